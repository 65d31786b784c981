use chrono::{SubsecRound, Utc};
use inkwell_types::Post;
use rusqlite::{Connection, params};
use tracing::debug;

use crate::error::{OptionalExt, Result, StoreError};
use crate::models::{POST_COLUMNS, PostRow, format_time};
use crate::{Database, LIST_LIMIT};

impl Database {
    /// Insert a new post and return it as stored, author attached.
    ///
    /// The row is written even when `author_id` names no user; the author
    /// lookup that follows then fails with `NotFound`.
    pub fn save_post(&self, mut post: Post) -> Result<Post> {
        post.created_at = post.created_at.trunc_subsecs(6);
        post.updated_at = post.updated_at.trunc_subsecs(6);

        let saved = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (title, content, author_id, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    post.title,
                    post.content,
                    post.author_id,
                    format_time(&post.created_at),
                    format_time(&post.updated_at),
                ],
            )?;
            let id = conn.last_insert_rowid();
            debug!(post_id = id, author_id = post.author_id, "Post saved");
            fetch_post(conn, id)
        })?;

        Ok(saved)
    }

    /// The [`LIST_LIMIT`] most recently stored posts, newest first.
    pub fn find_all_posts(&self) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            query_posts(
                conn,
                &format!(
                    "SELECT {POST_COLUMNS} FROM posts p LEFT JOIN users u ON p.author_id = u.id
                     ORDER BY p.id DESC LIMIT ?1"
                ),
                params![LIST_LIMIT],
            )
        })
    }

    pub fn find_post_by_id(&self, id: i64) -> Result<Post> {
        self.with_conn(|conn| fetch_post(conn, id))
    }

    /// Overwrite title and content of the stored post with `post.id`.
    /// Author and creation time are not touched.
    pub fn update_post(&self, post: Post) -> Result<Post> {
        let updated = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET title = ?1, content = ?2, updated_at = ?3 WHERE id = ?4",
                params![post.title, post.content, format_time(&Utc::now()), post.id],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("post {}", post.id)));
            }
            fetch_post(conn, post.id)
        })?;

        debug!(post_id = updated.id, "Post updated");
        Ok(updated)
    }

    /// Delete post `id`. Zero means there was no such post.
    pub fn delete_post(&self, id: i64) -> Result<usize> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])?)
        })?;

        debug!(post_id = id, deleted, "Post deleted");
        Ok(deleted)
    }

    /// Up to [`LIST_LIMIT`] posts by `author_id`, oldest first.
    pub fn get_users_posts(&self, author_id: i64) -> Result<Vec<Post>> {
        self.with_conn(|conn| {
            query_posts(
                conn,
                &format!(
                    "SELECT {POST_COLUMNS} FROM posts p LEFT JOIN users u ON p.author_id = u.id
                     WHERE p.author_id = ?1
                     ORDER BY p.created_at ASC, p.id ASC LIMIT ?2"
                ),
                params![author_id, LIST_LIMIT],
            )
        })
    }

    /// Delete every post by `author_id`, returning how many went.
    ///
    /// Run after [`Database::delete_user`] so no posts outlive their author.
    /// The two statements are independent; [`Database::delete_user_cascade`]
    /// does both in one transaction.
    pub fn delete_all_user_posts(&self, author_id: i64) -> Result<usize> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM posts WHERE author_id = ?1", [author_id])?)
        })?;

        debug!(author_id, deleted, "User posts deleted");
        Ok(deleted)
    }
}

fn fetch_post(conn: &Connection, id: i64) -> Result<Post> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM posts p LEFT JOIN users u ON p.author_id = u.id
         WHERE p.id = ?1"
    ))?;

    stmt.query_row([id], PostRow::from_row)
        .optional()?
        .ok_or_else(|| StoreError::NotFound(format!("post {id}")))?
        .into_post()
}

// JOIN users to fetch the author in the same query (no N+1)
fn query_posts(conn: &Connection, sql: &str, params: impl rusqlite::Params) -> Result<Vec<Post>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map(params, PostRow::from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    rows.into_iter().map(PostRow::into_post).collect()
}
