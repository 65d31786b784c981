/// Database row types — these map directly to SQLite rows.
/// Timestamps stay as stored text until converted into the entity types.
use chrono::{DateTime, SecondsFormat, Utc};
use inkwell_types::{Post, User};
use rusqlite::Row;

use crate::error::{Result, StoreError};

pub const USER_COLUMNS: &str = "id, username, email, password, created_at, updated_at";

/// Post columns followed by the joined author's columns, for `posts p LEFT JOIN users u`.
pub const POST_COLUMNS: &str = "p.id, p.title, p.content, p.author_id, p.created_at, p.updated_at, \
     u.id, u.username, u.email, u.password, u.created_at, u.updated_at";

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password: String,
    pub created_at: String,
    pub updated_at: String,
}

pub struct PostRow {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub author_id: i64,
    pub created_at: String,
    pub updated_at: String,
    pub author: Option<UserRow>,
}

impl UserRow {
    /// Read a user from `USER_COLUMNS` order.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    pub fn into_user(self) -> Result<User> {
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            password: self.password,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

impl PostRow {
    /// Read a post and its LEFT JOINed author from `POST_COLUMNS` order.
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let author = match row.get::<_, Option<i64>>(6)? {
            Some(id) => Some(UserRow {
                id,
                username: row.get(7)?,
                email: row.get(8)?,
                password: row.get(9)?,
                created_at: row.get(10)?,
                updated_at: row.get(11)?,
            }),
            None => None,
        };

        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            author_id: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
            author,
        })
    }

    /// Convert to a `Post` with its author attached. A dangling `author_id`
    /// is reported as `NotFound`.
    pub fn into_post(self) -> Result<Post> {
        let author = self
            .author
            .ok_or_else(|| {
                StoreError::NotFound(format!("author {} of post {}", self.author_id, self.id))
            })?
            .into_user()?;

        Ok(Post {
            id: self.id,
            title: self.title,
            content: self.content,
            author: Some(author),
            author_id: self.author_id,
            created_at: parse_time(&self.created_at)?,
            updated_at: parse_time(&self.updated_at)?,
        })
    }
}

/// Fixed-width RFC 3339 so that text order matches time order.
pub fn format_time(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::CorruptRow(format!("bad timestamp {raw:?}: {e}")))
}
