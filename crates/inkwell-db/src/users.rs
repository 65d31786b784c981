use chrono::{SubsecRound, Utc};
use inkwell_crypto::{PasswordError, hash_password, verify_password};
use inkwell_types::User;
use rusqlite::{Connection, params};
use tracing::{debug, info, warn};

use crate::error::{OptionalExt, Result, StoreError};
use crate::models::{USER_COLUMNS, UserRow, format_time};
use crate::{Database, LIST_LIMIT};

/// Rows removed by [`Database::delete_user_cascade`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub users: usize,
    pub posts: usize,
}

impl Database {
    /// Insert a new user. The password is hashed before it reaches the store;
    /// the returned user carries the generated id and the stored hash.
    pub fn save_user(&self, mut user: User) -> Result<User> {
        user.password = hash_password(&user.password)?;
        user.created_at = user.created_at.trunc_subsecs(6);
        user.updated_at = user.updated_at.trunc_subsecs(6);

        user.id = self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (username, email, password, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    user.username,
                    user.email,
                    user.password,
                    format_time(&user.created_at),
                    format_time(&user.updated_at),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })?;

        debug!(user_id = user.id, "User saved");
        Ok(user)
    }

    /// Overwrite username, email and password of user `id`, re-hashing the
    /// password. Returns the stored row.
    pub fn update_user(&self, id: i64, user: User) -> Result<User> {
        let password_hash = hash_password(&user.password)?;

        let updated = self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET username = ?1, email = ?2, password = ?3, updated_at = ?4
                 WHERE id = ?5",
                params![
                    user.username,
                    user.email,
                    password_hash,
                    format_time(&Utc::now()),
                    id
                ],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("user {id}")));
            }
            query_user_by_id(conn, id)?
                .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
        })?;

        debug!(user_id = id, "User updated");
        Ok(updated)
    }

    /// Delete user `id`. Zero means there was no such user.
    ///
    /// The user's posts are left in place; see [`Database::delete_user_cascade`].
    pub fn delete_user(&self, id: i64) -> Result<usize> {
        let deleted = self.with_conn(|conn| {
            Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])?)
        })?;

        debug!(user_id = id, deleted, "User deleted");
        Ok(deleted)
    }

    /// Delete user `id` and every post they authored in one transaction.
    /// Either both deletes land or neither does.
    pub fn delete_user_cascade(&self, id: i64) -> Result<CascadeOutcome> {
        let outcome = self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let posts = tx.execute("DELETE FROM posts WHERE author_id = ?1", [id])?;
            let users = tx.execute("DELETE FROM users WHERE id = ?1", [id])?;
            tx.commit()?;
            Ok(CascadeOutcome { users, posts })
        })?;

        info!(
            user_id = id,
            users = outcome.users,
            posts = outcome.posts,
            "User deleted with posts"
        );
        Ok(outcome)
    }

    /// Replace the password of the user registered under `email`.
    pub fn update_password(&self, email: &str, new_password: &str) -> Result<()> {
        let password_hash = hash_password(new_password)?;

        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET password = ?1, updated_at = ?2 WHERE email = ?3",
                params![password_hash, format_time(&Utc::now()), email],
            )?;
            if changed == 0 {
                return Err(StoreError::NotFound(format!("user with email {email}")));
            }
            Ok(())
        })?;

        debug!("Password updated");
        Ok(())
    }

    pub fn find_user_by_id(&self, id: i64) -> Result<User> {
        self.with_conn(|conn| query_user_by_id(conn, id))?
            .ok_or_else(|| StoreError::NotFound(format!("user {id}")))
    }

    pub fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// Up to [`LIST_LIMIT`] users in registration order.
    pub fn find_all_users(&self) -> Result<Vec<User>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY id LIMIT ?1"
            ))?;
            let rows = stmt
                .query_map([LIST_LIMIT], UserRow::from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            rows.into_iter().map(UserRow::into_user).collect()
        })
    }

    /// Look up `username` and check `password` against the stored hash.
    ///
    /// An unknown username and a wrong password fail identically.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<User> {
        let Some(user) = self.find_user_by_username(username)? else {
            warn!("Login failed: unknown user");
            return Err(PasswordError::Mismatch.into());
        };

        if let Err(e) = verify_password(&user.password, password) {
            warn!(user_id = user.id, "Login failed: bad password");
            return Err(e.into());
        }

        Ok(user)
    }
}

fn query_user_by_id(conn: &Connection, id: i64) -> Result<Option<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"))?;

    stmt.query_row([id], UserRow::from_row)
        .optional()?
        .map(UserRow::into_user)
        .transpose()
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let mut stmt =
        conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"))?;

    stmt.query_row([username], UserRow::from_row)
        .optional()?
        .map(UserRow::into_user)
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_types::Post;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn save(db: &Database, name: &str) -> User {
        db.save_user(User::new(name, format!("{name}@example.com"), "secret1"))
            .unwrap()
    }

    #[test]
    fn save_assigns_id_and_stores_hash() {
        let db = db();
        let user = save(&db, "alice");

        assert!(user.id > 0);
        assert_ne!(user.password, "secret1");
        assert!(verify_password(&user.password, "secret1").is_ok());

        let stored = db.find_user_by_id(user.id).unwrap();
        assert_eq!(stored.password, user.password);
        assert_eq!(stored.email, "alice@example.com");
        assert_eq!(stored.created_at, user.created_at);
    }

    #[test]
    fn duplicate_username_or_email_is_a_persistence_failure() {
        let db = db();
        save(&db, "alice");

        let err = db
            .save_user(User::new("alice", "other@example.com", "pw"))
            .unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert!(err.is_unique_violation());

        let err = db
            .save_user(User::new("alice2", "alice@example.com", "pw"))
            .unwrap_err();
        assert!(err.is_unique_violation());
    }

    #[test]
    fn update_rehashes_and_touches_updated_at() {
        let db = db();
        let user = save(&db, "alice");

        let changes = User::new("alicia", "alicia@example.com", "new-secret");
        let updated = db.update_user(user.id, changes).unwrap();

        assert_eq!(updated.id, user.id);
        assert_eq!(updated.username, "alicia");
        assert_eq!(updated.email, "alicia@example.com");
        assert_eq!(updated.created_at, user.created_at);
        assert!(updated.updated_at >= user.updated_at);
        assert!(verify_password(&updated.password, "new-secret").is_ok());
        assert!(verify_password(&updated.password, "secret1").is_err());
    }

    #[test]
    fn update_of_missing_user_is_not_found() {
        let db = db();
        let err = db
            .update_user(99, User::new("ghost", "g@example.com", "pw"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn delete_reports_row_count() {
        let db = db();
        let user = save(&db, "alice");

        assert_eq!(db.delete_user(user.id).unwrap(), 1);
        assert_eq!(db.delete_user(user.id).unwrap(), 0);
        assert!(db.find_user_by_id(user.id).unwrap_err().is_not_found());
    }

    #[test]
    fn password_reset_by_email() {
        let db = db();
        save(&db, "alice");

        db.update_password("alice@example.com", "brand-new").unwrap();
        assert!(db.authenticate("alice", "brand-new").is_ok());
        assert!(db.authenticate("alice", "secret1").is_err());

        let err = db.update_password("nobody@example.com", "x").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn authenticate_fails_uniformly() {
        let db = db();
        let alice = save(&db, "alice");

        assert_eq!(db.authenticate("alice", "secret1").unwrap().id, alice.id);
        assert!(matches!(
            db.authenticate("alice", "wrong"),
            Err(StoreError::Hashing(PasswordError::Mismatch))
        ));
        assert!(matches!(
            db.authenticate("bob", "secret1"),
            Err(StoreError::Hashing(PasswordError::Mismatch))
        ));
    }

    #[test]
    fn find_all_users_in_registration_order() {
        let db = db();
        save(&db, "alice");
        save(&db, "bob");

        let names: Vec<_> = db
            .find_all_users()
            .unwrap()
            .into_iter()
            .map(|u| u.username)
            .collect();
        assert_eq!(names, ["alice", "bob"]);
        assert!(db.find_user_by_username("carol").unwrap().is_none());
    }

    #[test]
    fn cascade_removes_only_the_users_posts() {
        let db = db();
        let alice = save(&db, "alice");
        let bob = save(&db, "bob");

        for i in 0..3 {
            db.save_post(Post::new(format!("a{i}"), "x", alice.id)).unwrap();
        }
        db.save_post(Post::new("b0", "x", bob.id)).unwrap();

        let outcome = db.delete_user_cascade(alice.id).unwrap();
        assert_eq!(outcome, CascadeOutcome { users: 1, posts: 3 });

        assert!(db.get_users_posts(alice.id).unwrap().is_empty());
        assert_eq!(db.get_users_posts(bob.id).unwrap().len(), 1);
        assert!(db.find_user_by_id(alice.id).unwrap_err().is_not_found());
    }

    #[test]
    fn cascade_on_missing_user_deletes_nothing() {
        let db = db();
        assert_eq!(
            db.delete_user_cascade(7).unwrap(),
            CascadeOutcome { users: 0, posts: 0 }
        );
    }
}
