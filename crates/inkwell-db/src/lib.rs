//! SQLite-backed store for users and posts.
//!
//! Every repository operation is a method on [`Database`] that runs one or a
//! few statements under the connection lock. Nothing is cached between calls.

pub mod error;
pub mod migrations;
pub mod models;
pub mod posts;
pub mod users;

pub use error::{Result, StoreError};
pub use users::CascadeOutcome;

use rusqlite::Connection;
use std::path::Path;
use std::sync::Mutex;
use tracing::info;

/// Maximum number of rows any list operation returns.
pub const LIST_LIMIT: u32 = 100;

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        migrations::run(&conn)?;

        info!("Database opened at {}", path.display());
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// A private, empty database that lives as long as the handle.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrations::run(&conn)?;

        info!("In-memory database opened");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn with_conn<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&conn)
    }

    /// Like [`Database::with_conn`], but hands out `&mut Connection` so the
    /// closure can open a transaction.
    pub fn with_conn_mut<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut *conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inkwell_types::{Post, User, ValidationMode};

    fn register(db: &Database, mut user: User) -> Result<User> {
        user.prepare();
        user.validate(ValidationMode::Create)?;
        db.save_user(user)
    }

    fn publish(db: &Database, mut post: Post) -> Result<Post> {
        post.prepare();
        post.validate()?;
        db.save_post(post)
    }

    #[test]
    fn end_to_end_user_post_lifecycle() {
        let db = Database::open_in_memory().unwrap();

        let alice = register(&db, User::new("alice", "a@example.com", "secret1")).unwrap();
        assert!(alice.id > 0);
        assert_ne!(alice.password, "secret1");

        let post = publish(&db, Post::new("hello", "world", alice.id)).unwrap();
        assert_eq!(post.author.as_ref().unwrap().username, "alice");

        assert_eq!(db.delete_user(alice.id).unwrap(), 1);
        assert_eq!(db.delete_all_user_posts(alice.id).unwrap(), 1);

        let err = db.find_post_by_id(post.id).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn validation_failures_surface_as_store_errors() {
        let db = Database::open_in_memory().unwrap();

        let err = register(&db, User::new("alice", "", "secret1")).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert_eq!(err.to_string(), "email is required");

        let err = publish(&db, Post::new("t", "c", 0)).unwrap_err();
        assert!(matches!(err, StoreError::Validation(_)));
        assert!(db.find_all_posts().unwrap().is_empty());
    }

    #[test]
    fn file_backed_database_persists_across_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("inkwell.db");

        let id = {
            let db = Database::open(&path).unwrap();
            register(&db, User::new("carol", "c@example.com", "pw")).unwrap().id
        };

        let db = Database::open(&path).unwrap();
        assert_eq!(db.find_user_by_id(id).unwrap().username, "carol");
    }
}
