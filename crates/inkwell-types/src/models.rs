use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sanitize::clean;
use crate::validation::{ValidationError, ValidationMode, check_email};

/// A registered account. `id == 0` means "not yet stored".
///
/// `password` holds the plaintext secret until the store saves the user;
/// from then on it holds an Argon2 PHC string. It is never serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: i64,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username: username.into(),
            email: email.into(),
            password: password.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Drop any client-supplied id, sanitize the identity fields and stamp
    /// both timestamps with the current time.
    pub fn prepare(&mut self) {
        let now = Utc::now();
        self.id = 0;
        self.username = clean(&self.username);
        self.email = clean(&self.email);
        self.created_at = now;
        self.updated_at = now;
    }

    pub fn validate(&self, mode: ValidationMode) -> Result<(), ValidationError> {
        match mode {
            ValidationMode::Create | ValidationMode::Update => {
                self.require_credentials()?;
                check_email(&self.email)
            }
            ValidationMode::Login => self.require_credentials(),
            ValidationMode::ForgotPassword => check_email(&self.email),
        }
    }

    fn require_credentials(&self) -> Result<(), ValidationError> {
        if self.username.is_empty() {
            return Err(ValidationError::MissingUsername);
        }
        if self.password.is_empty() {
            return Err(ValidationError::MissingPassword);
        }
        Ok(())
    }
}

/// A blog post. `author` is filled in by the store after every read or write
/// that resolves `author_id`; it is never persisted and is ignored on input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub id: i64,
    pub title: String,
    pub content: String,
    #[serde(default, skip_deserializing)]
    pub author: Option<User>,
    pub author_id: i64,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

impl Post {
    pub fn new(title: impl Into<String>, content: impl Into<String>, author_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            author: None,
            author_id,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn prepare(&mut self) {
        let now = Utc::now();
        self.title = clean(&self.title);
        self.content = clean(&self.content);
        self.author = None;
        self.created_at = now;
        self.updated_at = now;
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }
        if self.content.is_empty() {
            return Err(ValidationError::MissingContent);
        }
        if self.author_id < 1 {
            return Err(ValidationError::MissingAuthor);
        }
        Ok(())
    }
}
