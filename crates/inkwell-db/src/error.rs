use inkwell_crypto::PasswordError;
use inkwell_types::ValidationError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, StoreError>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    /// Any statement failure, unique-constraint violations included.
    #[error("database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("database lock poisoned")]
    Poisoned,

    #[error("corrupt row: {0}")]
    CorruptRow(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// True when the store rejected a write because of a UNIQUE column.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            Self::Persistence(rusqlite::Error::SqliteFailure(e, _))
                if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        )
    }
}

/// Extension trait for optional query results
pub(crate) trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
