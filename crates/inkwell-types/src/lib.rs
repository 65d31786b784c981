//! Entity types shared by the store and its callers.
//!
//! Callers build a `User` or `Post`, run `prepare()` to sanitize and stamp it,
//! `validate()` it for the action at hand, and only then hand it to the store.

pub mod models;
pub mod sanitize;
pub mod validation;

pub use models::{Post, User};
pub use validation::{ValidationError, ValidationMode};
