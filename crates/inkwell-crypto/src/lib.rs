/// Inkwell Crypto Library
///
/// Password hashing for stored credentials: Argon2id with the crate's
/// default cost parameters and a fresh random salt per hash. Hashes are
/// PHC strings, so the algorithm and parameters travel with each one.

pub mod password;

pub use password::{PasswordError, hash_password, verify_password};
