use argon2::Argon2;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use rand_core::OsRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hashing(argon2::password_hash::Error),
    /// Wrong secret and unreadable stored hash are reported the same way.
    #[error("invalid credentials")]
    Mismatch,
}

/// Hash a secret into a salted PHC string. Two calls with the same secret
/// produce different strings.
pub fn hash_password(secret: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret.as_bytes(), &salt)
        .map_err(PasswordError::Hashing)?;
    Ok(hash.to_string())
}

/// Check `candidate` against a stored PHC string.
pub fn verify_password(stored_hash: &str, candidate: &str) -> Result<(), PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| PasswordError::Mismatch)?;
    Argon2::default()
        .verify_password(candidate.as_bytes(), &parsed)
        .map_err(|_| PasswordError::Mismatch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_salted_and_not_plaintext() {
        let a = hash_password("secret1").unwrap();
        let b = hash_password("secret1").unwrap();
        assert_ne!(a, b);
        assert_ne!(a, "secret1");
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn verify_accepts_original_secret() {
        let hash = hash_password("correct horse").unwrap();
        assert!(verify_password(&hash, "correct horse").is_ok());
    }

    #[test]
    fn verify_rejects_other_secrets() {
        let hash = hash_password("correct horse").unwrap();
        assert!(matches!(
            verify_password(&hash, "correct horse "),
            Err(PasswordError::Mismatch)
        ));
        assert!(matches!(
            verify_password(&hash, ""),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn malformed_hash_is_a_plain_mismatch() {
        assert!(matches!(
            verify_password("not-a-phc-string", "anything"),
            Err(PasswordError::Mismatch)
        ));
        assert!(matches!(
            verify_password("secret1", "secret1"),
            Err(PasswordError::Mismatch)
        ));
    }

    #[test]
    fn empty_secret_still_hashes() {
        let hash = hash_password("").unwrap();
        assert!(verify_password(&hash, "").is_ok());
    }
}
