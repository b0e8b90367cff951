use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use uuid::Uuid;

use crate::core::error::{AppError, Result};

/// Hash a password into a PHC string
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Check a password against a stored PHC string.
///
/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

/// Temporary password handed out by an administrator reset
pub fn temporary_password(seed: Uuid) -> String {
    let simple = seed.simple().to_string();
    format!("temp{}2024", &simple[simple.len() - 8..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("s3cret-pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret-pass", &hash));
        assert!(!verify_password("S3cret-pass", &hash));
    }

    #[test]
    fn test_same_password_gets_distinct_salts() {
        let a = hash_password("repeat").unwrap();
        let b = hash_password("repeat").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "plaintext-in-db"));
        assert!(!verify_password("", ""));
    }

    #[test]
    fn test_temporary_password_shape() {
        let seed = Uuid::parse_str("0190f5a2-7c4e-7b1a-9d3e-a1b2c3d4e5f6").unwrap();
        assert_eq!(temporary_password(seed), "tempc3d4e5f62024");
        assert!(temporary_password(Uuid::now_v7()).len() >= 6);
    }
}
