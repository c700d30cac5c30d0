//! Parent code hashing and verification using Argon2
//!
//! Only the PHC-formatted hash (salt and parameters included) is stored.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::error::{EconomyError, EconomyResult};

const MIN_CODE_LEN: usize = 4;
const MAX_CODE_LEN: usize = 12;

/// Check that a code is 4-12 ASCII letters or digits
pub fn validate_code(code: &str) -> EconomyResult<()> {
    let len = code.chars().count();
    if !(MIN_CODE_LEN..=MAX_CODE_LEN).contains(&len) {
        return Err(EconomyError::InvalidCodeFormat(format!(
            "must be {MIN_CODE_LEN}-{MAX_CODE_LEN} characters"
        )));
    }
    if !code.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(EconomyError::InvalidCodeFormat(
            "only letters and digits are allowed".to_string(),
        ));
    }
    Ok(())
}

/// Hash a parent code using Argon2id with a fresh salt
pub fn hash_code(code: &str) -> EconomyResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(code.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| EconomyError::Hashing(format!("Failed to hash parent code: {e}")))
}

/// Verify a code against a stored hash.
///
/// The digest comparison inside the verifier is constant-time.
pub fn verify_code(code: &str, hash: &str) -> EconomyResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| EconomyError::Hashing(format!("Invalid stored hash format: {e}")))?;

    Ok(Argon2::default()
        .verify_password(code.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_code("4821").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("4821"));

        assert!(verify_code("4821", &hash).unwrap());
        assert!(!verify_code("4822", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_code("1234").unwrap();
        let b = hash_code("1234").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_stored_hash() {
        assert!(matches!(
            verify_code("1234", "plaintext-1234"),
            Err(EconomyError::Hashing(_))
        ));
    }

    #[test]
    fn test_code_format() {
        assert!(validate_code("1234").is_ok());
        assert!(validate_code("abc123XYZ").is_ok());
        assert!(validate_code("123").is_err());
        assert!(validate_code("1234567890123").is_err());
        assert!(validate_code("12 34").is_err());
        assert!(validate_code("ääää").is_err());
    }
}
