use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Hashes a plaintext password into a PHC-format string with a fresh
/// random salt. Only the encoded string is ever stored.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("password hashing failed: {e}"))
}

/// Checks a candidate password against a stored hash. A mismatch is
/// `Ok(false)`; only an unparseable stored hash is an error.
pub fn verify_password(plain: &str, stored: &str) -> anyhow::Result<bool> {
    let parsed =
        PasswordHash::new(stored).map_err(|e| anyhow!("stored password hash is invalid: {e}"))?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_form_is_a_salted_phc_string() {
        let first = hash_password("bakery-owner-2024").expect("hash");
        let second = hash_password("bakery-owner-2024").expect("hash");
        assert!(first.starts_with("$argon2"));
        // Fresh salt per call: equal passwords never share a stored form.
        assert_ne!(first, second);
    }

    #[test]
    fn matching_password_verifies_and_wrong_one_does_not() {
        let hash = hash_password("v1s1t-ma1n-street").expect("hash");
        assert!(verify_password("v1s1t-ma1n-street", &hash).expect("verify"));
        assert!(!verify_password("v1s1t-ma1n-streeT", &hash).expect("verify"));
        assert!(!verify_password("", &hash).expect("verify"));
    }

    #[test]
    fn garbage_in_the_hash_column_is_an_error_not_a_mismatch() {
        assert!(verify_password("anything", "plaintext-left-by-a-migration").is_err());
        assert!(verify_password("anything", "").is_err());
    }
}
