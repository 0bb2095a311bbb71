use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use secrecy::{ExposeSecret, SecretString};
use service_core::error::AppError;

/// Password digest collaborator.
pub trait PwdDigest: Send + Sync {
    fn digest(&self, identity: &str, plaintext: &str) -> Result<String, AppError>;

    /// Digest of the configured default password for `identity`.
    fn default_digest(&self, identity: &str) -> Result<String, AppError>;

    /// Checks `plaintext` against a stored digest. Malformed digests never match.
    fn matches(&self, identity: &str, plaintext: &str, stored: &str) -> bool;
}

/// Argon2id PHC strings with a random salt. The identity is bound into the
/// hashed input with a length prefix, so a digest only verifies for the
/// identity it was made for.
#[derive(Debug, Clone)]
pub struct Argon2PwdDigest {
    default_pwd: SecretString,
}

impl Argon2PwdDigest {
    pub fn new(default_pwd: SecretString) -> Self {
        Self { default_pwd }
    }
}

fn hash_input(identity: &str, plaintext: &str) -> Vec<u8> {
    format!("{}:{}{}", identity.len(), identity, plaintext).into_bytes()
}

impl PwdDigest for Argon2PwdDigest {
    fn digest(&self, identity: &str, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);

        let hash = Argon2::default()
            .hash_password(&hash_input(identity, plaintext), &salt)
            .map_err(|e| {
                AppError::InternalError(anyhow::anyhow!("Failed to hash password: {}", e))
            })?
            .to_string();

        Ok(hash)
    }

    fn default_digest(&self, identity: &str) -> Result<String, AppError> {
        self.digest(identity, self.default_pwd.expose_secret())
    }

    fn matches(&self, identity: &str, plaintext: &str, stored: &str) -> bool {
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };

        Argon2::default()
            .verify_password(&hash_input(identity, plaintext), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest() -> Argon2PwdDigest {
        Argon2PwdDigest::new(SecretString::new("changepwd".to_string()))
    }

    #[test]
    fn test_digest_is_salted_phc_string() {
        let d = digest();
        let first = d.digest("alice", "pw").unwrap();
        let second = d.digest("alice", "pw").unwrap();

        assert!(first.starts_with("$argon2"));
        assert_ne!(first, second);
        assert!(d.matches("alice", "pw", &first));
        assert!(d.matches("alice", "pw", &second));
    }

    #[test]
    fn test_digest_is_bound_to_identity() {
        let d = digest();
        let stored = d.digest("alice", "pw").unwrap();

        assert!(!d.matches("bob", "pw", &stored));
        assert!(!d.matches("alic", "epw", &stored));
        assert!(!d.matches("alice", "pw", &d.digest("alic", "epw").unwrap()));
    }

    #[test]
    fn test_default_digest_uses_default_password() {
        let d = digest();
        let stored = d.default_digest("alice").unwrap();
        assert!(d.matches("alice", "changepwd", &stored));
        assert!(!d.matches("alice", "other", &stored));
    }

    #[test]
    fn test_matches_rejects_wrong_or_malformed() {
        let d = digest();
        let stored = d.digest("alice", "s3cret").unwrap();
        assert!(d.matches("alice", "s3cret", &stored));
        assert!(!d.matches("alice", "wrong", &stored));
        assert!(!d.matches("alice", "s3cret", ""));
        assert!(!d.matches("alice", "s3cret", "not-a-phc-string"));
    }
}
