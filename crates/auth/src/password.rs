//! Password hashing (one-way digest + verify predicate).

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::AuthError;

/// Opaque one-way password scheme.
pub trait PasswordScheme: Send + Sync {
    /// Produce a self-describing digest (salt and parameters included).
    fn hash(&self, password: &str) -> Result<String, AuthError>;

    /// Constant-time check of `password` against a stored digest.
    ///
    /// An unparsable digest verifies as `false`.
    fn verify(&self, password: &str, digest: &str) -> bool;
}

/// Argon2id with PHC-string digests.
#[derive(Debug, Clone)]
pub struct Argon2Passwords {
    argon2: Argon2<'static>,
}

impl Argon2Passwords {
    pub fn new() -> Self {
        Self { argon2: Argon2::default() }
    }

    /// Custom cost parameters (memory KiB, iterations, lanes).
    ///
    /// Tests use tiny values; production should stay on the defaults.
    pub fn with_params(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, AuthError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| AuthError::Internal(format!("argon2 params: {e}")))?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

impl Default for Argon2Passwords {
    fn default() -> Self {
        Self::new()
    }
}

impl PasswordScheme for Argon2Passwords {
    fn hash(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))?;
        Ok(phc.to_string())
    }

    fn verify(&self, password: &str, digest: &str) -> bool {
        match PasswordHash::new(digest) {
            Ok(parsed) => self.argon2.verify_password(password.as_bytes(), &parsed).is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cheap() -> Argon2Passwords {
        Argon2Passwords::with_params(8, 1, 1).unwrap()
    }

    #[test]
    fn hash_and_verify() {
        let scheme = cheap();
        let digest = scheme.hash("a").unwrap();

        assert!(digest.starts_with("$argon2id$"));
        assert!(scheme.verify("a", &digest));
        assert!(!scheme.verify("b", &digest));
    }

    #[test]
    fn salts_differ() {
        let scheme = cheap();
        assert_ne!(scheme.hash("same").unwrap(), scheme.hash("same").unwrap());
    }

    #[test]
    fn garbage_digest_never_verifies() {
        assert!(!cheap().verify("a", "not-a-phc-string"));
    }
}
