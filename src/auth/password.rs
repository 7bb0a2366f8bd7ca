//! Argon2id password hashing.
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so the
//! random salt and cost parameters travel with the hash. Verification reads the
//! parameters from the stored string, which keeps old hashes valid after the
//! configured cost changes.

use argon2::password_hash::{
    rand_core::OsRng, Error as PhcError, PasswordHash, PasswordHasher as _, PasswordVerifier,
    SaltString,
};
use argon2::{Algorithm, Argon2, Params, Version};

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Invalid hashing parameters: {0}")]
    Params(String),

    #[error("Hashing failed: {0}")]
    Hash(String),

    #[error("Stored hash is malformed: {0}")]
    MalformedHash(String),
}

/// Argon2id cost parameters, fixed per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    /// OWASP recommended Argon2id parameters: m=19456 (19MB), t=2, p=1.
    fn default() -> Self {
        HashCost {
            memory_kib: 19_456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("params", self.argon2.params())
            .finish()
    }
}

impl PasswordHasher {
    pub fn new(cost: HashCost) -> Result<Self, PasswordError> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| PasswordError::Params(e.to_string()))?;
        Ok(PasswordHasher {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hash(e.to_string()))?;
        Ok(hash.to_string())
    }

    /// Check a plaintext password against a stored PHC hash.
    ///
    /// Returns `Ok(false)` on mismatch; `Err` only when the stored hash
    /// cannot be parsed.
    pub fn verify(&self, password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
        let parsed = PasswordHash::new(stored_hash)
            .map_err(|e| PasswordError::MalformedHash(e.to_string()))?;

        // Constant-time comparison is done by the argon2 crate
        match self.argon2.verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(PhcError::Password) => Ok(false),
            Err(e) => Err(PasswordError::MalformedHash(e.to_string())),
        }
    }
}
