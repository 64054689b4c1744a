/// Password hashing using Argon2id
///
/// This module hashes and verifies passwords with Argon2id, an adaptive,
/// memory-hard algorithm. The produced hash is a self-contained PHC string
/// carrying the algorithm version, its parameters, and a fresh random salt,
/// so verification needs no external salt storage.
///
/// # Security
///
/// - **Algorithm**: Argon2id (hybrid of Argon2i and Argon2d)
/// - **Memory**: 64 MB (65536 KB) by default
/// - **Iterations**: 3 passes by default
/// - **Parallelism**: 4 lanes by default
/// - **Output**: 32-byte hash
///
/// The work factor is tunable through [`HashingParams`]; tests use cheaper
/// settings so the suite stays fast.
///
/// # Example
///
/// ```
/// use minilms_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("super_secret_password_123")?;
///
/// assert!(verify_password("super_secret_password_123", &hash)?);
/// assert!(!verify_password("wrong_password", &hash)?);
/// # Ok(())
/// # }
/// ```

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2, ParamsBuilder, Version,
};

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Failed to hash password
    #[error("Failed to hash password: {0}")]
    HashError(String),

    /// Failed to verify password
    #[error("Failed to verify password: {0}")]
    VerifyError(String),

    /// Invalid password hash format
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Tunable Argon2id work factor
///
/// Defaults match the production settings (64 MB, 3 passes, 4 lanes).
/// Lower the costs only in tests.
#[derive(Debug, Clone, Copy)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub m_cost: u32,

    /// Number of iterations
    pub t_cost: u32,

    /// Degree of parallelism
    pub p_cost: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            m_cost: 65536, // 64 MB
            t_cost: 3,
            p_cost: 4,
        }
    }
}

impl HashingParams {
    /// Cheap parameters for test suites
    ///
    /// Roughly three orders of magnitude faster than the defaults while
    /// still exercising the full PHC encode/verify path.
    pub fn fast_insecure() -> Self {
        Self {
            m_cost: 1024, // 1 MB
            t_cost: 1,
            p_cost: 1,
        }
    }
}

/// Hashes a password using Argon2id with the default work factor
///
/// # Returns
///
/// PHC string format hash (includes algorithm, parameters, salt, and hash):
///
/// ```text
/// $argon2id$v=19$m=65536,t=3,p=4$c2FsdHNhbHRzYWx0$hash...
/// ```
///
/// Two calls with the same password produce different strings because the
/// salt is freshly generated each time.
///
/// # Errors
///
/// Returns `PasswordError::HashError` if hashing fails
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    hash_password_with(password, HashingParams::default())
}

/// Hashes a password using Argon2id with an explicit work factor
///
/// # Errors
///
/// Returns `PasswordError::HashError` if the parameters are rejected or
/// hashing fails
pub fn hash_password_with(
    password: &str,
    params: HashingParams,
) -> Result<String, PasswordError> {
    // Fresh random salt from the OS RNG for every call
    let salt = SaltString::generate(&mut OsRng);

    let params = ParamsBuilder::new()
        .m_cost(params.m_cost)
        .t_cost(params.t_cost)
        .p_cost(params.p_cost)
        .output_len(32)
        .build()
        .map_err(|e| PasswordError::HashError(format!("Invalid parameters: {}", e)))?;

    let argon2 = Argon2::new(argon2::Algorithm::Argon2id, Version::V0x13, params);

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashError(format!("Hash generation failed: {}", e)))?;

    Ok(password_hash.to_string())
}

/// Verifies a password against a PHC-encoded hash
///
/// The parameters and salt embedded in the hash drive the recomputation, so
/// hashes produced with any work factor verify correctly. Comparison is
/// constant-time.
///
/// # Returns
///
/// `Ok(true)` if the password matches, `Ok(false)` if it doesn't
///
/// # Errors
///
/// Returns `PasswordError::InvalidHash` if the stored hash cannot be parsed.
/// A wrong password is never an error, only `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| PasswordError::InvalidHash(format!("Failed to parse hash: {}", e)))?;

    // Parameters come from the hash itself
    let argon2 = Argon2::default();

    match argon2.verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::VerifyError(format!(
            "Verification failed: {}",
            e
        ))),
    }
}
