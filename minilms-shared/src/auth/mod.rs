/// Authentication core for Mini-LMS
///
/// This module provides the security-relevant building blocks and the
/// orchestrator that ties them together:
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and verification
/// - [`lockout`]: per-username failed-login tracking and temporary lockout
/// - [`session`]: opaque session identifiers and per-session CSRF tokens
/// - [`audit`]: audit event formatting and append-only sinks
/// - [`service`]: the `AuthService` use-case orchestrator
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with embedded salt and parameters
/// - **Lockout**: 5 consecutive failures lock a username for 10 minutes,
///   evaluated lazily at query time
/// - **Sessions/CSRF**: 256-bit random tokens from the OS RNG
/// - **Uniform failures**: unknown usernames and wrong passwords are
///   indistinguishable to callers
///
/// # Example
///
/// ```no_run
/// use minilms_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod audit;
pub mod lockout;
pub mod password;
pub mod service;
pub mod session;
