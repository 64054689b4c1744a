/// Server-side sessions and CSRF tokens
///
/// This module issues and validates opaque session identifiers and the CSRF
/// token bound to each session. Both values are 32 random bytes from the OS
/// RNG, hex-encoded (256 bits of entropy), and carry no structure: equality
/// and unguessability are their only contract.
///
/// A session is created on the first CSRF issue (before login); its username
/// is populated only after a successful login and the whole record is
/// destroyed on logout. The CSRF token never changes for the life of a
/// session.
///
/// Session state is process-local and lost on restart.
///
/// # Example
///
/// ```
/// use minilms_shared::auth::session::SessionManager;
///
/// let sessions = SessionManager::new();
///
/// let (sid, csrf) = sessions.issue_csrf(None);
/// assert!(sessions.validate_csrf(&sid, &csrf));
///
/// // Issuing again for the same session returns the same token
/// let (sid2, csrf2) = sessions.issue_csrf(Some(&sid));
/// assert_eq!(sid, sid2);
/// assert_eq!(csrf, csrf2);
/// ```

use chrono::{DateTime, Utc};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Number of random bytes in a session id or CSRF token
///
/// 32 bytes = 256 bits, comfortably above the 128-bit floor for
/// unguessability.
const TOKEN_BYTES: usize = 32;

/// A single server-side session
#[derive(Debug, Clone)]
struct Session {
    /// Authenticated username, populated only after a successful login
    username: Option<String>,

    /// CSRF token issued with the session; stable for its whole life
    csrf_token: String,

    /// When the session was created
    #[allow(dead_code)]
    created_at: DateTime<Utc>,
}

/// Issues and validates sessions and their CSRF tokens
///
/// Cloning is cheap and all clones share the same state. The mutex is held
/// only for individual map operations, never across I/O.
#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl SessionManager {
    /// Creates an empty session manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the CSRF token for a session, creating the session if needed
    ///
    /// Passing `None`, or an id that no longer resolves (expired cookie,
    /// server restart), creates a fresh session with new random id and CSRF
    /// token. Passing a live id returns the existing token unchanged, so the
    /// call is idempotent per session.
    ///
    /// # Returns
    ///
    /// Tuple of (session_id, csrf_token)
    pub fn issue_csrf(&self, session_id: Option<&str>) -> (String, String) {
        let mut sessions = self.sessions.lock().expect("session map lock poisoned");

        if let Some(id) = session_id {
            if let Some(session) = sessions.get(id) {
                return (id.to_string(), session.csrf_token.clone());
            }
        }

        let id = generate_token();
        let csrf_token = generate_token();
        sessions.insert(
            id.clone(),
            Session {
                username: None,
                csrf_token: csrf_token.clone(),
                created_at: Utc::now(),
            },
        );

        tracing::debug!(session_id = %id, "Created new session");
        (id, csrf_token)
    }

    /// Returns true iff the session exists and the submitted token matches
    ///
    /// No session, or any mismatch, is false; callers see a single failure
    /// mode.
    pub fn validate_csrf(&self, session_id: &str, submitted_token: &str) -> bool {
        let sessions = self.sessions.lock().expect("session map lock poisoned");
        match sessions.get(session_id) {
            Some(session) => session.csrf_token == submitted_token,
            None => false,
        }
    }

    /// Marks the session as authenticated for `username`
    ///
    /// Called only after credentials were verified. Binding an id that no
    /// longer resolves is a no-op; that can only happen if the session was
    /// destroyed concurrently.
    pub fn bind_identity(&self, session_id: &str, username: &str) {
        let mut sessions = self.sessions.lock().expect("session map lock poisoned");
        match sessions.get_mut(session_id) {
            Some(session) => {
                session.username = Some(username.to_string());
            }
            None => {
                tracing::warn!(session_id = %session_id, "bind_identity on unknown session");
            }
        }
    }

    /// Returns the authenticated username for a session, if any
    pub fn current_identity(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.lock().expect("session map lock poisoned");
        sessions.get(session_id).and_then(|s| s.username.clone())
    }

    /// Removes the session and its CSRF token entirely
    ///
    /// Destroying an unknown id is a no-op, which makes logout idempotent.
    pub fn destroy(&self, session_id: &str) {
        let mut sessions = self.sessions.lock().expect("session map lock poisoned");
        if sessions.remove(session_id).is_some() {
            tracing::debug!(session_id = %session_id, "Destroyed session");
        }
    }
}

/// Generates an opaque token: 32 OS-random bytes, hex-encoded
fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_creates_session() {
        let sessions = SessionManager::new();
        let (sid, csrf) = sessions.issue_csrf(None);

        assert_eq!(sid.len(), TOKEN_BYTES * 2);
        assert_eq!(csrf.len(), TOKEN_BYTES * 2);
        assert!(sessions.validate_csrf(&sid, &csrf));
    }

    #[test]
    fn test_issue_is_idempotent_for_live_session() {
        let sessions = SessionManager::new();
        let (sid, csrf) = sessions.issue_csrf(None);
        let (sid2, csrf2) = sessions.issue_csrf(Some(&sid));

        assert_eq!(sid, sid2);
        assert_eq!(csrf, csrf2);
    }

    #[test]
    fn test_issue_with_stale_id_creates_fresh_session() {
        let sessions = SessionManager::new();
        let (sid, csrf) = sessions.issue_csrf(Some("no-such-session"));

        assert_ne!(sid, "no-such-session");
        assert!(sessions.validate_csrf(&sid, &csrf));
    }

    #[test]
    fn test_tokens_are_unique() {
        let sessions = SessionManager::new();
        let (sid1, csrf1) = sessions.issue_csrf(None);
        let (sid2, csrf2) = sessions.issue_csrf(None);

        assert_ne!(sid1, sid2);
        assert_ne!(csrf1, csrf2);
    }

    #[test]
    fn test_validate_rejects_wrong_token() {
        let sessions = SessionManager::new();
        let (sid, _) = sessions.issue_csrf(None);

        assert!(!sessions.validate_csrf(&sid, "wrong-token"));
        assert!(!sessions.validate_csrf("unknown-session", "anything"));
    }

    #[test]
    fn test_identity_lifecycle() {
        let sessions = SessionManager::new();
        let (sid, _) = sessions.issue_csrf(None);

        assert_eq!(sessions.current_identity(&sid), None);

        sessions.bind_identity(&sid, "alice");
        assert_eq!(sessions.current_identity(&sid), Some("alice".to_string()));

        sessions.destroy(&sid);
        assert_eq!(sessions.current_identity(&sid), None);
    }

    #[test]
    fn test_csrf_token_stable_across_login() {
        let sessions = SessionManager::new();
        let (sid, csrf) = sessions.issue_csrf(None);

        sessions.bind_identity(&sid, "alice");
        let (_, csrf_after) = sessions.issue_csrf(Some(&sid));

        assert_eq!(csrf, csrf_after);
    }

    #[test]
    fn test_destroy_is_idempotent() {
        let sessions = SessionManager::new();
        let (sid, _) = sessions.issue_csrf(None);

        sessions.destroy(&sid);
        sessions.destroy(&sid);
        sessions.destroy("never-existed");
    }
}
