/// Login-attempt tracking and temporary lockout
///
/// This module counts consecutive failed logins per username and refuses
/// further attempts once a threshold is reached. Per-username state moves
/// through three logical states:
///
/// - **Clear**: no record exists
/// - **Warming**: `0 < failure_count < max_attempts`
/// - **Locked**: `failure_count >= max_attempts` and the last failure is
///   still within the block window
///
/// Lock status is derived from the counter and timestamp, never stored, and
/// expiry is evaluated lazily at query time: the first `is_locked` call after
/// the window has passed deletes the record. There is no background sweep, so
/// a locked username that receives no further traffic simply self-heals on
/// the next check.
///
/// The tracker counts unknown-username and wrong-password failures
/// identically; callers must not be able to infer account existence from
/// lockout behavior.
///
/// All state is process-local and lost on restart.
///
/// # Example
///
/// ```
/// use minilms_shared::auth::lockout::{LockoutPolicy, LoginAttemptTracker};
/// use chrono::Utc;
///
/// let tracker = LoginAttemptTracker::new(LockoutPolicy::default());
/// let now = Utc::now();
///
/// for _ in 0..5 {
///     tracker.record_failure("mallory", now);
/// }
/// assert!(tracker.is_locked("mallory", now));
/// ```

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Lockout policy constants
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    /// Consecutive failures that trigger a lock
    pub max_attempts: u32,

    /// How long a lock lasts, measured from the last failure
    pub block_duration: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            block_duration: Duration::minutes(10),
        }
    }
}

/// Per-username failure record
///
/// Exists only while `failure_count > 0`; deleted outright on success or
/// lazy expiry.
#[derive(Debug, Clone, Copy)]
struct AttemptState {
    failure_count: u32,
    last_failure_at: DateTime<Utc>,
}

/// Tracks consecutive login failures per username
///
/// Cloning is cheap and all clones share the same state, so a tracker can be
/// handed to request handlers and test code alike. The single mutex
/// serializes updates; two concurrent failures for the same username are both
/// counted.
#[derive(Debug, Clone)]
pub struct LoginAttemptTracker {
    policy: LockoutPolicy,
    attempts: Arc<Mutex<HashMap<String, AttemptState>>>,
}

impl Default for LoginAttemptTracker {
    fn default() -> Self {
        Self::new(LockoutPolicy::default())
    }
}

impl LoginAttemptTracker {
    /// Creates a tracker with the given policy
    pub fn new(policy: LockoutPolicy) -> Self {
        Self {
            policy,
            attempts: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Returns the configured policy
    pub fn policy(&self) -> LockoutPolicy {
        self.policy
    }

    /// Records a failed login attempt for `username`
    ///
    /// Increments the failure counter and stamps the failure time. Reaching
    /// `max_attempts` makes the username report as locked; there is no
    /// separate lock flag.
    pub fn record_failure(&self, username: &str, now: DateTime<Utc>) {
        let mut attempts = self.attempts.lock().expect("attempt map lock poisoned");
        let state = attempts
            .entry(username.to_string())
            .or_insert(AttemptState {
                failure_count: 0,
                last_failure_at: now,
            });
        state.failure_count += 1;
        state.last_failure_at = now;

        tracing::debug!(
            username = %username,
            failure_count = state.failure_count,
            "Recorded failed login attempt"
        );
    }

    /// Clears all failure state for `username`
    ///
    /// Called on successful login. The counter restarts from zero on the
    /// next failure.
    pub fn record_success(&self, username: &str) {
        let mut attempts = self.attempts.lock().expect("attempt map lock poisoned");
        if attempts.remove(username).is_some() {
            tracing::debug!(username = %username, "Cleared failed login attempts");
        }
    }

    /// Returns whether `username` is currently locked out
    ///
    /// A record whose block window has elapsed is deleted here and reported
    /// as clear; expiry happens on read, not via a sweeper.
    pub fn is_locked(&self, username: &str, now: DateTime<Utc>) -> bool {
        self.remaining_lockout(username, now).is_some()
    }

    /// Returns the time left in the block window, if `username` is locked
    ///
    /// `None` means the username is clear or merely warming. Like
    /// [`is_locked`](Self::is_locked), an expired record is deleted as a side
    /// effect of the check.
    pub fn remaining_lockout(&self, username: &str, now: DateTime<Utc>) -> Option<Duration> {
        let mut attempts = self.attempts.lock().expect("attempt map lock poisoned");

        let state = match attempts.get(username) {
            Some(state) => *state,
            None => return None,
        };

        if state.failure_count < self.policy.max_attempts {
            return None;
        }

        let elapsed = now - state.last_failure_at;
        if elapsed > self.policy.block_duration {
            // Window has passed: lazily expire the record
            attempts.remove(username);
            tracing::debug!(username = %username, "Lockout window elapsed, record expired");
            return None;
        }

        Some(self.policy.block_duration - elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> LoginAttemptTracker {
        LoginAttemptTracker::new(LockoutPolicy {
            max_attempts: 5,
            block_duration: Duration::minutes(10),
        })
    }

    #[test]
    fn test_clear_username_is_not_locked() {
        let t = tracker();
        assert!(!t.is_locked("alice", Utc::now()));
    }

    #[test]
    fn test_warming_is_not_locked() {
        let t = tracker();
        let now = Utc::now();

        for _ in 0..4 {
            t.record_failure("alice", now);
        }
        assert!(!t.is_locked("alice", now));
    }

    #[test]
    fn test_fifth_failure_locks() {
        let t = tracker();
        let now = Utc::now();

        for _ in 0..5 {
            t.record_failure("alice", now);
        }
        assert!(t.is_locked("alice", now));
    }

    #[test]
    fn test_lock_expires_lazily_after_window() {
        let t = tracker();
        let now = Utc::now();

        for _ in 0..5 {
            t.record_failure("alice", now);
        }

        // Still inside the window
        assert!(t.is_locked("alice", now + Duration::minutes(9)));

        // Exactly at the boundary the lock still holds (expiry is strictly
        // greater-than)
        assert!(t.is_locked("alice", now + Duration::minutes(10)));

        // Past the window the record is deleted and the state reads clear
        assert!(!t.is_locked("alice", now + Duration::minutes(10) + Duration::seconds(1)));

        // The deletion stuck: a new failure starts counting from one
        t.record_failure("alice", now + Duration::minutes(11));
        assert!(!t.is_locked("alice", now + Duration::minutes(11)));
    }

    #[test]
    fn test_success_resets_counter() {
        let t = tracker();
        let now = Utc::now();

        t.record_failure("alice", now);
        t.record_failure("alice", now);
        t.record_success("alice");

        // Four more failures must not lock (count restarted)
        for _ in 0..4 {
            t.record_failure("alice", now);
        }
        assert!(!t.is_locked("alice", now));

        // A fifth subsequent failure must
        t.record_failure("alice", now);
        assert!(t.is_locked("alice", now));
    }

    #[test]
    fn test_failure_after_lock_extends_window() {
        let t = tracker();
        let now = Utc::now();

        for _ in 0..5 {
            t.record_failure("alice", now);
        }

        // Another failure two minutes in restamps last_failure_at
        t.record_failure("alice", now + Duration::minutes(2));

        // 10 minutes after the original failures the lock still holds
        assert!(t.is_locked("alice", now + Duration::minutes(10) + Duration::seconds(30)));
    }

    #[test]
    fn test_usernames_are_independent() {
        let t = tracker();
        let now = Utc::now();

        for _ in 0..5 {
            t.record_failure("alice", now);
        }
        assert!(t.is_locked("alice", now));
        assert!(!t.is_locked("bob", now));
    }

    #[test]
    fn test_remaining_lockout_counts_down() {
        let t = tracker();
        let now = Utc::now();

        for _ in 0..5 {
            t.record_failure("alice", now);
        }

        let remaining = t
            .remaining_lockout("alice", now + Duration::minutes(4))
            .expect("should be locked");
        assert_eq!(remaining, Duration::minutes(6));
    }

    #[test]
    fn test_concurrent_failures_all_counted() {
        let t = tracker();
        let now = Utc::now();

        let handles: Vec<_> = (0..5)
            .map(|_| {
                let t = t.clone();
                std::thread::spawn(move || t.record_failure("alice", now))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert!(t.is_locked("alice", now));
    }
}
