/// Audit events and append-only sinks
///
/// Security-relevant outcomes are appended as one line per event:
///
/// ```text
/// 2024-05-11T09:13:02.481932Z - LOGIN failed for mallory
/// ```
///
/// The core is responsible only for producing the event text; where the
/// lines end up is a capability decided at wiring time. The file sink
/// mirrors the classic `auth.log` append; the memory sink backs tests.
///
/// Audit emission is a side channel: a sink that cannot write must never
/// fail the request it describes, so `append` is infallible and the file
/// sink logs write errors instead of propagating them.

use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// A security-relevant event worth recording
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditEvent {
    /// A new account was created
    RegisterSuccess { username: String },

    /// A login attempt failed (unknown username or wrong password; the
    /// event does not distinguish)
    LoginFailed { username: String },

    /// A login attempt was refused because the username is locked out
    LoginBlocked { username: String },

    /// A login attempt succeeded
    LoginSuccess { username: String },

    /// An authenticated session was logged out
    Logout { username: String },

    /// A state-changing request carried a missing or wrong CSRF token
    CsrfFailure,
}

impl fmt::Display for AuditEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditEvent::RegisterSuccess { username } => {
                write!(f, "REGISTER success for {}", username)
            }
            AuditEvent::LoginFailed { username } => write!(f, "LOGIN failed for {}", username),
            AuditEvent::LoginBlocked { username } => write!(f, "LOGIN blocked for {}", username),
            AuditEvent::LoginSuccess { username } => write!(f, "LOGIN success for {}", username),
            AuditEvent::Logout { username } => write!(f, "LOGOUT for {}", username),
            AuditEvent::CsrfFailure => write!(f, "CSRF validation failed"),
        }
    }
}

/// Formats an event as its on-disk line: ISO-8601 UTC timestamp, a dash,
/// the event text
pub fn format_line(at: DateTime<Utc>, event: &AuditEvent) -> String {
    format!("{} - {}", at.to_rfc3339_opts(SecondsFormat::Micros, true), event)
}

/// Destination for audit lines
///
/// Implementations must be safe to share across request handlers.
pub trait AuditSink: Send + Sync {
    /// Appends one formatted line to the sink
    fn append(&self, line: &str);
}

/// Append-only file sink (the `auth.log` of the original deployment)
pub struct FileAuditSink {
    file: Mutex<File>,
}

impl FileAuditSink {
    /// Opens (or creates) the log file in append mode
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened for appending
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

impl AuditSink for FileAuditSink {
    fn append(&self, line: &str) {
        let mut file = self.file.lock().expect("audit file lock poisoned");
        if let Err(e) = writeln!(file, "{}", line) {
            tracing::warn!(error = %e, "Failed to append audit line");
        }
    }
}

/// In-memory sink for tests
#[derive(Default)]
pub struct MemoryAuditSink {
    lines: Mutex<Vec<String>>,
}

impl MemoryAuditSink {
    /// Creates an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every line appended so far
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("audit line lock poisoned").clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn append(&self, line: &str) {
        self.lines
            .lock()
            .expect("audit line lock poisoned")
            .push(line.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_event_texts() {
        let cases = [
            (
                AuditEvent::RegisterSuccess {
                    username: "alice".into(),
                },
                "REGISTER success for alice",
            ),
            (
                AuditEvent::LoginFailed {
                    username: "alice".into(),
                },
                "LOGIN failed for alice",
            ),
            (
                AuditEvent::LoginBlocked {
                    username: "alice".into(),
                },
                "LOGIN blocked for alice",
            ),
            (
                AuditEvent::LoginSuccess {
                    username: "alice".into(),
                },
                "LOGIN success for alice",
            ),
            (
                AuditEvent::Logout {
                    username: "alice".into(),
                },
                "LOGOUT for alice",
            ),
            (AuditEvent::CsrfFailure, "CSRF validation failed"),
        ];

        for (event, expected) in cases {
            assert_eq!(event.to_string(), expected);
        }
    }

    #[test]
    fn test_line_format() {
        let at = Utc.with_ymd_and_hms(2024, 5, 11, 9, 13, 2).unwrap();
        let line = format_line(
            at,
            &AuditEvent::LoginSuccess {
                username: "alice".into(),
            },
        );
        assert_eq!(line, "2024-05-11T09:13:02.000000Z - LOGIN success for alice");
    }

    #[test]
    fn test_memory_sink_collects_lines() {
        let sink = MemoryAuditSink::new();
        sink.append("one");
        sink.append("two");
        assert_eq!(sink.lines(), vec!["one", "two"]);
    }

    #[test]
    fn test_file_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("auth.log");

        {
            let sink = FileAuditSink::open(&path).unwrap();
            sink.append("first");
        }
        {
            // Reopening must append, not truncate
            let sink = FileAuditSink::open(&path).unwrap();
            sink.append("second");
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
