//! Append-only security log.
//!
//! One line per event:
//! `[2026-01-31 09:15:02] [WARNING] [IP: 203.0.113.7] CSRF validation failed (contact)`.
//! The file and its directory are created on first write. Writes run on the
//! blocking pool. Failures are reported through tracing and never reach the
//! request.

use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Error => write!(f, "ERROR"),
        }
    }
}

/// Format one log line (without the trailing newline).
pub fn format_entry(at: DateTime<Utc>, severity: Severity, client: IpAddr, event: &str) -> String {
    // Keep one event per line whatever the event text contains.
    let event: String = event.chars().map(|c| if c.is_control() { ' ' } else { c }).collect();
    format!(
        "[{}] [{}] [IP: {}] {}",
        at.format("%Y-%m-%d %H:%M:%S"),
        severity,
        client,
        event
    )
}

/// Security/audit trail writer.
#[derive(Debug)]
pub struct AuditLog {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append an event.
    pub async fn record(&self, severity: Severity, client: IpAddr, event: &str) {
        let line = format_entry(Utc::now(), severity, client, event);
        let path = self.path.clone();
        let lock = Arc::clone(&self.lock);

        match tokio::task::spawn_blocking(move || append(&lock, &path, &line)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::error!(path = %self.path.display(), error = %e, "Failed to write security log");
            }
            Err(e) => {
                tracing::error!(path = %self.path.display(), error = %e, "Security log task failed");
            }
        }
    }
}

fn append(lock: &Mutex<()>, path: &Path, line: &str) -> io::Result<()> {
    let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{line}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_entry_format() {
        let at = Utc.with_ymd_and_hms(2026, 1, 31, 9, 15, 2).unwrap();
        let line = format_entry(at, Severity::Warning, "203.0.113.7".parse().unwrap(), "CSRF validation failed");
        assert_eq!(line, "[2026-01-31 09:15:02] [WARNING] [IP: 203.0.113.7] CSRF validation failed");
    }

    #[test]
    fn test_entry_stays_on_one_line() {
        let at = Utc.with_ymd_and_hms(2026, 1, 31, 9, 15, 2).unwrap();
        let line = format_entry(at, Severity::Info, "::1".parse().unwrap(), "forged\n[ERROR] entry");
        assert!(!line.contains('\n'));
        assert!(line.ends_with("forged [ERROR] entry"));
    }

    #[tokio::test]
    async fn test_appends_lines() {
        let dir = std::env::temp_dir().join(format!("audit-{}", uuid::Uuid::new_v4()));
        let log = AuditLog::new(dir.join("security.log"));
        let client = "127.0.0.1".parse().unwrap();

        log.record(Severity::Warning, client, "first").await;
        log.record(Severity::Info, client, "second").await;

        let content = fs::read_to_string(log.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[WARNING] [IP: 127.0.0.1] first"));
        assert!(lines[1].contains("[INFO] [IP: 127.0.0.1] second"));

        fs::remove_dir_all(&dir).unwrap_or_default();
    }
}
