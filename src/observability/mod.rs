//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (counters)
//!
//! Form handlers additionally produce:
//!     → audit.rs (append-only security log: CSRF failures, accepted submissions)
//! ```
//!
//! # Design Decisions
//! - Diagnostics go through tracing; the security log is a separate plain-text trail
//! - Request ID flows through every request span
//! - Metrics are cheap (atomic increments)

pub mod audit;
pub mod logging;
pub mod metrics;

pub use audit::{AuditLog, Severity};
