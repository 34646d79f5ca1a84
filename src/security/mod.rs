//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Form submission:
//!     → session.rs (load per-session state)
//!     → csrf.rs (validate submitted token)
//!     → rate_limit.rs (fixed-window check per client + action)
//!     → sanitize.rs (clean fields for storage)
//!     → upload.rs (admin image uploads only)
//!     → Pass to form handler
//!
//! Every response:
//!     → headers.rs (nosniff, frame and referrer policy)
//! ```
//!
//! # Design Decisions
//! - Session state is an explicit value, never ambient
//! - Checks report booleans or typed rejections; callers decide what to show
//! - No trust in client input, including declared file names and types

pub mod csrf;
pub mod headers;
pub mod rate_limit;
pub mod sanitize;
pub mod session;
pub mod upload;

pub use rate_limit::{Clock, ManualClock, RateLimiter, SystemClock};
pub use session::SessionState;
pub use upload::{UploadDescriptor, UploadRejection, UploadValidator};
