//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware, sessions)
//!     → request.rs (client address and user agent)
//!     → forms.rs (POST pipeline) / pages.rs (GET fragments)
//!     → flash.rs (outcome carried to the next page via the session)
//!     → 303 redirect or HTML fragment
//! ```

pub mod flash;
pub mod forms;
pub mod pages;
pub mod request;
pub mod server;

pub use flash::{Flash, FlashKind};
pub use server::{AppState, SiteServer, SESSION_COOKIE};
