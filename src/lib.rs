//! Form-submission security pipeline for the company website.
//!
//! Handles the site's dynamic endpoints: contact, blog comment and package
//! selection forms, the admin image upload, and the page fragments that
//! carry CSRF tokens and flash messages.

pub mod admin;
pub mod config;
pub mod forms;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod packages;
pub mod security;
pub mod storage;

pub use config::SiteConfig;
pub use http::{AppState, SiteServer};
pub use lifecycle::Shutdown;
