//! Request metadata.
//!
//! # Responsibilities
//! - Identify the client by its connection address
//! - Capture the user agent stored alongside submissions
//!
//! # Design Decisions
//! - Forwarding headers are not trusted; the socket peer is the client
//! - User agents are sanitized and capped before storage

use std::net::SocketAddr;

use axum::http::{header, HeaderMap};

use crate::security::sanitize::sanitize_for_storage;
use crate::storage::ClientMeta;

const USER_AGENT_MAX: usize = 255;

pub fn client_meta(peer: SocketAddr, headers: &HeaderMap) -> ClientMeta {
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(sanitize_for_storage)
        .filter(|ua| !ua.is_empty())
        .map(|ua| ua.chars().take(USER_AGENT_MAX).collect());

    ClientMeta {
        address: peer.ip(),
        user_agent,
    }
}
