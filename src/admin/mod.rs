//! Admin surface: authenticated image uploads.
//!
//! Mounted only when `admin.enabled` is set. Every route requires
//! `Authorization: Bearer <admin.api_key>`.

pub mod auth;
pub mod handlers;

use axum::extract::DefaultBodyLimit;
use axum::routing::post;
use axum::{middleware, Router};

use self::auth::admin_auth_middleware;
use self::handlers::upload_image;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/admin/uploads", post(upload_image))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
        .with_state(state)
}
