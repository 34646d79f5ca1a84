//! Read-only endpoints used by the page templates.
//!
//! # Responsibilities
//! - `/forms/{form}`: CSRF hidden field plus fields pre-filled from old input
//! - `/flash`: pending flash message, consumed on read
//! - `/packages/compare`: package comparison table
//! - `/health`: liveness probe

use std::fmt::Write;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tower_sessions::Session;

use crate::forms::FormKind;
use crate::http::flash::{self, Flash};
use crate::http::server::AppState;
use crate::packages::{build_comparison, render_table};
use crate::security::csrf;
use crate::security::sanitize::escape_html;
use crate::security::SessionState;

/// Fields rendered as a `<textarea>` instead of an `<input>`.
const MULTILINE_FIELDS: &[&str] = &["message", "comment"];

pub async fn health() -> &'static str {
    "ok"
}

pub async fn show_flash(session: Session) -> Html<String> {
    Html(
        Flash::take(&session)
            .await
            .map(|flash| flash.render())
            .unwrap_or_default(),
    )
}

pub async fn form_fields(Path(action): Path<String>, session: Session) -> Response {
    let Some(kind) = FormKind::from_action(&action) else {
        return (StatusCode::NOT_FOUND, "Unknown form").into_response();
    };

    let mut security = match SessionState::load(&session).await {
        Ok(state) => state,
        Err(e) => {
            tracing::error!(form = kind.action(), error = %e, "Failed to load session state");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Session unavailable").into_response();
        }
    };
    let mut html = csrf::render_hidden_field(&mut security);
    if let Err(e) = security.save(&session).await {
        tracing::error!(form = kind.action(), error = %e, "Failed to save session state");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Session unavailable").into_response();
    }

    let old = flash::old_input(&session, kind).await;
    for field in kind.fields() {
        let value = old.get(*field).map(|v| escape_html(v)).unwrap_or_default();
        html.push('\n');
        if MULTILINE_FIELDS.contains(field) {
            let _ = write!(html, r#"<textarea name="{field}">{value}</textarea>"#);
        } else {
            let _ = write!(html, r#"<input type="text" name="{field}" value="{value}">"#);
        }
    }

    Html(html).into_response()
}

pub async fn compare_packages(State(state): State<AppState>) -> Response {
    match state.repository.list_packages().await {
        Ok(packages) => {
            let comparison = build_comparison(&packages, &state.config.packages.comparison_keywords);
            Html(render_table(&comparison)).into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to load packages");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "Package comparison is temporarily unavailable",
            )
                .into_response()
        }
    }
}
