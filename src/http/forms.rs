//! Form submission handlers.
//!
//! Each POST runs the same pipeline:
//! ```text
//! CSRF check → rate-limit check → field validation → persistence → 303 redirect
//! ```
//! Any stage may stop the pipeline; the visitor is always redirected with a
//! flash message describing the outcome. Storage errors are logged in full
//! and shown only as a generic message.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};

use axum::extract::rejection::FormRejection;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::Redirect;
use axum::Form;
use chrono::Utc;
use tower_sessions::Session;

use crate::forms::{CommentForm, ContactForm, FormKind, PlanSelectionForm};
use crate::http::flash::{self, Flash};
use crate::http::request::client_meta;
use crate::http::server::AppState;
use crate::observability::{metrics, Severity};
use crate::security::csrf;
use crate::security::rate_limit::{cooldown_minutes, rate_limit_key};
use crate::security::sanitize::sanitize_for_storage;
use crate::security::SessionState;
use crate::storage::{ContactMessage, NewComment, PlanEnquiry};

pub const CSRF_ERROR: &str = "Invalid security token. Please refresh the page and try again.";
pub const GENERIC_ERROR: &str =
    "Sorry, something went wrong while processing your request. Please try again later.";
pub const INVALID_ARTICLE: &str = "Invalid article.";
pub const INVALID_PACKAGE: &str = "Please select a valid package.";

pub fn rate_limited_message(minutes: u64) -> String {
    let unit = if minutes == 1 { "minute" } else { "minutes" };
    format!("Too many submissions. Please try again in {minutes} {unit}.")
}

async fn redirect_with(session: &Session, to: &str, flash: Flash) -> Redirect {
    flash.store(session).await;
    Redirect::to(to)
}

/// Why a submission was stopped before validation.
enum GateRejection {
    Session,
    Csrf,
    RateLimited { cooldown_secs: u64 },
}

impl GateRejection {
    fn flash(&self) -> Flash {
        match self {
            GateRejection::Session => Flash::error(GENERIC_ERROR),
            GateRejection::Csrf => Flash::error(CSRF_ERROR),
            GateRejection::RateLimited { cooldown_secs } => {
                // The window can still be full with zero seconds left on it.
                Flash::error(rate_limited_message(cooldown_minutes(*cooldown_secs).max(1)))
            }
        }
    }

    /// Forged requests never get to write into the visitor's form state.
    fn keeps_input(&self) -> bool {
        !matches!(self, GateRejection::Csrf)
    }
}

/// CSRF and rate-limit gates shared by every form.
///
/// On success one attempt has been counted against the client's window.
async fn check_gates(
    state: &AppState,
    session: &Session,
    kind: FormKind,
    client: IpAddr,
    token: Option<&str>,
) -> Result<(), GateRejection> {
    let mut security = SessionState::load(session).await.map_err(|e| {
        tracing::error!(form = kind.action(), error = %e, "Failed to load session state");
        GateRejection::Session
    })?;

    if !csrf::validate(&security, token) {
        tracing::warn!(form = kind.action(), client = %client, "CSRF validation failed");
        metrics::record_csrf_failure(kind.action());
        state
            .audit
            .record(
                Severity::Warning,
                client,
                &format!("CSRF token validation failed on {} form", kind.action()),
            )
            .await;
        return Err(GateRejection::Csrf);
    }

    let rule = kind.rate_limit(&state.config);
    let key = rate_limit_key(kind.action(), client);
    let allowed = state.limiter.check_and_consume(&mut security, &key, rule);
    let cooldown_secs = state.limiter.remaining_cooldown(&security, &key, rule.window_secs);

    security.save(session).await.map_err(|e| {
        tracing::error!(form = kind.action(), error = %e, "Failed to save session state");
        GateRejection::Session
    })?;

    if allowed {
        Ok(())
    } else {
        tracing::warn!(form = kind.action(), client = %client, cooldown_secs, "Rate limit exceeded");
        Err(GateRejection::RateLimited { cooldown_secs })
    }
}

/// Unwrap the decoded body; an unreadable one is sent back like any other bad input.
async fn read_form<T>(
    session: &Session,
    kind: FormKind,
    body: Result<Form<T>, FormRejection>,
) -> Result<T, Redirect> {
    match body {
        Ok(Form(form)) => Ok(form),
        Err(rejection) => {
            tracing::warn!(
                form = kind.action(),
                status = %rejection.status(),
                error = %rejection.body_text(),
                "Unreadable form body"
            );
            metrics::record_submission(kind.action(), "malformed");
            Err(redirect_with(session, kind.redirect_path(), Flash::error(GENERIC_ERROR)).await)
        }
    }
}

/// Redirect back after a gate refused the submission.
async fn reject(
    session: &Session,
    kind: FormKind,
    to: &str,
    rejection: GateRejection,
    input: HashMap<String, String>,
) -> Redirect {
    if rejection.keeps_input() {
        flash::store_old_input(session, kind, input).await;
    }
    metrics::record_submission(kind.action(), "rejected");
    redirect_with(session, to, rejection.flash()).await
}

pub async fn submit_contact(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    session: Session,
    headers: HeaderMap,
    body: Result<Form<ContactForm>, FormRejection>,
) -> Redirect {
    let kind = FormKind::Contact;
    let form = match read_form(&session, kind, body).await {
        Ok(form) => form,
        Err(redirect) => return redirect,
    };
    let back = kind.redirect_path();
    let client = client_meta(peer, &headers);

    if let Err(rejection) =
        check_gates(&state, &session, kind, client.address, form.csrf_token.as_deref()).await
    {
        return reject(&session, kind, back, rejection, form.old_input()).await;
    }

    let contact = match form.validate() {
        Ok(contact) => contact,
        Err(errors) => {
            metrics::record_submission(kind.action(), "invalid");
            flash::store_old_input(&session, kind, form.old_input()).await;
            return redirect_with(&session, back, Flash::errors(errors)).await;
        }
    };

    let message = ContactMessage {
        first_name: contact.first_name,
        last_name: contact.last_name,
        email: contact.email,
        phone: contact.phone,
        service: contact.service,
        message: contact.message,
        submitted_at: Utc::now(),
        client,
    };

    match state.repository.insert_contact_message(&message).await {
        Ok(id) => {
            tracing::info!(id, client = %message.client.address, "Contact message stored");
            state
                .audit
                .record(
                    Severity::Info,
                    message.client.address,
                    &format!("Contact form submitted (message #{id})"),
                )
                .await;
            metrics::record_submission(kind.action(), "accepted");
            flash::clear_old_input(&session, kind).await;
            redirect_with(&session, back, Flash::success(kind.success_message())).await
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to store contact message");
            metrics::record_submission(kind.action(), "storage_error");
            flash::store_old_input(&session, kind, form.old_input()).await;
            redirect_with(&session, back, Flash::error(GENERIC_ERROR)).await
        }
    }
}

pub async fn submit_comment(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    session: Session,
    headers: HeaderMap,
    body: Result<Form<CommentForm>, FormRejection>,
) -> Redirect {
    let kind = FormKind::Comment;
    let form = match read_form(&session, kind, body).await {
        Ok(form) => form,
        Err(redirect) => return redirect,
    };
    let listing = kind.redirect_path();
    let client = client_meta(peer, &headers);

    // The article decides where the visitor goes back to, so it is resolved first.
    let article = match form.article_id() {
        Some(id) => match state.repository.find_published_article(id).await {
            Ok(article) => article,
            Err(e) => {
                tracing::error!(article_id = id, error = %e, "Failed to look up article");
                return redirect_with(&session, listing, Flash::error(GENERIC_ERROR)).await;
            }
        },
        None => None,
    };
    let Some(article) = article else {
        tracing::warn!(article_id = %form.article_id, client = %client.address, "Comment on unknown article");
        metrics::record_submission(kind.action(), "invalid_article");
        return redirect_with(&session, listing, Flash::error(INVALID_ARTICLE)).await;
    };
    let back = format!("/blog/{}#comments", article.slug);

    if let Err(rejection) =
        check_gates(&state, &session, kind, client.address, form.csrf_token.as_deref()).await
    {
        return reject(&session, kind, &back, rejection, form.old_input()).await;
    }

    let valid = match form.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            metrics::record_submission(kind.action(), "invalid");
            flash::store_old_input(&session, kind, form.old_input()).await;
            return redirect_with(&session, &back, Flash::errors(errors)).await;
        }
    };

    let comment = NewComment {
        article_id: article.id,
        name: valid.name,
        email: valid.email,
        comment: valid.comment,
        submitted_at: Utc::now(),
        client,
    };

    match state.repository.insert_comment(&comment).await {
        Ok(id) => {
            tracing::info!(id, article_id = article.id, "Comment stored for moderation");
            state
                .audit
                .record(
                    Severity::Info,
                    comment.client.address,
                    &format!("Comment #{id} submitted on article #{}", article.id),
                )
                .await;
            metrics::record_submission(kind.action(), "accepted");
            flash::clear_old_input(&session, kind).await;
            redirect_with(&session, &back, Flash::success(kind.success_message())).await
        }
        Err(e) => {
            tracing::error!(article_id = article.id, error = %e, "Failed to store comment");
            metrics::record_submission(kind.action(), "storage_error");
            flash::store_old_input(&session, kind, form.old_input()).await;
            redirect_with(&session, &back, Flash::error(GENERIC_ERROR)).await
        }
    }
}

pub async fn submit_plan_selection(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    session: Session,
    headers: HeaderMap,
    body: Result<Form<PlanSelectionForm>, FormRejection>,
) -> Redirect {
    let kind = FormKind::PlanSelection;
    let form = match read_form(&session, kind, body).await {
        Ok(form) => form,
        Err(redirect) => return redirect,
    };
    let back = kind.redirect_path();
    let client = client_meta(peer, &headers);

    if let Err(rejection) =
        check_gates(&state, &session, kind, client.address, form.csrf_token.as_deref()).await
    {
        return reject(&session, kind, back, rejection, form.old_input()).await;
    }

    let requested = sanitize_for_storage(&form.package);
    let package = if requested.is_empty() {
        None
    } else {
        match state.repository.find_package_by_name(&requested).await {
            Ok(package) => package,
            Err(e) => {
                tracing::error!(package = %requested, error = %e, "Failed to look up package");
                flash::store_old_input(&session, kind, form.old_input()).await;
                return redirect_with(&session, back, Flash::error(GENERIC_ERROR)).await;
            }
        }
    };

    let validated = form.validate();
    let mut errors = validated.as_ref().err().cloned().unwrap_or_default();
    if !requested.is_empty() && package.is_none() {
        errors.push(INVALID_PACKAGE.to_string());
    }
    let (Some(package), Ok(valid)) = (package, validated) else {
        metrics::record_submission(kind.action(), "invalid");
        flash::store_old_input(&session, kind, form.old_input()).await;
        return redirect_with(&session, back, Flash::errors(errors)).await;
    };

    let enquiry = PlanEnquiry {
        package_id: package.id,
        package_name: package.name.clone(),
        name: valid.name,
        email: valid.email,
        phone: valid.phone,
        location: valid.location,
        message: valid.message,
        submitted_at: Utc::now(),
        client,
    };

    match state.repository.insert_plan_enquiry(&enquiry).await {
        Ok(id) => {
            tracing::info!(id, package = %package.name, "Plan enquiry stored");
            state
                .audit
                .record(
                    Severity::Info,
                    enquiry.client.address,
                    &format!("Plan selection submitted for {} (enquiry #{id})", package.name),
                )
                .await;
            metrics::record_submission(kind.action(), "accepted");
            flash::clear_old_input(&session, kind).await;
            let message = format!("{} Selected package: {}.", kind.success_message(), package.name);
            redirect_with(&session, back, Flash::success(message)).await
        }
        Err(e) => {
            tracing::error!(package = %package.name, error = %e, "Failed to store plan enquiry");
            metrics::record_submission(kind.action(), "storage_error");
            flash::store_old_input(&session, kind, form.old_input()).await;
            redirect_with(&session, back, Flash::error(GENERIC_ERROR)).await
        }
    }
}
