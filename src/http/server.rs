//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the form, page and admin handlers
//! - Wire up middleware (sessions, tracing, limits, request ID, headers)
//! - Bind the server to a listener and shut down gracefully

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use crate::admin;
use crate::config::schema::SessionConfig;
use crate::config::SiteConfig;
use crate::http::{forms, pages};
use crate::observability::AuditLog;
use crate::security::headers::with_security_headers;
use crate::security::{Clock, RateLimiter, SystemClock, UploadValidator};
use crate::storage::Repository;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "site_session";

/// Multipart framing allowance on top of the upload size limit.
pub const UPLOAD_BODY_OVERHEAD: usize = 64 * 1024;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<SiteConfig>,
    pub repository: Arc<dyn Repository>,
    pub limiter: RateLimiter,
    pub audit: Arc<AuditLog>,
    pub uploads: Arc<UploadValidator>,
}

impl AppState {
    pub fn new(config: SiteConfig, repository: Arc<dyn Repository>) -> Self {
        Self::with_clock(config, repository, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an explicit rate-limit clock.
    pub fn with_clock(
        config: SiteConfig,
        repository: Arc<dyn Repository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let audit = Arc::new(AuditLog::new(&config.observability.security_log_path));
        let uploads = Arc::new(UploadValidator::new(&config.uploads));
        Self {
            config: Arc::new(config),
            repository,
            limiter: RateLimiter::new(clock),
            audit,
            uploads,
        }
    }
}

/// HTTP server for the site's dynamic endpoints.
pub struct SiteServer {
    router: Router,
    config: Arc<SiteConfig>,
}

impl SiteServer {
    pub fn new(state: AppState) -> Self {
        let config = state.config.clone();
        let router = Self::build_router(state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();
        let upload_limit = config.uploads.max_size_bytes as usize + UPLOAD_BODY_OVERHEAD;

        let session_routes = Router::new()
            .route("/contact", post(forms::submit_contact))
            .route("/blog/comment", post(forms::submit_comment))
            .route("/packages/select", post(forms::submit_plan_selection))
            .route("/forms/{form}", get(pages::form_fields))
            .route("/flash", get(pages::show_flash))
            .layer(session_layer(&config.session))
            .layer(DefaultBodyLimit::max(config.security.max_body_size));

        let mut router = Router::new()
            .route("/health", get(pages::health))
            .route("/packages/compare", get(pages::compare_packages))
            .merge(session_routes)
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(state, upload_limit));
        }

        let router = router
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.server.request_timeout_secs,
            )))
            .layer(RequestBodyLimitLayer::new(
                upload_limit.max(config.security.max_body_size),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

        if config.security.enable_headers {
            with_security_headers(router)
        } else {
            router
        }
    }

    /// Run the server until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            admin_enabled = self.config.admin.enabled,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

fn session_layer(config: &SessionConfig) -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE)
        .with_secure(config.secure_cookie)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::seconds(
            config.inactivity_secs,
        )))
}
