//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use site_forms::security::ManualClock;
use site_forms::storage::MemoryRepository;
use site_forms::{AppState, Shutdown, SiteConfig, SiteServer};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const ADMIN_KEY: &str = "test-admin-key";

/// A running server plus handles to its collaborators.
pub struct TestApp {
    pub addr: SocketAddr,
    pub repository: MemoryRepository,
    pub clock: Arc<ManualClock>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
    pub work_dir: PathBuf,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn security_log(&self) -> String {
        std::fs::read_to_string(self.work_dir.join("security.log")).unwrap_or_default()
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.work_dir.join("uploads")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.shutdown.trigger();
        let _ = std::fs::remove_dir_all(&self.work_dir);
    }
}

/// Config pointing every file path into a fresh temp directory.
pub fn test_config(work_dir: &std::path::Path) -> SiteConfig {
    let mut config = SiteConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    config.observability.security_log_path = work_dir.join("security.log").display().to_string();
    config.uploads.directory = work_dir.join("uploads").display().to_string();
    config.uploads.max_size_bytes = 1024;
    config.admin.enabled = true;
    config.admin.api_key = ADMIN_KEY.into();
    config
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Start a server on an ephemeral port with demo content and a manual clock.
pub async fn spawn_app_with(customize: impl FnOnce(&mut SiteConfig)) -> TestApp {
    let work_dir = std::env::temp_dir().join(format!("site-forms-test-{}", Uuid::new_v4().simple()));
    std::fs::create_dir_all(&work_dir).unwrap();

    let mut config = test_config(&work_dir);
    customize(&mut config);

    let repository = MemoryRepository::with_demo_content();
    let clock = Arc::new(ManualClock::new(1_700_000_000));
    let state = AppState::with_clock(config, Arc::new(repository.clone()), clock.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let stopped = shutdown.signalled();
    let handle = tokio::spawn(SiteServer::new(state).run(listener, stopped));

    // Wait for the server to start accepting
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestApp {
        addr,
        repository,
        clock,
        shutdown,
        handle,
        work_dir,
    }
}

/// Browser-like client: keeps cookies, does not follow redirects.
pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

/// Fetch a form fragment and return its CSRF token.
pub async fn csrf_token(client: &reqwest::Client, app: &TestApp, form: &str) -> String {
    let html = client
        .get(app.url(&format!("/forms/{form}")))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    extract_token(&html)
}

pub fn extract_token(html: &str) -> String {
    let marker = r#"name="csrf_token" value=""#;
    let start = html.find(marker).expect("fragment has a csrf field") + marker.len();
    let end = html[start..].find('"').unwrap() + start;
    html[start..end].to_string()
}

/// Take the pending flash message as rendered HTML.
pub async fn flash(client: &reqwest::Client, app: &TestApp) -> String {
    client
        .get(app.url("/flash"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap()
}

pub fn location(response: &reqwest::Response) -> String {
    response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

pub fn contact_fields(token: &str) -> Vec<(&'static str, String)> {
    vec![
        ("csrf_token", token.to_string()),
        ("first_name", "Asha".into()),
        ("last_name", "Kulkarni".into()),
        ("email", "asha@example.com".into()),
        ("phone", "+91 98220-12345".into()),
        ("service", "Residential construction".into()),
        ("message", "Looking for a quote on a G+1 house in Nagpur.".into()),
    ]
}
