//! Metrics collection and exposition.
//!
//! # Metrics
//! - `site_form_submissions_total` (counter): submissions by form and outcome
//! - `site_csrf_failures_total` (counter): rejected tokens by form
//! - `site_rate_limited_total` (counter): denials by action
//! - `site_uploads_total` (counter): image uploads by outcome
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Labels are low-cardinality (form names, outcomes), never client data

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_submission(form: &str, outcome: &str) {
    metrics::counter!(
        "site_form_submissions_total",
        "form" => form.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_csrf_failure(form: &str) {
    metrics::counter!("site_csrf_failures_total", "form" => form.to_string()).increment(1);
}

pub fn record_rate_limited(action: &str) {
    metrics::counter!("site_rate_limited_total", "action" => action.to_string()).increment(1);
}

pub fn record_upload(outcome: &str) {
    metrics::counter!("site_uploads_total", "outcome" => outcome.to_string()).increment(1);
}
