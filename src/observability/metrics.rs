//! Prometheus metrics for the portal.
//!
//! Provides metrics for:
//! - HTTP request latency and counts
//! - Sign-in attempts and account provisioning
//! - Authorization policy decisions
//! - Error responses by kind

#[cfg(feature = "prometheus")]
use std::sync::OnceLock;

#[cfg(feature = "prometheus")]
use metrics::{counter, histogram};
#[cfg(feature = "prometheus")]
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::MetricsConfig;

/// Request latency buckets. Most handlers are a single SQLite round trip.
#[cfg(feature = "prometheus")]
const LATENCY_BUCKETS_SECS: &[f64] = &[0.002, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5];

/// Global Prometheus handle for the metrics endpoint.
#[cfg(feature = "prometheus")]
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the metrics system with the given configuration.
#[cfg(feature = "prometheus")]
pub fn init_metrics(config: &MetricsConfig) -> Result<(), MetricsError> {
    if !config.enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            metrics_exporter_prometheus::Matcher::Suffix("_duration_seconds".to_string()),
            LATENCY_BUCKETS_SECS,
        )?
        .install_recorder()?;

    PROMETHEUS_HANDLE
        .set(handle)
        .map_err(|_| MetricsError::Setup("Metrics already initialized".to_string()))?;

    Ok(())
}

/// Initialize the metrics system (no-op without prometheus feature).
#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(_config: &MetricsConfig) -> Result<(), MetricsError> {
    Ok(())
}

/// Get the Prometheus handle for rendering metrics.
#[cfg(feature = "prometheus")]
pub fn get_prometheus_handle() -> Option<&'static PrometheusHandle> {
    PROMETHEUS_HANDLE.get()
}

// ─────────────────────────────────────────────────────────────────────────────
// Metric Recording Functions
// ─────────────────────────────────────────────────────────────────────────────

/// Record an HTTP request.
///
/// `path` should be the matched route template (`/experiences/{id}`), not the
/// raw URI, to keep label cardinality bounded.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    #[cfg(feature = "prometheus")]
    {
        let status_str = status.to_string();
        let status_class = format!("{}xx", status / 100);

        counter!("http_requests_total", "method" => method.to_string(), "path" => path.to_string(), "status" => status_str, "status_class" => status_class.clone())
            .increment(1);

        histogram!("http_request_duration_seconds", "method" => method.to_string(), "path" => path.to_string(), "status_class" => status_class)
            .record(duration_secs);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (method, path, status, duration_secs);
    }
}

/// Record an authentication attempt.
///
/// `method` is `google`, `refresh` or `bearer`.
pub fn record_auth_attempt(method: &str, success: bool) {
    #[cfg(feature = "prometheus")]
    {
        let status = if success { "success" } else { "failure" };
        counter!("auth_attempts_total", "method" => method.to_string(), "status" => status.to_string())
            .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (method, success);
    }
}

/// Record the outcome of resolving a sign-in to an account.
///
/// `outcome` is one of `existing`, `backup_email`, `provisioned`, `outside_domain`.
pub fn record_account_resolution(outcome: &str) {
    #[cfg(feature = "prometheus")]
    {
        counter!("account_resolutions_total", "outcome" => outcome.to_string()).increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = outcome;
    }
}

/// Record an authorization policy decision.
///
/// * `kind` - record kind (`experience`, `opportunity`)
/// * `operation` - `update`, `delete`, `verify`
/// * `decision` - `allow`, `deny`, `restricted`
pub fn record_policy_decision(kind: &str, operation: &str, decision: &str) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "policy_decisions_total",
            "kind" => kind.to_string(),
            "operation" => operation.to_string(),
            "decision" => decision.to_string()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (kind, operation, decision);
    }
}

/// Record an error response by its wire `type`.
pub fn record_api_error(error_type: &str, status: u16) {
    #[cfg(feature = "prometheus")]
    {
        counter!(
            "api_errors_total",
            "type" => error_type.to_string(),
            "status" => status.to_string()
        )
        .increment(1);
    }
    #[cfg(not(feature = "prometheus"))]
    {
        let _ = (error_type, status);
    }
}

/// Metrics initialization errors.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to set up metrics: {0}")]
    Setup(String),

    #[cfg(feature = "prometheus")]
    #[error("Failed to install metrics recorder: {0}")]
    Install(#[from] metrics_exporter_prometheus::BuildError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_harmless() {
        record_http_request("GET", "/experiences/{id}", 404, 0.002);
        record_auth_attempt("google", false);
        record_account_resolution("provisioned");
        record_policy_decision("experience", "update", "deny");
        record_api_error("permission_error", 403);
    }

    #[test]
    fn test_disabled_metrics_init_is_noop() {
        let config = MetricsConfig {
            enabled: false,
            ..Default::default()
        };
        assert!(init_metrics(&config).is_ok());
    }
}
