use axum::{Router, routing::get};
use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::Duration;
use tessera_auth::Role;
use tessera_core::RpcCode;

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

/// Check if observability is enabled.
///
/// Set once at startup from `ServerConfig`; falls back to the
/// OBSERVABILITY_ENABLED env var when nothing was set explicitly.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true) // Enabled by default
    })
}

/// Fix the observability switch for the rest of the process.
///
/// Later calls are ignored.
pub fn set_observability_enabled(enabled: bool) {
    let _ = OBSERVABILITY_ENABLED.set(enabled);
}

/// Initialize Prometheus metrics exporter with upkeep task
/// Returns Ok(None) if observability is disabled
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("rpc_request_duration_seconds".to_string()),
            &[
                0.001, 0.005, 0.01, 0.025, 0.05, 0.075, 0.1, 0.25, 0.5, 0.75, 1.0, 2.5, 5.0, 7.5,
                10.0,
            ],
        )?
        .install_recorder()?;

    // Spawn upkeep task to clean stale metrics
    let upkeep_handle = handle.clone();
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(5)).await;
            upkeep_handle.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Router for metrics server
pub fn metrics_app(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

/// Destination of every measurement taken while serving a call.
///
/// Handed to every call through its `CallContext`, so tests can swap in a sink
/// that records what was emitted.
pub trait MetricsSink: Send + Sync {
    fn increment_requests(&self, operation: &str, code: RpcCode);

    fn observe_duration(&self, operation: &str, elapsed: Duration);

    fn increment_errors(&self, operation: &str, code: RpcCode);

    fn user_created(&self, role: Role);

    fn login_succeeded(&self, role: Role);

    /// `reason` is a fixed label such as `unknown_email`, never caller input.
    fn login_failed(&self, reason: &'static str);

    fn token_issued(&self, role: Role);

    /// `role` is the verified role, or `anonymous`/`unknown` before verification.
    fn authorization_checked(&self, allowed: bool, role: &str);
}

/// Sink writing to the global `metrics` recorder, scraped through [`metrics_app`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PrometheusSink;

impl MetricsSink for PrometheusSink {
    fn increment_requests(&self, operation: &str, code: RpcCode) {
        if !is_observability_enabled() {
            return;
        }
        counter!("rpc_requests_total", "method" => operation.to_string(), "code" => code.as_str())
            .increment(1);
    }

    fn observe_duration(&self, operation: &str, elapsed: Duration) {
        if !is_observability_enabled() {
            return;
        }
        histogram!("rpc_request_duration_seconds", "method" => operation.to_string())
            .record(elapsed.as_secs_f64());
    }

    fn increment_errors(&self, operation: &str, code: RpcCode) {
        if !is_observability_enabled() {
            return;
        }
        counter!("rpc_errors_total", "method" => operation.to_string(), "code" => code.as_str())
            .increment(1);
    }

    // Business metrics

    fn user_created(&self, role: Role) {
        if !is_observability_enabled() {
            return;
        }
        counter!("users_created_total", "role" => role.as_str()).increment(1);
    }

    fn login_succeeded(&self, role: Role) {
        if !is_observability_enabled() {
            return;
        }
        counter!("user_logins_total", "role" => role.as_str(), "status" => "success").increment(1);
    }

    fn login_failed(&self, reason: &'static str) {
        if !is_observability_enabled() {
            return;
        }
        counter!("user_logins_total", "role" => "unknown", "status" => "failure", "reason" => reason)
            .increment(1);
    }

    fn token_issued(&self, role: Role) {
        if !is_observability_enabled() {
            return;
        }
        counter!("tokens_issued_total", "role" => role.as_str()).increment(1);
    }

    fn authorization_checked(&self, allowed: bool, role: &str) {
        if !is_observability_enabled() {
            return;
        }
        let status = if allowed { "allowed" } else { "denied" };
        counter!("authorization_checks_total", "role" => role.to_string(), "status" => status)
            .increment(1);
    }
}
