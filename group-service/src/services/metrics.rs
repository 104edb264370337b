//! Metrics collection for group-service.
//!
//! HTTP metrics go through the `metrics` recorder; domain counters live in a
//! dedicated Prometheus registry appended to the same scrape output.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use service_core::error::AppError;
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static GROUP_OPERATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static AUDIT_EVENTS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

fn metrics_error(context: &str, err: impl std::fmt::Display) -> AppError {
    AppError::InternalError(anyhow::anyhow!("{}: {}", context, err))
}

/// Initialize metrics collection. Call once at startup.
pub fn init_metrics() -> Result<(), AppError> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| metrics_error("failed to install Prometheus recorder", e))?;
    METRICS_HANDLE
        .set(handle)
        .map_err(|_| metrics_error("failed to set metrics handle", "already initialized"))?;

    let registry = Registry::new();

    let operations = IntCounterVec::new(
        Opts::new(
            "group_operations_total",
            "Group directory operations by operation and outcome",
        ),
        &["operation", "outcome"],
    )
    .map_err(|e| metrics_error("failed to create group_operations_total", e))?;

    let audit_events = IntCounterVec::new(
        Opts::new("audit_events_total", "Audit events by handling status"),
        &["status"],
    )
    .map_err(|e| metrics_error("failed to create audit_events_total", e))?;

    registry
        .register(Box::new(operations.clone()))
        .map_err(|e| metrics_error("failed to register group_operations_total", e))?;
    registry
        .register(Box::new(audit_events.clone()))
        .map_err(|e| metrics_error("failed to register audit_events_total", e))?;

    PROMETHEUS_REGISTRY
        .set(registry)
        .map_err(|_| metrics_error("failed to set prometheus registry", "already initialized"))?;
    GROUP_OPERATIONS_TOTAL
        .set(operations)
        .map_err(|_| metrics_error("failed to set group_operations_total", "already initialized"))?;
    AUDIT_EVENTS_TOTAL
        .set(audit_events)
        .map_err(|_| metrics_error("failed to set audit_events_total", "already initialized"))?;

    Ok(())
}

/// Get metrics output in Prometheus text format.
pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

pub fn record_group_operation(operation: &str, outcome: &str) {
    if let Some(counter) = GROUP_OPERATIONS_TOTAL.get() {
        counter.with_label_values(&[operation, outcome]).inc();
    }
}

pub fn record_audit_event(status: &str) {
    if let Some(counter) = AUDIT_EVENTS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}
