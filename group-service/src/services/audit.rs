//! Audit trail for administrative actions.
//!
//! Whether events are emitted is decided per call by the `audit_logging`
//! flag in the settings store; enabled events are handed to the logging
//! service as a single-line message. Audit outcomes are observed and logged
//! but never change the result of the operation that produced them.

use std::sync::Arc;

use thiserror::Error;

use super::metrics::record_audit_event;
use super::providers::{AuditPayload, EventSink, SettingsStore};
use crate::models::{AuditEvent, AuditResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStatus {
    /// Accepted by the event sink.
    Dispatched,
    /// Audit logging is disabled in the settings store.
    Skipped,
}

impl AuditStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStatus::Dispatched => "dispatched",
            AuditStatus::Skipped => "skipped",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuditError {
    #[error("No valid audit logging app configuration data available.")]
    ConfigUnavailable,

    #[error("Audit logging trigger failed.")]
    DispatchFailed,
}

impl AuditError {
    pub fn status_code(&self) -> u16 {
        match self {
            AuditError::ConfigUnavailable => 503,
            AuditError::DispatchFailed => 502,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditError::ConfigUnavailable => "config_unavailable",
            AuditError::DispatchFailed => "dispatch_failed",
        }
    }
}

#[derive(Clone)]
pub struct AuditGate {
    settings: Arc<dyn SettingsStore>,
    sink: Arc<dyn EventSink>,
    service_name: String,
}

impl AuditGate {
    pub fn new(
        settings: Arc<dyn SettingsStore>,
        sink: Arc<dyn EventSink>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            settings,
            sink,
            service_name: service_name.into(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// Builds an event attributed to this service.
    pub fn event(
        &self,
        user_id: impl Into<String>,
        operation: impl Into<String>,
        result: AuditResult,
    ) -> AuditEvent {
        AuditEvent::new(self.service_name.clone(), user_id, operation, result)
    }

    /// Emits `event` if audit logging is enabled. Returns once the sink has
    /// accepted the event, not once it has been processed.
    pub async fn log_event(&self, event: &AuditEvent) -> Result<AuditStatus, AuditError> {
        let enabled = match self.settings.audit_logging_enabled().await {
            Ok(Some(enabled)) => enabled,
            Ok(None) => {
                tracing::warn!("Audit logging setting is not configured");
                return Err(AuditError::ConfigUnavailable);
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to read audit logging setting");
                return Err(AuditError::ConfigUnavailable);
            }
        };

        if !enabled {
            return Ok(AuditStatus::Skipped);
        }

        let payload = AuditPayload {
            message: event.message(),
        };

        self.sink.dispatch(&payload).await.map_err(|e| {
            tracing::error!(
                error = %e,
                event_id = %event.event_id,
                "Failed to trigger audit logging service"
            );
            AuditError::DispatchFailed
        })?;

        Ok(AuditStatus::Dispatched)
    }

    /// Logs `event` in the background.
    pub fn record(&self, event: AuditEvent) {
        let gate = self.clone();
        tokio::spawn(async move {
            match gate.log_event(&event).await {
                Ok(status) => {
                    record_audit_event(status.as_str());
                    tracing::debug!(
                        event_id = %event.event_id,
                        operation = %event.operation,
                        status = status.as_str(),
                        "Audit event handled"
                    );
                }
                Err(e) => {
                    record_audit_event(e.as_str());
                    tracing::warn!(
                        error = %e,
                        event_id = %event.event_id,
                        operation = %event.operation,
                        "Audit event was not recorded"
                    );
                }
            }
        });
    }
}
