use super::{AuditPayload, EventSink, SinkError};
use async_trait::async_trait;
use reqwest::Client;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Posts audit events to the logging service. The service acknowledges
/// receipt (any 2xx, typically 202) before processing the event.
pub struct HttpEventSink {
    client: Client,
    endpoint: String,
}

impl HttpEventSink {
    pub fn new(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl EventSink for HttpEventSink {
    async fn dispatch(&self, payload: &AuditPayload) -> Result<(), SinkError> {
        let response = self
            .client
            .post(&self.endpoint)
            .headers(service_core::observability::trace_headers())
            .json(payload)
            .send()
            .await
            .map_err(|e| SinkError::Connection(format!("Failed to reach logging service: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        Ok(())
    }
}

/// Event sink that records payloads in memory.
pub struct MockEventSink {
    failing: AtomicBool,
    dispatch_count: AtomicU64,
    messages: Mutex<Vec<String>>,
}

impl MockEventSink {
    pub fn new() -> Self {
        Self {
            failing: AtomicBool::new(false),
            dispatch_count: AtomicU64::new(0),
            messages: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let sink = Self::new();
        sink.failing.store(true, Ordering::SeqCst);
        sink
    }

    /// Attempts, accepted or not.
    pub fn dispatch_count(&self) -> u64 {
        self.dispatch_count.load(Ordering::SeqCst)
    }

    /// Messages of accepted dispatches.
    pub fn messages(&self) -> Vec<String> {
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl Default for MockEventSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventSink for MockEventSink {
    async fn dispatch(&self, payload: &AuditPayload) -> Result<(), SinkError> {
        self.dispatch_count.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(SinkError::Connection("mock sink unavailable".to_string()));
        }

        tracing::info!(event = %payload.message, "[MOCK] Audit event would be dispatched");
        self.messages
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(payload.message.clone());
        Ok(())
    }
}
