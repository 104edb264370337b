use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditResult {
    Success,
    Fail,
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditResult::Success => write!(f, "success"),
            AuditResult::Fail => write!(f, "fail"),
        }
    }
}

/// A single access event. Built per action, handed to the audit gate and
/// dropped; nothing here is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: String,
    pub service_name: String,
    pub user_id: String,
    pub operation: String,
    pub result: AuditResult,
}

impl AuditEvent {
    pub fn new(
        service_name: impl Into<String>,
        user_id: impl Into<String>,
        operation: impl Into<String>,
        result: AuditResult,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4().to_string(),
            service_name: service_name.into(),
            user_id: user_id.into(),
            operation: operation.into(),
            result,
        }
    }

    /// Replaces the generated id, e.g. with the request id.
    pub fn with_event_id(mut self, event_id: impl Into<String>) -> Self {
        self.event_id = event_id.into();
        self
    }

    /// `<service>:<event_id> <user_id> <operation> [<result>]`
    pub fn message(&self) -> String {
        format!(
            "{}:{} {} {} [{}]",
            self.service_name, self.event_id, self.user_id, self.operation, self.result
        )
    }
}
