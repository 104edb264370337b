use serde::{Deserialize, Serialize};

pub const ADMIN_ROLE: &str = "Admin";

/// Outcome of upstream authentication for a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    Authorized,
    Invalid,
    #[serde(untagged)]
    Other(String),
}

impl From<&str> for AuthStatus {
    fn from(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "authorized" => AuthStatus::Authorized,
            "invalid" => AuthStatus::Invalid,
            _ => AuthStatus::Other(value.to_string()),
        }
    }
}

impl std::fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthStatus::Authorized => write!(f, "authorized"),
            AuthStatus::Invalid => write!(f, "invalid"),
            AuthStatus::Other(status) => write!(f, "{}", status),
        }
    }
}

/// Authorization claim produced by the upstream authorizer. Handed to every
/// gated operation and never modified by this service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub auth_status: AuthStatus,
    pub auth_status_reason: String,
    pub user_id: String,
    pub role: String,
    /// Id of the request that carried the ticket; audit events reuse it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl Ticket {
    pub fn new(
        auth_status: AuthStatus,
        auth_status_reason: impl Into<String>,
        user_id: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            auth_status,
            auth_status_reason: auth_status_reason.into(),
            user_id: user_id.into(),
            role: role.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn is_authorized(&self) -> bool {
        self.auth_status == AuthStatus::Authorized
    }

    pub fn is_admin(&self) -> bool {
        self.role == ADMIN_ROLE
    }
}
