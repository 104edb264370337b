//! Collaborators the directory core talks to: the managed group pool, the
//! federated identity source, the settings store and the audit event sink.

pub mod identity;
pub mod pool;
pub mod settings;
pub mod sink;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use thiserror::Error;

use crate::models::{GroupSummary, UserRecord};

pub use identity::{HttpIdentitySource, MockIdentitySource};
pub use pool::{HttpGroupPool, MockGroupPool, PoolCall};
pub use settings::{MockSetting, MockSettingsStore, MongoSettingsStore};
pub use sink::{HttpEventSink, MockEventSink};

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("Group already exists: {0}")]
    GroupExists(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Group is not empty: {0}")]
    GroupNotEmpty(String),

    #[error("Directory rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings lookup failed: {0}")]
    Lookup(String),

    #[error("Malformed settings record: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Event rejected ({status}): {message}")]
    Rejected { status: u16, message: String },
}

/// One page of a backend listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn last(items: Vec<T>) -> Self {
        Self {
            items,
            next_token: None,
        }
    }
}

/// Body sent to the event sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditPayload {
    pub message: String,
}

/// Natively managed group pool.
#[async_trait]
pub trait GroupPool: Send + Sync {
    fn pool_id(&self) -> &str;
    async fn list_groups(&self, next_token: Option<String>)
        -> Result<Page<GroupSummary>, PoolError>;
    async fn create_group(&self, name: &str, description: &str) -> Result<(), PoolError>;
    async fn update_group(&self, name: &str, description: &str) -> Result<(), PoolError>;
    /// Only empty groups can be deleted; the pool enforces it.
    async fn delete_group(&self, name: &str) -> Result<(), PoolError>;
    async fn get_group(&self, name: &str) -> Result<GroupSummary, PoolError>;
    async fn list_users_in_group(
        &self,
        name: &str,
        next_token: Option<String>,
    ) -> Result<Page<UserRecord>, PoolError>;
    async fn list_groups_for_user(
        &self,
        user_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<GroupSummary>, PoolError>;
    async fn add_user_to_group(&self, user_id: &str, name: &str) -> Result<(), PoolError>;
    async fn remove_user_from_group(&self, user_id: &str, name: &str) -> Result<(), PoolError>;
}

/// External identity records, read-only.
#[async_trait]
pub trait IdentitySource: Send + Sync {
    fn pool_id(&self) -> &str;
    async fn get_user(&self, user_id: &str) -> Result<UserRecord, IdentityError>;
}

/// Application settings; absence of the flag is distinct from `false`.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    async fn audit_logging_enabled(&self) -> Result<Option<bool>, SettingsError>;
}

/// Fire-and-forget event dispatch: returns once the sink accepted the event.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn dispatch(&self, payload: &AuditPayload) -> Result<(), SinkError>;
}

/// Follows `next_token` until the backend reports the last page.
pub async fn collect_pages<T, F, Fut>(mut fetch: F) -> Result<Vec<T>, PoolError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, PoolError>>,
{
    let mut items = Vec::new();
    let mut next_token = None;

    loop {
        let page = fetch(next_token.take()).await?;
        items.extend(page.items);
        match page.next_token {
            Some(token) if !token.is_empty() => next_token = Some(token),
            _ => return Ok(items),
        }
    }
}
