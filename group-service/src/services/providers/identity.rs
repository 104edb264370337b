use super::{IdentityError, IdentitySource};
use crate::models::UserRecord;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// Reads user records (and their attribute bags) from the external identity
/// directory at `{endpoint}/pools/{pool_id}/users/{user_id}`.
pub struct HttpIdentitySource {
    client: Client,
    base: Url,
    pool_id: String,
}

impl HttpIdentitySource {
    pub fn new(
        client: Client,
        endpoint: &str,
        pool_id: impl Into<String>,
    ) -> Result<Self, IdentityError> {
        let base = Url::parse(endpoint)
            .map_err(|e| IdentityError::Connection(format!("Invalid identity endpoint: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(IdentityError::Connection(format!(
                "Identity endpoint cannot be a base URL: {}",
                endpoint
            )));
        }

        Ok(Self {
            client,
            base,
            pool_id: pool_id.into(),
        })
    }

    fn user_url(&self, user_id: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .extend(["pools", self.pool_id.as_str(), "users", user_id]);
        }
        url
    }
}

#[async_trait]
impl IdentitySource for HttpIdentitySource {
    fn pool_id(&self) -> &str {
        &self.pool_id
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, IdentityError> {
        let response = self
            .client
            .get(self.user_url(user_id))
            .headers(service_core::observability::trace_headers())
            .send()
            .await
            .map_err(|e| {
                IdentityError::Connection(format!("Failed to reach identity directory: {}", e))
            })?;

        match response.status() {
            status if status.is_success() => response.json().await.map_err(|e| {
                IdentityError::InvalidResponse(format!("Failed to parse user record: {}", e))
            }),
            StatusCode::NOT_FOUND => Err(IdentityError::UserNotFound(user_id.to_string())),
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(IdentityError::InvalidResponse(format!(
                    "Identity directory returned {}: {}",
                    status, body
                )))
            }
        }
    }
}

/// Identity source backed by a fixed set of records.
pub struct MockIdentitySource {
    pool_id: String,
    users: Mutex<HashMap<String, UserRecord>>,
    lookup_count: AtomicU64,
}

impl MockIdentitySource {
    pub fn new(pool_id: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            users: Mutex::new(HashMap::new()),
            lookup_count: AtomicU64::new(0),
        }
    }

    pub fn with_user(self, record: UserRecord) -> Self {
        self.users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(record.username.clone(), record);
        self
    }

    pub fn lookup_count(&self) -> u64 {
        self.lookup_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdentitySource for MockIdentitySource {
    fn pool_id(&self) -> &str {
        &self.pool_id
    }

    async fn get_user(&self, user_id: &str) -> Result<UserRecord, IdentityError> {
        self.lookup_count.fetch_add(1, Ordering::SeqCst);
        self.users
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(user_id)
            .cloned()
            .ok_or_else(|| IdentityError::UserNotFound(user_id.to_string()))
    }
}
