use super::{GroupPool, Page, PoolError};
use crate::models::{GroupSummary, UserRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Response, StatusCode, Url};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

/// Group pool behind the directory REST API
/// (`{endpoint}/pools/{pool_id}/...`).
pub struct HttpGroupPool {
    client: Client,
    base: Url,
    pool_id: String,
}

#[derive(Debug, Deserialize)]
struct GroupRecord {
    group_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    creation_date: Option<DateTime<Utc>>,
    #[serde(default)]
    last_modified_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct GroupsPage {
    groups: Vec<GroupRecord>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsersPage {
    users: Vec<UserRecord>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct GroupBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    group_name: Option<&'a str>,
    description: &'a str,
}

impl HttpGroupPool {
    pub fn new(client: Client, endpoint: &str, pool_id: impl Into<String>) -> Result<Self, PoolError> {
        let base = Url::parse(endpoint)
            .map_err(|e| PoolError::Connection(format!("Invalid directory endpoint: {}", e)))?;
        if base.cannot_be_a_base() {
            return Err(PoolError::Connection(format!(
                "Directory endpoint cannot be a base URL: {}",
                endpoint
            )));
        }

        Ok(Self {
            client,
            base,
            pool_id: pool_id.into(),
        })
    }

    fn url(&self, segments: &[&str], next_token: Option<&str>) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty()
                .push("pools")
                .push(&self.pool_id)
                .extend(segments);
        }
        if let Some(token) = next_token {
            url.query_pairs_mut().append_pair("next_token", token);
        }
        url
    }

    fn summary(&self, record: GroupRecord) -> GroupSummary {
        GroupSummary {
            name: record.group_name,
            description: record.description.unwrap_or_default(),
            pool_id: self.pool_id.clone(),
            created_at: record.creation_date,
            last_modified_at: record.last_modified_date,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<Response, PoolError> {
        request
            .headers(service_core::observability::trace_headers())
            .send()
            .await
            .map_err(|e| PoolError::Connection(format!("Failed to reach directory: {}", e)))
    }

    async fn fetch_groups(&self, url: Url, missing: PoolError) -> Result<Page<GroupSummary>, PoolError> {
        let response = self.send(self.client.get(url)).await?;
        let response = expect_success(response, |status| match status {
            StatusCode::NOT_FOUND => Some(missing),
            _ => None,
        })
        .await?;

        let page: GroupsPage = response
            .json()
            .await
            .map_err(|e| PoolError::InvalidResponse(format!("Failed to parse group page: {}", e)))?;

        Ok(Page {
            items: page.groups.into_iter().map(|g| self.summary(g)).collect(),
            next_token: page.next_token,
        })
    }
}

/// Maps non-2xx responses to `PoolError`, letting the caller claim specific
/// statuses first.
async fn expect_success<F>(response: Response, classify: F) -> Result<Response, PoolError>
where
    F: FnOnce(StatusCode) -> Option<PoolError>,
{
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if let Some(err) = classify(status) {
        return Err(err);
    }

    let message = response.text().await.unwrap_or_default();
    Err(PoolError::Rejected {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl GroupPool for HttpGroupPool {
    fn pool_id(&self) -> &str {
        &self.pool_id
    }

    async fn list_groups(
        &self,
        next_token: Option<String>,
    ) -> Result<Page<GroupSummary>, PoolError> {
        let url = self.url(&["groups"], next_token.as_deref());
        self.fetch_groups(url, PoolError::InvalidResponse("group listing not found".to_string()))
            .await
    }

    async fn create_group(&self, name: &str, description: &str) -> Result<(), PoolError> {
        let body = GroupBody {
            group_name: Some(name),
            description,
        };
        let response = self
            .send(self.client.post(self.url(&["groups"], None)).json(&body))
            .await?;
        expect_success(response, |status| match status {
            StatusCode::CONFLICT => Some(PoolError::GroupExists(name.to_string())),
            _ => None,
        })
        .await?;
        Ok(())
    }

    async fn update_group(&self, name: &str, description: &str) -> Result<(), PoolError> {
        let body = GroupBody {
            group_name: None,
            description,
        };
        let response = self
            .send(self.client.put(self.url(&["groups", name], None)).json(&body))
            .await?;
        expect_success(response, |status| match status {
            StatusCode::NOT_FOUND => Some(PoolError::GroupNotFound(name.to_string())),
            _ => None,
        })
        .await?;
        Ok(())
    }

    async fn delete_group(&self, name: &str) -> Result<(), PoolError> {
        let response = self
            .send(self.client.delete(self.url(&["groups", name], None)))
            .await?;
        expect_success(response, |status| match status {
            StatusCode::NOT_FOUND => Some(PoolError::GroupNotFound(name.to_string())),
            StatusCode::CONFLICT => Some(PoolError::GroupNotEmpty(name.to_string())),
            _ => None,
        })
        .await?;
        Ok(())
    }

    async fn get_group(&self, name: &str) -> Result<GroupSummary, PoolError> {
        let response = self
            .send(self.client.get(self.url(&["groups", name], None)))
            .await?;
        let response = expect_success(response, |status| match status {
            StatusCode::NOT_FOUND => Some(PoolError::GroupNotFound(name.to_string())),
            _ => None,
        })
        .await?;

        let record: GroupRecord = response
            .json()
            .await
            .map_err(|e| PoolError::InvalidResponse(format!("Failed to parse group: {}", e)))?;
        Ok(self.summary(record))
    }

    async fn list_users_in_group(
        &self,
        name: &str,
        next_token: Option<String>,
    ) -> Result<Page<UserRecord>, PoolError> {
        let url = self.url(&["groups", name, "users"], next_token.as_deref());
        let response = self.send(self.client.get(url)).await?;
        let response = expect_success(response, |status| match status {
            StatusCode::NOT_FOUND => Some(PoolError::GroupNotFound(name.to_string())),
            _ => None,
        })
        .await?;

        let page: UsersPage = response
            .json()
            .await
            .map_err(|e| PoolError::InvalidResponse(format!("Failed to parse user page: {}", e)))?;
        Ok(Page {
            items: page.users,
            next_token: page.next_token,
        })
    }

    async fn list_groups_for_user(
        &self,
        user_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<GroupSummary>, PoolError> {
        let url = self.url(&["users", user_id, "groups"], next_token.as_deref());
        self.fetch_groups(url, PoolError::UserNotFound(user_id.to_string()))
            .await
    }

    async fn add_user_to_group(&self, user_id: &str, name: &str) -> Result<(), PoolError> {
        let url = self.url(&["groups", name, "users", user_id], None);
        let response = self.send(self.client.put(url)).await?;
        expect_success(response, |status| match status {
            StatusCode::NOT_FOUND => Some(PoolError::GroupNotFound(name.to_string())),
            _ => None,
        })
        .await?;
        Ok(())
    }

    async fn remove_user_from_group(&self, user_id: &str, name: &str) -> Result<(), PoolError> {
        let url = self.url(&["groups", name, "users", user_id], None);
        let response = self.send(self.client.delete(url)).await?;
        expect_success(response, |status| match status {
            StatusCode::NOT_FOUND => Some(PoolError::GroupNotFound(name.to_string())),
            _ => None,
        })
        .await?;
        Ok(())
    }
}

/// A pool call observed by [`MockGroupPool`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolCall {
    ListGroups,
    CreateGroup(String),
    UpdateGroup(String),
    DeleteGroup(String),
    GetGroup(String),
    ListUsersInGroup(String),
    ListGroupsForUser(String),
    AddUserToGroup { user_id: String, group: String },
    RemoveUserFromGroup { user_id: String, group: String },
}

#[derive(Default)]
struct MockPoolState {
    groups: BTreeMap<String, GroupSummary>,
    users: BTreeMap<String, UserRecord>,
    /// group name -> member user ids
    members: BTreeMap<String, BTreeSet<String>>,
    failing_grants: HashSet<String>,
    failing_revokes: HashSet<String>,
    calls: Vec<PoolCall>,
}

/// In-memory group pool for tests and local development.
pub struct MockGroupPool {
    pool_id: String,
    page_size: usize,
    unavailable: AtomicBool,
    call_count: AtomicU64,
    state: Mutex<MockPoolState>,
}

impl MockGroupPool {
    pub fn new(pool_id: impl Into<String>) -> Self {
        Self {
            pool_id: pool_id.into(),
            page_size: 60,
            unavailable: AtomicBool::new(false),
            call_count: AtomicU64::new(0),
            state: Mutex::new(MockPoolState::default()),
        }
    }

    /// Page size used by every listing, to exercise pagination.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn with_group(self, name: &str, description: &str) -> Self {
        {
            let mut state = self.lock();
            let now = Utc::now();
            state.groups.insert(
                name.to_string(),
                GroupSummary {
                    name: name.to_string(),
                    description: description.to_string(),
                    pool_id: self.pool_id.clone(),
                    created_at: Some(now),
                    last_modified_at: Some(now),
                },
            );
            state.members.entry(name.to_string()).or_default();
        }
        self
    }

    pub fn with_user(self, record: UserRecord) -> Self {
        self.lock().users.insert(record.username.clone(), record);
        self
    }

    pub fn with_member(self, group: &str, user_id: &str) -> Self {
        self.lock()
            .members
            .entry(group.to_string())
            .or_default()
            .insert(user_id.to_string());
        self
    }

    /// Every subsequent call fails with a connection error.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn fail_grants_to(&self, group: &str) {
        self.lock().failing_grants.insert(group.to_string());
    }

    pub fn fail_revokes_from(&self, group: &str) {
        self.lock().failing_revokes.insert(group.to_string());
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<PoolCall> {
        self.lock().calls.clone()
    }

    pub fn groups_of(&self, user_id: &str) -> BTreeSet<String> {
        self.lock()
            .members
            .iter()
            .filter(|(_, users)| users.contains(user_id))
            .map(|(group, _)| group.clone())
            .collect()
    }

    pub fn has_group(&self, name: &str) -> bool {
        self.lock().groups.contains_key(name)
    }

    pub fn description_of(&self, name: &str) -> Option<String> {
        self.lock().groups.get(name).map(|g| g.description.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockPoolState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn enter(&self, call: PoolCall) -> Result<std::sync::MutexGuard<'_, MockPoolState>, PoolError> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        let mut state = self.lock();
        state.calls.push(call);
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(PoolError::Connection("mock pool unavailable".to_string()));
        }
        Ok(state)
    }

    fn paginate<T: Clone>(&self, items: Vec<T>, next_token: Option<String>) -> Result<Page<T>, PoolError> {
        let start = match next_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| PoolError::Rejected {
                    status: 400,
                    message: format!("invalid pagination token {}", token),
                })?,
            None => 0,
        };
        let end = (start + self.page_size).min(items.len());
        let next_token = (end < items.len()).then(|| end.to_string());

        Ok(Page {
            items: items.get(start..end).map(<[T]>::to_vec).unwrap_or_default(),
            next_token,
        })
    }
}

#[async_trait]
impl GroupPool for MockGroupPool {
    fn pool_id(&self) -> &str {
        &self.pool_id
    }

    async fn list_groups(
        &self,
        next_token: Option<String>,
    ) -> Result<Page<GroupSummary>, PoolError> {
        let groups: Vec<GroupSummary> = {
            let state = self.enter(PoolCall::ListGroups)?;
            state.groups.values().cloned().collect()
        };
        self.paginate(groups, next_token)
    }

    async fn create_group(&self, name: &str, description: &str) -> Result<(), PoolError> {
        let mut state = self.enter(PoolCall::CreateGroup(name.to_string()))?;
        if state.groups.contains_key(name) {
            return Err(PoolError::GroupExists(name.to_string()));
        }
        let now = Utc::now();
        state.groups.insert(
            name.to_string(),
            GroupSummary {
                name: name.to_string(),
                description: description.to_string(),
                pool_id: self.pool_id.clone(),
                created_at: Some(now),
                last_modified_at: Some(now),
            },
        );
        state.members.insert(name.to_string(), BTreeSet::new());
        Ok(())
    }

    async fn update_group(&self, name: &str, description: &str) -> Result<(), PoolError> {
        let mut state = self.enter(PoolCall::UpdateGroup(name.to_string()))?;
        let group = state
            .groups
            .get_mut(name)
            .ok_or_else(|| PoolError::GroupNotFound(name.to_string()))?;
        group.description = description.to_string();
        group.last_modified_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_group(&self, name: &str) -> Result<(), PoolError> {
        let mut state = self.enter(PoolCall::DeleteGroup(name.to_string()))?;
        if !state.groups.contains_key(name) {
            return Err(PoolError::GroupNotFound(name.to_string()));
        }
        if state.members.get(name).is_some_and(|m| !m.is_empty()) {
            return Err(PoolError::GroupNotEmpty(name.to_string()));
        }
        state.groups.remove(name);
        state.members.remove(name);
        Ok(())
    }

    async fn get_group(&self, name: &str) -> Result<GroupSummary, PoolError> {
        let state = self.enter(PoolCall::GetGroup(name.to_string()))?;
        state
            .groups
            .get(name)
            .cloned()
            .ok_or_else(|| PoolError::GroupNotFound(name.to_string()))
    }

    async fn list_users_in_group(
        &self,
        name: &str,
        next_token: Option<String>,
    ) -> Result<Page<UserRecord>, PoolError> {
        let users: Vec<UserRecord> = {
            let state = self.enter(PoolCall::ListUsersInGroup(name.to_string()))?;
            let members = state
                .members
                .get(name)
                .ok_or_else(|| PoolError::GroupNotFound(name.to_string()))?;
            members
                .iter()
                .filter_map(|user_id| state.users.get(user_id).cloned())
                .collect()
        };
        self.paginate(users, next_token)
    }

    async fn list_groups_for_user(
        &self,
        user_id: &str,
        next_token: Option<String>,
    ) -> Result<Page<GroupSummary>, PoolError> {
        let groups: Vec<GroupSummary> = {
            let state = self.enter(PoolCall::ListGroupsForUser(user_id.to_string()))?;
            state
                .members
                .iter()
                .filter(|(_, users)| users.contains(user_id))
                .filter_map(|(group, _)| state.groups.get(group).cloned())
                .collect()
        };
        self.paginate(groups, next_token)
    }

    async fn add_user_to_group(&self, user_id: &str, name: &str) -> Result<(), PoolError> {
        let mut state = self.enter(PoolCall::AddUserToGroup {
            user_id: user_id.to_string(),
            group: name.to_string(),
        })?;
        if state.failing_grants.contains(name) {
            return Err(PoolError::Rejected {
                status: 500,
                message: format!("grant to {} failed", name),
            });
        }
        let members = state
            .members
            .get_mut(name)
            .ok_or_else(|| PoolError::GroupNotFound(name.to_string()))?;
        members.insert(user_id.to_string());
        Ok(())
    }

    async fn remove_user_from_group(&self, user_id: &str, name: &str) -> Result<(), PoolError> {
        let mut state = self.enter(PoolCall::RemoveUserFromGroup {
            user_id: user_id.to_string(),
            group: name.to_string(),
        })?;
        if state.failing_revokes.contains(name) {
            return Err(PoolError::Rejected {
                status: 500,
                message: format!("revoke from {} failed", name),
            });
        }
        let members = state
            .members
            .get_mut(name)
            .ok_or_else(|| PoolError::GroupNotFound(name.to_string()))?;
        members.remove(user_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_escape_path_segments() {
        let pool = HttpGroupPool::new(Client::new(), "http://directory.local/api/", "pool-1").unwrap();
        let url = pool.url(&["groups", "data science/ops"], Some("abc"));
        assert_eq!(
            url.as_str(),
            "http://directory.local/api/pools/pool-1/groups/data%20science%2Fops?next_token=abc"
        );
    }

    #[test]
    fn rejects_non_base_endpoint() {
        assert!(HttpGroupPool::new(Client::new(), "mailto:ops@example.com", "pool-1").is_err());
    }

    #[tokio::test]
    async fn mock_paginates_listings() {
        let pool = MockGroupPool::new("pool-1")
            .with_page_size(2)
            .with_group("a", "")
            .with_group("b", "")
            .with_group("c", "");

        let first = pool.list_groups(None).await.unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.next_token.as_deref(), Some("2"));

        let second = pool.list_groups(first.next_token).await.unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.next_token, None);
    }

    #[tokio::test]
    async fn mock_refuses_to_delete_non_empty_group() {
        let pool = MockGroupPool::new("pool-1")
            .with_group("a", "")
            .with_member("a", "alice");

        let err = pool.delete_group("a").await.unwrap_err();
        assert!(matches!(err, PoolError::GroupNotEmpty(_)));
        assert!(pool.has_group("a"));
    }
}
