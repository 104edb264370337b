use std::sync::Arc;

use super::providers::{GroupPool, IdentitySource};
use crate::config::DirectoryMode;
use crate::models::{GroupSummary, UserRecord, GROUPS_ATTRIBUTE};

pub const FEDERATED_GROUP_DESCRIPTION: &str = "Imported from external directory";

/// The active directory capability set. Managed pools support full CRUD;
/// federated sources only expose memberships read from user attributes.
#[derive(Clone)]
pub enum DirectoryBackend {
    Managed(Arc<dyn GroupPool>),
    Federated(Arc<dyn IdentitySource>),
}

impl DirectoryBackend {
    pub fn mode(&self) -> DirectoryMode {
        match self {
            DirectoryBackend::Managed(_) => DirectoryMode::Managed,
            DirectoryBackend::Federated(_) => DirectoryMode::Federated,
        }
    }
}

/// Holds the backend chosen at startup; it never changes afterwards.
#[derive(Clone)]
pub struct DirectoryModeResolver {
    backend: DirectoryBackend,
}

impl DirectoryModeResolver {
    pub fn managed(pool: Arc<dyn GroupPool>) -> Self {
        Self {
            backend: DirectoryBackend::Managed(pool),
        }
    }

    pub fn federated(identity: Arc<dyn IdentitySource>) -> Self {
        Self {
            backend: DirectoryBackend::Federated(identity),
        }
    }

    pub fn active_backend(&self) -> &DirectoryBackend {
        &self.backend
    }

    pub fn mode(&self) -> DirectoryMode {
        self.backend.mode()
    }
}

/// Splits a `[g1,g2,g3]` attribute value into group names, in attribute
/// order. Surrounding whitespace is trimmed and empty entries dropped.
pub fn parse_group_attribute(value: &str) -> Vec<String> {
    let value = value.trim();
    let value = value.strip_prefix('[').unwrap_or(value);
    let value = value.strip_suffix(']').unwrap_or(value);

    value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Group summaries for a federated user, in reverse attribute order. A user
/// without the groups attribute belongs to no groups.
pub fn federated_summaries(record: &UserRecord, pool_id: &str) -> Vec<GroupSummary> {
    let Some(value) = record.attribute(GROUPS_ATTRIBUTE) else {
        return Vec::new();
    };

    parse_group_attribute(value)
        .into_iter()
        .rev()
        .map(|name| GroupSummary {
            name,
            description: FEDERATED_GROUP_DESCRIPTION.to_string(),
            pool_id: pool_id.to_string(),
            created_at: None,
            last_modified_at: None,
        })
        .collect()
}
