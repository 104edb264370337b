use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const EMAIL_ATTRIBUTE: &str = "email";
pub const DISPLAY_NAME_ATTRIBUTE: &str = "custom:display_name";
pub const ROLE_ATTRIBUTE: &str = "custom:role";
/// Multi-valued attribute carrying federated memberships, e.g. `[g1,g2]`.
pub const GROUPS_ATTRIBUTE: &str = "custom:groups";

/// Group metadata as returned by list operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub name: String,
    pub description: String,
    pub pool_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified_at: Option<DateTime<Utc>>,
}

/// Group metadata plus its projected members.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub name: String,
    pub description: String,
    pub pool_id: String,
    pub created_at: Option<DateTime<Utc>>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub user_list: Vec<Member>,
}

impl Group {
    pub fn new(summary: GroupSummary, user_list: Vec<Member>) -> Self {
        Self {
            name: summary.name,
            description: summary.description,
            pool_id: summary.pool_id,
            created_at: summary.created_at,
            last_modified_at: summary.last_modified_at,
            user_list,
        }
    }
}

/// Account state reported by the directory backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserStatus {
    Unconfirmed,
    Confirmed,
    Archived,
    Compromised,
    Unknown,
    ResetRequired,
    ForceChangePassword,
    ExternalProvider,
    #[serde(untagged)]
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Raw user record with its attribute bag, as the backend returns it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub enabled: bool,
    pub status: UserStatus,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
}

impl UserRecord {
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == name)
            .map(|attr| attr.value.as_str())
    }
}

/// Membership-facing projection of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub enabled: bool,
    pub status: UserStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl From<UserRecord> for Member {
    fn from(record: UserRecord) -> Self {
        let mut member = Member {
            user_id: record.username,
            enabled: record.enabled,
            status: record.status,
            email: None,
            display_name: None,
            role: None,
        };

        for attr in record.attributes {
            match attr.name.as_str() {
                EMAIL_ATTRIBUTE => member.email = Some(attr.value),
                DISPLAY_NAME_ATTRIBUTE => member.display_name = Some(attr.value),
                ROLE_ATTRIBUTE => member.role = Some(attr.value),
                _ => {}
            }
        }

        member
    }
}

/// Set of group names a user belongs to, or should belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MembershipSet(BTreeSet<String>);

impl MembershipSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, group: &str) -> bool {
        self.0.contains(group)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    /// Groups in `self` that are absent from `other`.
    pub fn difference(&self, other: &MembershipSet) -> Vec<String> {
        self.0.difference(&other.0).cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for MembershipSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for MembershipSet {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Acknowledgment returned by mutating operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub code: u16,
    pub message: String,
}

impl Ack {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            code: 200,
            message: message.into(),
        }
    }
}
