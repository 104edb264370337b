//! Group administration against the active directory backend.
//!
//! Each operation resolves the backend once on entry. Managed-only operations
//! fail with `UnsupportedInFederatedMode` before the ticket is inspected;
//! everything else is admitted through [`require_admin`], except federated
//! group listing for the caller, which is open to any ticket.

use std::sync::Arc;

use super::audit::AuditGate;
use super::authorization::require_admin;
use super::backend::{federated_summaries, DirectoryBackend, DirectoryModeResolver};
use super::error::DirectoryError;
use super::metrics::record_group_operation;
use super::providers::{collect_pages, GroupPool, IdentitySource, PoolError};
use crate::config::DirectoryMode;
use crate::models::{Ack, AuditResult, Group, GroupSummary, Member, Ticket};

/// Returns the managed pool, or `UnsupportedInFederatedMode`.
pub(crate) fn managed_pool<'a>(
    resolver: &'a DirectoryModeResolver,
    operation: &'static str,
) -> Result<&'a Arc<dyn GroupPool>, DirectoryError> {
    match resolver.active_backend() {
        DirectoryBackend::Managed(pool) => Ok(pool),
        DirectoryBackend::Federated(_) => {
            record_group_operation(operation, "unsupported");
            tracing::debug!(operation = operation, "Operation not available for federated login");
            Err(DirectoryError::UnsupportedInFederatedMode)
        }
    }
}

pub(crate) fn admit(ticket: &Ticket, operation: &'static str) -> Result<(), DirectoryError> {
    require_admin(ticket).inspect_err(|_| record_group_operation(operation, "rejected"))
}

/// Counts the outcome and hands an audit event to the gate in the background.
/// The event id is the ticket's request id when there is one.
pub(crate) fn finish<T>(
    audit: &AuditGate,
    ticket: &Ticket,
    operation: &'static str,
    description: String,
    result: &Result<T, DirectoryError>,
) {
    let outcome = if result.is_ok() {
        AuditResult::Success
    } else {
        AuditResult::Fail
    };
    record_group_operation(operation, &outcome.to_string());
    let event = audit.event(ticket.user_id.clone(), description, outcome);
    let event = match &ticket.request_id {
        Some(request_id) => event.with_event_id(request_id.clone()),
        None => event,
    };
    audit.record(event);
}

#[derive(Clone)]
pub struct GroupDirectory {
    resolver: DirectoryModeResolver,
    audit: AuditGate,
}

impl GroupDirectory {
    pub fn new(resolver: DirectoryModeResolver, audit: AuditGate) -> Self {
        Self { resolver, audit }
    }

    pub fn mode(&self) -> DirectoryMode {
        self.resolver.mode()
    }

    /// Managed: every group in the pool. Federated: the caller's own groups
    /// from the identity record, without an admin check.
    pub async fn list_groups(&self, ticket: &Ticket) -> Result<Vec<GroupSummary>, DirectoryError> {
        const OPERATION: &str = "list_groups";
        const FAILURE: &str = "Failed to retrieve the group list.";

        let result = match self.resolver.active_backend() {
            DirectoryBackend::Managed(pool) => {
                admit(ticket, OPERATION)?;
                collect_pages(|token| pool.list_groups(token))
                    .await
                    .map_err(|e| DirectoryError::backend(OPERATION, pool.pool_id(), FAILURE, &e))
            }
            DirectoryBackend::Federated(identity) => {
                federated_groups(identity.as_ref(), &ticket.user_id, OPERATION, FAILURE).await
            }
        };

        finish(&self.audit, ticket, OPERATION, "list groups".to_string(), &result);
        result
    }

    pub async fn create_group(
        &self,
        name: &str,
        description: &str,
        ticket: &Ticket,
    ) -> Result<Ack, DirectoryError> {
        const OPERATION: &str = "create_group";
        let pool = managed_pool(&self.resolver, OPERATION)?;
        admit(ticket, OPERATION)?;

        let result = match pool.create_group(name, description).await {
            Ok(()) => {
                tracing::info!(group = %name, "Group created");
                Ok(Ack::ok(format!("Group {} created.", name)))
            }
            Err(PoolError::GroupExists(_)) => Err(DirectoryError::AlreadyExists {
                group: name.to_string(),
            }),
            Err(e) => Err(DirectoryError::backend(
                OPERATION,
                name,
                "Failed to create the group. Ask the directory admin to check group-service logs for details.",
                &e,
            )),
        };

        finish(&self.audit, ticket, OPERATION, format!("create group {}", name), &result);
        result
    }

    pub async fn update_group(
        &self,
        name: &str,
        description: &str,
        ticket: &Ticket,
    ) -> Result<Ack, DirectoryError> {
        const OPERATION: &str = "update_group";
        let pool = managed_pool(&self.resolver, OPERATION)?;
        admit(ticket, OPERATION)?;

        let result = pool
            .update_group(name, description)
            .await
            .map(|()| {
                tracing::info!(group = %name, "Group updated");
                Ack::ok(format!("Group {} updated.", name))
            })
            .map_err(|e| {
                DirectoryError::backend(
                    OPERATION,
                    name,
                    format!("Failed to update the specified group. Params: groupName:{}", name),
                    &e,
                )
            });

        finish(&self.audit, ticket, OPERATION, format!("update group {}", name), &result);
        result
    }

    /// The pool only deletes empty groups; its refusal is reported as a
    /// backend failure.
    pub async fn delete_group(&self, name: &str, ticket: &Ticket) -> Result<Ack, DirectoryError> {
        const OPERATION: &str = "delete_group";
        let pool = managed_pool(&self.resolver, OPERATION)?;
        admit(ticket, OPERATION)?;

        let result = pool
            .delete_group(name)
            .await
            .map(|()| {
                tracing::info!(group = %name, "Group deleted");
                Ack::ok(format!("Group {} deleted.", name))
            })
            .map_err(|e| {
                DirectoryError::backend(
                    OPERATION,
                    name,
                    format!("Failed to delete the specified group. Params: groupName:{}", name),
                    &e,
                )
            });

        finish(&self.audit, ticket, OPERATION, format!("delete group {}", name), &result);
        result
    }

    /// Group metadata and members, fetched concurrently.
    pub async fn get_group(&self, name: &str, ticket: &Ticket) -> Result<Group, DirectoryError> {
        const OPERATION: &str = "get_group";
        let pool = managed_pool(&self.resolver, OPERATION)?;
        admit(ticket, OPERATION)?;

        let result = tokio::try_join!(
            pool.get_group(name),
            collect_pages(|token| pool.list_users_in_group(name, token)),
        )
        .map(|(summary, users)| Group::new(summary, users.into_iter().map(Member::from).collect()))
        .map_err(|e| {
            DirectoryError::backend(
                OPERATION,
                name,
                format!("Failed to retrieve the specified group. Params: groupName:{}", name),
                &e,
            )
        });

        finish(&self.audit, ticket, OPERATION, format!("get group {}", name), &result);
        result
    }

    pub async fn add_user_to_group(
        &self,
        user_id: &str,
        name: &str,
        ticket: &Ticket,
    ) -> Result<Ack, DirectoryError> {
        const OPERATION: &str = "add_user_to_group";
        let pool = managed_pool(&self.resolver, OPERATION)?;
        admit(ticket, OPERATION)?;

        let result = pool
            .add_user_to_group(user_id, name)
            .await
            .map(|()| {
                tracing::info!(user_id = %user_id, group = %name, "User added to group");
                Ack::ok(format!("User {} added to group {}.", user_id, name))
            })
            .map_err(|e| {
                DirectoryError::backend(
                    OPERATION,
                    format!("{}/{}", name, user_id),
                    format!("Failed to add User {} to group {}.", user_id, name),
                    &e,
                )
            });

        finish(
            &self.audit,
            ticket,
            OPERATION,
            format!("add user {} to group {}", user_id, name),
            &result,
        );
        result
    }

    pub async fn remove_user_from_group(
        &self,
        user_id: &str,
        name: &str,
        ticket: &Ticket,
    ) -> Result<Ack, DirectoryError> {
        const OPERATION: &str = "remove_user_from_group";
        let pool = managed_pool(&self.resolver, OPERATION)?;
        admit(ticket, OPERATION)?;

        let result = pool
            .remove_user_from_group(user_id, name)
            .await
            .map(|()| {
                tracing::info!(user_id = %user_id, group = %name, "User removed from group");
                Ack::ok(format!("User {} removed from group {}.", user_id, name))
            })
            .map_err(|e| {
                DirectoryError::backend(
                    OPERATION,
                    format!("{}/{}", name, user_id),
                    format!("Failed to remove User {} from group {}.", user_id, name),
                    &e,
                )
            });

        finish(
            &self.audit,
            ticket,
            OPERATION,
            format!("remove user {} from group {}", user_id, name),
            &result,
        );
        result
    }

    /// Groups of an arbitrary user. Requires admin in both modes.
    pub async fn get_user_groups(
        &self,
        user_id: &str,
        ticket: &Ticket,
    ) -> Result<Vec<GroupSummary>, DirectoryError> {
        const OPERATION: &str = "get_user_groups";
        const FAILURE: &str = "Failed to list the groups that the user belongs to.";
        admit(ticket, OPERATION)?;

        let result = match self.resolver.active_backend() {
            DirectoryBackend::Managed(pool) => {
                collect_pages(|token| pool.list_groups_for_user(user_id, token))
                    .await
                    .map_err(|e| DirectoryError::backend(OPERATION, user_id, FAILURE, &e))
            }
            DirectoryBackend::Federated(identity) => {
                federated_groups(identity.as_ref(), user_id, OPERATION, FAILURE).await
            }
        };

        finish(
            &self.audit,
            ticket,
            OPERATION,
            format!("get groups of user {}", user_id),
            &result,
        );
        result
    }
}

async fn federated_groups(
    identity: &dyn IdentitySource,
    user_id: &str,
    operation: &'static str,
    failure: &str,
) -> Result<Vec<GroupSummary>, DirectoryError> {
    let record = identity
        .get_user(user_id)
        .await
        .map_err(|e| DirectoryError::backend(operation, user_id, failure, &e))?;
    Ok(federated_summaries(&record, identity.pool_id()))
}
