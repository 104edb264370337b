//! Converges a user's managed group memberships to a requested set.
//!
//! Grants and revokes are issued as one concurrent batch and all of them are
//! awaited. A failed call fails the whole update, but calls that already
//! succeeded are not undone: the user can be left partway between the old
//! and the requested membership.

use futures::future::join_all;

use super::audit::AuditGate;
use super::backend::DirectoryModeResolver;
use super::directory::{admit, finish, managed_pool};
use super::error::DirectoryError;
use super::providers::{collect_pages, GroupPool};
use crate::models::{Ack, MembershipSet, Ticket};

/// Additions and removals that turn `current` into `desired`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipPlan {
    pub to_add: Vec<String>,
    pub to_remove: Vec<String>,
}

impl MembershipPlan {
    pub fn compute(current: &MembershipSet, desired: &MembershipSet) -> Self {
        Self {
            to_add: desired.difference(current),
            to_remove: current.difference(desired),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Change {
    Grant,
    Revoke,
}

#[derive(Clone)]
pub struct MembershipReconciler {
    resolver: DirectoryModeResolver,
    audit: AuditGate,
}

impl MembershipReconciler {
    pub fn new(resolver: DirectoryModeResolver, audit: AuditGate) -> Self {
        Self { resolver, audit }
    }

    pub async fn update_membership(
        &self,
        user_id: &str,
        desired: MembershipSet,
        ticket: &Ticket,
    ) -> Result<Ack, DirectoryError> {
        const OPERATION: &str = "update_membership";
        let pool = managed_pool(&self.resolver, OPERATION)?;
        admit(ticket, OPERATION)?;

        let result = reconcile(pool.as_ref(), user_id, &desired).await;

        finish(
            &self.audit,
            ticket,
            OPERATION,
            format!("update membership of user {}", user_id),
            &result,
        );
        result
    }
}

async fn reconcile(
    pool: &dyn GroupPool,
    user_id: &str,
    desired: &MembershipSet,
) -> Result<Ack, DirectoryError> {
    const OPERATION: &str = "update_membership";
    let failure = || format!("Failed to update {} membership list", user_id);

    let current: MembershipSet = collect_pages(|token| pool.list_groups_for_user(user_id, token))
        .await
        .map_err(|e| DirectoryError::backend(OPERATION, user_id, failure(), &e))?
        .into_iter()
        .map(|group| group.name)
        .collect();

    let plan = MembershipPlan::compute(&current, desired);
    tracing::info!(
        user_id = %user_id,
        grants = plan.to_add.len(),
        revokes = plan.to_remove.len(),
        "Applying membership plan"
    );

    let changes = plan
        .to_add
        .iter()
        .map(|group| (Change::Grant, group.as_str()))
        .chain(plan.to_remove.iter().map(|group| (Change::Revoke, group.as_str())));

    let outcomes = join_all(changes.map(|(change, group)| async move {
        let outcome = match change {
            Change::Grant => pool.add_user_to_group(user_id, group).await,
            Change::Revoke => pool.remove_user_from_group(user_id, group).await,
        };
        (change, group, outcome)
    }))
    .await;

    let mut failed = 0usize;
    for (change, group, outcome) in &outcomes {
        if let Err(e) = outcome {
            failed += 1;
            tracing::error!(
                user_id = %user_id,
                group = %group,
                change = ?change,
                error = %e,
                "Membership change failed"
            );
        }
    }

    if failed > 0 {
        tracing::warn!(
            user_id = %user_id,
            failed = failed,
            applied = outcomes.len() - failed,
            "Membership left partially updated"
        );
        return Err(DirectoryError::BackendUnavailable {
            operation: OPERATION,
            target: user_id.to_string(),
            message: failure(),
        });
    }

    Ok(Ack::ok(format!("{} membership list updated.", user_id)))
}
