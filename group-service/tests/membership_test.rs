mod common;

use common::{admin_ticket, TestDirectory, POOL_ID};
use group_service::models::MembershipSet;
use group_service::services::providers::{MockGroupPool, PoolCall};
use group_service::services::DirectoryError;
use std::collections::BTreeSet;

fn pool_with_groups() -> MockGroupPool {
    MockGroupPool::new(POOL_ID)
        .with_group("A", "")
        .with_group("B", "")
        .with_group("C", "")
}

fn set(names: &[&str]) -> MembershipSet {
    names.iter().copied().collect()
}

fn changes(calls: &[PoolCall]) -> Vec<PoolCall> {
    calls
        .iter()
        .filter(|c| {
            matches!(
                c,
                PoolCall::AddUserToGroup { .. } | PoolCall::RemoveUserFromGroup { .. }
            )
        })
        .cloned()
        .collect()
}

#[tokio::test]
async fn update_issues_only_the_difference() {
    let pool = pool_with_groups()
        .with_member("A", "u-1")
        .with_member("B", "u-1");
    let test = TestDirectory::managed(pool);

    let ack = test
        .reconciler
        .update_membership("u-1", set(&["A", "C"]), &admin_ticket())
        .await
        .unwrap();

    assert_eq!(ack.message, "u-1 membership list updated.");
    let mut issued = changes(&test.pool.calls());
    issued.sort_by_key(|c| format!("{:?}", c));
    assert_eq!(
        issued,
        vec![
            PoolCall::AddUserToGroup {
                user_id: "u-1".to_string(),
                group: "C".to_string()
            },
            PoolCall::RemoveUserFromGroup {
                user_id: "u-1".to_string(),
                group: "B".to_string()
            },
        ]
    );
    assert_eq!(
        test.pool.groups_of("u-1"),
        BTreeSet::from(["A".to_string(), "C".to_string()])
    );
}

#[tokio::test]
async fn unchanged_membership_issues_no_calls() {
    let test = TestDirectory::managed(pool_with_groups().with_member("A", "u-1"));

    let ack = test
        .reconciler
        .update_membership("u-1", set(&["A"]), &admin_ticket())
        .await
        .unwrap();

    assert_eq!(ack.code, 200);
    assert!(changes(&test.pool.calls()).is_empty());
}

#[tokio::test]
async fn empty_desired_set_removes_everything() {
    let pool = pool_with_groups()
        .with_member("A", "u-1")
        .with_member("C", "u-1");
    let test = TestDirectory::managed(pool);

    test.reconciler
        .update_membership("u-1", MembershipSet::new(), &admin_ticket())
        .await
        .unwrap();

    assert!(test.pool.groups_of("u-1").is_empty());
}

#[tokio::test]
async fn failed_grant_fails_update_without_rollback() {
    let pool = pool_with_groups()
        .with_member("A", "u-1")
        .with_member("B", "u-1");
    let test = TestDirectory::managed(pool);
    test.pool.fail_grants_to("C");

    let err = test
        .reconciler
        .update_membership("u-1", set(&["A", "C"]), &admin_ticket())
        .await
        .unwrap_err();

    assert!(matches!(err, DirectoryError::BackendUnavailable { .. }));
    assert_eq!(err.to_string(), "Failed to update u-1 membership list");
    // The revoke from B went through and stays applied.
    assert_eq!(
        test.pool.groups_of("u-1"),
        BTreeSet::from(["A".to_string()])
    );
    assert_eq!(changes(&test.pool.calls()).len(), 2);
}

#[tokio::test]
async fn failed_current_lookup_issues_no_changes() {
    let test = TestDirectory::managed(pool_with_groups().with_member("A", "u-1"));
    test.pool.set_unavailable(true);

    let err = test
        .reconciler
        .update_membership("u-1", set(&["B"]), &admin_ticket())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 502);
    assert!(changes(&test.pool.calls()).is_empty());
}

#[tokio::test]
async fn current_membership_is_read_across_pages() {
    let pool = ["A", "B", "C", "D", "E"]
        .iter()
        .fold(MockGroupPool::new(POOL_ID).with_page_size(2), |pool, g| {
            pool.with_group(g, "").with_member(g, "u-1")
        });
    let test = TestDirectory::managed(pool);

    test.reconciler
        .update_membership("u-1", set(&["A", "B", "C", "D"]), &admin_ticket())
        .await
        .unwrap();

    assert_eq!(
        changes(&test.pool.calls()),
        vec![PoolCall::RemoveUserFromGroup {
            user_id: "u-1".to_string(),
            group: "E".to_string()
        }]
    );
}

#[tokio::test]
async fn membership_update_is_unsupported_in_federated_mode() {
    let test = TestDirectory::federated(group_service::services::providers::MockIdentitySource::new(
        POOL_ID,
    ));

    let err = test
        .reconciler
        .update_membership("u-1", set(&["A"]), &admin_ticket())
        .await
        .unwrap_err();

    assert_eq!(err, DirectoryError::UnsupportedInFederatedMode);
}
