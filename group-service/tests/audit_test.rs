mod common;

use common::{admin_ticket, user_ticket, TestDirectory, POOL_ID, SERVICE_NAME};
use group_service::models::{AuditEvent, AuditResult};
use group_service::services::providers::{
    MockEventSink, MockGroupPool, MockSetting, MockSettingsStore,
};
use group_service::services::{AuditError, AuditGate, AuditStatus};
use std::sync::Arc;

fn build_gate(
    setting: MockSetting,
    sink: MockEventSink,
) -> (AuditGate, Arc<MockSettingsStore>, Arc<MockEventSink>) {
    let settings = Arc::new(MockSettingsStore::new(setting));
    let sink = Arc::new(sink);
    let gate = AuditGate::new(settings.clone(), sink.clone(), SERVICE_NAME);
    (gate, settings, sink)
}

fn event() -> AuditEvent {
    AuditEvent::new(SERVICE_NAME, "admin-1", "create group ops", AuditResult::Success)
}

#[tokio::test]
async fn enabled_setting_dispatches_formatted_message() {
    let (gate, _, sink) = build_gate(MockSetting::Enabled, MockEventSink::new());
    let event = event();

    let status = gate.log_event(&event).await.unwrap();

    assert_eq!(status, AuditStatus::Dispatched);
    assert_eq!(
        sink.messages(),
        vec![format!(
            "group-service:{} admin-1 create group ops [success]",
            event.event_id
        )]
    );
}

#[tokio::test]
async fn disabled_setting_skips_dispatch() {
    let (gate, _, sink) = build_gate(MockSetting::Disabled, MockEventSink::new());

    let status = gate.log_event(&event()).await.unwrap();

    assert_eq!(status, AuditStatus::Skipped);
    assert_eq!(sink.dispatch_count(), 0);
}

#[tokio::test]
async fn absent_setting_is_config_unavailable() {
    let (gate, _, sink) = build_gate(MockSetting::Absent, MockEventSink::new());

    let err = gate.log_event(&event()).await.unwrap_err();

    assert_eq!(err, AuditError::ConfigUnavailable);
    assert_eq!(err.status_code(), 503);
    assert_eq!(sink.dispatch_count(), 0);
}

#[tokio::test]
async fn failing_settings_lookup_is_config_unavailable() {
    let (gate, _, sink) = build_gate(MockSetting::Failing, MockEventSink::new());

    let err = gate.log_event(&event()).await.unwrap_err();

    assert_eq!(err, AuditError::ConfigUnavailable);
    assert_eq!(sink.dispatch_count(), 0);
}

#[tokio::test]
async fn rejected_dispatch_is_dispatch_failed() {
    let (gate, _, sink) = build_gate(MockSetting::Enabled, MockEventSink::failing());

    let err = gate.log_event(&event()).await.unwrap_err();

    assert_eq!(err, AuditError::DispatchFailed);
    assert_eq!(err.status_code(), 502);
    assert_eq!(sink.dispatch_count(), 1);
    assert!(sink.messages().is_empty());
}

#[tokio::test]
async fn setting_is_read_on_every_event() {
    let (gate, settings, sink) = build_gate(MockSetting::Enabled, MockEventSink::new());

    gate.log_event(&event()).await.unwrap();
    settings.set(MockSetting::Disabled);
    let status = gate.log_event(&event()).await.unwrap();

    assert_eq!(status, AuditStatus::Skipped);
    assert_eq!(settings.lookup_count(), 2);
    assert_eq!(sink.dispatch_count(), 1);
}

#[tokio::test]
async fn successful_operation_is_audited() {
    let test = TestDirectory::managed(MockGroupPool::new(POOL_ID));

    test.directory
        .create_group("ops", "", &admin_ticket())
        .await
        .unwrap();

    assert!(test.wait_for_dispatches(1).await);
    let messages = test.sink.messages();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("group-service:"));
    assert!(messages[0].ends_with(" admin-1 create group ops [success]"));
}

#[tokio::test]
async fn failed_operation_is_audited_as_fail() {
    let test = TestDirectory::managed(MockGroupPool::new(POOL_ID));

    let _ = test.directory.delete_group("ghost", &admin_ticket()).await;

    assert!(test.wait_for_dispatches(1).await);
    assert!(test.sink.messages()[0].ends_with(" admin-1 delete group ghost [fail]"));
}

#[tokio::test]
async fn audit_failure_does_not_fail_the_operation() {
    let test =
        TestDirectory::managed_with_sink(MockGroupPool::new(POOL_ID), MockEventSink::failing());

    let ack = test
        .directory
        .create_group("ops", "", &admin_ticket())
        .await
        .unwrap();

    assert_eq!(ack.message, "Group ops created.");
    assert!(test.wait_for_dispatches(1).await);
    assert!(test.pool.has_group("ops"));
}

#[tokio::test]
async fn missing_audit_setting_does_not_fail_the_operation() {
    let test = TestDirectory::managed(MockGroupPool::new(POOL_ID).with_group("ops", ""));
    test.settings.set(MockSetting::Absent);

    let groups = test.directory.list_groups(&admin_ticket()).await.unwrap();
    test.settle().await;

    assert_eq!(groups.len(), 1);
    assert!(test.settings.lookup_count() >= 1);
    assert_eq!(test.sink.dispatch_count(), 0);
}

#[tokio::test]
async fn federated_listing_is_audited_for_the_caller() {
    use common::user_record;
    use group_service::models::GROUPS_ATTRIBUTE;
    use group_service::services::providers::MockIdentitySource;

    let identity = MockIdentitySource::new(POOL_ID)
        .with_user(user_record("carol", &[(GROUPS_ATTRIBUTE, "[g1]")]));
    let test = TestDirectory::federated(identity);

    test.directory
        .list_groups(&user_ticket("carol"))
        .await
        .unwrap();

    assert!(test.wait_for_dispatches(1).await);
    assert!(test.sink.messages()[0].ends_with(" carol list groups [success]"));
}

#[tokio::test]
async fn request_id_becomes_the_event_id() {
    let test = TestDirectory::managed(MockGroupPool::new(POOL_ID));
    let ticket = admin_ticket().with_request_id("req-42");

    test.directory
        .create_group("ops", "", &ticket)
        .await
        .unwrap();

    assert!(test.wait_for_dispatches(1).await);
    assert_eq!(
        test.sink.messages(),
        vec!["group-service:req-42 admin-1 create group ops [success]".to_string()]
    );
}
