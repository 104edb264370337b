
use group_service::models::UserStatus;
use group_service::services::providers::{
    collect_pages, AuditPayload, EventSink, GroupPool, HttpEventSink, HttpGroupPool,
    HttpIdentitySource, IdentityError, IdentitySource, PoolError, SinkError,
};
use reqwest::Client;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const POOL: &str = "pool-1";

async fn pool(server: &MockServer) -> HttpGroupPool {
    HttpGroupPool::new(Client::new(), &server.uri(), POOL).unwrap()
}

#[tokio::test]
async fn group_listing_follows_next_token() {
    let server = MockServer::start().await;
    // Mounted first so it wins over the unfiltered first-page mock.
    Mock::given(method("GET"))
        .and(path("/pools/pool-1/groups"))
        .and(query_param("next_token", "page-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [{ "group_name": "c" }]
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/pools/pool-1/groups"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "groups": [
                {
                    "group_name": "a",
                    "description": "first",
                    "creation_date": "2024-01-02T03:04:05Z",
                    "last_modified_date": "2024-02-02T03:04:05Z"
                },
                { "group_name": "b" }
            ],
            "next_token": "page-2"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let pool = pool(&server).await;
    let groups = collect_pages(|token| pool.list_groups(token)).await.unwrap();

    let names: Vec<_> = groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b", "c"]);
    assert_eq!(groups[0].description, "first");
    assert_eq!(groups[0].pool_id, POOL);
    assert!(groups[0].created_at.is_some());
    assert_eq!(groups[1].description, "");
    assert!(groups[1].created_at.is_none());
}

#[tokio::test]
async fn create_conflict_is_group_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/pools/pool-1/groups"))
        .and(body_json(json!({ "group_name": "ops", "description": "Operations" })))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = pool(&server)
        .await
        .create_group("ops", "Operations")
        .await
        .unwrap_err();

    assert!(matches!(err, PoolError::GroupExists(name) if name == "ops"));
}

#[tokio::test]
async fn delete_conflict_is_group_not_empty() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/pools/pool-1/groups/ops"))
        .respond_with(ResponseTemplate::new(409))
        .mount(&server)
        .await;

    let err = pool(&server).await.delete_group("ops").await.unwrap_err();

    assert!(matches!(err, PoolError::GroupNotEmpty(_)));
}

#[tokio::test]
async fn server_error_is_rejected_with_status() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/pools/pool-1/groups/ops/users/u-1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let err = pool(&server)
        .await
        .add_user_to_group("u-1", "ops")
        .await
        .unwrap_err();

    assert!(matches!(err, PoolError::Rejected { status: 500, ref message } if message == "boom"));
}

#[tokio::test]
async fn group_members_are_decoded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pools/pool-1/groups/ops/users"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": [{
                "username": "u-1",
                "enabled": true,
                "status": "FORCE_CHANGE_PASSWORD",
                "attributes": [{ "name": "email", "value": "a@example.com" }]
            }]
        })))
        .mount(&server)
        .await;

    let page = pool(&server)
        .await
        .list_users_in_group("ops", None)
        .await
        .unwrap();

    assert_eq!(page.next_token, None);
    assert_eq!(page.items[0].status, UserStatus::ForceChangePassword);
    assert_eq!(page.items[0].attribute("email"), Some("a@example.com"));
}

#[tokio::test]
async fn identity_lookup_decodes_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pools/pool-1/users/carol"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "username": "carol",
            "enabled": true,
            "status": "EXTERNAL_PROVIDER",
            "attributes": [{ "name": "custom:groups", "value": "[g1,g2]" }]
        })))
        .mount(&server)
        .await;

    let identity = HttpIdentitySource::new(Client::new(), &server.uri(), POOL).unwrap();
    let record = identity.get_user("carol").await.unwrap();

    assert_eq!(record.status, UserStatus::ExternalProvider);
    assert_eq!(record.attribute("custom:groups"), Some("[g1,g2]"));
}

#[tokio::test]
async fn identity_lookup_of_unknown_user() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/pools/pool-1/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let identity = HttpIdentitySource::new(Client::new(), &server.uri(), POOL).unwrap();
    let err = identity.get_user("ghost").await.unwrap_err();

    assert!(matches!(err, IdentityError::UserNotFound(_)));
}

#[tokio::test]
async fn sink_posts_message_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/events"))
        .and(body_json(json!({ "message": "group-service:1 admin list groups [success]" })))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let sink = HttpEventSink::new(Client::new(), format!("{}/events", server.uri()));
    sink.dispatch(&AuditPayload {
        message: "group-service:1 admin list groups [success]".to_string(),
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn sink_rejection_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = HttpEventSink::new(Client::new(), format!("{}/events", server.uri()));
    let err = sink
        .dispatch(&AuditPayload {
            message: "m".to_string(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, SinkError::Rejected { status: 503, .. }));
}
