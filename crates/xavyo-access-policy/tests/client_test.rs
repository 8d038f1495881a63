//! HTTP client tests against a wiremock policy API.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use xavyo_access_policy::api::{PolicyApi, WorkspaceApi};
use xavyo_access_policy::assignment::{DbAuthProfileConfig, ReadOutcome, TargetAssignmentConfig};
use xavyo_access_policy::client::PolicyClient;
use xavyo_access_policy::error::PolicyError;
use xavyo_access_policy::models::{AccessPolicy, AuthenticationMethod};
use xavyo_access_policy::reconciler::Reconciler;
use xavyo_access_policy::retry::RetryPolicy;

/// Helper: a `PolicyClient` pointing at a wiremock server.
fn client(server: &MockServer) -> PolicyClient {
    PolicyClient::with_http_client(&server.uri(), "test-token-123", reqwest::Client::new())
        .unwrap()
}

fn policy_json() -> serde_json::Value {
    json!({
        "metadata": { "policy_id": "P1", "name": "Production DBAs" },
        "targets": {
            "FQDN/IP": {
                "instances": [{
                    "instance_id": "99",
                    "instance_name": "orders-db",
                    "instance_type": "Postgres",
                    "authentication_method": "db_auth",
                    "db_auth_profile": { "roles": ["read"] }
                }]
            }
        },
        "principals": [],
        "conditions": { "max_session_duration": 4 }
    })
}

#[tokio::test]
async fn test_get_policy_sends_bearer_token() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/access-policies/P1"))
        .and(header("Authorization", "Bearer test-token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(policy_json()))
        .expect(1)
        .mount(&server)
        .await;

    let policy = client(&server).get_policy("P1").await.unwrap();
    assert_eq!(policy.metadata.name, "Production DBAs");
    assert_eq!(policy.instance_count(), 1);
}

#[tokio::test]
async fn test_get_policy_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/access-policies/P404"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such policy"))
        .mount(&server)
        .await;

    let err = client(&server).get_policy("P404").await.unwrap_err();
    match err {
        PolicyError::NotFound { entity, id } => {
            assert_eq!(entity, "access policy");
            assert_eq!(id, "P404");
        }
        other => panic!("Expected NotFound, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_error_status_mapping() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/access-policies/limited"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "12"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/access-policies/denied"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/access-policies/broken"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/access-policies/garbled"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .mount(&server)
        .await;

    let client = client(&server);

    let err = client.get_policy("limited").await.unwrap_err();
    assert!(matches!(
        err,
        PolicyError::RateLimited {
            retry_after_secs: Some(12)
        }
    ));

    let err = client.get_policy("denied").await.unwrap_err();
    assert!(matches!(err, PolicyError::AuthError(ref msg) if msg.contains("token expired")));

    let err = client.get_policy("broken").await.unwrap_err();
    assert!(err.is_server_error());
    assert!(RetryPolicy::is_transient(&err));

    let err = client.get_policy("garbled").await.unwrap_err();
    assert!(matches!(err, PolicyError::ParseError(_)));
}

#[tokio::test]
async fn test_update_policy_puts_single_partition() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/access-policies/P1"))
        .and(body_partial_json(json!({
            "conditions": { "max_session_duration": 4 }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(policy_json()))
        .expect(1)
        .mount(&server)
        .await;

    let policy: AccessPolicy = serde_json::from_value(policy_json()).unwrap();
    let updated = client(&server).update_policy("P1", &policy).await.unwrap();
    assert_eq!(updated, policy);
}

#[tokio::test]
async fn test_update_policy_rejects_multiple_partitions_locally() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut policy: AccessPolicy = serde_json::from_value(policy_json()).unwrap();
    policy.targets.insert("AWS".into(), Default::default());

    let err = client(&server).update_policy("P1", &policy).await.unwrap_err();
    assert!(matches!(err, PolicyError::InvalidPayload(_)));
}

#[tokio::test]
async fn test_update_policy_no_content_echoes_payload() {
    let server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path("/api/access-policies/P1"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let policy: AccessPolicy = serde_json::from_value(policy_json()).unwrap();
    let updated = client(&server).update_policy("P1", &policy).await.unwrap();
    assert_eq!(updated, policy);
}

#[tokio::test]
async fn test_get_workspace() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/workspaces/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "name": "orders-db",
            "platform_type": "Postgres"
        })))
        .mount(&server)
        .await;

    let client = client(&server);
    let workspace = client.get_workspace("42").await.unwrap();
    assert_eq!(workspace.name, "orders-db");

    let err = client.get_workspace("43").await.unwrap_err();
    assert!(matches!(err, PolicyError::NotFound { ref entity, .. } if entity == "workspace"));
}

#[tokio::test]
async fn test_reconciler_over_http_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/access-policies/P1"))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/access-policies/P1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(policy_json()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workspaces/42"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "42",
            "name": "billing-db",
            "platform_type": "MySQL"
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/access-policies/P1"))
        .and(body_partial_json(json!({
            "targets": { "FQDN/IP": { "instances": [
                { "instance_id": "99" },
                {
                    "instance_id": "42",
                    "instance_name": "billing-db",
                    "instance_type": "MySQL",
                    "authentication_method": "db_auth",
                    "db_auth_profile": { "roles": ["connect"] }
                }
            ]}}
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let client = Arc::new(client(&server));
    let targets = Reconciler::new(client.clone())
        .with_retry(RetryPolicy::new(2, Duration::ZERO))
        .targets(client);

    let desired = TargetAssignmentConfig::new("P1", "42", AuthenticationMethod::DbAuth)
        .with_db_auth(DbAuthProfileConfig {
            roles: vec!["connect".into()],
        });
    let id = targets.create(&desired).await.unwrap();
    assert_eq!(id.to_string(), "P1:42");

    // The mock keeps serving the original document, so 42 reads back as removed.
    assert_eq!(targets.read("P1:42").await.unwrap(), ReadOutcome::Removed);
}
