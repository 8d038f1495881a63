//! Test data builders for access-policy integration tests.

#![allow(dead_code)]

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use xavyo_access_policy::assignment::{
    DbAuthProfileConfig, PrincipalAssignmentConfig, TargetAssignmentConfig,
};
use xavyo_access_policy::models::{AccessPolicy, AuthenticationMethod, PrincipalType, TargetWorkspace};
use xavyo_access_policy::reconciler::{
    PrincipalAssignments, Reconciler, ReconcilerOptions, TargetAssignments,
};
use xavyo_access_policy::retry::RetryPolicy;

use super::fake_policy_api::FakePolicyApi;

pub const POLICY_ID: &str = "P1";

/// A policy with one instance in the `AWS` partition, one principal and
/// pass-through fields that every write must carry unchanged.
pub fn seeded_policy() -> AccessPolicy {
    serde_json::from_value(json!({
        "metadata": {
            "policy_id": POLICY_ID,
            "name": "Production DBAs",
            "status": "Active",
            "created_at": "2024-03-01T10:00:00Z"
        },
        "targets": {
            "AWS": {
                "instances": [{
                    "instance_id": "77",
                    "instance_name": "billing-db",
                    "instance_type": "MySQL",
                    "authentication_method": "db_auth",
                    "db_auth_profile": { "roles": ["read"] }
                }]
            }
        },
        "principals": [{
            "id": "r-1",
            "name": "auditors",
            "type": "ROLE"
        }],
        "conditions": {
            "max_session_duration": 4,
            "idle_time": 10,
            "access_window": { "days_of_the_week": [1, 2, 3, 4, 5], "from_hour": "08:00", "to_hour": "18:00" }
        },
        "delegation_classes": { "r-1": ["ManageMembership"] },
        "policy_tags": ["prod"]
    }))
    .expect("seeded policy is valid")
}

/// Instance `99` as another tool left it: a profile key this crate does not
/// model and a stale slot for a method it no longer uses.
pub fn legacy_sibling() -> serde_json::Value {
    json!({
        "instance_id": "99",
        "instance_name": "reports-db",
        "instance_type": "Postgres",
        "authentication_method": "db_auth",
        "db_auth_profile": { "roles": ["read"], "password_rotation": "weekly" },
        "ldap_auth_profile": { "assign_groups": ["cn=old"] }
    })
}

/// Instance `55` using an authentication method this crate cannot represent.
pub fn foreign_instance() -> serde_json::Value {
    json!({
        "instance_id": "55",
        "instance_name": "warehouse",
        "instance_type": "MySQL",
        "authentication_method": "rds_iam_user_auth",
        "rds_iam_user_auth_profile": { "db_user": "reporting" }
    })
}

/// [`seeded_policy`] plus [`legacy_sibling`] in the default partition,
/// [`foreign_instance`] next to `77` and a principal of an unmodelled type.
pub fn mixed_policy() -> AccessPolicy {
    let mut policy = serde_json::to_value(seeded_policy()).expect("seeded policy serializes");
    policy["targets"]["FQDN/IP"] = json!({ "instances": [legacy_sibling()] });
    policy["targets"]["AWS"]["instances"]
        .as_array_mut()
        .expect("AWS partition has instances")
        .push(foreign_instance());
    policy["principals"]
        .as_array_mut()
        .expect("principals is a list")
        .push(json!({ "id": "svc-1", "name": "etl", "type": "SERVICE_ACCOUNT" }));
    serde_json::from_value(policy).expect("mixed policy is valid")
}

pub fn workspace(id: &str) -> TargetWorkspace {
    TargetWorkspace {
        id: id.to_string(),
        name: format!("instance-{id}"),
        platform_type: "Postgres".to_string(),
    }
}

pub fn db_auth(instance_id: &str, roles: &[&str]) -> TargetAssignmentConfig {
    TargetAssignmentConfig::new(POLICY_ID, instance_id, AuthenticationMethod::DbAuth).with_db_auth(
        DbAuthProfileConfig {
            roles: roles.iter().map(|r| (*r).to_string()).collect(),
        },
    )
}

pub fn user(principal_id: &str, name: &str) -> PrincipalAssignmentConfig {
    PrincipalAssignmentConfig {
        policy_id: POLICY_ID.to_string(),
        principal_id: principal_id.to_string(),
        principal_type: PrincipalType::User,
        principal_name: name.to_string(),
        source_directory_name: Some("Corp AD".to_string()),
        source_directory_id: Some("dir-1".to_string()),
    }
}

/// Retry policy that retries immediately.
pub fn fast_retry() -> RetryPolicy {
    RetryPolicy::new(3, Duration::ZERO)
}

/// Route reconciler logs to the test writer (safe to call repeatedly).
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_env_filter("xavyo_access_policy=debug")
        .try_init();
}

/// Fake API seeded with [`seeded_policy`] and workspaces `42`, `77` and `99`.
pub async fn seeded_api() -> Arc<FakePolicyApi> {
    api_with(seeded_policy()).await
}

/// Fake API seeded with [`mixed_policy`].
pub async fn mixed_api() -> Arc<FakePolicyApi> {
    api_with(mixed_policy()).await
}

async fn api_with(policy: AccessPolicy) -> Arc<FakePolicyApi> {
    init_test_logging();
    let api = FakePolicyApi::new();
    api.put_policy(POLICY_ID, policy).await;
    for id in ["42", "55", "77", "99"] {
        api.put_workspace(workspace(id)).await;
    }
    api
}

pub fn targets(api: &Arc<FakePolicyApi>) -> TargetAssignments {
    targets_with(api, ReconcilerOptions::default())
}

pub fn targets_with(api: &Arc<FakePolicyApi>, options: ReconcilerOptions) -> TargetAssignments {
    Reconciler::new(api.clone())
        .with_retry(fast_retry())
        .with_options(options)
        .targets(api.clone())
}

pub fn principals(api: &Arc<FakePolicyApi>) -> PrincipalAssignments {
    principals_with(api, ReconcilerOptions::default())
}

pub fn principals_with(
    api: &Arc<FakePolicyApi>,
    options: ReconcilerOptions,
) -> PrincipalAssignments {
    Reconciler::new(api.clone())
        .with_retry(fast_retry())
        .with_options(options)
        .principals()
}
