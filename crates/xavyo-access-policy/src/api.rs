//! Remote collaborators consumed by the reconciler.
//!
//! The reconciler only talks to the policy API through these traits, so tests
//! and alternative transports can plug in their own implementation.
//! [`PolicyClient`](crate::client::PolicyClient) is the HTTP one.

use async_trait::async_trait;

use crate::error::PolicyResult;
use crate::models::{AccessPolicy, TargetWorkspace};

/// Fetch and replace access-policy documents.
#[async_trait]
pub trait PolicyApi: Send + Sync {
    /// Fetch a policy.
    ///
    /// Returns [`PolicyError::NotFound`](crate::error::PolicyError::NotFound)
    /// if the policy does not exist.
    async fn get_policy(&self, policy_id: &str) -> PolicyResult<AccessPolicy>;

    /// Replace a policy's principals and at most one target partition.
    ///
    /// Callers must never pass more than one key in `policy.targets`;
    /// partitions not named in the payload are left untouched remotely. An
    /// empty `targets` map therefore leaves every stored partition as it is,
    /// which is how principal writes avoid touching instance targets.
    async fn update_policy(&self, policy_id: &str, policy: &AccessPolicy)
        -> PolicyResult<AccessPolicy>;
}

/// Resolve target workspaces referenced by instance assignments.
#[async_trait]
pub trait WorkspaceApi: Send + Sync {
    /// Fetch a workspace.
    ///
    /// Returns [`PolicyError::NotFound`](crate::error::PolicyError::NotFound)
    /// if the workspace does not exist.
    async fn get_workspace(&self, workspace_id: &str) -> PolicyResult<TargetWorkspace>;
}
