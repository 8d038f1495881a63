//! In-memory policy API for reconciler integration tests.
//!
//! Applies writes the way the real API does: the principal list and top-level
//! fields are replaced from the payload, a target partition named in the
//! payload replaces the stored one, and partitions not named are kept. A
//! payload with more than one partition is rejected.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use xavyo_access_policy::api::{PolicyApi, WorkspaceApi};
use xavyo_access_policy::async_trait;
use xavyo_access_policy::error::{PolicyError, PolicyResult};
use xavyo_access_policy::models::{AccessPolicy, TargetWorkspace};

/// A recorded write call.
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub policy_id: String,
    pub payload: AccessPolicy,
}

/// Fake policy + workspace API backed by in-memory maps.
#[derive(Default)]
pub struct FakePolicyApi {
    policies: RwLock<HashMap<String, AccessPolicy>>,
    workspaces: RwLock<HashMap<String, TargetWorkspace>>,
    writes: RwLock<Vec<RecordedWrite>>,
    get_calls: AtomicU32,
    /// Number of upcoming `get_policy` calls that fail with a transient error.
    failing_gets: AtomicU32,
    /// Number of upcoming `update_policy` calls that fail with a transient error.
    failing_writes: AtomicU32,
}

impl FakePolicyApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn put_policy(&self, policy_id: &str, policy: AccessPolicy) {
        self.policies
            .write()
            .await
            .insert(policy_id.to_string(), policy);
    }

    pub async fn remove_policy(&self, policy_id: &str) {
        self.policies.write().await.remove(policy_id);
    }

    pub async fn stored_policy(&self, policy_id: &str) -> Option<AccessPolicy> {
        self.policies.read().await.get(policy_id).cloned()
    }

    pub async fn put_workspace(&self, workspace: TargetWorkspace) {
        self.workspaces
            .write()
            .await
            .insert(workspace.id.clone(), workspace);
    }

    pub async fn remove_workspace(&self, workspace_id: &str) {
        self.workspaces.write().await.remove(workspace_id);
    }

    /// All write payloads received so far, oldest first.
    pub async fn writes(&self) -> Vec<RecordedWrite> {
        self.writes.read().await.clone()
    }

    pub async fn write_count(&self) -> usize {
        self.writes.read().await.len()
    }

    pub fn get_calls(&self) -> u32 {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_gets(&self, count: u32) {
        self.failing_gets.store(count, Ordering::SeqCst);
    }

    pub fn fail_next_writes(&self, count: u32) {
        self.failing_writes.store(count, Ordering::SeqCst);
    }

    fn take_failure(counter: &AtomicU32) -> bool {
        counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

#[async_trait]
impl PolicyApi for FakePolicyApi {
    async fn get_policy(&self, policy_id: &str) -> PolicyResult<AccessPolicy> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        if Self::take_failure(&self.failing_gets) {
            return Err(PolicyError::Unreachable("injected failure".into()));
        }
        self.policies
            .read()
            .await
            .get(policy_id)
            .cloned()
            .ok_or_else(|| PolicyError::not_found("access policy", policy_id))
    }

    async fn update_policy(
        &self,
        policy_id: &str,
        policy: &AccessPolicy,
    ) -> PolicyResult<AccessPolicy> {
        if Self::take_failure(&self.failing_writes) {
            return Err(PolicyError::Unreachable("injected failure".into()));
        }
        if policy.targets.len() > 1 {
            return Err(PolicyError::Api {
                status: 400,
                detail: "only one target partition may be updated per request".into(),
            });
        }

        self.writes.write().await.push(RecordedWrite {
            policy_id: policy_id.to_string(),
            payload: policy.clone(),
        });

        let mut policies = self.policies.write().await;
        let stored = policies
            .get_mut(policy_id)
            .ok_or_else(|| PolicyError::not_found("access policy", policy_id))?;

        let mut targets = std::mem::take(&mut stored.targets);
        for (key, partition) in &policy.targets {
            targets.insert(key.clone(), partition.clone());
        }
        *stored = AccessPolicy {
            targets,
            ..policy.clone()
        };
        Ok(stored.clone())
    }
}

#[async_trait]
impl WorkspaceApi for FakePolicyApi {
    async fn get_workspace(&self, workspace_id: &str) -> PolicyResult<TargetWorkspace> {
        self.workspaces
            .read()
            .await
            .get(workspace_id)
            .cloned()
            .ok_or_else(|| PolicyError::not_found("workspace", workspace_id))
    }
}
