//! Assignment reconciliation engine.
//!
//! Every operation follows the same fetch-merge-write protocol:
//!
//! 1. fetch the current policy document (never cached between operations),
//! 2. locate the entry with the [`accessor`](crate::accessor) helpers,
//! 3. mutate the in-memory document,
//! 4. write back only the changed partition (or no partition for principal
//!    changes) together with every other top-level field as fetched.
//!
//! Remote calls are wrapped in the configured [`RetryPolicy`].
//!
//! The remote document is not locked and the API offers no version token, so
//! two operations racing on the same policy can lose an update. Callers
//! serialize mutations per policy.

mod principal;
mod target;

pub use principal::PrincipalAssignments;
pub use target::TargetAssignments;

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{PolicyApi, WorkspaceApi};
use crate::error::{PolicyError, PolicyResult};
use crate::models::{AccessPolicy, DEFAULT_PARTITION_KEY};
use crate::retry::RetryPolicy;

/// What create does when an entry with the same key already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CreateMode {
    /// Adopt the existing entry without writing. A content mismatch is logged.
    #[default]
    Adopt,
    /// Adopt only if the existing entry matches; otherwise fail with
    /// [`PolicyError::Conflict`].
    RejectConflicting,
}

/// Engine-wide settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcilerOptions {
    /// Partition that new instance targets are appended to.
    pub partition_key: String,
    pub create_mode: CreateMode,
}

impl Default for ReconcilerOptions {
    fn default() -> Self {
        Self {
            partition_key: DEFAULT_PARTITION_KEY.to_string(),
            create_mode: CreateMode::default(),
        }
    }
}

/// Shared plumbing for the assignment reconcilers.
#[derive(Clone)]
pub struct Reconciler {
    policies: Arc<dyn PolicyApi>,
    retry: RetryPolicy,
    options: ReconcilerOptions,
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("retry", &self.retry)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    /// Create a reconciler with the default retry policy and options.
    pub fn new(policies: Arc<dyn PolicyApi>) -> Self {
        Self {
            policies,
            retry: RetryPolicy::default(),
            options: ReconcilerOptions::default(),
        }
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: ReconcilerOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn options(&self) -> &ReconcilerOptions {
        &self.options
    }

    #[must_use]
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Reconciler for policy ↔ target assignments.
    #[must_use]
    pub fn targets(&self, workspaces: Arc<dyn WorkspaceApi>) -> TargetAssignments {
        TargetAssignments::new(self.clone(), workspaces)
    }

    /// Reconciler for policy ↔ principal assignments.
    #[must_use]
    pub fn principals(&self) -> PrincipalAssignments {
        PrincipalAssignments::new(self.clone())
    }

    /// Fetch a policy. A missing policy is an error.
    async fn fetch_policy(&self, policy_id: &str) -> PolicyResult<AccessPolicy> {
        debug!(policy_id = %policy_id, "Fetching access policy");
        self.retry
            .execute("get_policy", || self.policies.get_policy(policy_id))
            .await
    }

    /// Fetch a policy, mapping "not found" to `None`.
    async fn fetch_existing_policy(&self, policy_id: &str) -> PolicyResult<Option<AccessPolicy>> {
        match self.fetch_policy(policy_id).await {
            Ok(policy) => Ok(Some(policy)),
            Err(PolicyError::NotFound { .. }) => {
                debug!(policy_id = %policy_id, "Access policy not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Send a write payload, enforcing the one-partition rule first.
    async fn write_policy(&self, policy_id: &str, payload: &AccessPolicy) -> PolicyResult<()> {
        payload.ensure_writable()?;
        debug!(
            policy_id = %policy_id,
            partitions = payload.targets.len(),
            principals = payload.principals.len(),
            "Writing access policy"
        );
        self.retry
            .execute("update_policy", || {
                self.policies.update_policy(policy_id, payload)
            })
            .await?;
        Ok(())
    }
}

/// Log a failed operation with its key before handing the error back.
fn log_failure<T>(operation: &str, key: &str, result: PolicyResult<T>) -> PolicyResult<T> {
    if let Err(e) = &result {
        warn!(
            operation = operation,
            assignment = %key,
            error_code = e.error_code(),
            error = %e,
            "Assignment operation failed"
        );
    }
    result
}

/// Reject a desired config whose key differs from the id being updated.
fn ensure_same_key(operation: &str, id: &str, desired: &str) -> PolicyResult<()> {
    if id == desired {
        Ok(())
    } else {
        Err(PolicyError::InvalidConfig(format!(
            "{operation}: configuration key {desired} does not match assignment {id}; \
             changing a key part requires a new assignment"
        )))
    }
}
