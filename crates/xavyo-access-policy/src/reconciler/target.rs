//! Policy ↔ instance target assignments.

use std::fmt;
use std::sync::Arc;

use serde_json::Map;
use tracing::{debug, info, warn};

use super::{ensure_same_key, log_failure, CreateMode, Reconciler};
use crate::accessor::{find_instance, instance_position};
use crate::api::WorkspaceApi;
use crate::assignment::{ReadOutcome, TargetAssignmentConfig};
use crate::error::{PolicyError, PolicyResult};
use crate::ids::TargetAssignmentId;
use crate::models::{InstanceEntry, InstanceTarget, TargetWorkspace};
use crate::profiles::{attach_profile, build_profile, parse_profile};

/// Create, read, update, delete and import target assignments.
#[derive(Clone)]
pub struct TargetAssignments {
    reconciler: Reconciler,
    workspaces: Arc<dyn WorkspaceApi>,
}

impl fmt::Debug for TargetAssignments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetAssignments")
            .field("reconciler", &self.reconciler)
            .finish_non_exhaustive()
    }
}

impl TargetAssignments {
    pub fn new(reconciler: Reconciler, workspaces: Arc<dyn WorkspaceApi>) -> Self {
        Self {
            reconciler,
            workspaces,
        }
    }

    /// Add an instance target to a policy and return the assignment id.
    ///
    /// An entry already holding the instance is adopted without a write (see
    /// [`CreateMode`]).
    pub async fn create(
        &self,
        desired: &TargetAssignmentConfig,
    ) -> PolicyResult<TargetAssignmentId> {
        let id = desired.assignment_id();
        let key = id.to_string();
        log_failure("create", &key, self.create_inner(id, desired).await)
    }

    async fn create_inner(
        &self,
        id: TargetAssignmentId,
        desired: &TargetAssignmentConfig,
    ) -> PolicyResult<TargetAssignmentId> {
        id.validate()?;
        let profile = build_profile(desired)?;

        let mut policy = self.reconciler.fetch_policy(&id.policy_id).await?;
        let workspace = self.fetch_workspace(&id.instance_id).await?;

        if let Some(existing) = find_instance(&policy, &id.instance_id)? {
            if !existing.authentication.same_settings(&profile) {
                if self.reconciler.options.create_mode == CreateMode::RejectConflicting {
                    return Err(PolicyError::conflict(
                        id.to_string(),
                        format!(
                            "instance is assigned with {} and a different profile",
                            existing.authentication_method()
                        ),
                    ));
                }
                warn!(
                    policy_id = %id.policy_id,
                    instance_id = %id.instance_id,
                    existing_method = %existing.authentication_method(),
                    desired_method = %desired.authentication_method,
                    "Adopting existing instance assignment with a different profile"
                );
            } else {
                debug!(
                    policy_id = %id.policy_id,
                    instance_id = %id.instance_id,
                    "Adopting existing instance assignment"
                );
            }
            return Ok(id);
        }

        let entry = InstanceEntry::encode(&InstanceTarget {
            instance_id: id.instance_id.clone(),
            instance_name: workspace.name,
            instance_type: workspace.platform_type,
            authentication: profile,
            extra: Map::new(),
        })?;

        let partition_key = self.reconciler.options.partition_key.clone();
        policy
            .targets
            .entry(partition_key.clone())
            .or_default()
            .instances
            .push(entry);

        let payload = policy.with_single_partition(&partition_key);
        self.reconciler.write_policy(&id.policy_id, &payload).await?;

        info!(
            policy_id = %id.policy_id,
            instance_id = %id.instance_id,
            partition = %partition_key,
            method = %desired.authentication_method,
            "Instance assignment created"
        );
        Ok(id)
    }

    /// Read an assignment back. Returns [`ReadOutcome::Removed`] if the
    /// policy, the entry or the referenced workspace no longer exists.
    pub async fn read(&self, id: &str) -> PolicyResult<ReadOutcome<TargetAssignmentConfig>> {
        log_failure("read", id, self.read_inner(id).await)
    }

    async fn read_inner(&self, id: &str) -> PolicyResult<ReadOutcome<TargetAssignmentConfig>> {
        let id = TargetAssignmentId::parse(id)?;
        let outcome = self.lookup(&id).await?;
        if outcome.is_removed() {
            info!(
                policy_id = %id.policy_id,
                instance_id = %id.instance_id,
                "Instance assignment removed remotely"
            );
        }
        Ok(outcome)
    }

    /// Like [`read`](Self::read), but absence is an
    /// [`AssignmentNotFound`](PolicyError::AssignmentNotFound) error.
    pub async fn import(&self, id: &str) -> PolicyResult<TargetAssignmentConfig> {
        log_failure("import", id, self.import_inner(id).await)
    }

    async fn import_inner(&self, id: &str) -> PolicyResult<TargetAssignmentConfig> {
        let parsed = TargetAssignmentId::parse(id)?;
        match self.lookup(&parsed).await? {
            ReadOutcome::Found(config) => Ok(config),
            ReadOutcome::Removed => Err(PolicyError::assignment_not_found("import", id)),
        }
    }

    /// Replace the profile of an existing assignment and return the new state.
    pub async fn update(
        &self,
        id: &str,
        desired: &TargetAssignmentConfig,
    ) -> PolicyResult<TargetAssignmentConfig> {
        log_failure("update", id, self.update_inner(id, desired).await)
    }

    async fn update_inner(
        &self,
        id: &str,
        desired: &TargetAssignmentConfig,
    ) -> PolicyResult<TargetAssignmentConfig> {
        let id = TargetAssignmentId::parse(id)?;
        let key = id.to_string();
        ensure_same_key("update", &key, &desired.assignment_id().to_string())?;
        let profile = build_profile(desired)?;

        let mut policy = self
            .reconciler
            .fetch_existing_policy(&id.policy_id)
            .await?
            .ok_or_else(|| PolicyError::assignment_not_found("update", &key))?;

        let (partition_key, index) = instance_position(&policy, &id.instance_id)
            .ok_or_else(|| PolicyError::assignment_not_found("update", &key))?;

        let entry = policy
            .targets
            .get_mut(&partition_key)
            .and_then(|partition| partition.instances.get_mut(index))
            .ok_or_else(|| PolicyError::assignment_not_found("update", &key))?;
        let mut instance = entry.decode()?;
        attach_profile(&mut instance, profile);
        let updated = parse_profile(&id.policy_id, &instance);
        *entry = InstanceEntry::encode(&instance)?;

        let payload = policy.with_single_partition(&partition_key);
        self.reconciler.write_policy(&id.policy_id, &payload).await?;

        info!(
            policy_id = %id.policy_id,
            instance_id = %id.instance_id,
            partition = %partition_key,
            method = %updated.authentication_method,
            "Instance assignment updated"
        );
        Ok(updated)
    }

    /// Remove an assignment. Deleting something already gone succeeds.
    pub async fn delete(&self, id: &str) -> PolicyResult<()> {
        log_failure("delete", id, self.delete_inner(id).await)
    }

    async fn delete_inner(&self, id: &str) -> PolicyResult<()> {
        let id = TargetAssignmentId::parse(id)?;

        let Some(mut policy) = self.reconciler.fetch_existing_policy(&id.policy_id).await? else {
            debug!(policy_id = %id.policy_id, "Policy already gone, nothing to delete");
            return Ok(());
        };

        let Some((partition_key, index)) = instance_position(&policy, &id.instance_id) else {
            debug!(
                policy_id = %id.policy_id,
                instance_id = %id.instance_id,
                "Instance assignment already absent"
            );
            return Ok(());
        };

        if let Some(partition) = policy.targets.get_mut(&partition_key) {
            partition.instances.remove(index);
        }

        let payload = policy.with_single_partition(&partition_key);
        self.reconciler.write_policy(&id.policy_id, &payload).await?;

        info!(
            policy_id = %id.policy_id,
            instance_id = %id.instance_id,
            partition = %partition_key,
            "Instance assignment deleted"
        );
        Ok(())
    }

    async fn lookup(
        &self,
        id: &TargetAssignmentId,
    ) -> PolicyResult<ReadOutcome<TargetAssignmentConfig>> {
        let Some(policy) = self.reconciler.fetch_existing_policy(&id.policy_id).await? else {
            return Ok(ReadOutcome::Removed);
        };

        let Some(instance) = find_instance(&policy, &id.instance_id)? else {
            return Ok(ReadOutcome::Removed);
        };

        match self.fetch_workspace(&id.instance_id).await {
            Ok(_) => {}
            Err(PolicyError::NotFound { .. }) => {
                debug!(
                    instance_id = %id.instance_id,
                    "Workspace deleted, treating assignment as removed"
                );
                return Ok(ReadOutcome::Removed);
            }
            Err(e) => return Err(e),
        }

        Ok(ReadOutcome::Found(parse_profile(&id.policy_id, &instance)))
    }

    async fn fetch_workspace(&self, workspace_id: &str) -> PolicyResult<TargetWorkspace> {
        self.reconciler
            .retry
            .execute("get_workspace", || self.workspaces.get_workspace(workspace_id))
            .await
    }
}
