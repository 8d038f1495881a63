//! Policy ↔ principal assignments.
//!
//! Principal writes carry no target partition at all, so instance targets are
//! never touched by these operations.

use serde_json::Map;
use tracing::{debug, info, warn};

use super::{ensure_same_key, log_failure, CreateMode, Reconciler};
use crate::accessor::{find_principal, principal_position};
use crate::assignment::{PrincipalAssignmentConfig, ReadOutcome};
use crate::error::{PolicyError, PolicyResult};
use crate::ids::PrincipalAssignmentId;
use crate::models::{Principal, PrincipalEntry};

/// Create, read, update, delete and import principal assignments.
#[derive(Debug, Clone)]
pub struct PrincipalAssignments {
    reconciler: Reconciler,
}

impl PrincipalAssignments {
    pub fn new(reconciler: Reconciler) -> Self {
        Self { reconciler }
    }

    /// Add a principal to a policy and return the assignment id.
    ///
    /// An entry already holding the `(id, type)` pair is adopted without a
    /// write (see [`CreateMode`]).
    pub async fn create(
        &self,
        desired: &PrincipalAssignmentConfig,
    ) -> PolicyResult<PrincipalAssignmentId> {
        let id = desired.assignment_id();
        let key = id.to_string();
        log_failure("create", &key, self.create_inner(id, desired).await)
    }

    async fn create_inner(
        &self,
        id: PrincipalAssignmentId,
        desired: &PrincipalAssignmentConfig,
    ) -> PolicyResult<PrincipalAssignmentId> {
        id.validate()?;
        validate_directory(desired)?;

        let mut policy = self.reconciler.fetch_policy(&id.policy_id).await?;

        if let Some(existing) = find_principal(&policy, &id.principal_id, id.principal_type)? {
            if !same_fields(&existing, desired) {
                if self.reconciler.options.create_mode == CreateMode::RejectConflicting {
                    return Err(PolicyError::conflict(
                        id.to_string(),
                        format!(
                            "principal is assigned as '{}' with different directory fields",
                            existing.name
                        ),
                    ));
                }
                warn!(
                    policy_id = %id.policy_id,
                    principal_id = %id.principal_id,
                    principal_type = %id.principal_type,
                    "Adopting existing principal assignment with different fields"
                );
            } else {
                debug!(
                    policy_id = %id.policy_id,
                    principal_id = %id.principal_id,
                    principal_type = %id.principal_type,
                    "Adopting existing principal assignment"
                );
            }
            return Ok(id);
        }

        policy.principals.push(PrincipalEntry::encode(&Principal {
            id: id.principal_id.clone(),
            name: desired.principal_name.clone(),
            principal_type: id.principal_type,
            source_directory_name: desired.source_directory_name.clone(),
            source_directory_id: desired.source_directory_id.clone(),
            extra: Map::new(),
        })?);

        self.reconciler
            .write_policy(&id.policy_id, &policy.without_targets())
            .await?;

        info!(
            policy_id = %id.policy_id,
            principal_id = %id.principal_id,
            principal_type = %id.principal_type,
            "Principal assignment created"
        );
        Ok(id)
    }

    /// Read an assignment back. Returns [`ReadOutcome::Removed`] if the
    /// policy or the principal entry no longer exists.
    pub async fn read(&self, id: &str) -> PolicyResult<ReadOutcome<PrincipalAssignmentConfig>> {
        log_failure("read", id, self.read_inner(id).await)
    }

    async fn read_inner(&self, id: &str) -> PolicyResult<ReadOutcome<PrincipalAssignmentConfig>> {
        let id = PrincipalAssignmentId::parse(id)?;
        let outcome = self.lookup(&id).await?;
        if outcome.is_removed() {
            info!(
                policy_id = %id.policy_id,
                principal_id = %id.principal_id,
                principal_type = %id.principal_type,
                "Principal assignment removed remotely"
            );
        }
        Ok(outcome)
    }

    /// Like [`read`](Self::read), but absence is an
    /// [`AssignmentNotFound`](PolicyError::AssignmentNotFound) error.
    pub async fn import(&self, id: &str) -> PolicyResult<PrincipalAssignmentConfig> {
        log_failure("import", id, self.import_inner(id).await)
    }

    async fn import_inner(&self, id: &str) -> PolicyResult<PrincipalAssignmentConfig> {
        let parsed = PrincipalAssignmentId::parse(id)?;
        match self.lookup(&parsed).await? {
            ReadOutcome::Found(config) => Ok(config),
            ReadOutcome::Removed => Err(PolicyError::assignment_not_found("import", id)),
        }
    }

    /// Overwrite the name and directory fields of an existing principal.
    pub async fn update(
        &self,
        id: &str,
        desired: &PrincipalAssignmentConfig,
    ) -> PolicyResult<PrincipalAssignmentConfig> {
        log_failure("update", id, self.update_inner(id, desired).await)
    }

    async fn update_inner(
        &self,
        id: &str,
        desired: &PrincipalAssignmentConfig,
    ) -> PolicyResult<PrincipalAssignmentConfig> {
        let id = PrincipalAssignmentId::parse(id)?;
        let key = id.to_string();
        ensure_same_key("update", &key, &desired.assignment_id().to_string())?;
        validate_directory(desired)?;

        let mut policy = self
            .reconciler
            .fetch_existing_policy(&id.policy_id)
            .await?
            .ok_or_else(|| PolicyError::assignment_not_found("update", &key))?;

        let index = principal_position(&policy, &id.principal_id, id.principal_type)
            .ok_or_else(|| PolicyError::assignment_not_found("update", &key))?;

        let entry = policy
            .principals
            .get_mut(index)
            .ok_or_else(|| PolicyError::assignment_not_found("update", &key))?;
        let mut principal = entry.decode()?;
        principal.name = desired.principal_name.clone();
        principal.source_directory_name = desired.source_directory_name.clone();
        principal.source_directory_id = desired.source_directory_id.clone();
        let updated = to_config(&id.policy_id, &principal);
        *entry = PrincipalEntry::encode(&principal)?;

        self.reconciler
            .write_policy(&id.policy_id, &policy.without_targets())
            .await?;

        info!(
            policy_id = %id.policy_id,
            principal_id = %id.principal_id,
            principal_type = %id.principal_type,
            "Principal assignment updated"
        );
        Ok(updated)
    }

    /// Remove an assignment. Deleting something already gone succeeds.
    pub async fn delete(&self, id: &str) -> PolicyResult<()> {
        log_failure("delete", id, self.delete_inner(id).await)
    }

    async fn delete_inner(&self, id: &str) -> PolicyResult<()> {
        let id = PrincipalAssignmentId::parse(id)?;

        let Some(mut policy) = self.reconciler.fetch_existing_policy(&id.policy_id).await? else {
            debug!(policy_id = %id.policy_id, "Policy already gone, nothing to delete");
            return Ok(());
        };

        let Some(index) = principal_position(&policy, &id.principal_id, id.principal_type) else {
            debug!(
                policy_id = %id.policy_id,
                principal_id = %id.principal_id,
                principal_type = %id.principal_type,
                "Principal assignment already absent"
            );
            return Ok(());
        };

        policy.principals.remove(index);
        self.reconciler
            .write_policy(&id.policy_id, &policy.without_targets())
            .await?;

        info!(
            policy_id = %id.policy_id,
            principal_id = %id.principal_id,
            principal_type = %id.principal_type,
            "Principal assignment deleted"
        );
        Ok(())
    }

    async fn lookup(
        &self,
        id: &PrincipalAssignmentId,
    ) -> PolicyResult<ReadOutcome<PrincipalAssignmentConfig>> {
        let Some(policy) = self.reconciler.fetch_existing_policy(&id.policy_id).await? else {
            return Ok(ReadOutcome::Removed);
        };

        Ok(
            match find_principal(&policy, &id.principal_id, id.principal_type)? {
                Some(principal) => ReadOutcome::Found(to_config(&id.policy_id, &principal)),
                None => ReadOutcome::Removed,
            },
        )
    }
}

/// Users and groups must name the directory they come from.
fn validate_directory(config: &PrincipalAssignmentConfig) -> PolicyResult<()> {
    if !config.principal_type.requires_source_directory() {
        return Ok(());
    }

    let present = |value: &Option<String>| value.as_deref().is_some_and(|v| !v.trim().is_empty());
    if present(&config.source_directory_name) && present(&config.source_directory_id) {
        Ok(())
    } else {
        Err(PolicyError::InvalidConfig(format!(
            "principal {} of type {} requires source_directory_name and source_directory_id",
            config.principal_id, config.principal_type
        )))
    }
}

fn same_fields(existing: &Principal, desired: &PrincipalAssignmentConfig) -> bool {
    existing.name == desired.principal_name
        && existing.source_directory_name == desired.source_directory_name
        && existing.source_directory_id == desired.source_directory_id
}

fn to_config(policy_id: &str, principal: &Principal) -> PrincipalAssignmentConfig {
    PrincipalAssignmentConfig {
        policy_id: policy_id.to_string(),
        principal_id: principal.id.clone(),
        principal_type: principal.principal_type,
        principal_name: principal.name.clone(),
        source_directory_name: principal.source_directory_name.clone(),
        source_directory_id: principal.source_directory_id.clone(),
    }
}
