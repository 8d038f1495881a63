//! Lookups inside a fetched policy document.
//!
//! Instance ids are unique across the whole document, so instance searches scan
//! every partition rather than only the configured one. Entries are matched on
//! their wire keys; only the match is decoded, so entries of unsupported shape
//! elsewhere in the policy never get in the way.

use crate::error::PolicyResult;
use crate::models::{AccessPolicy, InstanceTarget, Principal, PrincipalType};

/// Find an instance target by id in any partition.
///
/// # Errors
///
/// Returns [`PolicyError::ParseError`](crate::PolicyError::ParseError) if the
/// matching entry cannot be decoded.
pub fn find_instance(policy: &AccessPolicy, instance_id: &str) -> PolicyResult<Option<InstanceTarget>> {
    Ok(find_instance_with_partition(policy, instance_id)?.map(|(instance, _)| instance))
}

/// Find an instance target and the key of the partition holding it.
pub fn find_instance_with_partition<'a>(
    policy: &'a AccessPolicy,
    instance_id: &str,
) -> PolicyResult<Option<(InstanceTarget, &'a str)>> {
    let found = policy.targets.iter().find_map(|(key, partition)| {
        partition
            .instances
            .iter()
            .find(|entry| entry.instance_id() == Some(instance_id))
            .map(|entry| (entry, key.as_str()))
    });

    match found {
        Some((entry, key)) => Ok(Some((entry.decode()?, key))),
        None => Ok(None),
    }
}

/// Find a principal by its `(id, type)` key.
pub fn find_principal(
    policy: &AccessPolicy,
    principal_id: &str,
    principal_type: PrincipalType,
) -> PolicyResult<Option<Principal>> {
    policy
        .principals
        .iter()
        .find(|entry| entry.matches(principal_id, principal_type))
        .map(|entry| entry.decode())
        .transpose()
}

/// Locate an instance as `(partition_key, index)` for in-place mutation.
#[must_use]
pub fn instance_position(policy: &AccessPolicy, instance_id: &str) -> Option<(String, usize)> {
    policy.targets.iter().find_map(|(key, partition)| {
        partition
            .instances
            .iter()
            .position(|entry| entry.instance_id() == Some(instance_id))
            .map(|index| (key.clone(), index))
    })
}

/// Index of a principal in the policy's principal list.
#[must_use]
pub fn principal_position(
    policy: &AccessPolicy,
    principal_id: &str,
    principal_type: PrincipalType,
) -> Option<usize> {
    policy
        .principals
        .iter()
        .position(|entry| entry.matches(principal_id, principal_type))
}
