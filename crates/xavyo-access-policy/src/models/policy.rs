//! The access-policy document.
//!
//! A policy aggregates instance targets (grouped into partitions) and
//! principals. The policy API replaces at most one target partition per
//! write; every other top-level field sent along is taken as-is, so writes are
//! built from the freshly fetched document with all pass-through fields kept.
//! Instances and principals are held in wire form (see [`RawEntry`](crate::models::RawEntry)) so
//! entries an operation does not change are sent back unmodified.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::entry::{InstanceEntry, PrincipalEntry};
use crate::error::{PolicyError, PolicyResult};

/// Partition key used for instance targets unless configured otherwise.
pub const DEFAULT_PARTITION_KEY: &str = "FQDN/IP";

/// Remote-owned policy metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Instance targets sharing a partition key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TargetPartition {
    #[serde(default)]
    pub instances: Vec<InstanceEntry>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A remote access policy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AccessPolicy {
    #[serde(default)]
    pub metadata: PolicyMetadata,
    #[serde(default)]
    pub targets: BTreeMap<String, TargetPartition>,
    #[serde(default)]
    pub principals: Vec<PrincipalEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delegation_classes: Option<Value>,
    /// Top-level fields this crate does not model, preserved on write.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessPolicy {
    /// Copy of this document carrying only the named target partition.
    ///
    /// A partition missing from the document is sent empty, which the policy
    /// API treats as "replace with nothing".
    #[must_use]
    pub fn with_single_partition(&self, partition_key: &str) -> AccessPolicy {
        let partition = self.targets.get(partition_key).cloned().unwrap_or_default();
        AccessPolicy {
            targets: BTreeMap::from([(partition_key.to_string(), partition)]),
            ..self.without_targets()
        }
    }

    /// Copy of this document with no target partition, for principal-only writes.
    #[must_use]
    pub fn without_targets(&self) -> AccessPolicy {
        AccessPolicy {
            metadata: self.metadata.clone(),
            targets: BTreeMap::new(),
            principals: self.principals.clone(),
            conditions: self.conditions.clone(),
            delegation_classes: self.delegation_classes.clone(),
            extra: self.extra.clone(),
        }
    }

    /// Check the one-partition-per-write rule.
    pub fn ensure_writable(&self) -> PolicyResult<()> {
        if self.targets.len() > 1 {
            let keys: Vec<&str> = self.targets.keys().map(String::as_str).collect();
            return Err(PolicyError::InvalidPayload(format!(
                "a write may replace at most one target partition, got {}: {}",
                keys.len(),
                keys.join(", ")
            )));
        }
        Ok(())
    }

    /// Total number of instance targets across partitions.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.targets.values().map(|p| p.instances.len()).sum()
    }
}
