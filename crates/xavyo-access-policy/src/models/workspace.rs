//! Target workspaces referenced by instance assignments.

use serde::{Deserialize, Serialize};

/// A target resource registered with the platform.
///
/// Instance entries embed a copy of `name` and `platform_type`, so a target
/// assignment resolves the workspace before writing the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetWorkspace {
    pub id: String,
    pub name: String,
    pub platform_type: String,
}
