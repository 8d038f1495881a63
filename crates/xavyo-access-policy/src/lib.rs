//! # Access-Policy Assignment Reconciliation
//!
//! Keeps policy ↔ target and policy ↔ principal assignments in a remote
//! access policy in line with a caller's desired configuration.
//!
//! An access policy is a shared document: instance targets grouped into
//! partitions, a principal list and pass-through fields such as conditions.
//! The policy API replaces at most one target partition per write, so every
//! operation fetches the document fresh, changes one entry in memory and
//! writes back only what it touched.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use xavyo_access_policy::prelude::*;
//!
//! let config = ClientConfig::from_env()?;
//! let client = Arc::new(build_policy_client(&config)?);
//! let reconciler = Reconciler::new(client.clone()).with_retry(config.retry.clone());
//!
//! let targets = reconciler.targets(client);
//! let desired = TargetAssignmentConfig::new("P1", "42", AuthenticationMethod::DbAuth)
//!     .with_db_auth(DbAuthProfileConfig { roles: vec!["connect".into()] });
//! let id = targets.create(&desired).await?;          // "P1:42"
//! let current = targets.read(&id.to_string()).await?; // Found(..) or Removed
//! ```
//!
//! ## Crate Organization
//!
//! - [`ids`] - Composite assignment identifiers
//! - [`models`] - Remote document types (policy, instance, principal, profiles)
//! - [`assignment`] - Caller-facing configuration structures
//! - [`profiles`] - Build/attach/parse of authentication profiles
//! - [`accessor`] - Lookups inside a fetched policy
//! - [`reconciler`] - The create/read/update/delete/import engine
//! - [`api`] - Remote collaborator traits
//! - [`client`] - reqwest implementation of the collaborators
//! - [`retry`] - Exponential backoff for transient failures
//! - [`config`] - Environment-driven client configuration
//! - [`error`] - Error types with transient/not-found classification

pub mod accessor;
pub mod api;
pub mod assignment;
pub mod client;
pub mod config;
pub mod error;
pub mod ids;
pub mod models;
pub mod profiles;
pub mod reconciler;
pub mod retry;

pub use error::{PolicyError, PolicyResult};

/// Prelude module for convenient imports.
///
/// ```
/// use xavyo_access_policy::prelude::*;
/// ```
pub mod prelude {
    // Identifiers
    pub use crate::ids::{PrincipalAssignmentId, TargetAssignmentId};

    // Caller configuration
    pub use crate::assignment::{
        DbAuthProfileConfig, LdapAuthProfileConfig, MongoAuthProfileConfig,
        OracleAuthProfileConfig, PostgresAuthProfileConfig, PrincipalAssignmentConfig,
        ReadOutcome, SqlServerAuthProfileConfig, TargetAssignmentConfig,
    };

    // Remote model
    pub use crate::models::{
        AccessPolicy, AuthenticationMethod, AuthenticationProfile, InstanceTarget, Principal,
        PrincipalType, TargetWorkspace,
    };

    // Error handling
    pub use crate::error::{PolicyError, PolicyResult};

    // Engine
    pub use crate::reconciler::{
        CreateMode, PrincipalAssignments, Reconciler, ReconcilerOptions, TargetAssignments,
    };

    // Transport
    pub use crate::api::{PolicyApi, WorkspaceApi};
    pub use crate::client::{build_policy_client, PolicyClient};
    pub use crate::config::ClientConfig;
    pub use crate::retry::RetryPolicy;
}

// Re-export async_trait for PolicyApi implementors
pub use async_trait::async_trait;
