//! Caller-facing assignment configuration.
//!
//! These are the plain structures reconciliation operations take and return.
//! A target assignment declares an `authentication_method` and carries the
//! matching profile block; blocks for other methods are ignored on write and
//! come back empty on read.

use serde::{Deserialize, Serialize};

use crate::ids::{PrincipalAssignmentId, TargetAssignmentId};
use crate::models::{AuthenticationMethod, PrincipalType, RoleMatrix};

/// Desired state of a policy ↔ target assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAssignmentConfig {
    pub policy_id: String,
    pub instance_id: String,
    pub authentication_method: AuthenticationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_auth_profile: Option<DbAuthProfileConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ldap_auth_profile: Option<LdapAuthProfileConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oracle_auth_profile: Option<OracleAuthProfileConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mongo_auth_profile: Option<MongoAuthProfileConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postgres_auth_profile: Option<PostgresAuthProfileConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sql_server_auth_profile: Option<SqlServerAuthProfileConfig>,
}

impl TargetAssignmentConfig {
    /// Config with a method and no profile blocks yet.
    pub fn new(
        policy_id: impl Into<String>,
        instance_id: impl Into<String>,
        authentication_method: AuthenticationMethod,
    ) -> Self {
        Self {
            policy_id: policy_id.into(),
            instance_id: instance_id.into(),
            authentication_method,
            db_auth_profile: None,
            ldap_auth_profile: None,
            oracle_auth_profile: None,
            mongo_auth_profile: None,
            postgres_auth_profile: None,
            sql_server_auth_profile: None,
        }
    }

    /// Identity this config maps to.
    #[must_use]
    pub fn assignment_id(&self) -> TargetAssignmentId {
        TargetAssignmentId::new(&self.policy_id, &self.instance_id)
    }

    #[must_use]
    pub fn with_db_auth(mut self, profile: DbAuthProfileConfig) -> Self {
        self.db_auth_profile = Some(profile);
        self
    }

    #[must_use]
    pub fn with_ldap_auth(mut self, profile: LdapAuthProfileConfig) -> Self {
        self.ldap_auth_profile = Some(profile);
        self
    }

    #[must_use]
    pub fn with_oracle_auth(mut self, profile: OracleAuthProfileConfig) -> Self {
        self.oracle_auth_profile = Some(profile);
        self
    }

    #[must_use]
    pub fn with_mongo_auth(mut self, profile: MongoAuthProfileConfig) -> Self {
        self.mongo_auth_profile = Some(profile);
        self
    }

    #[must_use]
    pub fn with_postgres_auth(mut self, profile: PostgresAuthProfileConfig) -> Self {
        self.postgres_auth_profile = Some(profile);
        self
    }

    #[must_use]
    pub fn with_sql_server_auth(mut self, profile: SqlServerAuthProfileConfig) -> Self {
        self.sql_server_auth_profile = Some(profile);
        self
    }
}

/// `db_auth`: roles granted to the ephemeral database user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbAuthProfileConfig {
    pub roles: Vec<String>,
}

/// `ldap_auth`: directory groups the user is added to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LdapAuthProfileConfig {
    pub assign_groups: Vec<String>,
}

/// `oracle_auth`: roles plus administrative privileges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleAuthProfileConfig {
    pub roles: Vec<String>,
    #[serde(default)]
    pub dba_role: bool,
    #[serde(default)]
    pub sysdba_role: bool,
    #[serde(default)]
    pub sysoper_role: bool,
}

/// `mongo_auth`: global and per-database builtin roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MongoAuthProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_builtin_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_builtin_roles: Option<RoleMatrix>,
}

/// `postgres_auth`: global and per-database builtin roles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostgresAuthProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_builtin_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_builtin_roles: Option<RoleMatrix>,
}

/// `sql_server_auth`: builtin and custom roles, global and per-database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SqlServerAuthProfileConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_builtin_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_custom_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_builtin_roles: Option<RoleMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_custom_roles: Option<RoleMatrix>,
}

/// Desired state of a policy ↔ principal assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrincipalAssignmentConfig {
    pub policy_id: String,
    pub principal_id: String,
    pub principal_type: PrincipalType,
    pub principal_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_directory_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_directory_id: Option<String>,
}

impl PrincipalAssignmentConfig {
    /// Identity this config maps to.
    #[must_use]
    pub fn assignment_id(&self) -> PrincipalAssignmentId {
        PrincipalAssignmentId::new(&self.policy_id, self.principal_type, &self.principal_id)
    }
}

/// Result of reading an assignment back from the policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome<T> {
    /// The assignment exists; here is its current state.
    Found(T),
    /// The assignment (or something it depends on) is gone; drop local state.
    Removed,
}

impl<T> ReadOutcome<T> {
    #[must_use]
    pub fn is_removed(&self) -> bool {
        matches!(self, ReadOutcome::Removed)
    }

    /// The found value, if any.
    pub fn found(self) -> Option<T> {
        match self {
            ReadOutcome::Found(value) => Some(value),
            ReadOutcome::Removed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_target_config_from_json() {
        let config: TargetAssignmentConfig = serde_json::from_value(json!({
            "policy_id": "P1",
            "instance_id": "42",
            "authentication_method": "db_auth",
            "db_auth_profile": { "roles": ["connect"] }
        }))
        .unwrap();

        assert_eq!(
            config,
            TargetAssignmentConfig::new("P1", "42", AuthenticationMethod::DbAuth)
                .with_db_auth(DbAuthProfileConfig {
                    roles: vec!["connect".into()]
                })
        );
        assert_eq!(config.assignment_id().to_string(), "P1:42");
    }

    #[test]
    fn test_principal_config_assignment_id() {
        let config = PrincipalAssignmentConfig {
            policy_id: "P1".into(),
            principal_id: "u-1".into(),
            principal_type: PrincipalType::User,
            principal_name: "alice".into(),
            source_directory_name: Some("Corp AD".into()),
            source_directory_id: Some("dir-1".into()),
        };
        assert_eq!(config.assignment_id().to_string(), "P1:USER:u-1");
    }

    #[test]
    fn test_read_outcome() {
        assert!(ReadOutcome::<()>::Removed.is_removed());
        assert_eq!(ReadOutcome::Found(3).found(), Some(3));
    }
}
