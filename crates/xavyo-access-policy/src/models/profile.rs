//! Authentication profiles attached to instance targets.
//!
//! The policy API stores a profile as one of six optional fields on an
//! instance entry, selected by `authentication_method`. In memory the choice
//! is an [`AuthenticationProfile`] sum type.
//!
//! Keys a profile object carries beyond the modelled ones are kept in its
//! `extra` map and written back with it.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Per-resource role matrix: resource name (database, schema) to role names.
pub type RoleMatrix = BTreeMap<String, Vec<String>>;

/// How a principal authenticates against an instance target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthenticationMethod {
    /// Database-native users granted a list of roles.
    DbAuth,
    /// Directory users added to a list of directory groups.
    LdapAuth,
    /// Oracle users granted roles plus administrative privileges.
    OracleAuth,
    /// MongoDB users with global and per-database builtin roles.
    MongoAuth,
    /// PostgreSQL users with global and per-database builtin roles.
    PostgresAuth,
    /// SQL Server users with builtin and custom roles, global and per-database.
    SqlServerAuth,
}

impl AuthenticationMethod {
    /// Get all authentication methods.
    #[must_use]
    pub fn all() -> &'static [AuthenticationMethod] {
        &[
            AuthenticationMethod::DbAuth,
            AuthenticationMethod::LdapAuth,
            AuthenticationMethod::OracleAuth,
            AuthenticationMethod::MongoAuth,
            AuthenticationMethod::PostgresAuth,
            AuthenticationMethod::SqlServerAuth,
        ]
    }

    /// Wire name of the method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthenticationMethod::DbAuth => "db_auth",
            AuthenticationMethod::LdapAuth => "ldap_auth",
            AuthenticationMethod::OracleAuth => "oracle_auth",
            AuthenticationMethod::MongoAuth => "mongo_auth",
            AuthenticationMethod::PostgresAuth => "postgres_auth",
            AuthenticationMethod::SqlServerAuth => "sql_server_auth",
        }
    }

    /// Name of the field carrying this method's profile.
    #[must_use]
    pub fn profile_field(&self) -> &'static str {
        match self {
            AuthenticationMethod::DbAuth => "db_auth_profile",
            AuthenticationMethod::LdapAuth => "ldap_auth_profile",
            AuthenticationMethod::OracleAuth => "oracle_auth_profile",
            AuthenticationMethod::MongoAuth => "mongo_auth_profile",
            AuthenticationMethod::PostgresAuth => "postgres_auth_profile",
            AuthenticationMethod::SqlServerAuth => "sql_server_auth_profile",
        }
    }
}

impl fmt::Display for AuthenticationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for AuthenticationMethod {
    type Err = ParseAuthenticationMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AuthenticationMethod::all()
            .iter()
            .find(|method| method.as_str() == s.to_lowercase())
            .copied()
            .ok_or_else(|| ParseAuthenticationMethodError(s.to_string()))
    }
}

/// Error parsing an authentication method from a string.
#[derive(Debug, Clone)]
pub struct ParseAuthenticationMethodError(String);

impl fmt::Display for ParseAuthenticationMethodError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let valid: Vec<&str> = AuthenticationMethod::all()
            .iter()
            .map(AuthenticationMethod::as_str)
            .collect();
        write!(
            f,
            "invalid authentication method '{}', expected one of: {}",
            self.0,
            valid.join(", ")
        )
    }
}

impl std::error::Error for ParseAuthenticationMethodError {}

/// Roles granted to a database-native user.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DbAuthProfile {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Directory groups a user is added to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LdapAuthProfile {
    #[serde(default)]
    pub assign_groups: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Oracle roles plus the three administrative privilege flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OracleAuthProfile {
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default)]
    pub dba_role: bool,
    #[serde(default)]
    pub sysdba_role: bool,
    #[serde(default)]
    pub sysoper_role: bool,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// MongoDB global and per-database builtin roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MongoAuthProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_builtin_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_builtin_roles: Option<RoleMatrix>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// PostgreSQL global and per-database builtin roles.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostgresAuthProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_builtin_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_builtin_roles: Option<RoleMatrix>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// SQL Server builtin and custom roles, both global and per-database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SqlServerAuthProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_builtin_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_custom_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_builtin_roles: Option<RoleMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_custom_roles: Option<RoleMatrix>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The single profile attached to an instance target.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthenticationProfile {
    Db(DbAuthProfile),
    Ldap(LdapAuthProfile),
    Oracle(OracleAuthProfile),
    Mongo(MongoAuthProfile),
    Postgres(PostgresAuthProfile),
    SqlServer(SqlServerAuthProfile),
}

impl AuthenticationProfile {
    /// The method tag matching this profile.
    #[must_use]
    pub fn method(&self) -> AuthenticationMethod {
        match self {
            AuthenticationProfile::Db(_) => AuthenticationMethod::DbAuth,
            AuthenticationProfile::Ldap(_) => AuthenticationMethod::LdapAuth,
            AuthenticationProfile::Oracle(_) => AuthenticationMethod::OracleAuth,
            AuthenticationProfile::Mongo(_) => AuthenticationMethod::MongoAuth,
            AuthenticationProfile::Postgres(_) => AuthenticationMethod::PostgresAuth,
            AuthenticationProfile::SqlServer(_) => AuthenticationMethod::SqlServerAuth,
        }
    }

    /// Unmodelled keys of the profile object.
    #[must_use]
    pub fn extra(&self) -> &Map<String, Value> {
        match self {
            AuthenticationProfile::Db(p) => &p.extra,
            AuthenticationProfile::Ldap(p) => &p.extra,
            AuthenticationProfile::Oracle(p) => &p.extra,
            AuthenticationProfile::Mongo(p) => &p.extra,
            AuthenticationProfile::Postgres(p) => &p.extra,
            AuthenticationProfile::SqlServer(p) => &p.extra,
        }
    }

    pub fn extra_mut(&mut self) -> &mut Map<String, Value> {
        match self {
            AuthenticationProfile::Db(p) => &mut p.extra,
            AuthenticationProfile::Ldap(p) => &mut p.extra,
            AuthenticationProfile::Oracle(p) => &mut p.extra,
            AuthenticationProfile::Mongo(p) => &mut p.extra,
            AuthenticationProfile::Postgres(p) => &mut p.extra,
            AuthenticationProfile::SqlServer(p) => &mut p.extra,
        }
    }

    /// Compare the modelled settings only, ignoring unmodelled keys.
    #[must_use]
    pub fn same_settings(&self, other: &AuthenticationProfile) -> bool {
        let mut left = self.clone();
        left.extra_mut().clear();
        let mut right = other.clone();
        right.extra_mut().clear();
        left == right
    }

    /// An empty profile of the given method.
    #[must_use]
    pub fn empty(method: AuthenticationMethod) -> Self {
        match method {
            AuthenticationMethod::DbAuth => AuthenticationProfile::Db(DbAuthProfile::default()),
            AuthenticationMethod::LdapAuth => {
                AuthenticationProfile::Ldap(LdapAuthProfile::default())
            }
            AuthenticationMethod::OracleAuth => {
                AuthenticationProfile::Oracle(OracleAuthProfile::default())
            }
            AuthenticationMethod::MongoAuth => {
                AuthenticationProfile::Mongo(MongoAuthProfile::default())
            }
            AuthenticationMethod::PostgresAuth => {
                AuthenticationProfile::Postgres(PostgresAuthProfile::default())
            }
            AuthenticationMethod::SqlServerAuth => {
                AuthenticationProfile::SqlServer(SqlServerAuthProfile::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_wire_names() {
        for method in AuthenticationMethod::all() {
            let json = serde_json::to_string(method).unwrap();
            assert_eq!(json, format!("\"{}\"", method.as_str()));
            let parsed: AuthenticationMethod = method.as_str().parse().unwrap();
            assert_eq!(parsed, *method);
        }
    }

    #[test]
    fn test_method_from_str_rejects_unknown() {
        let err = "kerberos".parse::<AuthenticationMethod>().unwrap_err();
        assert!(err.to_string().contains("db_auth"));
    }

    #[test]
    fn test_empty_profile_matches_method() {
        for method in AuthenticationMethod::all() {
            assert_eq!(AuthenticationProfile::empty(*method).method(), *method);
        }
    }

    #[test]
    fn test_matrix_profile_omits_unset_fields() {
        let profile = MongoAuthProfile {
            global_builtin_roles: Some(vec![]),
            database_builtin_roles: None,
            ..MongoAuthProfile::default()
        };
        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json, serde_json::json!({ "global_builtin_roles": [] }));
    }

    #[test]
    fn test_unmodelled_profile_keys_round_trip() {
        let source = serde_json::json!({ "roles": ["read"], "password_rotation": "weekly" });
        let profile: DbAuthProfile = serde_json::from_value(source.clone()).unwrap();
        assert_eq!(profile.roles, vec!["read".to_string()]);
        assert_eq!(profile.extra["password_rotation"], "weekly");
        assert_eq!(serde_json::to_value(&profile).unwrap(), source);
    }

    #[test]
    fn test_same_settings_ignores_unmodelled_keys() {
        let plain = AuthenticationProfile::Db(DbAuthProfile {
            roles: vec!["read".into()],
            ..DbAuthProfile::default()
        });
        let mut annotated = plain.clone();
        annotated
            .extra_mut()
            .insert("password_rotation".into(), "weekly".into());

        assert_ne!(plain, annotated);
        assert!(plain.same_settings(&annotated));
        assert!(!plain.same_settings(&AuthenticationProfile::empty(AuthenticationMethod::DbAuth)));
    }
}
