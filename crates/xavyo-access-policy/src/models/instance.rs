//! Instance targets listed inside a policy partition.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::profile::{
    AuthenticationMethod, AuthenticationProfile, DbAuthProfile, LdapAuthProfile,
    MongoAuthProfile, OracleAuthProfile, PostgresAuthProfile, SqlServerAuthProfile,
};

/// A target resource (database, server) granted by a policy.
///
/// Serializes to the policy API's shape: an `authentication_method` tag plus
/// exactly one of the six `*_profile` fields. Decoding picks the field named
/// by the tag; other profile fields are dropped and a missing one decodes as
/// an empty profile of that method. Only entries being written are decoded;
/// the rest of a policy stays in wire form (see
/// [`InstanceEntry`](crate::models::InstanceEntry)).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "InstanceTargetRepr", into = "InstanceTargetRepr")]
pub struct InstanceTarget {
    pub instance_id: String,
    pub instance_name: String,
    pub instance_type: String,
    pub authentication: AuthenticationProfile,
    /// Fields this crate does not model, preserved on write.
    pub extra: Map<String, Value>,
}

impl InstanceTarget {
    #[must_use]
    pub fn authentication_method(&self) -> AuthenticationMethod {
        self.authentication.method()
    }
}

#[derive(Serialize, Deserialize)]
struct InstanceTargetRepr {
    instance_id: String,
    #[serde(default)]
    instance_name: String,
    #[serde(default)]
    instance_type: String,
    authentication_method: AuthenticationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    db_auth_profile: Option<DbAuthProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    ldap_auth_profile: Option<LdapAuthProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    oracle_auth_profile: Option<OracleAuthProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    mongo_auth_profile: Option<MongoAuthProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    postgres_auth_profile: Option<PostgresAuthProfile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sql_server_auth_profile: Option<SqlServerAuthProfile>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl From<InstanceTargetRepr> for InstanceTarget {
    fn from(repr: InstanceTargetRepr) -> Self {
        let method = repr.authentication_method;
        let selected = match method {
            AuthenticationMethod::DbAuth => repr.db_auth_profile.map(AuthenticationProfile::Db),
            AuthenticationMethod::LdapAuth => {
                repr.ldap_auth_profile.map(AuthenticationProfile::Ldap)
            }
            AuthenticationMethod::OracleAuth => {
                repr.oracle_auth_profile.map(AuthenticationProfile::Oracle)
            }
            AuthenticationMethod::MongoAuth => {
                repr.mongo_auth_profile.map(AuthenticationProfile::Mongo)
            }
            AuthenticationMethod::PostgresAuth => {
                repr.postgres_auth_profile.map(AuthenticationProfile::Postgres)
            }
            AuthenticationMethod::SqlServerAuth => {
                repr.sql_server_auth_profile.map(AuthenticationProfile::SqlServer)
            }
        };

        Self {
            instance_id: repr.instance_id,
            instance_name: repr.instance_name,
            instance_type: repr.instance_type,
            authentication: selected.unwrap_or_else(|| AuthenticationProfile::empty(method)),
            extra: repr.extra,
        }
    }
}

impl From<InstanceTarget> for InstanceTargetRepr {
    fn from(target: InstanceTarget) -> Self {
        let mut repr = InstanceTargetRepr {
            instance_id: target.instance_id,
            instance_name: target.instance_name,
            instance_type: target.instance_type,
            authentication_method: target.authentication.method(),
            db_auth_profile: None,
            ldap_auth_profile: None,
            oracle_auth_profile: None,
            mongo_auth_profile: None,
            postgres_auth_profile: None,
            sql_server_auth_profile: None,
            extra: target.extra,
        };

        match target.authentication {
            AuthenticationProfile::Db(p) => repr.db_auth_profile = Some(p),
            AuthenticationProfile::Ldap(p) => repr.ldap_auth_profile = Some(p),
            AuthenticationProfile::Oracle(p) => repr.oracle_auth_profile = Some(p),
            AuthenticationProfile::Mongo(p) => repr.mongo_auth_profile = Some(p),
            AuthenticationProfile::Postgres(p) => repr.postgres_auth_profile = Some(p),
            AuthenticationProfile::SqlServer(p) => repr.sql_server_auth_profile = Some(p),
        }

        repr
    }
}
