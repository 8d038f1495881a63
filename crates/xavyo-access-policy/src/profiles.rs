//! Conversion between caller profile blocks and remote authentication profiles.
//!
//! [`build_profile`] turns the block selected by a config's
//! `authentication_method` into an [`AuthenticationProfile`], [`attach_profile`]
//! places it on an instance entry, and [`parse_profile`] reads it back.
//!
//! Optional role lists and role matrices keep the absent/empty distinction in
//! both directions: `None` stays unset on the remote side and an empty
//! collection stays empty.

use serde_json::Map;

use crate::assignment::{
    DbAuthProfileConfig, LdapAuthProfileConfig, MongoAuthProfileConfig,
    OracleAuthProfileConfig, PostgresAuthProfileConfig, SqlServerAuthProfileConfig,
    TargetAssignmentConfig,
};
use crate::error::{PolicyError, PolicyResult};
use crate::models::{
    AuthenticationMethod, AuthenticationProfile, DbAuthProfile, InstanceTarget, LdapAuthProfile,
    MongoAuthProfile, OracleAuthProfile, PostgresAuthProfile, SqlServerAuthProfile,
};

/// Build the remote profile for the config's declared method.
///
/// Blocks belonging to other methods are ignored.
///
/// # Errors
///
/// Returns [`PolicyError::MissingProfileBlock`] if the block matching
/// `authentication_method` is absent.
pub fn build_profile(config: &TargetAssignmentConfig) -> PolicyResult<AuthenticationProfile> {
    let method = config.authentication_method;
    let missing = || PolicyError::MissingProfileBlock { method };

    let profile = match method {
        AuthenticationMethod::DbAuth => {
            let block = config.db_auth_profile.as_ref().ok_or_else(missing)?;
            AuthenticationProfile::Db(DbAuthProfile {
                roles: block.roles.clone(),
                extra: Map::new(),
            })
        }
        AuthenticationMethod::LdapAuth => {
            let block = config.ldap_auth_profile.as_ref().ok_or_else(missing)?;
            AuthenticationProfile::Ldap(LdapAuthProfile {
                assign_groups: block.assign_groups.clone(),
                extra: Map::new(),
            })
        }
        AuthenticationMethod::OracleAuth => {
            let block = config.oracle_auth_profile.as_ref().ok_or_else(missing)?;
            AuthenticationProfile::Oracle(OracleAuthProfile {
                roles: block.roles.clone(),
                dba_role: block.dba_role,
                sysdba_role: block.sysdba_role,
                sysoper_role: block.sysoper_role,
                extra: Map::new(),
            })
        }
        AuthenticationMethod::MongoAuth => {
            let block = config.mongo_auth_profile.as_ref().ok_or_else(missing)?;
            AuthenticationProfile::Mongo(MongoAuthProfile {
                global_builtin_roles: block.global_builtin_roles.clone(),
                database_builtin_roles: block.database_builtin_roles.clone(),
                extra: Map::new(),
            })
        }
        AuthenticationMethod::PostgresAuth => {
            let block = config.postgres_auth_profile.as_ref().ok_or_else(missing)?;
            AuthenticationProfile::Postgres(PostgresAuthProfile {
                global_builtin_roles: block.global_builtin_roles.clone(),
                database_builtin_roles: block.database_builtin_roles.clone(),
                extra: Map::new(),
            })
        }
        AuthenticationMethod::SqlServerAuth => {
            let block = config.sql_server_auth_profile.as_ref().ok_or_else(missing)?;
            AuthenticationProfile::SqlServer(SqlServerAuthProfile {
                global_builtin_roles: block.global_builtin_roles.clone(),
                global_custom_roles: block.global_custom_roles.clone(),
                database_builtin_roles: block.database_builtin_roles.clone(),
                database_custom_roles: block.database_custom_roles.clone(),
                extra: Map::new(),
            })
        }
    };

    Ok(profile)
}

/// Replace the entry's profile (and therefore its method) with `profile`.
///
/// When the method stays the same, unmodelled keys of the previous profile
/// object are carried over unless `profile` sets them itself.
pub fn attach_profile(target: &mut InstanceTarget, mut profile: AuthenticationProfile) {
    if profile.method() == target.authentication_method() {
        let previous = std::mem::take(target.authentication.extra_mut());
        let extra = profile.extra_mut();
        for (key, value) in previous {
            extra.entry(key).or_insert(value);
        }
    }
    target.authentication = profile;
}

/// Reconstruct the caller config for an instance entry.
///
/// Only the block matching the entry's method is filled in.
#[must_use]
pub fn parse_profile(policy_id: &str, target: &InstanceTarget) -> TargetAssignmentConfig {
    let config = TargetAssignmentConfig::new(
        policy_id,
        &target.instance_id,
        target.authentication_method(),
    );

    match &target.authentication {
        AuthenticationProfile::Db(p) => config.with_db_auth(DbAuthProfileConfig {
            roles: p.roles.clone(),
        }),
        AuthenticationProfile::Ldap(p) => config.with_ldap_auth(LdapAuthProfileConfig {
            assign_groups: p.assign_groups.clone(),
        }),
        AuthenticationProfile::Oracle(p) => config.with_oracle_auth(OracleAuthProfileConfig {
            roles: p.roles.clone(),
            dba_role: p.dba_role,
            sysdba_role: p.sysdba_role,
            sysoper_role: p.sysoper_role,
        }),
        AuthenticationProfile::Mongo(p) => config.with_mongo_auth(MongoAuthProfileConfig {
            global_builtin_roles: p.global_builtin_roles.clone(),
            database_builtin_roles: p.database_builtin_roles.clone(),
        }),
        AuthenticationProfile::Postgres(p) => {
            config.with_postgres_auth(PostgresAuthProfileConfig {
                global_builtin_roles: p.global_builtin_roles.clone(),
                database_builtin_roles: p.database_builtin_roles.clone(),
            })
        }
        AuthenticationProfile::SqlServer(p) => {
            config.with_sql_server_auth(SqlServerAuthProfileConfig {
                global_builtin_roles: p.global_builtin_roles.clone(),
                global_custom_roles: p.global_custom_roles.clone(),
                database_builtin_roles: p.database_builtin_roles.clone(),
                database_custom_roles: p.database_custom_roles.clone(),
            })
        }
    }
}
