//! Remote document types of the policy API.

pub mod entry;
pub mod instance;
pub mod policy;
pub mod principal;
pub mod profile;
pub mod workspace;

pub use entry::{InstanceEntry, PrincipalEntry, RawEntry};
pub use instance::InstanceTarget;
pub use policy::{AccessPolicy, PolicyMetadata, TargetPartition, DEFAULT_PARTITION_KEY};
pub use principal::{ParsePrincipalTypeError, Principal, PrincipalType};
pub use profile::{
    AuthenticationMethod, AuthenticationProfile, DbAuthProfile, LdapAuthProfile,
    MongoAuthProfile, OracleAuthProfile, ParseAuthenticationMethodError, PostgresAuthProfile,
    RoleMatrix, SqlServerAuthProfile,
};
pub use workspace::TargetWorkspace;
