//! List entries kept in the form the policy API returned them.
//!
//! Writes send every entry back as stored, so an entry no operation touched
//! goes out exactly as it came in: fields, stale profile slots and
//! authentication methods this crate does not model included. Only the entry
//! an operation works on is decoded into its typed form and encoded again.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

use super::instance::InstanceTarget;
use super::principal::{Principal, PrincipalType};
use crate::error::{PolicyError, PolicyResult};

/// A list entry held as the JSON value the policy API sent.
pub struct RawEntry<T> {
    value: Value,
    kind: PhantomData<fn() -> T>,
}

/// An instance target in wire form.
pub type InstanceEntry = RawEntry<InstanceTarget>;

/// A principal in wire form.
pub type PrincipalEntry = RawEntry<Principal>;

impl<T> RawEntry<T> {
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Self {
            value,
            kind: PhantomData,
        }
    }

    #[must_use]
    pub fn as_value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn into_value(self) -> Value {
        self.value
    }

    fn str_field(&self, name: &str) -> Option<&str> {
        self.value.get(name).and_then(Value::as_str)
    }
}

impl<T: Serialize> RawEntry<T> {
    /// Wire form of a typed entry.
    pub fn encode(entry: &T) -> PolicyResult<Self> {
        Ok(Self::from_value(serde_json::to_value(entry)?))
    }
}

impl<T: DeserializeOwned> RawEntry<T> {
    /// Typed view of the entry.
    ///
    /// # Errors
    ///
    /// Returns [`PolicyError::ParseError`] if the entry uses a shape this crate
    /// cannot represent, such as an unknown authentication method.
    pub fn decode(&self) -> PolicyResult<T> {
        T::deserialize(&self.value)
            .map_err(|e| PolicyError::ParseError(format!("unsupported policy entry: {e}")))
    }
}

impl RawEntry<InstanceTarget> {
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.str_field("instance_id")
    }
}

impl RawEntry<Principal> {
    #[must_use]
    pub fn principal_id(&self) -> Option<&str> {
        self.str_field("id")
    }

    /// Whether this entry has the given compound key. The type must be in its
    /// canonical upper-case wire form.
    #[must_use]
    pub fn matches(&self, principal_id: &str, principal_type: PrincipalType) -> bool {
        self.principal_id() == Some(principal_id)
            && self.str_field("type") == Some(principal_type.as_str())
    }
}

impl<T> Clone for RawEntry<T> {
    fn clone(&self) -> Self {
        Self::from_value(self.value.clone())
    }
}

impl<T> PartialEq for RawEntry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> fmt::Debug for RawEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawEntry").field(&self.value).finish()
    }
}

impl<T> From<Value> for RawEntry<T> {
    fn from(value: Value) -> Self {
        Self::from_value(value)
    }
}

impl<T> Serialize for RawEntry<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for RawEntry<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::from_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_method_stays_opaque() {
        let source = json!({
            "instance_id": "55",
            "instance_name": "warehouse",
            "authentication_method": "rds_iam_user_auth",
            "rds_iam_user_auth_profile": { "db_user": "reporting" }
        });
        let entry: InstanceEntry = serde_json::from_value(source.clone()).unwrap();

        assert_eq!(entry.instance_id(), Some("55"));
        assert_eq!(serde_json::to_value(&entry).unwrap(), source);
        assert!(matches!(entry.decode(), Err(PolicyError::ParseError(_))));
    }

    #[test]
    fn test_decode_and_encode_instance() {
        let entry: InstanceEntry = serde_json::from_value(json!({
            "instance_id": "42",
            "instance_name": "orders-db",
            "instance_type": "Postgres",
            "authentication_method": "db_auth",
            "db_auth_profile": { "roles": ["connect"] }
        }))
        .unwrap();

        let target = entry.decode().unwrap();
        assert_eq!(target.instance_id, "42");
        assert_eq!(InstanceEntry::encode(&target).unwrap(), entry);
    }

    #[test]
    fn test_principal_key_matching() {
        let entry: PrincipalEntry = serde_json::from_value(json!({
            "id": "u-1",
            "name": "alice",
            "type": "USER",
            "source_directory_name": null
        }))
        .unwrap();

        assert!(entry.matches("u-1", PrincipalType::User));
        assert!(!entry.matches("u-1", PrincipalType::Group));
        assert!(!entry.matches("u-2", PrincipalType::User));

        let lower: PrincipalEntry = serde_json::from_value(json!({ "id": "u-1", "type": "user" }))
            .unwrap();
        assert!(!lower.matches("u-1", PrincipalType::User));
    }
}
