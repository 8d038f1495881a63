//! Principals granted access by a policy.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

/// Kind of identity a principal refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PrincipalType {
    User,
    Group,
    Role,
}

impl PrincipalType {
    /// Wire name of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            PrincipalType::User => "USER",
            PrincipalType::Group => "GROUP",
            PrincipalType::Role => "ROLE",
        }
    }

    /// Users and groups live in a directory and must name it.
    #[must_use]
    pub fn requires_source_directory(&self) -> bool {
        matches!(self, PrincipalType::User | PrincipalType::Group)
    }
}

impl fmt::Display for PrincipalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PrincipalType {
    type Err = ParsePrincipalTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "USER" => Ok(PrincipalType::User),
            "GROUP" => Ok(PrincipalType::Group),
            "ROLE" => Ok(PrincipalType::Role),
            _ => Err(ParsePrincipalTypeError(s.to_string())),
        }
    }
}

/// Error parsing a principal type from a string.
#[derive(Debug, Clone)]
pub struct ParsePrincipalTypeError(String);

impl fmt::Display for ParsePrincipalTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid principal type '{}', expected one of: USER, GROUP, ROLE",
            self.0
        )
    }
}

impl std::error::Error for ParsePrincipalTypeError {}

/// A principal entry in a policy. Unique per `(id, type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub principal_type: PrincipalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_directory_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_directory_id: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_principal_wire_shape() {
        let principal: Principal = serde_json::from_value(json!({
            "id": "u-1",
            "name": "alice@example.com",
            "type": "USER",
            "source_directory_name": "Corp AD",
            "source_directory_id": "dir-1"
        }))
        .unwrap();

        assert_eq!(principal.id, "u-1");
        assert_eq!(principal.principal_type, PrincipalType::User);
        assert_eq!(principal.source_directory_id.as_deref(), Some("dir-1"));
    }

    #[test]
    fn test_role_without_directory() {
        let principal: Principal = serde_json::from_value(json!({
            "id": "r-1",
            "name": "auditors",
            "type": "ROLE"
        }))
        .unwrap();

        assert!(principal.source_directory_name.is_none());
        assert!(!principal.principal_type.requires_source_directory());
        let json = serde_json::to_value(&principal).unwrap();
        assert!(json.get("source_directory_id").is_none());
    }

    #[test]
    fn test_principal_type_parse() {
        assert_eq!("group".parse::<PrincipalType>().unwrap(), PrincipalType::Group);
        assert!("robot".parse::<PrincipalType>().is_err());
    }
}
