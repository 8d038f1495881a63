//! Composite identifiers for assignment pseudo-resources.
//!
//! An assignment has no identity of its own on the remote side. Callers persist
//! a single string built from the ordered foreign keys instead:
//!
//! - target assignment: `policy_id:instance_id`
//! - principal assignment: `policy_id:principal_type:principal_id`
//!
//! Parts are joined without escaping. Parsing limits the number of splits to
//! the expected arity, so the last part may itself contain `:`.

use std::fmt;
use std::str::FromStr;

use crate::error::{PolicyError, PolicyResult};
use crate::models::PrincipalType;

/// Separator between identifier parts.
pub const SEPARATOR: char = ':';

/// Join identifier parts with [`SEPARATOR`].
#[must_use]
pub fn build_composite_id<S: AsRef<str>>(parts: &[S]) -> String {
    parts
        .iter()
        .map(|part| part.as_ref())
        .collect::<Vec<&str>>()
        .join(&SEPARATOR.to_string())
}

/// Split an identifier into exactly `expected_parts` non-empty parts.
/// `expected_parts` must be at least 1.
///
/// The split is limited to `expected_parts`, so any further separators end up
/// in the last part: `parse_composite_id("P1:99:extra", 2)` yields
/// `["P1", "99:extra"]`.
pub fn parse_composite_id(id: &str, expected_parts: usize) -> PolicyResult<Vec<String>> {
    if expected_parts == 0 {
        return Err(PolicyError::malformed_identifier(
            id,
            "an identifier has at least one part",
        ));
    }

    let parts: Vec<String> = id
        .splitn(expected_parts, SEPARATOR)
        .map(str::to_string)
        .collect();

    if parts.len() != expected_parts {
        return Err(PolicyError::malformed_identifier(
            id,
            format!("expected {expected_parts} parts, found {}", parts.len()),
        ));
    }

    if let Some(index) = parts.iter().position(String::is_empty) {
        return Err(PolicyError::malformed_identifier(
            id,
            format!("part {} is empty", index + 1),
        ));
    }

    Ok(parts)
}

/// Check that key parts would survive a round trip through the codec.
///
/// Every part must be non-empty and only the last one may contain the
/// separator.
pub fn validate_parts<S: AsRef<str>>(parts: &[S]) -> PolicyResult<()> {
    let id = build_composite_id(parts);
    let last = parts.len().saturating_sub(1);
    for (index, part) in parts.iter().enumerate() {
        let part = part.as_ref();
        if part.is_empty() {
            return Err(PolicyError::malformed_identifier(
                &id,
                format!("part {} is empty", index + 1),
            ));
        }
        if index < last && part.contains(SEPARATOR) {
            return Err(PolicyError::malformed_identifier(
                &id,
                format!("part {} contains the separator '{SEPARATOR}'", index + 1),
            ));
        }
    }
    Ok(())
}

/// Identity of a policy ↔ target assignment.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetAssignmentId {
    pub policy_id: String,
    pub instance_id: String,
}

impl TargetAssignmentId {
    pub fn new(policy_id: impl Into<String>, instance_id: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            instance_id: instance_id.into(),
        }
    }

    /// Parse from the persisted string form.
    pub fn parse(id: &str) -> PolicyResult<Self> {
        let mut parts = parse_composite_id(id, 2)?.into_iter();
        match (parts.next(), parts.next()) {
            (Some(policy_id), Some(instance_id)) => Ok(Self {
                policy_id,
                instance_id,
            }),
            _ => Err(PolicyError::malformed_identifier(id, "expected 2 parts")),
        }
    }

    /// Reject keys that would not parse back to themselves.
    pub fn validate(&self) -> PolicyResult<()> {
        validate_parts(&[&self.policy_id, &self.instance_id])
    }
}

impl fmt::Display for TargetAssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&build_composite_id(&[&self.policy_id, &self.instance_id]))
    }
}

impl FromStr for TargetAssignmentId {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Identity of a policy ↔ principal assignment.
///
/// The principal id goes last because it is the only free-form part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrincipalAssignmentId {
    pub policy_id: String,
    pub principal_type: PrincipalType,
    pub principal_id: String,
}

impl PrincipalAssignmentId {
    pub fn new(
        policy_id: impl Into<String>,
        principal_type: PrincipalType,
        principal_id: impl Into<String>,
    ) -> Self {
        Self {
            policy_id: policy_id.into(),
            principal_type,
            principal_id: principal_id.into(),
        }
    }

    /// Parse from the persisted string form.
    ///
    /// The type must be spelled exactly as [`Display`](fmt::Display) renders
    /// it (`USER`, `GROUP`, `ROLE`), so a parsed id always prints back as the
    /// input.
    pub fn parse(id: &str) -> PolicyResult<Self> {
        let mut parts = parse_composite_id(id, 3)?.into_iter();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(policy_id), Some(raw_type), Some(principal_id)) => {
                let principal_type = raw_type.parse::<PrincipalType>().map_err(|e| {
                    PolicyError::malformed_identifier(id, e.to_string())
                })?;
                if principal_type.as_str() != raw_type {
                    return Err(PolicyError::malformed_identifier(
                        id,
                        format!("principal type must be written as '{principal_type}'"),
                    ));
                }
                Ok(Self {
                    policy_id,
                    principal_type,
                    principal_id,
                })
            }
            _ => Err(PolicyError::malformed_identifier(id, "expected 3 parts")),
        }
    }

    /// Reject keys that would not parse back to themselves.
    pub fn validate(&self) -> PolicyResult<()> {
        validate_parts(&[
            self.policy_id.as_str(),
            self.principal_type.as_str(),
            self.principal_id.as_str(),
        ])
    }
}

impl fmt::Display for PrincipalAssignmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&build_composite_id(&[
            self.policy_id.as_str(),
            self.principal_type.as_str(),
            self.principal_id.as_str(),
        ]))
    }
}

impl FromStr for PrincipalAssignmentId {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
