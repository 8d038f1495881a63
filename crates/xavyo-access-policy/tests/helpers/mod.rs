//! Shared helpers for access-policy integration tests.

pub mod fake_policy_api;
pub mod test_data;
