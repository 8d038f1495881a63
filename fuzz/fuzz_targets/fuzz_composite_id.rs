//! Fuzz target for composite assignment identifiers.
//!
//! Parsing must never panic, and every identifier that parses must render
//! back to the same string.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_composite_id -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use xavyo_access_policy::ids::{
    build_composite_id, parse_composite_id, PrincipalAssignmentId, TargetAssignmentId,
};

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    assert!(parse_composite_id(s, 0).is_err());

    for arity in 1..=4 {
        if let Ok(parts) = parse_composite_id(s, arity) {
            assert_eq!(parts.len(), arity);
            assert_eq!(build_composite_id(&parts), s);
        }
    }

    if let Ok(id) = TargetAssignmentId::parse(s) {
        assert_eq!(id.to_string(), s);
        assert!(id.validate().is_ok());
    }

    if let Ok(id) = PrincipalAssignmentId::parse(s) {
        assert_eq!(id.to_string(), s);
        assert!(id.validate().is_ok());
    }
});
