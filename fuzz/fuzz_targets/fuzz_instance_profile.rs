//! Fuzz target for instance target documents.
//!
//! Arbitrary JSON must deserialize or fail cleanly, and any instance that
//! deserializes must survive the profile mapping in both directions.
//!
//! Run with:
//! cargo +nightly fuzz run fuzz_instance_profile -- -max_total_time=600

#![no_main]

use libfuzzer_sys::fuzz_target;
use xavyo_access_policy::models::InstanceTarget;
use xavyo_access_policy::profiles::{build_profile, parse_profile};

fuzz_target!(|data: &[u8]| {
    let Ok(target) = serde_json::from_slice::<InstanceTarget>(data) else {
        return;
    };

    let config = parse_profile("P1", &target);
    assert_eq!(config.authentication_method, target.authentication_method());
    let profile = build_profile(&config).expect("parsed config carries its profile block");
    assert!(profile.same_settings(&target.authentication));

    let reencoded = serde_json::to_vec(&target).expect("instance serializes");
    let again: InstanceTarget = serde_json::from_slice(&reencoded).expect("instance re-parses");
    assert_eq!(again, target);
});
