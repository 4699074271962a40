// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz RunConfig TOML parsing and validation.
//!
//! Feeds arbitrary strings through `parse_toml` and `validate_config`,
//! verifying:
//! 1. `parse_toml` never panics on arbitrary input.
//! 2. Parsed overlays can be validated without panics.
//! 3. Round-trip: serialize back to TOML and re-parse produces the same overlay.
#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };

    let Ok(config) = srg_config::parse_toml(s) else {
        return;
    };

    match srg_config::validate_config(&config) {
        Ok(warnings) => {
            for w in &warnings {
                let _ = format!("{w}");
            }
        }
        Err(e) => {
            let _ = format!("{e}");
        }
    }

    if let Ok(toml_str) = toml::to_string(&config) {
        if let Ok(rt) = srg_config::parse_toml(&toml_str) {
            assert_eq!(config, rt, "TOML round-trip must be lossless");
        }
    }
});
