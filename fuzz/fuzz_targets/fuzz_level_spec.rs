// SPDX-License-Identifier: MIT OR Apache-2.0
//! Fuzz level-spec normalization and rule evaluation.
//!
//! Properties:
//! 1. Normalized output always starts and ends with `:`.
//! 2. Normalizing twice changes nothing.
//! 3. Rule evaluation never panics for any major/minor pair.
//! 4. A major absent from the rules is never enabled.
#![no_main]
use libfuzzer_sys::fuzz_target;
use srg_debug::{CompareMode, LevelRules, MinorLevel, normalize_levels};

fuzz_target!(|data: &[u8]| {
    let Some((&probe, rest)) = data.split_first() else {
        return;
    };
    let raw = String::from_utf8_lossy(rest);

    let normalized = normalize_levels(&raw);
    assert!(normalized.starts_with(':') && normalized.ends_with(':'));
    assert_eq!(normalize_levels(&normalized), normalized);

    let rules = LevelRules::parse(&normalized);
    let major = u32::from(probe % 16);
    for minor in [MinorLevel::Number(u32::from(probe)), MinorLevel::Tag("x".into())] {
        let le = rules.is_enabled(CompareMode::Le, major, &minor);
        let _ = rules.is_enabled(CompareMode::Ge, major, &minor);
        if let LevelRules::ByMajor(map) = &rules {
            if !map.contains_key(&major) {
                assert!(!le);
            }
        }
    }
});
