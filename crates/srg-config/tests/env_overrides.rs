// SPDX-License-Identifier: MIT OR Apache-2.0
//! Environment overrides for `srg-config`.

use serial_test::serial;
use srg_config::{DEFAULT_PAGE_SIZE, RunConfig, apply_env_overrides, load_config};
use std::io::Write;

/// Guard that removes SRG_* env vars on drop. Tests that set env vars should
/// hold this guard for the duration of the test.
struct EnvGuard {
    keys: Vec<&'static str>,
}

impl EnvGuard {
    fn new(pairs: &[(&'static str, &str)]) -> Self {
        let keys: Vec<&'static str> = pairs.iter().map(|(k, _)| *k).collect();
        for (k, v) in pairs {
            // SAFETY: these tests run serially (env vars are process-global).
            unsafe { std::env::set_var(k, v) };
        }
        Self { keys }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for k in &self.keys {
            // SAFETY: restoring env to previous state on drop.
            unsafe { std::env::remove_var(k) };
        }
    }
}

#[test]
#[serial]
fn env_overrides_apply_to_defaults() {
    let _g = EnvGuard::new(&[
        ("SRG_PAGE_SIZE", "125"),
        ("SRG_OUTPUT", "/tmp/chart.html"),
        ("SRG_DEBUG_DEFINITIONS", "/etc/srg/debug.json"),
    ]);
    let cfg = load_config(None).unwrap();
    assert_eq!(cfg.page_size(), 125);
    assert_eq!(cfg.output(), "/tmp/chart.html");
    assert_eq!(cfg.debug_definitions.as_deref(), Some("/etc/srg/debug.json"));
}

#[test]
#[serial]
fn env_beats_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("run.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    writeln!(f, "page_size = 50\noutput = \"file.html\"").unwrap();

    let _g = EnvGuard::new(&[("SRG_OUTPUT", "env.html")]);
    let cfg = load_config(Some(&path)).unwrap();
    assert_eq!(cfg.page_size(), 50);
    assert_eq!(cfg.output(), "env.html");
}

#[test]
#[serial]
fn non_numeric_page_size_is_ignored() {
    let _g = EnvGuard::new(&[("SRG_PAGE_SIZE", "many")]);
    let mut cfg = RunConfig::default();
    apply_env_overrides(&mut cfg);
    assert_eq!(cfg.page_size(), DEFAULT_PAGE_SIZE);
}
