//! Fuzz target for the TOML configuration parser.
//!
//! Run with: cargo +nightly fuzz run fuzz_config_parser

#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = bzlnav_config::AppConfig::parse(s) {
        // Anything that parsed has passed validation.
        assert!(!config.workspace.markers.is_empty());
        assert!(!config.query.command.is_empty());
        assert!(config.validate().is_ok());
    }
});
