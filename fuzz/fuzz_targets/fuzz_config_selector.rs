//! Fuzz target for selector.json parsing and validation.

#![no_main]

use hs_config::{validate_config, HmmSelectConfig};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = HmmSelectConfig::from_json(text) {
        if validate_config(&config).is_ok() {
            assert!(!config.selector.candidates().is_empty());
        }
    }
});
