#![no_main]

use libfuzzer_sys::fuzz_target;
use vizeval_core::EvalConfig;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(cfg) = serde_yaml::from_str::<EvalConfig>(text) {
            let _ = cfg.validate();
        }
    }
});
