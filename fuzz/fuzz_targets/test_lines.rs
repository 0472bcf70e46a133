#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        if let Ok(tests) = vizeval_core::loader::parse_tests(text) {
            let _ = vizeval_core::loader::sample_per_group(tests, 1);
        }
    }
});
