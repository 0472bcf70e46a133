#![no_main]

use libfuzzer_sys::fuzz_target;
use vizeval_core::storage::{decode_key, encode_key};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let key = encode_key(text);
    assert!(!key.contains('/') && !key.contains('\\'));
    assert!(key != "." && key != "..");
    assert_eq!(decode_key(&key).as_deref(), Some(text));

    let _ = decode_key(text);
});
