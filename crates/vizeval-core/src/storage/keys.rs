//! Test id <-> entry file stem.
//!
//! Ids keep `[A-Za-z0-9._@-]` as-is; every other byte becomes `%HH`. The
//! mapping is reversible so entries can be listed back into test ids.

fn is_plain(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'@' | b'-')
}

pub fn encode_key(test_id: &str) -> String {
    let mut out = String::with_capacity(test_id.len());
    for b in test_id.bytes() {
        if is_plain(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{:02X}", b));
        }
    }
    // "." and ".." are not usable as stems on their own.
    if out.chars().all(|c| c == '.') {
        return out.replace('.', "%2E");
    }
    out
}

pub fn decode_key(stem: &str) -> Option<String> {
    let bytes = stem.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = stem.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ids_are_untouched() {
        assert_eq!(encode_key("42@y_name@DESC"), "42@y_name@DESC");
    }

    #[test]
    fn path_separators_are_escaped() {
        let k = encode_key("../etc/passwd");
        assert!(!k.contains('/'));
        assert_eq!(decode_key(&k).as_deref(), Some("../etc/passwd"));
    }

    #[test]
    fn dot_only_ids_are_escaped() {
        assert_eq!(encode_key(".."), "%2E%2E");
        assert_eq!(decode_key("%2E%2E").as_deref(), Some(".."));
    }

    #[test]
    fn unicode_roundtrips() {
        let id = "prüfung 7";
        assert_eq!(decode_key(&encode_key(id)).as_deref(), Some(id));
    }

    #[test]
    fn truncated_escape_is_rejected() {
        assert_eq!(decode_key("abc%4"), None);
    }
}
