//! Object key validation
//!
//! Keys are non-empty Unicode strings whose UTF-8 encoding is at most 1024
//! bytes. Listing responses are XML 1.0 documents, so keys may only contain
//! characters that are legal in XML 1.0 (XML 1.0, section 2.2).

use thiserror::Error;

/// Longest key accepted, in bytes of UTF-8
pub const MAX_KEY_LEN: usize = 1024;

/// Reasons a key is rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Keys may be no longer than 1024 bytes (got {0} bytes)")]
    TooLong(usize),

    #[error("Keys must be valid UTF-8")]
    InvalidUtf8,

    #[error("Keys must be non-empty")]
    Empty,

    #[error("Key contains invalid codepoint: {}", codepoint(.0))]
    InvalidCodepoint(char),
}

fn codepoint(c: &char) -> String {
    format!("U+{:04X}", *c as u32)
}

/// Whether `c` is a legal XML 1.0 character.
pub fn is_legal_xml_char(c: u32) -> bool {
    c == 0x09
        || c == 0x0A
        || c == 0x0D
        || (0x20..=0xD7FF).contains(&c)
        || (0xE000..=0xFFFD).contains(&c)
        || (0x10000..=0x10FFFF).contains(&c)
}

/// Validate a key, returning it as `&str` on success.
pub fn validate_key(key: &[u8]) -> Result<&str, KeyError> {
    if key.len() > MAX_KEY_LEN {
        return Err(KeyError::TooLong(key.len()));
    }

    let key = std::str::from_utf8(key).map_err(|_| KeyError::InvalidUtf8)?;

    // An empty key could never be listed: the empty marker means "from the start".
    if key.is_empty() {
        return Err(KeyError::Empty);
    }

    match key.chars().find(|&c| !is_legal_xml_char(c as u32)) {
        Some(c) => Err(KeyError::InvalidCodepoint(c)),
        None => Ok(key),
    }
}

/// Validate a listing marker: empty (start of range) or a valid key.
pub fn validate_marker(marker: &[u8]) -> Result<&str, KeyError> {
    if marker.is_empty() {
        return Ok("");
    }
    validate_key(marker)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_keys() {
        assert_eq!(validate_key(b"foo/bar.txt"), Ok("foo/bar.txt"));
        assert_eq!(validate_key("타코 burrito".as_bytes()), Ok("타코 burrito"));
        assert!(validate_key("tab\there\r\nnewline".as_bytes()).is_ok());
        assert!(validate_key("\u{1F32E}".as_bytes()).is_ok());
    }

    #[test]
    fn test_key_too_long() {
        let key = "a".repeat(1025);
        let err = validate_key(key.as_bytes()).unwrap_err();
        assert_eq!(err, KeyError::TooLong(1025));
        assert!(err.to_string().contains("1024"));
        assert!(err.to_string().contains("bytes"));

        assert!(validate_key("a".repeat(1024).as_bytes()).is_ok());
    }

    #[test]
    fn test_length_counts_utf8_bytes() {
        // 342 three-byte characters = 1026 bytes
        let key = "타".repeat(342);
        assert_eq!(validate_key(key.as_bytes()), Err(KeyError::TooLong(1026)));
    }

    #[test]
    fn test_key_not_utf8() {
        let err = validate_key(b"taco\xffburrito").unwrap_err();
        assert_eq!(err, KeyError::InvalidUtf8);
        assert!(err.to_string().contains("valid"));
        assert!(err.to_string().contains("UTF-8"));
    }

    #[test]
    fn test_key_empty() {
        let err = validate_key(b"").unwrap_err();
        assert_eq!(err, KeyError::Empty);
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn test_key_invalid_codepoints() {
        let err = validate_key("taco\u{0}burrito".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("U+0000"));

        let err = validate_key("taco\u{fffe}burrito".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("U+FFFE"));

        let err = validate_key("\u{1f}".as_bytes()).unwrap_err();
        assert!(err.to_string().contains("U+001F"));
    }

    #[test]
    fn test_length_checked_before_utf8() {
        let mut key = vec![0xffu8];
        key.extend(std::iter::repeat(b'a').take(1024));
        assert_eq!(validate_key(&key), Err(KeyError::TooLong(1025)));
    }

    #[test]
    fn test_xml_range_boundaries() {
        assert!(!is_legal_xml_char(0x08));
        assert!(is_legal_xml_char(0x09));
        assert!(!is_legal_xml_char(0x0B));
        assert!(!is_legal_xml_char(0x1F));
        assert!(is_legal_xml_char(0x20));
        assert!(is_legal_xml_char(0xD7FF));
        assert!(is_legal_xml_char(0xE000));
        assert!(is_legal_xml_char(0xFFFD));
        assert!(!is_legal_xml_char(0xFFFE));
        assert!(!is_legal_xml_char(0xFFFF));
        assert!(is_legal_xml_char(0x10000));
        assert!(is_legal_xml_char(0x10FFFF));
        assert!(!is_legal_xml_char(0x110000));
    }

    /// The first range stops at U+D7FF, the start of the surrogate block.
    /// Some implementations spell the bound as 0xDF77, which would admit most
    /// surrogates; every surrogate must stay illegal here.
    #[test]
    fn test_surrogate_block_is_illegal() {
        assert!(!is_legal_xml_char(0xD800));
        assert!(!is_legal_xml_char(0xDBFF));
        assert!(!is_legal_xml_char(0xDC00));
        assert!(!is_legal_xml_char(0xDF77));
        assert!(!is_legal_xml_char(0xDFFF));
    }

    #[test]
    fn test_marker() {
        assert_eq!(validate_marker(b""), Ok(""));
        assert_eq!(validate_marker(b"taco burrito"), Ok("taco burrito"));
        assert_eq!(validate_marker(b"\xff"), Err(KeyError::InvalidUtf8));
    }
}
