//! Input encoding lookup

use encoding_rs::{Encoding, EUC_JP, SHIFT_JIS, UTF_8};

use crate::error::{QqError, Result};

/// Names accepted on top of the WHATWG labels `encoding_rs` knows.
fn alias(label: &str) -> Option<&'static Encoding> {
    match label.to_ascii_lowercase().as_str() {
        "cp932" => Some(SHIFT_JIS),
        "eucjp" | "euc_jp" => Some(EUC_JP),
        "utf-8n" => Some(UTF_8),
        _ => None,
    }
}

/// Resolve an encoding name such as `sjis`, `euc-jp` or `latin1`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    let trimmed = label.trim();

    if let Some(encoding) = Encoding::for_label(trimmed.as_bytes()) {
        return Ok(encoding);
    }

    alias(trimmed).ok_or_else(|| QqError::UnknownEncoding(label.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whatwg_labels() {
        assert_eq!(resolve_encoding("utf-8").unwrap(), UTF_8);
        assert_eq!(resolve_encoding("sjis").unwrap(), SHIFT_JIS);
        assert_eq!(resolve_encoding("EUC-JP").unwrap(), EUC_JP);
        assert_eq!(resolve_encoding("latin1").unwrap().name(), "windows-1252");
    }

    #[test]
    fn test_aliases() {
        assert_eq!(resolve_encoding("CP932").unwrap(), SHIFT_JIS);
        assert_eq!(resolve_encoding("eucjp").unwrap(), EUC_JP);
    }

    #[test]
    fn test_unknown_encoding() {
        let err = resolve_encoding("klingon").unwrap_err();
        assert!(matches!(err, QqError::UnknownEncoding(ref name) if name == "klingon"));
        assert_eq!(err.to_string(), "invalid encoding name: klingon");
    }
}
