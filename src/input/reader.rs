//! Reading and decoding input sources

use std::io::Read;

use encoding_rs::Encoding;
use tracing::{debug, warn};

use crate::error::Result;

/// Read a whole source and decode it to text.
///
/// A byte order mark overrides `encoding`. Malformed sequences are replaced
/// with U+FFFD rather than failing the import.
pub fn read_source<R: Read>(mut reader: R, encoding: &'static Encoding) -> Result<String> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;

    let (text, used, had_errors) = encoding.decode(&bytes);
    debug!(bytes = bytes.len(), encoding = used.name(), "decoded input");
    if had_errors {
        warn!(encoding = used.name(), "input contained malformed sequences");
    }

    Ok(text.into_owned())
}

/// Split text into lines, dropping line terminators and blank lines.
pub fn read_lines(text: &str) -> Vec<String> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use encoding_rs::{SHIFT_JIS, UTF_8};

    #[test]
    fn test_read_lines_skips_blank_lines() {
        let input = "  PID command   \n\n   1   ls       \n";
        assert_eq!(
            read_lines(input),
            vec!["  PID command   ", "   1   ls       "]
        );
    }

    #[test]
    fn test_read_lines_whitespace_only_is_blank() {
        assert_eq!(read_lines("a\n \t \nb"), vec!["a", "b"]);
        assert!(read_lines("").is_empty());
        assert!(read_lines("\n\n   \n").is_empty());
    }

    #[test]
    fn test_read_lines_strips_carriage_returns() {
        assert_eq!(read_lines("a b\r\nc d\r\n"), vec!["a b", "c d"]);
    }

    #[test]
    fn test_read_source_utf8() {
        let text = read_source("名前 年齢\n".as_bytes(), UTF_8).unwrap();
        assert_eq!(text, "名前 年齢\n");
    }

    #[test]
    fn test_read_source_shift_jis() {
        let (bytes, _, _) = SHIFT_JIS.encode("日本語");
        let text = read_source(&bytes[..], SHIFT_JIS).unwrap();
        assert_eq!(text, "日本語");
    }

    #[test]
    fn test_read_source_bom_wins() {
        let bytes = b"\xEF\xBB\xBFabc";
        let text = read_source(&bytes[..], SHIFT_JIS).unwrap();
        assert_eq!(text, "abc");
    }

    #[test]
    fn test_read_source_replaces_malformed_bytes() {
        let text = read_source(&b"a\xFFb"[..], UTF_8).unwrap();
        assert_eq!(text, "a\u{FFFD}b");
    }
}
