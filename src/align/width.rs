//! Terminal display-width helpers

use unicode_width::UnicodeWidthChar;

/// Number of terminal cells a character occupies.
///
/// Characters without a defined width, such as C0 controls, count as zero
/// cells.
pub fn char_width(c: char) -> usize {
    UnicodeWidthChar::width(c).unwrap_or(0)
}

/// Total display width of a run of characters.
pub fn display_width(chars: &[char]) -> usize {
    chars.iter().map(|&c| char_width(c)).sum()
}

/// Longest prefix of `chars` whose display width does not exceed `max_width`.
///
/// Zero-width characters directly after the cut are kept with the prefix, so
/// a combining mark stays attached to its base character.
pub fn truncate_to_width(chars: &[char], max_width: usize) -> &[char] {
    let mut current_width = 0;
    let mut end = 0;

    for &c in chars {
        let w = char_width(c);
        if current_width + w > max_width {
            break;
        }
        current_width += w;
        end += 1;
    }

    &chars[..end]
}

/// True when the cell ending at `width` is blank in `line`: either the
/// character drawn there is whitespace, or the line stops short of it.
pub fn is_clear_at(line: &[char], width: usize) -> bool {
    match truncate_to_width(line, width).last() {
        Some(c) if c.is_whitespace() => true,
        _ => display_width(line) < width,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn test_char_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width(' '), 1);
        assert_eq!(char_width('日'), 2);
        assert_eq!(char_width('\u{0301}'), 0);
    }

    #[test]
    fn test_display_width_mixed() {
        assert_eq!(display_width(&chars("ab")), 2);
        assert_eq!(display_width(&chars("日本")), 4);
        assert_eq!(display_width(&chars("a日b")), 4);
        assert_eq!(display_width(&[]), 0);
    }

    #[test]
    fn test_truncate_ascii() {
        let line = chars("hello world");
        assert_eq!(truncate_to_width(&line, 5), &chars("hello")[..]);
        assert_eq!(truncate_to_width(&line, 0), &[] as &[char]);
        assert_eq!(truncate_to_width(&line, 100), &line[..]);
    }

    #[test]
    fn test_truncate_does_not_split_wide_chars() {
        let line = chars("日本語");
        assert_eq!(truncate_to_width(&line, 3), &chars("日")[..]);
        assert_eq!(truncate_to_width(&line, 4), &chars("日本")[..]);
        assert_eq!(truncate_to_width(&line, 1), &[] as &[char]);
    }

    #[test]
    fn test_truncate_keeps_combining_mark() {
        let line = chars("e\u{0301}x");
        assert_eq!(truncate_to_width(&line, 1), &chars("e\u{0301}")[..]);
    }

    #[test]
    fn test_is_clear_at() {
        let line = chars("ab cd");
        assert!(!is_clear_at(&line, 2));
        assert!(is_clear_at(&line, 3));
        assert!(!is_clear_at(&line, 4));
        // past the end of the line
        assert!(is_clear_at(&line, 6));
        assert!(is_clear_at(&chars("1"), 4));
    }

    #[test]
    fn test_is_clear_at_wide_char_straddling_cut() {
        // "日" covers cells 1 and 2, so width 2 cuts through it
        let line = chars("a日 ");
        assert!(!is_clear_at(&line, 2));
        assert!(!is_clear_at(&line, 3));
        assert!(is_clear_at(&line, 4));
    }
}
