//! Text Measurement
//!
//! Measures text nodes in terminal cells for [`LayoutHost`](super::LayoutHost).
//! Widths come from Unicode East Asian Width, applied per grapheme cluster so
//! combining marks and emoji sequences occupy the cells a terminal gives them.

use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

/// Display width of a single codepoint in terminal cells.
///
/// - `0` for control characters, combining marks and zero-width characters
/// - `1` for normal-width characters
/// - `2` for wide characters (CJK, fullwidth forms, emoji)
#[inline]
pub fn char_width(c: char) -> usize {
    // Terminals draw these emoji blocks two cells wide
    match c as u32 {
        0x2600..=0x27BF => 2,
        0x1F300..=0x1F5FF => 2,
        0x1F600..=0x1F64F => 2,
        0x1F680..=0x1F6FF => 2,
        0x1F900..=0x1F9FF => 2,
        0x1FA70..=0x1FAFF => 2,
        _ => c.width().unwrap_or(0),
    }
}

/// Display width of one grapheme cluster.
///
/// Flags, ZWJ sequences, skin tones, VS16 and keycaps count as one wide
/// glyph; a base character with combining marks counts as its base.
pub fn grapheme_width(grapheme: &str) -> usize {
    let mut chars = grapheme.chars();
    let Some(first) = chars.next() else {
        return 0;
    };
    if grapheme.len() == first.len_utf8() {
        return char_width(first);
    }

    // Regional indicator pair
    if (0x1F1E6..=0x1F1FF).contains(&(first as u32)) {
        return 2;
    }

    let emoji_sequence = chars.any(|c| {
        matches!(c as u32, 0x200D | 0xFE0F | 0x20E3 | 0x1F3FB..=0x1F3FF)
    });
    if emoji_sequence {
        2
    } else {
        char_width(first)
    }
}

fn line_width(line: &str) -> usize {
    if line.is_ascii() {
        return line.bytes().filter(|&b| b >= 0x20 && b != 0x7F).count();
    }
    line.graphemes(true).map(grapheme_width).sum()
}

/// Display width of the widest line of `s`.
pub fn string_width(s: &str) -> usize {
    s.split('\n').map(line_width).max().unwrap_or(0)
}

/// Number of lines `text` occupies when wrapped at `available_width` cells.
///
/// Wrapping breaks between grapheme clusters. Returns 0 for empty text and at
/// least 1 otherwise.
pub fn measure_text_height(text: &str, available_width: usize) -> usize {
    if text.is_empty() {
        return 0;
    }
    if available_width == 0 {
        return 1;
    }

    let mut lines = 0usize;
    for line in text.split('\n') {
        let mut rows = 1usize;
        let mut current = 0usize;
        for grapheme in line.graphemes(true) {
            let width = grapheme_width(grapheme);
            if current > 0 && current.saturating_add(width) > available_width {
                rows += 1;
                current = width;
            } else {
                current = current.saturating_add(width);
            }
        }
        lines = lines.saturating_add(rows);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_char_width() {
        assert_eq!(char_width('a'), 1);
        assert_eq!(char_width('\t'), 0);
        assert_eq!(char_width('\u{301}'), 0);
        assert_eq!(char_width('\u{200B}'), 0);
        assert_eq!(char_width('\u{2600}'), 2);
        assert_eq!(char_width('你'), 2);
    }

    #[test]
    fn test_grapheme_width() {
        assert_eq!(grapheme_width("e\u{301}"), 1);
        assert_eq!(grapheme_width("👨\u{200D}👩\u{200D}👧"), 2);
        assert_eq!(grapheme_width("👍\u{1F3FD}"), 2);
        assert_eq!(grapheme_width("🇺🇸"), 2);
    }

    #[test]
    fn test_string_width() {
        assert_eq!(string_width("hello"), 5);
        assert_eq!(string_width("日本"), 4);
        assert_eq!(string_width("ab\nabcd"), 4);
        assert_eq!(string_width("e\u{301}"), 1);
        assert_eq!(string_width("a\u{200B}b"), 2);
        assert_eq!(string_width(""), 0);
    }

    #[test]
    fn test_measure_text_height() {
        assert_eq!(measure_text_height("", 10), 0);
        assert_eq!(measure_text_height("hello", 10), 1);
        assert_eq!(measure_text_height("hello world", 5), 3);
        assert_eq!(measure_text_height("a\nb", 10), 2);
        assert_eq!(measure_text_height("日本語", 4), 2);
    }

    #[test]
    fn test_unbounded_width_does_not_overflow() {
        let long = "x".repeat(70_000);
        assert_eq!(measure_text_height(&long, usize::MAX), 1);
        assert_eq!(string_width(&long), 70_000);
    }
}
