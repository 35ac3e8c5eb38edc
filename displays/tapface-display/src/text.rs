//! Fixed-width line helpers
//!
//! All widths are in character cells. Text is expected to be ASCII; other
//! characters count as one cell each and render as whatever the panel's
//! ROM maps them to.

use core::fmt::Write;

use heapless::String;

/// Widest panel supported (HD44780 tops out at 40 columns)
pub const LINE_CAPACITY: usize = 40;

/// One rendered row
pub type Line = String<LINE_CAPACITY>;

/// Spaces appended between repetitions of a scrolling line
const SCROLL_GAP: usize = 3;

fn push_spaces(line: &mut Line, count: usize) {
    for _ in 0..count {
        if line.push(' ').is_err() {
            break;
        }
    }
}

fn push_truncated(line: &mut Line, text: &str, width: usize) {
    for ch in text.chars() {
        if line.chars().count() >= width || line.push(ch).is_err() {
            break;
        }
    }
}

/// Truncate or pad `text` to exactly `width` cells
pub fn fit(text: &str, width: usize, center: bool) -> Line {
    let width = width.min(LINE_CAPACITY);
    let len = text.chars().count();
    let mut line = Line::new();
    if len >= width {
        push_truncated(&mut line, text, width);
        return line;
    }
    let pad = width - len;
    let left = if center { pad / 2 } else { 0 };
    push_spaces(&mut line, left);
    push_truncated(&mut line, text, width);
    push_spaces(&mut line, pad - left);
    line
}

/// Left-align `left`, right-align `right`
///
/// At least one space separates the two; when they do not fit the joined
/// text is truncated from the right.
pub fn split(left: &str, right: &str, width: usize) -> Line {
    if right.is_empty() {
        return fit(left, width, false);
    }
    let width = width.min(LINE_CAPACITY);
    let used = left.chars().count() + right.chars().count();
    let mut line = Line::new();
    if used + 1 > width {
        push_truncated(&mut line, left, width);
        push_truncated(&mut line, " ", width);
        push_truncated(&mut line, right, width);
        return line;
    }
    push_truncated(&mut line, left, width);
    push_spaces(&mut line, width - used);
    push_truncated(&mut line, right, width);
    line
}

/// Number of marquee frames for `text`; 1 when it fits statically
pub fn scroll_frame_count(text: &str, width: usize) -> usize {
    let len = text.chars().count();
    if len <= width {
        1
    } else {
        len + SCROLL_GAP
    }
}

/// Marquee frame `index`
///
/// Frames are `width`-cell windows over `text` followed by a short gap,
/// wrapping around, so consecutive frames move one cell left. For text that
/// fits, the only frame is the text itself.
pub fn scroll_frame(text: &str, width: usize, index: usize) -> Line {
    let count = scroll_frame_count(text, width);
    if count == 1 {
        let mut line = Line::new();
        push_truncated(&mut line, text, width.min(LINE_CAPACITY));
        return line;
    }
    let cells = text.chars().chain(core::iter::repeat(' ').take(SCROLL_GAP));
    let mut line = Line::new();
    for ch in cells.cycle().skip(index % count).take(width.min(LINE_CAPACITY)) {
        if line.push(ch).is_err() {
            break;
        }
    }
    line
}

/// `"{prefix} m:ss"` for a countdown in whole seconds
pub fn countdown(prefix: &str, remaining_s: u32) -> Line {
    let mut line = Line::new();
    let _ = write!(line, "{} {}:{:02}", prefix, remaining_s / 60, remaining_s % 60);
    line
}

/// Battery label such as `"85%"`
pub fn percent(value: u8) -> String<4> {
    let mut label = String::new();
    let _ = write!(label, "{}%", value.min(100));
    label
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fit_pads_and_truncates() {
        assert_eq!(fit("abc", 6, false).as_str(), "abc   ");
        assert_eq!(fit("abc", 6, true).as_str(), " abc  ");
        assert_eq!(fit("abcdefgh", 4, true).as_str(), "abcd");
        assert_eq!(fit("", 3, true).as_str(), "   ");
    }

    #[test]
    fn test_split_right_aligns() {
        assert_eq!(split("Touch", "85%", 12).as_str(), "Touch    85%");
        assert_eq!(split("Touch", "", 8).as_str(), "Touch   ");
        // Exactly one spare cell keeps the single space
        assert_eq!(split("Hello", "9%", 8).as_str(), "Hello 9%");
    }

    #[test]
    fn test_split_overflow_truncates_joined_text() {
        assert_eq!(split("Touch a panel 4:59", "100%", 20).as_str(), "Touch a panel 4:59 1");
    }

    #[test]
    fn test_scroll_frames() {
        assert_eq!(scroll_frame_count("short", 10), 1);
        assert_eq!(scroll_frame("short", 10, 3).as_str(), "short");

        assert_eq!(scroll_frame_count("abcdef", 4), 9);
        assert_eq!(scroll_frame("abcdef", 4, 0).as_str(), "abcd");
        assert_eq!(scroll_frame("abcdef", 4, 1).as_str(), "bcde");
        assert_eq!(scroll_frame("abcdef", 4, 4).as_str(), "ef  ");
        assert_eq!(scroll_frame("abcdef", 4, 7).as_str(), "  ab");
        assert_eq!(scroll_frame("abcdef", 4, 8).as_str(), " abc");
        // Wraps past the last frame
        assert_eq!(scroll_frame("abcdef", 4, 9).as_str(), "abcd");
    }

    #[test]
    fn test_countdown_and_percent() {
        assert_eq!(countdown("Touch a panel", 59).as_str(), "Touch a panel 0:59");
        assert_eq!(countdown("Press I/O", 60).as_str(), "Press I/O 1:00");
        assert_eq!(percent(85).as_str(), "85%");
        assert_eq!(percent(100).as_str(), "100%");
    }

    proptest! {
        #[test]
        fn prop_fit_is_exact_width(text in "[ -~]{0,30}", width in 1usize..=20, center: bool) {
            prop_assert_eq!(fit(&text, width, center).chars().count(), width);
        }

        #[test]
        fn prop_scroll_frames_are_full_width(text in "[ -~]{21,30}", index in 0usize..64) {
            prop_assert_eq!(scroll_frame(&text, 20, index).chars().count(), 20);
        }
    }
}
