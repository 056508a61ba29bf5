//! Small pure text helpers.

use unicode_segmentation::UnicodeSegmentation;

/// Number of user-perceived characters (grapheme clusters) in `text`.
///
/// This is what message length limits are measured in.
#[must_use]
pub fn count_chars(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Truncate a string to a maximum length, adding `...` if needed.
///
/// - Trims surrounding whitespace before truncating.
/// - Counts grapheme clusters so emoji sequences are never split.
/// - Enforces a minimum `max` of 3 so the ellipsis fits.
#[must_use]
pub fn truncate_with_ellipsis(raw: &str, max: usize) -> String {
    let max = max.max(3);
    let trimmed = raw.trim();
    if count_chars(trimmed) <= max {
        return trimmed.to_string();
    }
    let head: String = trimmed.graphemes(true).take(max - 3).collect();
    format!("{head}...")
}
