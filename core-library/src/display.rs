//! Text helpers for book cards

const ELLIPSIS: &str = "...";

const TITLE_FONT_MAX_REM: f64 = 3.5;
const TITLE_FONT_MIN_REM: f64 = 2.5;
/// Titles up to this many characters use the full size
const TITLE_FONT_FULL_SIZE_CHARS: usize = 100;
const TITLE_FONT_SHRINK_PER_CHAR: f64 = 0.2 / 10.0;

/// Cut `text` to at most `max_chars` characters on a word boundary and mark
/// the cut with an ellipsis
///
/// ```
/// use core_library::display::truncate_text;
///
/// assert_eq!(truncate_text("A short review", 50), "A short review");
/// assert_eq!(truncate_text("It was the best of times", 12), "It was the...");
/// ```
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let trimmed = match cut.rfind(' ') {
        Some(index) if index > 0 => &cut[..index],
        _ => cut.as_str(),
    };
    format!("{}{}", trimmed, ELLIPSIS)
}

/// Font size (rem) for a book title of `len` characters
pub fn title_font_size(len: usize) -> f64 {
    if len <= TITLE_FONT_FULL_SIZE_CHARS {
        return TITLE_FONT_MAX_REM;
    }
    let overflow = (len - TITLE_FONT_FULL_SIZE_CHARS) as f64;
    (TITLE_FONT_MAX_REM - overflow * TITLE_FONT_SHRINK_PER_CHAR).max(TITLE_FONT_MIN_REM)
}
