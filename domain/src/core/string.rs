//! String utilities for the domain layer.

/// Maximum number of characters kept when deriving a session title.
pub const TITLE_MAX_CHARS: usize = 30;

/// Derive a session title from the first user message.
///
/// Keeps the first [`TITLE_MAX_CHARS`] characters (not bytes) and appends
/// `...` when anything was cut off.
pub fn derive_title(text: &str) -> String {
    let text = text.trim();
    let mut chars = text.char_indices();
    match chars.nth(TITLE_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Returns true if the string is empty or only whitespace
pub fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
