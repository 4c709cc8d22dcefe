use std::fmt::Display;

/// Escape text for interpolation into HTML markup.
///
/// Ampersand goes first so already-produced entities are not escaped twice.
pub fn escape_html(unsafe_text: &str) -> String {
    unsafe_text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#039;")
}

/// Escape an optional value. Absent values render as the empty string.
pub fn escape_opt<T: Display>(value: Option<T>) -> String {
    match value {
        Some(v) => escape_html(&v.to_string()),
        None => String::new(),
    }
}
