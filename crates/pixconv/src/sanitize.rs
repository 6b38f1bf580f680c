//! Helpers for sanitizing data before it enters tracing span attributes.

/// Longest name emitted into a span field.
const MAX_DISPLAY_LEN: usize = 128;

/// Reduces a client-supplied file name to its final path component.
///
/// Uploads may carry full client paths with either separator. Control
/// characters are dropped and the result is truncated so a hostile name
/// cannot flood the logs.
pub fn display_name(original_name: &str) -> String {
    let last = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control())
        .take(MAX_DISPLAY_LEN)
        .collect();

    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "<unknown>".to_string()
    } else {
        trimmed.to_string()
    }
}
