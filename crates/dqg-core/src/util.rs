//! Small text helpers shared by the model, config and transfer code.

/// Longest response excerpt carried in an error message.
const EXCERPT_CHARS: usize = 180;

/// Trimmed view of `value`, or `None` when nothing but whitespace remains.
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

pub fn has_http_scheme(url: &str) -> bool {
    ["http://", "https://"]
        .iter()
        .any(|scheme| url.len() > scheme.len() && url.starts_with(scheme))
}

/// First characters of a response body, for error messages.
pub fn body_excerpt(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(EXCERPT_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}
