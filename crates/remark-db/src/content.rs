//! Comment text policy: length cap, mark and control rejection, HTML escaping.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::StoreError;

/// Maximum length of a comment, in Unicode scalar values.
pub const MAX_CONTENT_CHARS: usize = 35;

/// Nonspacing, spacing-combining and enclosing marks. Stacking these is how
/// "zalgo" text overflows its line box, so any occurrence is rejected.
static MARKS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Mn}\p{Mc}\p{Me}]").expect("mark pattern is valid"));

/// C0/C1 controls except tab. Most are not legal XML 1.0 characters and would
/// break the badge SVG.
static CONTROLS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\p{Cc}--\t]").expect("control pattern is valid"));

/// Validates and normalizes raw comment text into its stored form.
///
/// Over-long input is truncated rather than rejected. Combining marks and
/// control characters other than tab are rejected. The result is
/// HTML-escaped and safe to embed verbatim in markup.
pub fn sanitize(raw: &str) -> Result<String, StoreError> {
    if raw.is_empty() {
        return Err(StoreError::InvalidInput("content not provided".into()));
    }

    let truncated = truncate_chars(raw, MAX_CONTENT_CHARS);

    if has_marks(truncated) || has_controls(truncated) {
        return Err(StoreError::InvalidInput("invalid content".into()));
    }

    Ok(escape_html(truncated))
}

pub fn has_marks(text: &str) -> bool {
    MARKS.is_match(text)
}

pub fn has_controls(text: &str) -> bool {
    CONTROLS.is_match(text)
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Escapes the five HTML-significant characters. NUL is replaced with U+FFFD.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&#34;"),
            '\'' => out.push_str("&#39;"),
            '\0' => out.push('\u{FFFD}'),
            c => out.push(c),
        }
    }
    out
}
