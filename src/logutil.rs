//! Logging helpers that keep externally supplied identifiers on a single log line.
//!
//! User ids come from the auth provider and module ids from seed files, so they are
//! escaped before they reach a log record.

/// Longest identifier preview written to a log line.
pub const MAX_LOG_PREVIEW: usize = 96;

fn push_escaped(out: &mut String, ch: char) {
    use std::fmt::Write;
    match ch {
        '\\' => out.push_str("\\\\"),
        '\n' => out.push_str("\\n"),
        '\r' => out.push_str("\\r"),
        '\t' => out.push_str("\\t"),
        c if c.is_control() => {
            let _ = write!(out, "\\x{:02X}", c as u32);
        }
        c => out.push(c),
    }
}

/// Render a user or module id as a single log-safe token.
///
/// Newlines, tabs and backslashes get backslash escapes, other control
/// characters become `\xNN`. Ids longer than [`MAX_LOG_PREVIEW`] characters
/// are cut and end with an ellipsis.
pub fn escape_log(id: &str) -> String {
    let mut out = String::with_capacity(id.len().min(MAX_LOG_PREVIEW) + 4);
    let mut chars = id.chars();
    for ch in chars.by_ref().take(MAX_LOG_PREVIEW) {
        push_escaped(&mut out, ch);
    }
    if chars.next().is_some() {
        out.push('…');
    }
    out
}
