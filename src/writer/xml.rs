//! XML escaping for worksheet text content
//!
//! Everything written between tags or into attribute values goes through
//! [`escape`]. Besides the five XML special characters, XML 1.0 forbids most
//! C0 control characters entirely, so those are mapped to spaces instead of
//! failing the whole document. TAB, LF and CR are legal and pass through.

use std::borrow::Cow;

fn needs_escape(c: char) -> bool {
    matches!(c, '&' | '<' | '>' | '"' | '\'' | '\x7f')
        || (c < '\x20' && c != '\t' && c != '\n' && c != '\r')
}

/// Escape text for inclusion in XML element content or attribute values.
///
/// The input is treated as raw text, not markup, so an ampersand that
/// already looks like an entity is escaped again.
pub fn escape(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len() + 8);
    push_escaped(&mut out, text);
    Cow::Owned(out)
}

/// Escape `text` and append it to `buf`
pub fn push_escaped(buf: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => buf.push_str("&amp;"),
            '<' => buf.push_str("&lt;"),
            '>' => buf.push_str("&gt;"),
            '"' => buf.push_str("&quot;"),
            '\'' => buf.push_str("&apos;"),
            '\t' | '\n' | '\r' => buf.push(c),
            c if c < '\x20' || c == '\x7f' => buf.push(' '),
            c => buf.push(c),
        }
    }
}
