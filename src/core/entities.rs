//! Entity decoding and markup escaping
//!
//! Handles the five predefined entities (&lt; &gt; &amp; &quot; &apos;)
//! and decimal numeric character references (&#123;). The inverse,
//! `escape_markup`, produces text that round-trips through the tokenizer.
//!
//! Hexadecimal references (&#x7B;) are deliberately not decoded; an
//! unknown or malformed body is reported as `None` so the tokenizer can
//! re-emit it as literal text instead of failing.

use memchr::{memchr2, memchr3};

/// Decode a single entity body (the characters between `&` and `;`).
///
/// Lookup is case-sensitive: `&AMP;` is unknown. Returns `None` for
/// anything that is not a predefined name or a decimal reference that
/// maps to a valid scalar value.
pub fn decode_entity(body: &str) -> Option<char> {
    if let Some(digits) = body.strip_prefix('#') {
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let code = digits.parse::<u32>().ok()?;
        return char::from_u32(code);
    }

    match body {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Escape text for embedding in markup.
///
/// Escapes `&`, `<`, `>`, `"` and `'`. With `ascii_only`, every code
/// point above U+007F is written as a decimal numeric entity so the
/// result is pure ASCII.
pub fn escape_markup(text: &str, ascii_only: bool) -> String {
    // Fast path: nothing to escape
    let bytes = text.as_bytes();
    let clean = memchr3(b'&', b'<', b'>', bytes).is_none()
        && memchr2(b'"', b'\'', bytes).is_none()
        && (!ascii_only || text.is_ascii());
    if clean {
        return text.to_string();
    }

    let mut result = String::with_capacity(text.len() + 16);
    for c in text.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ if ascii_only && (c as u32) > 0x7F => {
                result.push_str("&#");
                result.push_str(&(c as u32).to_string());
                result.push(';');
            }
            _ => result.push(c),
        }
    }
    result
}
