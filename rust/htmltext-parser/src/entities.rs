//! HTML character reference scanning and decoding
//!
//! Named references are resolved against the full HTML5 table shipped with
//! `markup5ever`. Numeric references must be semicolon-terminated and are
//! bounded in length so scanning stays linear on adversarial input.

use std::borrow::Cow;

use markup5ever::data::NAMED_ENTITIES;

/// Longest reference name we attempt to resolve (the HTML5 table tops out at 32)
pub const MAX_ENTITY_NAME_LEN: usize = 32;

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Scan a character reference starting at `start` (which must point at `&`).
///
/// Returns the exclusive end offset (just past the `;`) when the bytes form a
/// syntactically valid reference. Validity of the name is not checked here.
pub fn scan_entity(bytes: &[u8], start: usize) -> Option<usize> {
    if bytes.get(start) != Some(&b'&') {
        return None;
    }

    #[derive(Clone, Copy)]
    enum Kind {
        Named,
        Decimal,
        Hex,
    }

    let mut i = start + 1;
    let kind = match bytes.get(i) {
        Some(b'#') => {
            i += 1;
            match bytes.get(i) {
                Some(b'x') | Some(b'X') => {
                    i += 1;
                    Kind::Hex
                }
                _ => Kind::Decimal,
            }
        }
        Some(b) if b.is_ascii_alphabetic() => Kind::Named,
        _ => return None,
    };
    let max_len = match kind {
        Kind::Named => MAX_ENTITY_NAME_LEN,
        Kind::Decimal => MAX_DEC_DIGITS,
        Kind::Hex => MAX_HEX_DIGITS,
    };

    let body_start = i;
    while i < bytes.len() && i - body_start < max_len {
        let accepted = match kind {
            Kind::Named => bytes[i].is_ascii_alphanumeric(),
            Kind::Decimal => bytes[i].is_ascii_digit(),
            Kind::Hex => bytes[i].is_ascii_hexdigit(),
        };
        if !accepted {
            break;
        }
        i += 1;
    }

    if i == body_start || bytes.get(i) != Some(&b';') {
        return None;
    }
    Some(i + 1)
}

/// Decode a single reference such as `&amp;`, `&#60;` or `&#x3C;`.
///
/// Numeric references outside the Unicode scalar range (or NUL) decode to
/// U+FFFD. Unknown names return `None` so callers can keep the literal text.
pub fn decode_entity(raw: &str) -> Option<Cow<'static, str>> {
    let body = raw.strip_prefix('&')?.strip_suffix(';')?;

    if let Some(numeric) = body.strip_prefix('#') {
        let code = match numeric.strip_prefix(|c| c == 'x' || c == 'X') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        let ch = match code {
            0 => char::REPLACEMENT_CHARACTER,
            _ => char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER),
        };
        return Some(Cow::Owned(ch.to_string()));
    }

    // Table keys omit the leading '&' and keep the trailing ';'
    let key = &raw[1..];
    let &(first, second) = NAMED_ENTITIES.get(key)?;
    // Prefix-only entries map to (0, 0)
    if first == 0 {
        return None;
    }

    let mut out = String::with_capacity(4);
    out.push(char::from_u32(first)?);
    if second != 0 {
        out.push(char::from_u32(second)?);
    }
    Some(Cow::Owned(out))
}

/// Append the decoded form of `raw` to `out`, or `raw` itself if it does not
/// name a known reference.
pub fn push_decoded(out: &mut String, raw: &str) {
    match decode_entity(raw) {
        Some(decoded) => out.push_str(&decoded),
        None => out.push_str(raw),
    }
}

/// Decode every reference in a piece of text (used for attribute values).
pub fn decode_text(text: &str) -> Cow<'_, str> {
    if !text.contains('&') {
        return Cow::Borrowed(text);
    }

    let bytes = text.as_bytes();
    let mut out = String::with_capacity(text.len());
    let mut copy_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'&' {
            if let Some(end) = scan_entity(bytes, i) {
                out.push_str(&text[copy_start..i]);
                push_decoded(&mut out, &text[i..end]);
                i = end;
                copy_start = end;
                continue;
            }
        }
        i += 1;
    }
    out.push_str(&text[copy_start..]);
    Cow::Owned(out)
}
