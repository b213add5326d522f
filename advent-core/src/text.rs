//! Text helpers shared by the salvage parsers and the record codecs.

use crate::constants::PLACEHOLDER;

/// Decode Latin-1 bytes; every byte maps to the code point of the same value.
#[must_use]
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().copied().map(char::from).collect()
}

/// Split text on LF, CRLF or bare CR line endings.
///
/// A trailing line terminator does not produce an empty final line.
#[must_use]
pub fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let bytes = text.as_bytes();
    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\n' => {
                lines.push(&text[start..i]);
                start = i + 1;
            }
            b'\r' => {
                lines.push(&text[start..i]);
                if bytes.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
                start = i + 1;
            }
            _ => {}
        }
        i += 1;
    }
    if start < bytes.len() {
        lines.push(&text[start..]);
    }
    lines
}

/// Map a string to engine bytes: ASCII `0x01..=0x7F` passes through, anything
/// else (NUL included) becomes the placeholder.
#[must_use]
pub fn to_engine_bytes(value: &str) -> Vec<u8> {
    value
        .chars()
        .map(|c| match u8::try_from(c) {
            Ok(b) if (0x01..=0x7F).contains(&b) => b,
            _ => PLACEHOLDER,
        })
        .collect()
}

/// Copy `src` into `dest`, truncating at the field width. Remaining bytes are
/// left untouched (callers start from a zeroed record).
pub(crate) fn write_field(dest: &mut [u8], src: &[u8]) {
    let len = src.len().min(dest.len());
    dest[..len].copy_from_slice(&src[..len]);
}

/// Read a NUL-padded field: everything up to the first NUL.
#[must_use]
pub(crate) fn read_field(bytes: &[u8]) -> String {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    decode_latin1(&bytes[..end])
}

/// Collapse runs of whitespace and drop non-printable characters.
#[must_use]
pub fn normalize_whitespace(value: &str) -> String {
    value
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|c| (' '..='~').contains(c))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
