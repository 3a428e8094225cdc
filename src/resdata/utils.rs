//! Low-level string and byte helpers shared by the codecs.

use std::io::{self, Read};

use super::types::error::{ResdataError, Result};
use super::types::models::KEYWORD_NAME_LEN;

/// Validates a keyword name and returns it without trailing blanks.
///
/// Names are at most eight printable ASCII characters and not entirely blank.
pub fn validate_name(name: &str) -> Result<String> {
    if name.len() > KEYWORD_NAME_LEN {
        return Err(ResdataError::Format(format!(
            "Keyword name '{}' is longer than {} characters",
            name, KEYWORD_NAME_LEN
        )));
    }
    if !name.bytes().all(|b| (0x20..=0x7e).contains(&b)) {
        return Err(ResdataError::Format(format!(
            "Keyword name {:?} contains non-printable characters",
            name
        )));
    }
    let trimmed = name.trim_end_matches(' ');
    if trimmed.is_empty() {
        return Err(ResdataError::Format("Keyword name is blank".to_string()));
    }
    Ok(trimmed.to_string())
}

/// Right-pads `text` with blanks to exactly `width` bytes.
///
/// # Errors
/// Returns [`ResdataError::Format`] if `text` does not fit or is not ASCII.
pub fn pad_ascii(text: &str, width: usize) -> Result<Vec<u8>> {
    if !text.is_ascii() {
        return Err(ResdataError::Format(format!("String {:?} is not ASCII", text)));
    }
    if text.len() > width {
        return Err(ResdataError::Format(format!(
            "String '{}' does not fit in {} characters",
            text, width
        )));
    }
    let mut padded = Vec::with_capacity(width);
    padded.extend_from_slice(text.as_bytes());
    padded.resize(width, b' ');
    Ok(padded)
}

/// Decodes a fixed width string slot, dropping trailing blanks and NULs.
pub fn trim_slot(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    text.trim_end_matches([' ', '\0']).to_string()
}

/// Reads until `buf` is full or the reader is exhausted.
///
/// Returns the number of bytes read, which is less than `buf.len()` only at
/// end of stream.
pub fn read_full(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
