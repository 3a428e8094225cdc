//! Fortran unformatted record framing.
//!
//! A Fortran `write(unit) array` statement puts a length marker on both
//! sides of the payload:
//!
//! ```text
//! ┌──────────┬──────────────────────┬──────────┐
//! │ len (i32)│  payload (len bytes) │ len (i32)│
//! └──────────┴──────────────────────┴──────────┘
//! ```
//!
//! Markers and numeric payloads share the byte order of the stream.

use std::io::{BufReader, Read, Seek, Write};

use log::trace;

use crate::resdata::types::error::{ResdataError, Result};
use crate::resdata::types::models::Endianness;
use crate::resdata::utils::read_full;

/// Size of a record length marker.
pub const MARKER_SIZE: u64 = 4;

/// Reads one length marker.
///
/// Returns `Ok(None)` if the stream is exhausted before the first byte.
fn read_marker(reader: &mut impl Read, endian: Endianness) -> Result<Option<i32>> {
    let mut buf = [0u8; 4];
    let n = read_full(reader, &mut buf)?;
    match n {
        0 => Ok(None),
        4 => Ok(Some(endian.read_i32(&buf))),
        _ => Err(ResdataError::TruncatedRecord {
            expected: MARKER_SIZE,
            found: n as u64,
        }),
    }
}

fn record_len(header: i32) -> Result<usize> {
    usize::try_from(header)
        .map_err(|_| ResdataError::Format(format!("Negative record length marker: {}", header)))
}

/// Reads one framed record and returns its payload.
///
/// Returns `Ok(None)` at a clean end of stream.
///
/// # Errors
/// - [`ResdataError::TruncatedRecord`] if fewer bytes than declared remain
/// - [`ResdataError::Framing`] if the trailing marker disagrees with the leading one
/// - [`ResdataError::Format`] if the leading marker is negative
pub fn read_record(reader: &mut impl Read, endian: Endianness) -> Result<Option<Vec<u8>>> {
    let Some(header) = read_marker(reader, endian)? else {
        return Ok(None);
    };
    let len = record_len(header)?;
    let mut payload = vec![0u8; len];
    let n = read_full(reader, &mut payload)?;
    if n < len {
        return Err(ResdataError::TruncatedRecord {
            expected: len as u64,
            found: n as u64,
        });
    }
    let trailer = read_marker(reader, endian)?.ok_or(ResdataError::TruncatedRecord {
        expected: MARKER_SIZE,
        found: 0,
    })?;
    if trailer != header {
        return Err(ResdataError::Framing { header, trailer });
    }
    Ok(Some(payload))
}

/// Skips one framed record without reading its payload.
///
/// `stream_len` bounds the seek so that a record running past the end of the
/// stream is reported as truncated. Returns the payload length, or `None` at
/// a clean end of stream.
pub fn skip_record<R: Read + Seek>(
    reader: &mut BufReader<R>,
    endian: Endianness,
    stream_len: u64,
) -> Result<Option<usize>> {
    let Some(header) = read_marker(reader, endian)? else {
        return Ok(None);
    };
    let len = record_len(header)?;
    let position = reader.stream_position()?;
    let remaining = stream_len.saturating_sub(position);
    if remaining < len as u64 + MARKER_SIZE {
        return Err(ResdataError::TruncatedRecord {
            expected: len as u64 + MARKER_SIZE,
            found: remaining,
        });
    }
    reader.seek_relative(len as i64)?;
    let trailer = read_marker(reader, endian)?.ok_or(ResdataError::TruncatedRecord {
        expected: MARKER_SIZE,
        found: 0,
    })?;
    if trailer != header {
        return Err(ResdataError::Framing { header, trailer });
    }
    trace!("Skipped record: offset={:#x}, len={}", position, len);
    Ok(Some(len))
}

/// Writes `payload` as one framed record.
pub fn write_record(writer: &mut impl Write, endian: Endianness, payload: &[u8]) -> Result<()> {
    let len = i32::try_from(payload.len()).map_err(|_| {
        ResdataError::Format(format!(
            "Record of {} bytes exceeds the marker range",
            payload.len()
        ))
    })?;
    let mut marker = [0u8; 4];
    endian.write_i32(&mut marker, len);
    writer.write_all(&marker)?;
    writer.write_all(payload)?;
    writer.write_all(&marker)?;
    Ok(())
}

/// Reverses the byte order of every `element_size` wide element in place.
///
/// Applying it twice restores the original bytes.
pub fn endian_flip(bytes: &mut [u8], element_size: usize) {
    if element_size < 2 {
        return;
    }
    for element in bytes.chunks_exact_mut(element_size) {
        element.reverse();
    }
}
