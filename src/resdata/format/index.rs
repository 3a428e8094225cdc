//! # Stream Probe and Keyword Scan
//!
//! [`probe`] resolves the wire encoding of a stream from its leading bytes;
//! [`scan`] walks the stream once, header by header, and records where each
//! keyword lives without decoding any payload.

use std::collections::HashMap;
use std::io::{BufReader, Read, Seek, SeekFrom};

use log::{debug, trace};

use super::keyword;
use crate::resdata::types::error::{ResdataError, Result};
use crate::resdata::types::models::*;
use crate::resdata::utils::read_full;

/// Bytes needed to check the framing of the leading header record.
const PROBE_LEN: usize = HEADER_RECORD_LEN + 8;

/// Whether the leading bytes are a framed 16 byte header record in `endian`.
fn is_header_record(lead: &[u8], endian: Endianness) -> bool {
    if lead.len() < PROBE_LEN {
        return false;
    }
    let expected = HEADER_RECORD_LEN as i32;
    endian.read_i32(&lead[..4]) == expected
        && endian.read_i32(&lead[PROBE_LEN - 4..PROBE_LEN]) == expected
}

fn is_text_header(lead: &[u8]) -> bool {
    lead.iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| *b == b'\'')
}

/// Resolves the wire encoding of a stream.
///
/// Explicit modes in `options` are trusted; `Auto` modes are decided from the
/// leading record: a framed big-endian header, then a framed little-endian
/// header, then a quoted text header line. The stream is rewound afterwards.
///
/// # Errors
/// Returns [`ResdataError::Format`] if an `Auto` mode cannot be resolved.
pub fn probe<R: Read + Seek>(reader: &mut BufReader<R>, options: OpenOptions) -> Result<StreamFormat> {
    reader.seek(SeekFrom::Start(0))?;
    let mut lead = [0u8; PROBE_LEN];
    let n = read_full(reader, &mut lead)?;
    reader.seek(SeekFrom::Start(0))?;
    let lead = &lead[..n];

    let candidates: &[Endianness] = match options.endian {
        EndianMode::Big => &[Endianness::Big],
        EndianMode::Little => &[Endianness::Little],
        EndianMode::Auto => &[Endianness::Big, Endianness::Little],
    };
    let binary = candidates.iter().copied().find(|e| is_header_record(lead, *e));
    let fallback_endian = candidates.first().copied().unwrap_or_default();

    let resolved = match (options.format, binary) {
        (FormatMode::Formatted, _) => StreamFormat::formatted(),
        (FormatMode::Unformatted, Some(endian)) => StreamFormat::unformatted(endian),
        // An explicit byte order is trusted even if the leading record disagrees;
        // the keyword check that follows reports the real problem.
        (FormatMode::Unformatted, None) if options.endian != EndianMode::Auto => {
            StreamFormat::unformatted(fallback_endian)
        }
        (FormatMode::Auto, Some(endian)) => StreamFormat::unformatted(endian),
        (FormatMode::Auto, None) if is_text_header(lead) => StreamFormat::formatted(),
        _ => {
            return Err(ResdataError::Format(
                "Leading record does not parse as a keyword header".to_string(),
            ))
        }
    };
    debug!(
        "Resolved stream encoding: formatted={}, endian={:?}",
        resolved.formatted, resolved.endian
    );
    Ok(resolved)
}

/// Scans every keyword header from the start of the stream.
///
/// Data records are skipped by seeking past them after checking their
/// framing, so the cost grows with the number of keywords rather than their
/// size.
pub fn scan<R: Read + Seek>(
    reader: &mut BufReader<R>,
    format: StreamFormat,
    stream_len: u64,
) -> Result<Vec<IndexEntry>> {
    reader.seek(SeekFrom::Start(0))?;
    let mut entries = Vec::new();
    let mut occurrences: HashMap<String, usize> = HashMap::new();
    loop {
        let offset = reader.stream_position()?;
        let Some(header) = keyword::read_header(reader, format)? else {
            break;
        };
        let data_offset = reader.stream_position()?;
        keyword::skip_data(reader, &header, format, stream_len)?;

        let occurrence = occurrences.entry(header.name.clone()).or_insert(0);
        trace!(
            "Indexed '{}' #{}: type={}, count={}, offset={:#x}",
            header.name,
            occurrence,
            header.data_type,
            header.count,
            offset
        );
        entries.push(IndexEntry {
            name: header.name,
            data_type: header.data_type,
            count: header.count,
            offset,
            data_offset,
            occurrence: *occurrence,
        });
        *occurrence += 1;
    }
    Ok(entries)
}
