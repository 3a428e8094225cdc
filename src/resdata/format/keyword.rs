//! # Keyword Codec
//!
//! Encodes and decodes one keyword on top of the record codecs. An
//! unformatted keyword is a 16 byte header record followed by as many data
//! records as needed to hold `count` elements in blocks of
//! [`BLOCKSIZE_NUMERIC`] or [`BLOCKSIZE_CHAR`] elements.

use std::io::{BufRead, BufReader, Read, Seek, Write};

use log::trace;

use crate::resdata::codec::{formatted, record};
use crate::resdata::types::error::{ResdataError, Result};
use crate::resdata::types::keyword::Keyword;
use crate::resdata::types::models::*;
use crate::resdata::utils::{pad_ascii, validate_name};

/// Encodes a keyword header into its 16 byte record payload.
pub fn encode_header(header: &KeywordHeader, endian: Endianness) -> Result<[u8; HEADER_RECORD_LEN]> {
    let count = i32::try_from(header.count).map_err(|_| {
        ResdataError::Format(format!(
            "Keyword '{}' has {} elements, more than a header can declare",
            header.name, header.count
        ))
    })?;
    let mut buf = [0u8; HEADER_RECORD_LEN];
    buf[..KEYWORD_NAME_LEN].copy_from_slice(&pad_ascii(&header.name, KEYWORD_NAME_LEN)?);
    endian.write_i32(&mut buf[KEYWORD_NAME_LEN..KEYWORD_NAME_LEN + 4], count);
    buf[KEYWORD_NAME_LEN + 4..].copy_from_slice(header.data_type.type_code().as_bytes());
    Ok(buf)
}

/// Decodes a 16 byte header record payload.
///
/// # Errors
/// Returns [`ResdataError::Format`] if:
/// - the record is not 16 bytes long
/// - the name is not a valid 8 character token
/// - the element count is negative
/// - the element type code is unrecognized
pub fn decode_header(bytes: &[u8], endian: Endianness) -> Result<KeywordHeader> {
    if bytes.len() != HEADER_RECORD_LEN {
        return Err(ResdataError::Format(format!(
            "Keyword header record has {} bytes, expected {}",
            bytes.len(),
            HEADER_RECORD_LEN
        )));
    }
    let name_bytes = &bytes[..KEYWORD_NAME_LEN];
    let name = std::str::from_utf8(name_bytes)
        .map_err(|_| ResdataError::Format(format!("Keyword name is not ASCII: {:?}", name_bytes)))?;
    let name = validate_name(name)?;
    let count = endian.read_i32(&bytes[KEYWORD_NAME_LEN..KEYWORD_NAME_LEN + 4]);
    let count = usize::try_from(count).map_err(|_| {
        ResdataError::Format(format!("Keyword '{}' declares a negative count: {}", name, count))
    })?;
    let code = String::from_utf8_lossy(&bytes[KEYWORD_NAME_LEN + 4..]);
    let data_type = DataType::from_type_code(&code)?;
    Ok(KeywordHeader {
        name,
        data_type,
        count,
    })
}

/// Reads the next keyword header.
///
/// Returns `Ok(None)` when the stream holds no further keyword.
pub fn read_header<R: Read + Seek>(
    reader: &mut BufReader<R>,
    format: StreamFormat,
) -> Result<Option<KeywordHeader>> {
    if format.formatted {
        let mut line = String::new();
        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            if !line.trim().is_empty() {
                return formatted::parse_header_line(&line).map(Some);
            }
        }
    }
    match record::read_record(reader, format.endian)? {
        Some(bytes) => decode_header(&bytes, format.endian).map(Some),
        None => Ok(None),
    }
}

fn data_record_len(header: &KeywordHeader, block: usize) -> usize {
    block * header.data_type.element_size()
}

/// Element counts of the unformatted data records of a keyword.
fn record_blocks(header: &KeywordHeader) -> impl Iterator<Item = usize> {
    let block = header.data_type.block_size();
    let count = header.count;
    let records = if header.data_type.element_size() == 0 {
        0
    } else {
        count.div_ceil(block)
    };
    (0..records).map(move |r| block.min(count - r * block))
}

/// Reads the data following `header` into a native-order payload.
///
/// # Errors
/// - [`ResdataError::TruncatedRecord`] if the stream ends inside the data
/// - [`ResdataError::Format`] if a data record has the wrong length
pub fn read_data<R: Read + Seek>(
    reader: &mut BufReader<R>,
    header: &KeywordHeader,
    format: StreamFormat,
) -> Result<Vec<u8>> {
    if format.formatted {
        let expected = formatted::data_line_count(header.data_type, header.count);
        let mut lines = Vec::with_capacity(expected);
        for _ in 0..expected {
            let mut line = String::new();
            if reader.read_line(&mut line)? == 0 {
                return Err(ResdataError::Format(format!(
                    "Keyword '{}' ends after {} of {} data lines",
                    header.name,
                    lines.len(),
                    expected
                )));
            }
            lines.push(line);
        }
        return formatted::parse_data(header, &lines);
    }

    let size = header.data_type.element_size();
    let mut data = Vec::with_capacity(header.count * size);
    for block in record_blocks(header) {
        let expected = data_record_len(header, block);
        let bytes = record::read_record(reader, format.endian)?.ok_or(
            ResdataError::TruncatedRecord {
                expected: expected as u64,
                found: 0,
            },
        )?;
        if bytes.len() != expected {
            return Err(ResdataError::Format(format!(
                "Data record of '{}' has {} bytes, expected {}",
                header.name,
                bytes.len(),
                expected
            )));
        }
        data.extend_from_slice(&bytes);
    }
    if header.data_type.is_numeric() && format.endian.needs_flip() {
        record::endian_flip(&mut data, size);
    }
    Ok(data)
}

/// Advances past the data following `header` without decoding it.
pub fn skip_data<R: Read + Seek>(
    reader: &mut BufReader<R>,
    header: &KeywordHeader,
    format: StreamFormat,
    stream_len: u64,
) -> Result<()> {
    if format.formatted {
        let expected = formatted::data_line_count(header.data_type, header.count);
        let mut line = String::new();
        for read in 0..expected {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                return Err(ResdataError::Format(format!(
                    "Keyword '{}' ends after {} of {} data lines",
                    header.name, read, expected
                )));
            }
        }
        return Ok(());
    }

    for block in record_blocks(header) {
        let expected = data_record_len(header, block);
        let len = record::skip_record(reader, format.endian, stream_len)?.ok_or(
            ResdataError::TruncatedRecord {
                expected: expected as u64,
                found: 0,
            },
        )?;
        if len != expected {
            return Err(ResdataError::Format(format!(
                "Data record of '{}' has {} bytes, expected {}",
                header.name, len, expected
            )));
        }
    }
    Ok(())
}

/// Decodes the next keyword in the stream.
///
/// # Errors
/// Returns [`ResdataError::EndOfStream`] when no keyword remains.
pub fn decode_next<R: Read + Seek>(reader: &mut BufReader<R>, format: StreamFormat) -> Result<Keyword> {
    let header = read_header(reader, format)?.ok_or(ResdataError::EndOfStream)?;
    let data = read_data(reader, &header, format)?;
    trace!(
        "Decoded keyword '{}': type={}, count={}",
        header.name,
        header.data_type,
        header.count
    );
    Keyword::from_raw(&header.name, header.data_type, header.count, data)
}

/// Encodes `keyword` to the stream.
pub fn encode(writer: &mut impl Write, keyword: &Keyword, format: StreamFormat) -> Result<()> {
    let header = keyword.header();
    if format.formatted {
        writer.write_all(formatted::header_line(&header).as_bytes())?;
        writer.write_all(b"\n")?;
        return formatted::write_data(writer, keyword);
    }

    record::write_record(writer, format.endian, &encode_header(&header, format.endian)?)?;
    let size = header.data_type.element_size();
    let flip = header.data_type.is_numeric() && format.endian.needs_flip();
    let mut offset = 0;
    let mut buf = Vec::new();
    for block in record_blocks(&header) {
        let len = data_record_len(&header, block);
        buf.clear();
        buf.extend_from_slice(&keyword.data()[offset..offset + len]);
        if flip {
            record::endian_flip(&mut buf, size);
        }
        record::write_record(writer, format.endian, &buf)?;
        offset += len;
    }
    Ok(())
}

/// Absolute byte offset of element `index` in an unformatted keyword whose
/// first data record starts at `data_offset`.
pub fn element_offset(data_offset: u64, data_type: DataType, index: usize) -> u64 {
    let block = data_type.block_size() as u64;
    let size = data_type.element_size() as u64;
    let index = index as u64;
    let full_record = block * size + 2 * record::MARKER_SIZE;
    data_offset + (index / block) * full_record + record::MARKER_SIZE + (index % block) * size
}
