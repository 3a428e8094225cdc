//! Core data structures for the keyword container format.
//!
//! This module defines the fundamental types used throughout the library:
//! - Element type codes and their sizes
//! - Stream byte order and text/binary mode
//! - Keyword headers and index entries

use std::fmt;

use byteorder::{BigEndian, ByteOrder, LittleEndian};

use super::error::{ResdataError, Result};

/// Number of numeric elements stored per unformatted data record.
pub const BLOCKSIZE_NUMERIC: usize = 1000;
/// Number of string elements stored per unformatted data record.
pub const BLOCKSIZE_CHAR: usize = 105;

/// Width of a keyword name on disk.
pub const KEYWORD_NAME_LEN: usize = 8;
/// Width of a keyword type code on disk.
pub const TYPE_CODE_LEN: usize = 4;
/// Size of the unformatted keyword header record: name + count + type code.
pub const HEADER_RECORD_LEN: usize = KEYWORD_NAME_LEN + 4 + TYPE_CODE_LEN;

/// Element type of a keyword.
///
/// The on-disk four character codes are `INTE`, `REAL`, `DOUB`, `LOGI`,
/// `CHAR`, `MESS` and `Cnnn` for fixed width strings of `nnn` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Int,
    Real,
    Double,
    Bool,
    /// Eight character blank padded strings.
    Char,
    /// Message keyword without payload.
    Mess,
    /// Blank padded strings of the given width (1..=999).
    CharN(u16),
}

impl DataType {
    /// Size in bytes of one element as stored in the stream.
    pub fn element_size(self) -> usize {
        match self {
            DataType::Int | DataType::Real | DataType::Bool => 4,
            DataType::Double => 8,
            DataType::Char => KEYWORD_NAME_LEN,
            DataType::Mess => 0,
            DataType::CharN(width) => width as usize,
        }
    }

    /// Number of elements written per unformatted data record.
    pub fn block_size(self) -> usize {
        if self.is_numeric() {
            BLOCKSIZE_NUMERIC
        } else {
            BLOCKSIZE_CHAR
        }
    }

    /// Number of elements written per line in formatted mode.
    pub fn formatted_columns(self) -> usize {
        match self {
            DataType::Int => 6,
            DataType::Real => 4,
            DataType::Double => 3,
            DataType::Bool => 25,
            DataType::Char | DataType::CharN(_) => 7,
            DataType::Mess => 1,
        }
    }

    /// Multi-byte scalars that are byte swapped between stream and memory.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            DataType::Int | DataType::Real | DataType::Double | DataType::Bool
        )
    }

    pub fn is_string(self) -> bool {
        matches!(self, DataType::Char | DataType::CharN(_))
    }

    /// The four character type code written to the stream.
    pub fn type_code(self) -> String {
        match self {
            DataType::Int => "INTE".to_string(),
            DataType::Real => "REAL".to_string(),
            DataType::Double => "DOUB".to_string(),
            DataType::Bool => "LOGI".to_string(),
            DataType::Char => "CHAR".to_string(),
            DataType::Mess => "MESS".to_string(),
            DataType::CharN(width) => format!("C{:03}", width),
        }
    }

    /// Parses a four character type code.
    ///
    /// # Errors
    /// Returns [`ResdataError::Format`] for unknown codes and for `Cnnn`
    /// codes with a zero or non-numeric width.
    pub fn from_type_code(code: &str) -> Result<Self> {
        match code {
            "INTE" => Ok(DataType::Int),
            "REAL" => Ok(DataType::Real),
            "DOUB" => Ok(DataType::Double),
            "LOGI" => Ok(DataType::Bool),
            "CHAR" => Ok(DataType::Char),
            "MESS" => Ok(DataType::Mess),
            _ => {
                let width = code
                    .strip_prefix('C')
                    .filter(|digits| digits.len() == 3 && digits.bytes().all(|b| b.is_ascii_digit()))
                    .and_then(|digits| digits.parse::<u16>().ok())
                    .filter(|width| *width > 0);
                width.map(DataType::CharN).ok_or_else(|| {
                    ResdataError::Format(format!("Unrecognized element type code: '{}'", code))
                })
            }
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_code())
    }
}

/// Byte order of the multi-byte scalars in an unformatted stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Endianness {
    /// The byte order written by the simulators.
    #[default]
    Big,
    Little,
}

impl Endianness {
    /// Byte order of the running machine.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    /// Whether values must be byte swapped between this stream and memory.
    pub fn needs_flip(self) -> bool {
        self != Self::native()
    }

    pub fn read_i32(self, buf: &[u8]) -> i32 {
        match self {
            Endianness::Big => BigEndian::read_i32(buf),
            Endianness::Little => LittleEndian::read_i32(buf),
        }
    }

    pub fn write_i32(self, buf: &mut [u8], value: i32) {
        match self {
            Endianness::Big => BigEndian::write_i32(buf, value),
            Endianness::Little => LittleEndian::write_i32(buf, value),
        }
    }
}

/// The resolved wire encoding of a stream, fixed for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StreamFormat {
    /// Text mode instead of Fortran unformatted records.
    pub formatted: bool,
    /// Byte order of record markers and numeric data. Ignored in text mode.
    pub endian: Endianness,
}

impl StreamFormat {
    pub fn unformatted(endian: Endianness) -> Self {
        Self {
            formatted: false,
            endian,
        }
    }

    pub fn formatted() -> Self {
        Self {
            formatted: true,
            endian: Endianness::default(),
        }
    }
}

/// Caller override for the byte order of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndianMode {
    /// Probe the leading record.
    #[default]
    Auto,
    Big,
    Little,
}

/// Caller override for the text/binary mode of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatMode {
    /// Probe the leading record.
    #[default]
    Auto,
    Unformatted,
    Formatted,
}

/// Configuration passed when opening a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OpenOptions {
    pub endian: EndianMode,
    pub format: FormatMode,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn endian(mut self, endian: EndianMode) -> Self {
        self.endian = endian;
        self
    }

    pub fn format(mut self, format: FormatMode) -> Self {
        self.format = format;
        self
    }
}

/// Name, type and element count of a keyword, as found in its header record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeywordHeader {
    /// Name with the blank padding removed.
    pub name: String,
    pub data_type: DataType,
    pub count: usize,
}

/// One keyword occurrence in a scanned stream.
///
/// Carries everything needed to seek straight back to the keyword without
/// re-scanning; the payload itself is never held here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    pub name: String,
    pub data_type: DataType,
    pub count: usize,
    /// Absolute byte offset of the keyword header.
    pub offset: u64,
    /// Absolute byte offset of the first data record or line.
    pub data_offset: u64,
    /// Position among the keywords sharing this name, in file order.
    pub occurrence: usize,
}

impl IndexEntry {
    pub fn header(&self) -> KeywordHeader {
        KeywordHeader {
            name: self.name.clone(),
            data_type: self.data_type,
            count: self.count,
        }
    }
}
