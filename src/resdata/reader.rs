//! Random access to the keywords of one file.
//!
//! [`ResFile`] probes the encoding of a file and catalogs every keyword
//! occurrence with its offset; payloads are decoded on demand. A
//! [`BlockView`] scopes the same queries to a contiguous run of entries,
//! such as one LGR section of a grid file or one report step of a restart
//! file.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Seek, SeekFrom};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use log::{debug, info};

use super::format::{index, keyword};
use super::iter::KeywordIter;
use super::types::element::Element;
use super::types::error::{ResdataError, Result};
use super::types::keyword::Keyword;
use super::types::models::*;
use super::utils::read_full;

/// A keyword file opened for random access.
///
/// Opening probes the wire encoding and checks that the stream starts with
/// a keyword; [`scan`](Self::scan) then builds the ordered catalog of
/// keyword occurrences. Payloads are only read by [`load`](Self::load),
/// which seeks straight to the recorded offset.
///
/// The catalog is immutable once built and the handle can be shared across
/// threads; reads are serialized on an internal lock.
#[derive(Debug)]
pub struct ResFile {
    path: PathBuf,
    file: Arc<Mutex<BufReader<File>>>,
    format: StreamFormat,
    stream_len: u64,
    entries: Vec<IndexEntry>,
    by_name: HashMap<String, Vec<usize>>,
}

impl ResFile {
    /// Opens a keyword file, probing its encoding.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The leading record does not parse as a keyword
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with(path, OpenOptions::default())
    }

    /// Opens a keyword file with explicit encoding overrides.
    ///
    /// # Arguments
    /// * `path` - File path to the keyword file
    /// * `options` - Byte order and text/binary overrides; `Auto` fields are probed
    ///
    /// # Errors
    /// Returns an error if:
    /// - The file cannot be opened
    /// - The leading record does not parse as a keyword
    pub fn open_with(path: impl AsRef<Path>, options: OpenOptions) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening keyword file: {}", path.display());
        let file = File::open(path)?;
        let stream_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        let format = index::probe(&mut reader, options)?;
        match keyword::read_header(&mut reader, format) {
            Ok(Some(header)) => debug!("Leading keyword: '{}'", header.name),
            Ok(None) => return Err(ResdataError::Format("Stream holds no keyword".to_string())),
            Err(ResdataError::Io(e)) => return Err(ResdataError::Io(e)),
            Err(e) => {
                return Err(ResdataError::Format(format!(
                    "Leading record does not parse as a keyword: {}",
                    e
                )))
            }
        }
        reader.seek(SeekFrom::Start(0))?;

        Ok(Self {
            path: path.to_path_buf(),
            file: Arc::new(Mutex::new(reader)),
            format,
            stream_len,
            entries: Vec::new(),
            by_name: HashMap::new(),
        })
    }

    /// Opens and scans a keyword file in one step.
    pub fn scan_path(path: impl AsRef<Path>) -> Result<Self> {
        let mut file = Self::open(path)?;
        file.scan()?;
        Ok(file)
    }

    /// Builds the ordered catalog of keyword occurrences.
    ///
    /// Reads header records only. Calling it again rebuilds the catalog
    /// from the start of the stream.
    pub fn scan(&mut self) -> Result<()> {
        let entries = {
            let mut reader = self.file.lock().map_err(|_| ResdataError::LockPoisoned)?;
            index::scan(&mut *reader, self.format, self.stream_len)?
        };
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (position, entry) in entries.iter().enumerate() {
            by_name.entry(entry.name.clone()).or_default().push(position);
        }
        info!(
            "Scanned {}: {} keywords, {} distinct names",
            self.path.display(),
            entries.len(),
            by_name.len()
        );
        self.entries = entries;
        self.by_name = by_name;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The resolved wire encoding of the stream.
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// All catalog entries in file order.
    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Distinct keyword names in order of first appearance.
    pub fn names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|entry| entry.occurrence == 0)
            .map(|entry| entry.name.as_str())
            .collect()
    }

    /// Entry for occurrence `occurrence` of keyword `name`.
    pub fn get(&self, name: &str, occurrence: usize) -> Option<&IndexEntry> {
        self.by_name
            .get(name)
            .and_then(|positions| positions.get(occurrence))
            .map(|&position| &self.entries[position])
    }

    /// Number of occurrences of keyword `name`.
    pub fn num_named(&self, name: &str) -> usize {
        self.by_name.get(name).map_or(0, Vec::len)
    }

    pub fn has(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Returns an iterator decoding every keyword in file order.
    pub fn iter(&self) -> KeywordIter<'_> {
        KeywordIter::new(self, 0..self.entries.len())
    }

    /// Decodes the keyword recorded by `entry`.
    ///
    /// # Errors
    /// Returns [`ResdataError::Format`] if the bytes at the recorded offset no
    /// longer decode to the indexed keyword.
    pub fn load(&self, entry: &IndexEntry) -> Result<Keyword> {
        let mut reader = self.file.lock().map_err(|_| ResdataError::LockPoisoned)?;
        reader.seek(SeekFrom::Start(entry.offset))?;
        let header = match keyword::read_header(&mut *reader, self.format) {
            Ok(Some(header)) => header,
            Ok(None) | Err(ResdataError::EndOfStream) => return Err(stale_entry(entry, "end of stream")),
            Err(ResdataError::Io(e)) => return Err(ResdataError::Io(e)),
            Err(e) => return Err(stale_entry(entry, &e.to_string())),
        };
        if header != entry.header() {
            return Err(stale_entry(entry, &format!("found '{}'", header.name)));
        }
        let data = match keyword::read_data(&mut *reader, &header, self.format) {
            Ok(data) => data,
            Err(ResdataError::Io(e)) => return Err(ResdataError::Io(e)),
            Err(e) => return Err(stale_entry(entry, &e.to_string())),
        };
        Keyword::from_raw(&header.name, header.data_type, header.count, data)
    }

    /// Decodes occurrence `occurrence` of keyword `name`.
    ///
    /// # Errors
    /// Returns [`ResdataError::Format`] if the keyword is absent.
    pub fn load_named(&self, name: &str, occurrence: usize) -> Result<Keyword> {
        let entry = self.get(name, occurrence).ok_or_else(|| missing(name, occurrence))?;
        self.load(entry)
    }

    /// Reads elements `range` of a numeric keyword without decoding the rest.
    ///
    /// Unformatted streams seek directly into the data records; formatted
    /// streams decode the whole keyword.
    ///
    /// # Errors
    /// - [`ResdataError::TypeMismatch`] if `T` is not the keyword's element type
    /// - [`ResdataError::IndexOutOfRange`] if `range` exceeds the element count
    /// - [`ResdataError::TruncatedRecord`] if the stream ends inside the range
    pub fn read_elements<T: Element>(&self, entry: &IndexEntry, range: Range<usize>) -> Result<Vec<T>> {
        if entry.data_type != T::DATA_TYPE {
            return Err(ResdataError::TypeMismatch {
                keyword: entry.name.clone(),
                expected: T::DATA_TYPE.to_string(),
                found: entry.data_type.to_string(),
            });
        }
        if range.start > range.end || range.end > entry.count {
            return Err(ResdataError::IndexOutOfRange {
                what: "element",
                index: range.end.max(range.start),
                len: entry.count,
            });
        }
        if self.format.formatted {
            let values = self.load(entry)?.values::<T>()?;
            return Ok(values[range].to_vec());
        }

        let size = entry.data_type.element_size();
        let block = entry.data_type.block_size();
        let mut values = Vec::with_capacity(range.len());
        let mut buf = vec![0u8; size];
        let mut reader = self.file.lock().map_err(|_| ResdataError::LockPoisoned)?;
        let mut index = range.start;
        while index < range.end {
            // Elements are contiguous up to the end of their record.
            let run_end = range.end.min((index / block + 1) * block);
            reader.seek(SeekFrom::Start(keyword::element_offset(
                entry.data_offset,
                entry.data_type,
                index,
            )))?;
            for _ in index..run_end {
                let n = read_full(&mut *reader, &mut buf)?;
                if n < size {
                    return Err(ResdataError::TruncatedRecord {
                        expected: size as u64,
                        found: n as u64,
                    });
                }
                if self.format.endian.needs_flip() {
                    buf.reverse();
                }
                values.push(T::read_native(&buf));
            }
            index = run_end;
        }
        Ok(values)
    }

    /// Reads a single element of a numeric keyword.
    pub fn read_element<T: Element>(&self, entry: &IndexEntry, index: usize) -> Result<T> {
        let values = self.read_elements::<T>(entry, index..index + 1)?;
        values.into_iter().next().ok_or(ResdataError::IndexOutOfRange {
            what: "element",
            index,
            len: entry.count,
        })
    }

    /// The whole catalog as a view.
    pub fn view(&self) -> BlockView<'_> {
        BlockView::new(self, 0..self.entries.len())
    }

    /// The entries from occurrence `occurrence` of `name` up to, but not
    /// including, the next occurrence of `name` (or the end of the file).
    pub fn block_view(&self, name: &str, occurrence: usize) -> Option<BlockView<'_>> {
        let positions = self.by_name.get(name)?;
        let start = *positions.get(occurrence)?;
        let end = positions.get(occurrence + 1).copied().unwrap_or(self.entries.len());
        Some(BlockView::new(self, start..end))
    }

    /// The entries before the first occurrence of `name`; the whole catalog
    /// if `name` never occurs.
    pub fn head_view(&self, name: &str) -> BlockView<'_> {
        let end = self
            .by_name
            .get(name)
            .and_then(|positions| positions.first().copied())
            .unwrap_or(self.entries.len());
        BlockView::new(self, 0..end)
    }
}

fn stale_entry(entry: &IndexEntry, detail: &str) -> ResdataError {
    ResdataError::Format(format!(
        "Keyword '{}' at offset {:#x} no longer decodes consistently: {}",
        entry.name, entry.offset, detail
    ))
}

fn missing(name: &str, occurrence: usize) -> ResdataError {
    ResdataError::Format(format!(
        "Keyword '{}' occurrence {} is missing",
        name, occurrence
    ))
}

/// A contiguous range of catalog entries, queried like a file of its own.
///
/// Occurrence numbers are relative to the view.
#[derive(Debug, Clone)]
pub struct BlockView<'a> {
    file: &'a ResFile,
    range: Range<usize>,
}

impl<'a> BlockView<'a> {
    fn new(file: &'a ResFile, range: Range<usize>) -> Self {
        Self { file, range }
    }

    pub fn file(&self) -> &'a ResFile {
        self.file
    }

    pub fn entries(&self) -> &'a [IndexEntry] {
        &self.file.entries[self.range.clone()]
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }

    pub fn get(&self, name: &str, occurrence: usize) -> Option<&'a IndexEntry> {
        self.entries()
            .iter()
            .filter(|entry| entry.name == name)
            .nth(occurrence)
    }

    pub fn num_named(&self, name: &str) -> usize {
        self.entries().iter().filter(|entry| entry.name == name).count()
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name, 0).is_some()
    }

    /// Decodes occurrence `occurrence` of `name` within this view.
    pub fn load(&self, name: &str, occurrence: usize) -> Result<Keyword> {
        let entry = self.get(name, occurrence).ok_or_else(|| missing(name, occurrence))?;
        self.file.load(entry)
    }

    /// Decodes `name` if it occurs in this view.
    pub fn load_optional(&self, name: &str) -> Result<Option<Keyword>> {
        self.get(name, 0).map(|entry| self.file.load(entry)).transpose()
    }

    /// Returns an iterator decoding the keywords of this view in order.
    pub fn iter(&self) -> KeywordIter<'a> {
        KeywordIter::new(self.file, self.range.clone())
    }
}
