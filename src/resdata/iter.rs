//! Iterators for sequential access to the keywords of a scanned file.
//!
//! The catalog is walked in file order and each keyword is decoded only
//! when the iterator reaches it:
//!
//! 1. [`KeywordIter`] - yields every decoded [`Keyword`] in its range
//! 2. [`NamedIter`] - restricts that walk to the occurrences of one name
//!
//! # Example
//! ```no_run
//! # use resdata_reader::ResFile;
//! # let file = ResFile::scan_path("CASE.EGRID").unwrap();
//! for keyword in file.iter().named("ZCORN") {
//!     let keyword = keyword.unwrap();
//!     println!("{}: {} elements", keyword.name(), keyword.len());
//! }
//! ```

use std::ops::Range;

use super::reader::ResFile;
use super::types::error::Result;
use super::types::keyword::Keyword;
use super::types::models::IndexEntry;

/// Iterator decoding keywords from a range of catalog entries.
///
/// Created by [`ResFile::iter()`](crate::ResFile::iter) and
/// [`BlockView::iter()`](crate::BlockView::iter).
pub struct KeywordIter<'a> {
    file: &'a ResFile,
    positions: Range<usize>,
}

impl<'a> KeywordIter<'a> {
    pub(super) fn new(file: &'a ResFile, positions: Range<usize>) -> Self {
        Self { file, positions }
    }

    /// Restricts the walk to keywords called `name`.
    pub fn named(self, name: &str) -> NamedIter<'a> {
        NamedIter {
            inner: self,
            name: name.to_string(),
        }
    }

    fn entry(&self, position: usize) -> &'a IndexEntry {
        &self.file.entries()[position]
    }
}

impl<'a> Iterator for KeywordIter<'a> {
    type Item = Result<Keyword>;

    fn next(&mut self) -> Option<Self::Item> {
        let position = self.positions.next()?;
        Some(self.file.load(self.entry(position)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.positions.size_hint()
    }
}

/// Iterator over the occurrences of one keyword name, in file order.
pub struct NamedIter<'a> {
    inner: KeywordIter<'a>,
    name: String,
}

impl<'a> Iterator for NamedIter<'a> {
    type Item = Result<Keyword>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let position = self.inner.positions.next()?;
            let entry = self.inner.entry(position);
            if entry.name == self.name {
                return Some(self.inner.file.load(entry));
            }
        }
    }
}
