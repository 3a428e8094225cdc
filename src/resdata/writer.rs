//! Sequential keyword writer.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, info};

use super::format::keyword;
use super::types::error::Result;
use super::types::keyword::Keyword;
use super::types::models::StreamFormat;

/// Writes keywords one after another in a fixed wire encoding.
///
/// The encoding is the exact inverse of the decoder used by
/// [`ResFile`](crate::ResFile), so anything written here can be scanned and
/// loaded back.
#[derive(Debug)]
pub struct ResWriter<W: Write> {
    writer: W,
    format: StreamFormat,
    written: usize,
}

impl ResWriter<BufWriter<File>> {
    /// Creates (or truncates) a keyword file.
    pub fn create(path: impl AsRef<Path>, format: StreamFormat) -> Result<Self> {
        let path = path.as_ref();
        info!(
            "Creating keyword file: {} (formatted={}, endian={:?})",
            path.display(),
            format.formatted,
            format.endian
        );
        Ok(Self::new(BufWriter::new(File::create(path)?), format))
    }
}

impl<W: Write> ResWriter<W> {
    pub fn new(writer: W, format: StreamFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
        }
    }

    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Number of keywords written so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Appends one keyword.
    pub fn write_keyword(&mut self, keyword: &Keyword) -> Result<()> {
        keyword::encode(&mut self.writer, keyword, self.format)?;
        self.written += 1;
        debug!(
            "Wrote keyword '{}': type={}, count={}",
            keyword.name(),
            keyword.data_type(),
            keyword.len()
        );
        Ok(())
    }

    /// Appends every keyword in order.
    pub fn write_all<'k>(&mut self, keywords: impl IntoIterator<Item = &'k Keyword>) -> Result<()> {
        for keyword in keywords {
            self.write_keyword(keyword)?;
        }
        Ok(())
    }

    /// Flushes buffered output and returns the underlying writer.
    pub fn finish(mut self) -> Result<W> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
