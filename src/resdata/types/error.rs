//! Custom error types for the resdata-reader crate.

use thiserror::Error;

/// The primary error type for all operations in this crate.
#[derive(Debug, Error)]
pub enum ResdataError {
    /// An error originating from I/O operations.
    #[error("I/O error: {0:?}")]
    Io(#[from] std::io::Error),

    /// The stream is structurally invalid: bad keyword name, unknown type code,
    /// malformed grid or summary metadata.
    #[error("Invalid format: {0}")]
    Format(String),

    /// Fewer bytes were available than a record declared.
    #[error("Truncated record: expected {expected} bytes, but only {found} were available")]
    TruncatedRecord { expected: u64, found: u64 },

    /// The leading and trailing length markers of an unformatted record disagree.
    #[error("Record framing error: header marker {header} does not match trailer marker {trailer}")]
    Framing { header: i32, trailer: i32 },

    /// No keyword remains in the stream. Normal termination signal for scans.
    #[error("End of stream")]
    EndOfStream,

    /// A caller passed a position, ministep, cell or grid index outside the valid range.
    #[error("{what} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    /// Structural inconsistency between grids, LGRs and NNCs.
    #[error("Invalid topology: {0}")]
    InvalidTopology(String),

    /// A keyword has an unexpected size for its context.
    #[error("Size mismatch for {context}: expected {expected} elements, but found {found}")]
    SizeMismatch {
        context: String,
        expected: u64,
        found: u64,
    },

    /// Typed access was attempted with the wrong element type.
    #[error("Type mismatch for keyword '{keyword}': expected {expected}, found {found}")]
    TypeMismatch {
        keyword: String,
        expected: String,
        found: String,
    },

    /// A mutex lock was poisoned, indicating a panic in another thread holding the lock.
    #[error("A mutex lock was poisoned, indicating a panic in another thread holding the lock.")]
    LockPoisoned,
}

impl ResdataError {
    /// Whether this error describes structurally invalid data rather than an
    /// I/O failure or a caller mistake.
    pub fn is_format(&self) -> bool {
        matches!(
            self,
            ResdataError::Format(_)
                | ResdataError::Framing { .. }
                | ResdataError::SizeMismatch { .. }
                | ResdataError::TypeMismatch { .. }
        )
    }

    pub(crate) fn size_mismatch(context: impl Into<String>, expected: usize, found: usize) -> Self {
        ResdataError::SizeMismatch {
            context: context.into(),
            expected: expected as u64,
            found: found as u64,
        }
    }
}

/// A convenience `Result` type alias using the crate's `ResdataError` type.
pub type Result<T> = std::result::Result<T, ResdataError>;
