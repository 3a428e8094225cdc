//! Keyword parsing layer.
//!
//! This module bridges between the record codecs and the high-level
//! [`ResFile`](crate::resdata::reader::ResFile) index.
//!
//! # Module Organization
//!
//! - [`keyword`]: Encodes and decodes one keyword (header + data records)
//! - [`index`]: Probes the stream encoding and scans keyword headers
//!
//! # Architecture
//!
//! ```text
//! Stream Structure:
//! ┌─────────────────┐
//! │ Header record   │ ← keyword::read_header()
//! │ 'COORD   ' REAL │
//! ├─────────────────┤
//! │ Data records    │ ← keyword::read_data() / skip_data()
//! │ (≤1000 numeric  │
//! │  or ≤105 string │
//! │  per record)    │
//! ├─────────────────┤
//! │ Header record   │
//! │ ...             │
//! └─────────────────┘
//! ```

pub mod index;
pub mod keyword;
