//! Codec layer for the two record wire encodings.
//!
//! This module provides the framing primitives used by the keyword
//! parsers in [`format`](crate::resdata::format).
//!
//! # Submodules
//!
//! - [`record`][]: Fortran unformatted records (length markers, endian flip)
//! - [`formatted`][]: Text mode header and data lines

pub mod formatted;
pub mod record;
