//! # resdata-reader
//!
//! A reader and writer for ECLIPSE-style Fortran keyword containers.
//! Handles unformatted (big or little endian) and formatted streams, builds
//! corner-point grids with local refinements and non-neighbor connections,
//! and reads summary catalogs and their time series.
pub mod resdata;

// Re-export the main types for convenience
pub use resdata::{
    BlockView,
    Element,
    Keyword,
    ResFile,
    ResWriter,
    ResdataError,
    Result,
    grid::{Grid, GridNode, GridOptions, LgrId, MapAxes, NncPair, Point},
    models::{
        DataType,
        EndianMode,
        Endianness,
        FormatMode,
        IndexEntry,
        KeywordHeader,
        OpenOptions,
        StreamFormat,
    },
    summary::{SummaryData, SummaryIndex, SummaryNode, SummaryOptions, VarType},
};
