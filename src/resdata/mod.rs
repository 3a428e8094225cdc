//! Core keyword container module

pub mod codec;
pub mod format;
pub mod grid;
pub mod iter;
pub mod reader;
pub mod summary;
pub mod types;
pub mod utils;
pub mod writer;

pub use reader::{BlockView, ResFile};
pub use types::element::Element;
pub use types::error::{ResdataError, Result};
pub use types::keyword::Keyword;
pub use types::models;
pub use writer::ResWriter;
