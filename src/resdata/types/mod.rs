//! Foundational data structures, error types, and typed element access.

pub mod element;
pub mod error;
pub mod keyword;
pub mod models;
