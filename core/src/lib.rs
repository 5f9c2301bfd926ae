//! # tablediff-core
//!
//! Core library for tablediff - a streaming comparison engine for large,
//! key-ordered tabular data sets. Two row streams are sorted (in memory, or
//! with an external merge sort that spills batches to disk), grouped by key
//! and compared row-by-row, yielding a lazy sequence of diff records.
//!
//! This crate provides the engine that can be used by different interfaces
//! (the `tablediff` CLI, or other programs embedding it).

pub mod compare;
pub mod config;
pub mod error;
pub mod external_sort;
pub mod peekable;
pub mod source;
pub mod staging;
pub mod table;
pub mod value;

// Re-export the most commonly used types for convenience
pub use compare::{
    compare, compare_batches, compare_tables, CompareOptions, DiffRecord, DiffStream,
    DiffSummary, RowComparator, Source,
};
pub use config::Config;
pub use error::{DiffError, Result};
pub use external_sort::{ExternalMergeSorter, MergedRows};
pub use peekable::PeekableSequence;
pub use source::CsvSource;
pub use table::{Schema, Table};
pub use value::{Key, Row, Side, Value};
