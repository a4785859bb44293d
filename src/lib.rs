//! # blockdex - block-based inverted index construction
//!
//! Builds a disk-resident inverted index (term to sorted posting ids) from a
//! stream of tokenized documents. Postings accumulate in memory, are flushed
//! as sorted block files, and all blocks are finally merged into one index
//! file with an external k-way merge.
//!
//! ## Architecture
//!
//! - [`index::accumulator`] - In-memory postings of the current block
//! - [`index::writer`] - Block numbering and durable flushes
//! - [`index::merge`] - k-way merge of block files
//! - [`index::pool`] - All-or-nothing concurrent file opening
//! - [`index::codec`] - The fixed record layout shared by blocks and indexes
//! - [`index::build`] - The append / flush / merge driver
//! - [`utils`] - Integer I/O, progress bars and the document tokenizer
//!
//! ## Quick Start
//!
//! ```no_run
//! use blockdex::index::{IndexBuilder, IndexConfig};
//! use std::path::Path;
//!
//! let mut builder = IndexBuilder::new(Path::new("myIndex"), IndexConfig::default())?;
//! builder.add_document(1, ["austin", "pizza"])?;
//! builder.add_document(2, ["pizza"])?;
//! let summary = builder.finish()?;
//! println!("{} terms", summary.merge.terms);
//! # Ok::<(), blockdex::IndexError>(())
//! ```
//!
//! ## File format
//!
//! Blocks and the merged index share one layout, a sequence of records:
//! `[term: 20 bytes][count: u32 LE][id: u32 LE] * count`. See [`index::codec`].

pub mod error;
pub mod index;
pub mod utils;

pub use error::{IndexError, Result};
