//! Utility functions shared by the index pipeline.
//!
//! - [`encoding`] - Little-endian integer I/O
//! - [`progress`] - Progress bars (no-op without the `progress` feature)
//! - [`tokenizer`] - Document text to normalized terms

pub mod encoding;
pub mod progress;
pub mod tokenizer;

pub use encoding::*;
pub use tokenizer::{DocumentTokenizer, Tokenizer};
