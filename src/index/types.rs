use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Normalized term used as an index key
pub type Term = String;

/// Identifier of a document a term occurs in
pub type PostingId = u32;

/// Block sequence number, starting at 1
pub type BlockNumber = u32;

/// Width of the fixed term field in a record
pub const TERM_WIDTH: usize = 20;

/// Byte used to left-pad short terms
pub const TERM_PAD: u8 = b' ';

/// Size of the record header (term field + posting count)
pub const RECORD_HEADER_SIZE: usize = TERM_WIDTH + 4;

/// One decoded (term, postings) record of a block or index file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub term: Term,
    pub postings: Vec<PostingId>,
}

impl Record {
    pub fn new(term: impl Into<Term>, postings: Vec<PostingId>) -> Self {
        Self {
            term: term.into(),
            postings,
        }
    }

    /// Size of this record once encoded
    pub fn encoded_len(&self) -> usize {
        RECORD_HEADER_SIZE + 4 * self.postings.len()
    }
}

/// File name of block `number` for the index at `base`: `<base>_<number>`
pub fn block_file_name(base: &Path, number: BlockNumber) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(format!("_{}", number));
    PathBuf::from(name)
}

/// Configuration for the index builder
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Number of documents appended before a block is flushed
    pub docs_per_block: usize,
    /// Write blocks on a background thread while the next block accumulates
    pub background_flush: bool,
    /// Keep block files on disk after a successful merge
    pub keep_blocks: bool,
    /// Show progress bars
    pub show_progress: bool,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            docs_per_block: 10_000,
            background_flush: true,
            keep_blocks: false,
            show_progress: true,
        }
    }
}

impl IndexConfig {
    /// Load a config file, missing keys take their default value
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: IndexConfig = serde_json::from_str(&content)
            .map_err(|e| IndexError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.docs_per_block == 0 {
            return Err(IndexError::Config(
                "docs_per_block must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_block_file_name() {
        assert_eq!(
            block_file_name(Path::new("myIndex"), 1),
            PathBuf::from("myIndex_1")
        );
        assert_eq!(
            block_file_name(Path::new("/tmp/out/idx.bin"), 12),
            PathBuf::from("/tmp/out/idx.bin_12")
        );
    }

    #[test]
    fn test_record_encoded_len() {
        assert_eq!(Record::new("a", vec![]).encoded_len(), 24);
        assert_eq!(Record::new("a", vec![1, 2, 3]).encoded_len(), 36);
    }

    #[test]
    fn test_config_partial_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "docs_per_block": 5, "keep_blocks": true }"#).unwrap();

        let config = IndexConfig::load(&path).unwrap();
        assert_eq!(config.docs_per_block, 5);
        assert!(config.keep_blocks);
        assert!(config.background_flush);
    }

    #[test]
    fn test_config_rejects_zero_block_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{ "docs_per_block": 0 }"#).unwrap();

        assert!(matches!(
            IndexConfig::load(&path),
            Err(IndexError::Config(_))
        ));
    }
}
