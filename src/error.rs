use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A single file that could not be opened as part of a batch
#[derive(Debug)]
pub struct OpenFailure {
    pub path: PathBuf,
    pub source: io::Error,
}

impl fmt::Display for OpenFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.source)
    }
}

/// Main error type for block construction and merging
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Malformed record in {} at byte {offset}: {reason}", .path.display())]
    Validation {
        path: PathBuf,
        offset: u64,
        reason: String,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to open {} file(s): {}", .failures.len(), join_failures(.failures))]
    Open { failures: Vec<OpenFailure> },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid document at {}:{line}: {reason}", .path.display())]
    Input {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Background flush of {} did not complete", .path.display())]
    BackgroundWrite { path: PathBuf },

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Result type alias for index operations
pub type Result<T> = std::result::Result<T, IndexError>;

fn join_failures(failures: &[OpenFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl IndexError {
    /// Paths of the files that failed to open, empty for other errors
    pub fn failed_paths(&self) -> Vec<&PathBuf> {
        match self {
            IndexError::Open { failures } => failures.iter().map(|f| &f.path).collect(),
            _ => Vec::new(),
        }
    }
}
