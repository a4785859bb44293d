use crate::error::{IndexError, OpenFailure, Result};
use log::debug;
use rayon::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Read-only handles for a batch of files, in the order they were requested
#[derive(Debug)]
pub struct OpenFiles {
    files: Vec<(PathBuf, File)>,
}

impl OpenFiles {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl IntoIterator for OpenFiles {
    type Item = (PathBuf, File);
    type IntoIter = std::vec::IntoIter<(PathBuf, File)>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.into_iter()
    }
}

/// Open every file concurrently.
///
/// Either all handles are returned or none: if any open fails the handles
/// that did open are dropped and every failure is reported together.
pub fn open_all<P: AsRef<Path> + Sync>(paths: &[P]) -> Result<OpenFiles> {
    let results: Vec<(PathBuf, std::io::Result<File>)> = paths
        .par_iter()
        .map(|path| {
            let path = path.as_ref();
            debug!("Opening {}", path.display());
            (path.to_path_buf(), File::open(path))
        })
        .collect();

    let mut files = Vec::with_capacity(results.len());
    let mut failures = Vec::new();
    for (path, result) in results {
        match result {
            Ok(file) => files.push((path, file)),
            Err(source) => failures.push(OpenFailure { path, source }),
        }
    }

    if !failures.is_empty() {
        return Err(IndexError::Open { failures });
    }
    Ok(OpenFiles { files })
}
