use crate::error::{IndexError, Result};
use crate::index::codec::RecordCursor;
use std::fs;
use std::io::Write;
use std::path::Path;

/// Summary of a block or index file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexStats {
    pub records: usize,
    pub postings: u64,
    pub longest_list: usize,
    pub longest_term: Option<String>,
    pub file_size: u64,
    /// Every term is strictly greater than the previous one
    pub strictly_sorted: bool,
    /// Every posting list is in ascending order
    pub postings_sorted: bool,
}

impl IndexStats {
    /// Decode a file and gather its statistics
    pub fn collect(path: &Path) -> Result<Self> {
        let file_size = fs::metadata(path)
            .map_err(|source| IndexError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .len();

        let mut stats = IndexStats {
            file_size,
            strictly_sorted: true,
            postings_sorted: true,
            ..Default::default()
        };
        let mut previous: Option<String> = None;

        for record in RecordCursor::open(path)? {
            let record = record?;
            stats.records += 1;
            stats.postings += record.postings.len() as u64;

            if record.postings.len() > stats.longest_list || stats.longest_term.is_none() {
                stats.longest_list = record.postings.len();
                stats.longest_term = Some(record.term.clone());
            }
            if !record.postings.is_sorted() {
                stats.postings_sorted = false;
            }
            if previous.as_ref().is_some_and(|p| *p >= record.term) {
                stats.strictly_sorted = false;
            }
            previous = Some(record.term);
        }

        Ok(stats)
    }
}

/// Display statistics for a block or index file
pub fn show_stats(path: &Path) -> Result<()> {
    let stats = IndexStats::collect(path)?;

    println!("Index Statistics");
    println!("================");
    println!();
    println!("File:             {}", path.display());
    println!("File size:        {}", format_size(stats.file_size));
    println!("Terms:            {}", stats.records);
    println!("Postings:         {}", stats.postings);
    if let Some(term) = &stats.longest_term {
        println!("Longest list:     {} ({} postings)", term, stats.longest_list);
    }
    println!(
        "Unique terms:     {}",
        if stats.strictly_sorted { "yes" } else { "no (block file or unsorted)" }
    );
    println!(
        "Sorted postings:  {}",
        if stats.postings_sorted { "yes" } else { "no" }
    );

    Ok(())
}

/// Write every record as `term<TAB>id,id,...`
pub fn dump_index<W: Write>(path: &Path, out: &mut W) -> Result<usize> {
    let mut count = 0;
    for record in RecordCursor::open(path)? {
        let record = record?;
        let ids = record
            .postings
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        writeln!(out, "{}\t{}", record.term, ids)?;
        count += 1;
    }
    Ok(count)
}

/// Format byte size to human readable
fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
