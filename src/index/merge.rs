//! External k-way merge of block files into one index file
//!
//! Every block is sorted by term and each posting list by id, so the merge
//! only ever holds one record per block in memory. Terms present in several
//! blocks are combined into a single record whose posting list is the
//! numeric merge of the per-block lists (duplicates kept).

use crate::error::{IndexError, Result};
use crate::index::codec::{write_record, RecordCursor};
use crate::index::pool::open_all;
use crate::index::types::{PostingId, Record, Term};
use log::{debug, info, warn};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Outcome of a successful merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    pub blocks: usize,
    pub terms: usize,
    pub postings: u64,
    pub bytes: u64,
}

/// Merges a set of block files into a single sorted index file
pub struct BlockMerger {
    output: PathBuf,
    blocks: Vec<PathBuf>,
}

/// One block being consumed by the merge
struct BlockStream {
    cursor: RecordCursor<BufReader<File>>,
    head: Option<Record>,
}

impl BlockStream {
    fn advance(&mut self) -> Result<()> {
        self.head = self.cursor.next_record()?;
        Ok(())
    }
}

impl BlockMerger {
    pub fn new(output: &Path, blocks: Vec<PathBuf>) -> Self {
        Self {
            output: output.to_path_buf(),
            blocks,
        }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn blocks(&self) -> &[PathBuf] {
        &self.blocks
    }

    /// Run the merge.
    ///
    /// Any open, read or decode failure aborts the merge. Once the output
    /// has been created, an abort also removes it; a failure before that
    /// leaves whatever is at the output path alone.
    pub fn merge(&self) -> Result<MergeSummary> {
        info!(
            "Merging {} blocks into {}",
            self.blocks.len(),
            self.output.display()
        );
        let summary = self.run()?;
        info!(
            "Merged index {} ({} terms, {} postings, {} bytes)",
            self.output.display(),
            summary.terms,
            summary.postings,
            summary.bytes
        );
        Ok(summary)
    }

    fn run(&self) -> Result<MergeSummary> {
        let files = open_all(&self.blocks)?;

        let mut streams = Vec::with_capacity(files.len());
        for (path, file) in files {
            let mut stream = BlockStream {
                cursor: RecordCursor::from_file(&path, file)?,
                head: None,
            };
            stream.advance()?;
            streams.push(stream);
        }

        // Min-heap of (current term, stream index)
        let heap: BinaryHeap<Reverse<(Term, usize)>> = streams
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.head.as_ref().map(|r| Reverse((r.term.clone(), i))))
            .collect();

        let out = File::create(&self.output).map_err(|source| self.write_error(source))?;
        let result = self.write_merged(out, streams, heap);
        if result.is_err() {
            if let Err(e) = fs::remove_file(&self.output) {
                warn!("Could not remove {}: {}", self.output.display(), e);
            }
        }
        result
    }

    fn write_merged(
        &self,
        out: File,
        mut streams: Vec<BlockStream>,
        mut heap: BinaryHeap<Reverse<(Term, usize)>>,
    ) -> Result<MergeSummary> {
        let mut writer = BufWriter::new(out);
        let mut summary = MergeSummary {
            blocks: streams.len(),
            ..Default::default()
        };

        while let Some(Reverse((term, first))) = heap.pop() {
            let mut pending = vec![first];
            while let Some(Reverse((next, _))) = heap.peek() {
                if *next != term {
                    break;
                }
                if let Some(Reverse((_, i))) = heap.pop() {
                    pending.push(i);
                }
            }

            let mut lists = Vec::with_capacity(pending.len());
            while let Some(i) = pending.pop() {
                let stream = &mut streams[i];
                if let Some(record) = stream.head.take() {
                    lists.push(record.postings);
                }
                let start = stream.cursor.offset();
                stream.advance()?;

                if let Some(next) = &stream.head {
                    if next.term == term {
                        // Same stored term twice in one block
                        pending.push(i);
                        continue;
                    }
                    if next.term < term {
                        return Err(IndexError::Validation {
                            path: stream.cursor.path().to_path_buf(),
                            offset: start,
                            reason: format!("term {:?} follows {:?}", next.term, term),
                        });
                    }
                    heap.push(Reverse((next.term.clone(), i)));
                }
            }

            debug!("Merging {:?} from {} list(s)", term, lists.len());
            let postings = merge_postings(lists);
            write_record(&mut writer, &term, &postings).map_err(|source| self.write_error(source))?;

            summary.terms += 1;
            summary.postings += postings.len() as u64;
            summary.bytes += Record::new(term, postings).encoded_len() as u64;
        }

        writer.flush().map_err(|source| self.write_error(source))?;
        let out = writer
            .into_inner()
            .map_err(|e| self.write_error(e.into_error()))?;
        out.sync_all().map_err(|source| self.write_error(source))?;

        Ok(summary)
    }

    fn write_error(&self, source: std::io::Error) -> IndexError {
        IndexError::Write {
            path: self.output.clone(),
            source,
        }
    }
}

/// Merge ascending posting lists into one ascending list, keeping duplicates
pub fn merge_postings(mut lists: Vec<Vec<PostingId>>) -> Vec<PostingId> {
    match lists.len() {
        0 => return Vec::new(),
        1 => return lists.pop().unwrap_or_default(),
        _ => {}
    }

    let total = lists.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    let mut positions = vec![0usize; lists.len()];

    let mut heap: BinaryHeap<Reverse<(PostingId, usize)>> = lists
        .iter()
        .enumerate()
        .filter_map(|(i, list)| list.first().map(|&id| Reverse((id, i))))
        .collect();

    while let Some(Reverse((id, i))) = heap.pop() {
        merged.push(id);
        positions[i] += 1;
        if let Some(&next) = lists[i].get(positions[i]) {
            heap.push(Reverse((next, i)));
        }
    }

    merged
}
