use crate::error::{IndexError, Result};
use crate::index::accumulator::PostingAccumulator;
use crate::index::codec::{decode_term, encode_record, encode_term};
use crate::index::types::{block_file_name, BlockNumber, PostingId, Term};
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};

/// A block that has been durably written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushedBlock {
    pub number: BlockNumber,
    pub path: PathBuf,
    pub terms: usize,
    pub bytes: u64,
}

/// Background write that has not been confirmed yet
struct PendingFlush {
    number: BlockNumber,
    path: PathBuf,
    terms: usize,
    bytes: u64,
    /// Postings of the block, restored if the write fails
    snapshot: PostingAccumulator,
    handle: JoinHandle<io::Result<()>>,
}

/// Turns accumulated postings into numbered block files.
///
/// Blocks are named `<base>_<n>` with `n` starting at 1. The writer owns the
/// accumulator of the block being built. At most one flush is in flight at a
/// time: every flush first waits for the previous one.
pub struct BlockWriter {
    base: PathBuf,
    block_number: BlockNumber,
    accumulator: PostingAccumulator,
    in_flight: Option<PendingFlush>,
}

impl BlockWriter {
    /// Create a writer for blocks of the index at `base`
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
            block_number: 1,
            accumulator: PostingAccumulator::new(),
            in_flight: None,
        }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Number the next flush will write
    pub fn block_number(&self) -> BlockNumber {
        self.block_number
    }

    /// File the next flush will write
    pub fn current_block_name(&self) -> PathBuf {
        block_file_name(&self.base, self.block_number)
    }

    pub fn accumulator(&self) -> &PostingAccumulator {
        &self.accumulator
    }

    /// Append a document's terms to the current block
    pub fn append<I, S>(&mut self, posting_id: PostingId, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.accumulator.append(posting_id, terms);
    }

    /// Write the current block and wait until it is on disk.
    ///
    /// On failure neither the block number nor the accumulator change, so
    /// the same flush can be attempted again.
    pub fn flush(&mut self) -> Result<FlushedBlock> {
        self.wait()?;

        let path = self.current_block_name();
        let (payload, terms) = encode_block(&self.accumulator);
        write_block(&path, &payload).map_err(|source| IndexError::Write {
            path: path.clone(),
            source,
        })?;

        let flushed = FlushedBlock {
            number: self.block_number,
            path,
            terms,
            bytes: payload.len() as u64,
        };
        info!(
            "Flushed block {} ({} terms, {} bytes)",
            flushed.path.display(),
            flushed.terms,
            flushed.bytes
        );

        self.block_number += 1;
        self.accumulator.clear();
        Ok(flushed)
    }

    /// Start writing the current block on a background thread.
    ///
    /// The block is encoded, numbered and the accumulator reset before this
    /// returns, so appending to the next block can continue immediately.
    /// [`wait`](Self::wait) reports the outcome; a failed write rolls the
    /// numbering and the postings back as if the flush never happened.
    pub fn flush_in_background(&mut self) -> Result<BlockNumber> {
        self.wait()?;

        let number = self.block_number;
        let path = self.current_block_name();
        let snapshot = self.accumulator.take();
        let (payload, terms) = encode_block(&snapshot);
        let bytes = payload.len() as u64;

        let thread_path = path.clone();
        let spawned = thread::Builder::new()
            .name(format!("block-flush-{}", number))
            .spawn(move || write_block(&thread_path, &payload));

        let handle = match spawned {
            Ok(handle) => handle,
            Err(source) => {
                self.accumulator.absorb(snapshot);
                return Err(IndexError::Write { path, source });
            }
        };

        debug!("Background flush of {} started", path.display());
        self.block_number += 1;
        self.in_flight = Some(PendingFlush {
            number,
            path,
            terms,
            bytes,
            snapshot,
            handle,
        });
        Ok(number)
    }

    /// Wait for the in-flight background flush, if any
    pub fn wait(&mut self) -> Result<Option<FlushedBlock>> {
        let Some(pending) = self.in_flight.take() else {
            return Ok(None);
        };

        match pending.handle.join() {
            Ok(Ok(())) => {
                info!(
                    "Flushed block {} ({} terms, {} bytes)",
                    pending.path.display(),
                    pending.terms,
                    pending.bytes
                );
                Ok(Some(FlushedBlock {
                    number: pending.number,
                    path: pending.path,
                    terms: pending.terms,
                    bytes: pending.bytes,
                }))
            }
            Ok(Err(source)) => {
                self.block_number = pending.number;
                self.accumulator.absorb(pending.snapshot);
                Err(IndexError::Write {
                    path: pending.path,
                    source,
                })
            }
            Err(_) => {
                self.block_number = pending.number;
                self.accumulator.absorb(pending.snapshot);
                Err(IndexError::BackgroundWrite { path: pending.path })
            }
        }
    }

    pub fn is_flushing(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Blocks confirmed on disk, by ascending block number
    pub fn block_names(&self) -> Vec<PathBuf> {
        let written = match &self.in_flight {
            Some(pending) => pending.number,
            None => self.block_number,
        };
        (1..written)
            .map(|n| block_file_name(&self.base, n))
            .collect()
    }

    /// Wait for any in-flight flush and return every written block
    pub fn finish(&mut self) -> Result<Vec<PathBuf>> {
        self.wait()?;
        Ok(self.block_names())
    }
}

impl Drop for BlockWriter {
    fn drop(&mut self) {
        if let Err(e) = self.wait() {
            warn!("Background flush lost on drop: {}", e);
        }
    }
}

/// Encode every entry of the accumulator in stored-term order.
///
/// Terms cut to the same 20-byte field share one record, so a block never
/// goes backwards or repeats a term once decoded.
fn encode_block(accumulator: &PostingAccumulator) -> (Vec<u8>, usize) {
    let mut stored: BTreeMap<Term, Vec<PostingId>> = BTreeMap::new();
    for (term, ids) in accumulator.sorted_entries() {
        let key = decode_term(&encode_term(&term));
        let list = stored.entry(key).or_default();
        let folded = !list.is_empty();
        list.extend(ids);
        if folded {
            list.sort_unstable();
        }
    }

    let mut buf = Vec::new();
    for (term, ids) in &stored {
        encode_record(term, ids, &mut buf);
    }
    (buf, stored.len())
}

/// Write the payload to a new block file and sync it.
///
/// The block must not exist yet. A failed write removes the file again.
fn write_block(path: &Path, payload: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .append(true)
        .open(path)?;

    let result = file.write_all(payload).and_then(|_| file.sync_all());
    if result.is_err() {
        drop(file);
        if let Err(e) = fs::remove_file(path) {
            warn!("Could not remove partial block {}: {}", path.display(), e);
        }
    }
    result
}
