use crate::error::{IndexError, Result};
use crate::index::merge::{BlockMerger, MergeSummary};
use crate::index::types::{IndexConfig, PostingId};
use crate::index::writer::BlockWriter;
use crate::utils::progress::{byte_bar, spinner};
use crate::utils::Tokenizer;
use log::{info, warn};
use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Result of a complete build
#[derive(Debug, Clone)]
pub struct BuildSummary {
    pub documents: u64,
    pub blocks: Vec<PathBuf>,
    pub merge: MergeSummary,
}

/// Drives the append / flush / merge pipeline for one output index.
///
/// A block is flushed every `docs_per_block` documents; `finish` flushes the
/// remainder, merges every block into the output file and, unless
/// `keep_blocks` is set, removes the blocks.
pub struct IndexBuilder {
    output: PathBuf,
    config: IndexConfig,
    writer: BlockWriter,
    docs_in_block: usize,
    documents: u64,
}

impl IndexBuilder {
    pub fn new(output: &Path, config: IndexConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            output: output.to_path_buf(),
            writer: BlockWriter::new(output),
            config,
            docs_in_block: 0,
            documents: 0,
        })
    }

    pub fn writer(&self) -> &BlockWriter {
        &self.writer
    }

    /// Add one document's terms, flushing a block when it is full
    pub fn add_document<I, S>(&mut self, posting_id: PostingId, terms: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.writer.append(posting_id, terms);
        self.docs_in_block += 1;
        self.documents += 1;

        if self.docs_in_block >= self.config.docs_per_block {
            self.flush_block()?;
        }
        Ok(())
    }

    fn flush_block(&mut self) -> Result<()> {
        if self.config.background_flush {
            self.writer.flush_in_background()?;
        } else {
            self.writer.flush()?;
        }
        self.docs_in_block = 0;
        Ok(())
    }

    /// Flush what is left, merge all blocks and clean them up
    pub fn finish(mut self) -> Result<BuildSummary> {
        if !self.writer.accumulator().is_empty() {
            self.writer.flush()?;
        }
        let blocks = self.writer.finish()?;

        let merge = BlockMerger::new(&self.output, blocks.clone()).merge()?;

        if !self.config.keep_blocks {
            for block in &blocks {
                if let Err(e) = fs::remove_file(block) {
                    warn!("Could not remove block {}: {}", block.display(), e);
                }
            }
        }

        Ok(BuildSummary {
            documents: self.documents,
            blocks,
            merge,
        })
    }
}

/// Parse a `<posting-id><TAB><text>` document line
fn parse_document_line<'a>(path: &Path, line_no: usize, line: &'a str) -> Result<(PostingId, &'a str)> {
    let invalid = |reason: String| IndexError::Input {
        path: path.to_path_buf(),
        line: line_no,
        reason,
    };

    let (id, text) = line
        .split_once('\t')
        .ok_or_else(|| invalid("expected <posting-id><TAB><text>".to_string()))?;
    let id = id
        .trim()
        .parse::<PostingId>()
        .map_err(|e| invalid(format!("invalid posting id {:?}: {}", id, e)))?;
    Ok((id, text))
}

/// Build an index at `output` from a file of tab-separated documents.
///
/// Empty lines are skipped; any other malformed line aborts the build.
pub fn build_index_from_file(
    input: &Path,
    output: &Path,
    config: IndexConfig,
    tokenizer: &dyn Tokenizer,
) -> Result<BuildSummary> {
    let read_error = |source| IndexError::Read {
        path: input.to_path_buf(),
        source,
    };
    let file = File::open(input).map_err(read_error)?;
    let len = file.metadata().map_err(read_error)?.len();
    let show_progress = config.show_progress;

    info!("Indexing {} into {}", input.display(), output.display());
    let mut builder = IndexBuilder::new(output, config)?;
    let bar = byte_bar(len, show_progress);

    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(read_error)?;
        if let Some(ref bar) = bar {
            bar.inc(line.len() as u64 + 1);
        }
        if line.trim().is_empty() {
            continue;
        }
        let (id, text) = parse_document_line(input, i + 1, &line)?;
        builder.add_document(id, tokenizer.tokenize(text))?;
    }

    if let Some(bar) = bar {
        bar.finish_with_message(format!("{} documents", builder.documents));
    }

    let merging = spinner("Merging blocks...", show_progress);
    let summary = builder.finish()?;
    if let Some(merging) = merging {
        merging.finish_with_message(format!(
            "Merged {} blocks into {} terms",
            summary.blocks.len(),
            summary.merge.terms
        ));
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::codec::{encode_record, read_records};
    use crate::index::types::Record;
    use crate::utils::DocumentTokenizer;
    use tempfile::tempdir;

    fn config(docs_per_block: usize, background_flush: bool) -> IndexConfig {
        IndexConfig {
            docs_per_block,
            background_flush,
            keep_blocks: false,
            show_progress: false,
        }
    }

    #[test]
    fn test_builder_flushes_per_block() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("idx");
        let mut builder = IndexBuilder::new(&output, config(2, false)).unwrap();

        builder.add_document(1, ["a", "b"]).unwrap();
        assert_eq!(builder.writer().block_number(), 1);
        builder.add_document(2, ["b"]).unwrap();
        assert_eq!(builder.writer().block_number(), 2);
        builder.add_document(3, ["a"]).unwrap();

        let summary = builder.finish().unwrap();
        assert_eq!(summary.documents, 3);
        assert_eq!(summary.blocks.len(), 2);
        assert!(summary.blocks.iter().all(|b| !b.exists()));

        assert_eq!(
            read_records(&output).unwrap(),
            vec![Record::new("a", vec![1, 3]), Record::new("b", vec![1, 2])]
        );
    }

    #[test]
    fn test_background_build_matches_sync_build() {
        let dir = tempdir().unwrap();
        let docs: Vec<(PostingId, Vec<String>)> = (0..50)
            .map(|i| (i, vec![format!("t{}", i % 7), format!("t{}", i % 3)]))
            .collect();

        let mut outputs = Vec::new();
        for background in [false, true] {
            let output = dir.path().join(format!("idx_bg_{}", background));
            let mut builder = IndexBuilder::new(&output, config(4, background)).unwrap();
            for (id, terms) in &docs {
                builder.add_document(*id, terms).unwrap();
            }
            builder.finish().unwrap();
            outputs.push(read_records(&output).unwrap());
        }
        assert_eq!(outputs[0], outputs[1]);
    }

    #[test]
    fn test_keep_blocks() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("idx");
        let mut cfg = config(1, true);
        cfg.keep_blocks = true;

        let mut builder = IndexBuilder::new(&output, cfg).unwrap();
        builder.add_document(1, ["a"]).unwrap();
        builder.add_document(2, ["a"]).unwrap();
        let summary = builder.finish().unwrap();

        assert_eq!(summary.blocks.len(), 2);
        assert!(summary.blocks.iter().all(|b| b.exists()));
    }

    #[test]
    fn test_leftover_block_fails_build() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("idx");
        let leftover = dir.path().join("idx_1");
        let mut stale = Vec::new();
        encode_record("zebra", &[99], &mut stale);
        fs::write(&leftover, &stale).unwrap();

        for background in [false, true] {
            let mut builder = IndexBuilder::new(&output, config(1, background)).unwrap();
            let added = builder
                .add_document(1, ["apple"])
                .and_then(|_| builder.add_document(2, ["zebra"]));
            let err = match added {
                Ok(()) => builder.finish().unwrap_err(),
                Err(e) => e,
            };
            match err {
                IndexError::Write { path, .. } => assert_eq!(path, leftover),
                other => panic!("unexpected error: {other}"),
            }
            assert!(!output.exists());
            assert_eq!(fs::read(&leftover).unwrap(), stale);
        }
    }

    #[test]
    fn test_rejects_zero_block_size() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            IndexBuilder::new(&dir.path().join("idx"), config(0, false)),
            Err(IndexError::Config(_))
        ));
    }

    #[test]
    fn test_build_from_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("docs.tsv");
        fs::write(
            &input,
            "1\tAustin Pizza LLC\n\n2\tpizza (915)920-0102\n3\thttp://www.google.com/\n",
        )
        .unwrap();
        let output = dir.path().join("idx");
        let tokenizer = DocumentTokenizer::new().unwrap();

        let summary = build_index_from_file(&input, &output, config(2, true), &tokenizer).unwrap();
        assert_eq!(summary.documents, 3);

        let records = read_records(&output).unwrap();
        let pizza = records.iter().find(|r| r.term == "pizza").unwrap();
        assert_eq!(pizza.postings, vec![1, 2]);
        assert!(records.iter().any(|r| r.term == "google.com" && r.postings == vec![3]));
        assert!(records.iter().any(|r| r.term == "915" && r.postings == vec![2]));
    }

    #[test]
    fn test_build_from_file_reports_bad_line() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("docs.tsv");
        fs::write(&input, "1\tok\nnot-a-number\tbad\n").unwrap();
        let tokenizer = DocumentTokenizer::new().unwrap();

        let err = build_index_from_file(&input, &dir.path().join("idx"), config(10, false), &tokenizer)
            .unwrap_err();
        match err {
            IndexError::Input { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }
}
