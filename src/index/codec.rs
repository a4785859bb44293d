//! Record codec for block and index files
//!
//! A block file (and the merged index, which shares the layout) is a plain
//! concatenation of records with no header:
//!
//! ```text
//! [term: 20 bytes][posting count: u32 LE][posting id: u32 LE] * count
//! ```
//!
//! Terms are right-aligned in the 20-byte field and left-padded with spaces.
//! A term of 20 bytes or more keeps only its trailing 20 bytes, so two long
//! terms sharing a suffix become the same key once encoded. Readers of
//! existing files depend on this layout; it must not change.

use super::types::{PostingId, Record, Term, RECORD_HEADER_SIZE, TERM_PAD, TERM_WIDTH};
use crate::error::{IndexError, Result};
use crate::utils::{read_up_to, write_u32_le};
use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

/// Cap on posting-list preallocation when the file length is unknown
const MAX_PREALLOC: usize = 64 * 1024;

/// Encode a term into the fixed 20-byte field
pub fn encode_term(term: &str) -> [u8; TERM_WIDTH] {
    let bytes = term.as_bytes();
    let kept = &bytes[bytes.len().saturating_sub(TERM_WIDTH)..];

    let mut field = [TERM_PAD; TERM_WIDTH];
    field[TERM_WIDTH - kept.len()..].copy_from_slice(kept);
    field
}

/// Recover a term from its field by stripping the leading padding
pub fn decode_term(field: &[u8; TERM_WIDTH]) -> Term {
    let start = field
        .iter()
        .position(|&b| b != TERM_PAD)
        .unwrap_or(TERM_WIDTH);
    String::from_utf8_lossy(&field[start..]).into_owned()
}

/// Append one encoded record to `buf`
pub fn encode_record(term: &str, postings: &[PostingId], buf: &mut Vec<u8>) {
    buf.reserve(RECORD_HEADER_SIZE + 4 * postings.len());
    buf.extend_from_slice(&encode_term(term));
    buf.extend_from_slice(&(postings.len() as u32).to_le_bytes());
    for &id in postings {
        buf.extend_from_slice(&id.to_le_bytes());
    }
}

/// Stream one encoded record into a writer
pub fn write_record<W: Write>(writer: &mut W, term: &str, postings: &[PostingId]) -> io::Result<()> {
    writer.write_all(&encode_term(term))?;
    write_u32_le(writer, postings.len() as u32)?;
    for &id in postings {
        write_u32_le(writer, id)?;
    }
    Ok(())
}

/// Sequential decoder over the records of one file.
///
/// The cursor tracks its byte offset so a malformed record is reported with
/// the position it starts at. After an error the cursor is exhausted.
pub struct RecordCursor<R> {
    reader: R,
    path: PathBuf,
    offset: u64,
    len: Option<u64>,
    done: bool,
}

impl RecordCursor<BufReader<File>> {
    /// Open a block or index file for decoding
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| IndexError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_file(path, file)
    }

    /// Decode an already opened file
    pub fn from_file(path: &Path, file: File) -> Result<Self> {
        let len = file
            .metadata()
            .map_err(|source| IndexError::Read {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        Ok(Self::with_len(BufReader::new(file), path, len))
    }
}

impl<R: Read> RecordCursor<R> {
    /// Decode from a reader of unknown length
    pub fn new(reader: R, path: impl Into<PathBuf>) -> Self {
        Self {
            reader,
            path: path.into(),
            offset: 0,
            len: None,
            done: false,
        }
    }

    /// Decode from a reader holding exactly `len` bytes
    pub fn with_len(reader: R, path: impl Into<PathBuf>, len: u64) -> Self {
        Self {
            len: Some(len),
            ..Self::new(reader, path)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of the next record
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Decode the next record, `None` at a clean end of file
    pub fn next_record(&mut self) -> Result<Option<Record>> {
        if self.done {
            return Ok(None);
        }
        let result = self.decode_next();
        if !matches!(result, Ok(Some(_))) {
            self.done = true;
        }
        result
    }

    fn decode_next(&mut self) -> Result<Option<Record>> {
        let start = self.offset;

        let mut field = [0u8; TERM_WIDTH];
        let n = self.read(&mut field)?;
        if n == 0 {
            return Ok(None);
        }
        if n < TERM_WIDTH {
            return Err(self.invalid(start, format!("truncated term field ({} of {} bytes)", n, TERM_WIDTH)));
        }

        let mut count_buf = [0u8; 4];
        if self.read(&mut count_buf)? < 4 {
            return Err(self.invalid(start, "truncated posting count".to_string()));
        }
        let count = u32::from_le_bytes(count_buf);

        let body_start = start + RECORD_HEADER_SIZE as u64;
        let body_len = count as u64 * 4;
        if let Some(len) = self.len {
            let remaining = len.saturating_sub(body_start);
            if body_len > remaining {
                return Err(self.invalid(
                    start,
                    format!("posting count {} exceeds the {} remaining bytes", count, remaining),
                ));
            }
        }

        let mut postings = Vec::with_capacity((count as usize).min(MAX_PREALLOC));
        let mut id_buf = [0u8; 4];
        for i in 0..count {
            if self.read(&mut id_buf)? < 4 {
                return Err(self.invalid(
                    start,
                    format!("truncated posting list ({} of {} ids)", i, count),
                ));
            }
            postings.push(u32::from_le_bytes(id_buf));
        }

        self.offset = body_start + body_len;
        Ok(Some(Record {
            term: decode_term(&field),
            postings,
        }))
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        read_up_to(&mut self.reader, buf).map_err(|source| IndexError::Read {
            path: self.path.clone(),
            source,
        })
    }

    fn invalid(&self, offset: u64, reason: String) -> IndexError {
        IndexError::Validation {
            path: self.path.clone(),
            offset,
            reason,
        }
    }
}

impl<R: Read> Iterator for RecordCursor<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_record().transpose()
    }
}

/// Decode every record of a file
pub fn read_records(path: &Path) -> Result<Vec<Record>> {
    RecordCursor::open(path)?.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_all(bytes: Vec<u8>) -> Result<Vec<Record>> {
        let len = bytes.len() as u64;
        RecordCursor::with_len(Cursor::new(bytes), "mem", len).collect()
    }

    #[test]
    fn test_short_term_is_left_padded() {
        let field = encode_term("abc");
        assert_eq!(&field[..17], &[b' '; 17]);
        assert_eq!(&field[17..], b"abc");
        assert_eq!(decode_term(&field), "abc");
    }

    #[test]
    fn test_long_term_keeps_trailing_bytes() {
        let term = "abcdefghijklmnopqrstuvwxyz";
        let field = encode_term(term);
        assert_eq!(&field, b"ghijklmnopqrstuvwxyz");
        assert_eq!(decode_term(&field), "ghijklmnopqrstuvwxyz");

        // Exactly 20 bytes is stored unchanged
        let exact = "01234567890123456789";
        assert_eq!(decode_term(&encode_term(exact)), exact);
    }

    #[test]
    fn test_long_terms_with_shared_suffix_collide() {
        let a = "prefix-one-shared-suffix-value";
        let b = "prefix-two-shared-suffix-value";
        assert_eq!(encode_term(a), encode_term(b));
    }

    #[test]
    fn test_record_layout() {
        let mut buf = Vec::new();
        encode_record("a", &[1, 258], &mut buf);

        assert_eq!(buf.len(), 20 + 4 + 8);
        assert_eq!(buf[19], b'a');
        assert_eq!(&buf[20..24], &[2, 0, 0, 0]);
        assert_eq!(&buf[24..28], &[1, 0, 0, 0]);
        assert_eq!(&buf[28..32], &[2, 1, 0, 0]);
    }

    #[test]
    fn test_write_record_matches_encode_record() {
        let mut encoded = Vec::new();
        encode_record("term", &[3, 9, 27], &mut encoded);

        let mut written = Vec::new();
        write_record(&mut written, "term", &[3, 9, 27]).unwrap();
        assert_eq!(encoded, written);
    }

    #[test]
    fn test_decode_sequence() {
        let mut buf = Vec::new();
        encode_record("apple", &[1, 4], &mut buf);
        encode_record("pear", &[], &mut buf);
        encode_record("zebra", &[u32::MAX], &mut buf);

        let records = decode_all(buf).unwrap();
        assert_eq!(
            records,
            vec![
                Record::new("apple", vec![1, 4]),
                Record::new("pear", vec![]),
                Record::new("zebra", vec![u32::MAX]),
            ]
        );
    }

    #[test]
    fn test_empty_input_has_no_records() {
        assert!(decode_all(Vec::new()).unwrap().is_empty());
    }

    #[test]
    fn test_truncated_term_field() {
        let err = decode_all(vec![b' '; 7]).unwrap_err();
        match err {
            IndexError::Validation { offset, reason, .. } => {
                assert_eq!(offset, 0);
                assert!(reason.contains("term field"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_count_exceeding_remaining_bytes() {
        let mut buf = Vec::new();
        encode_record("ok", &[1], &mut buf);
        let second = buf.len() as u64;
        encode_record("bad", &[1, 2, 3], &mut buf);
        buf.truncate(buf.len() - 4);

        let mut cursor = RecordCursor::with_len(Cursor::new(buf.clone()), "mem", buf.len() as u64);
        assert_eq!(cursor.next_record().unwrap(), Some(Record::new("ok", vec![1])));
        match cursor.next_record() {
            Err(IndexError::Validation { offset, reason, .. }) => {
                assert_eq!(offset, second);
                assert!(reason.contains("exceeds"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        // Exhausted after an error
        assert!(cursor.next_record().unwrap().is_none());
    }

    #[test]
    fn test_truncated_postings_without_known_length() {
        let mut buf = Vec::new();
        encode_record("bad", &[1, 2, 3], &mut buf);
        buf.truncate(buf.len() - 2);

        let result: Result<Vec<Record>> = RecordCursor::new(Cursor::new(buf), "mem").collect();
        match result {
            Err(IndexError::Validation { reason, .. }) => {
                assert!(reason.contains("2 of 3"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
