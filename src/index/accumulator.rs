use super::types::{PostingId, Term};
use std::collections::BTreeMap;

/// In-memory postings of the block currently being built.
///
/// Ids are kept in append order and sorted only when the block is
/// snapshotted. Repeated (term, id) pairs are kept as-is.
#[derive(Debug, Default, Clone)]
pub struct PostingAccumulator {
    postings: BTreeMap<Term, Vec<PostingId>>,
    posting_count: usize,
}

impl PostingAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `posting_id` to the posting list of every term
    pub fn append<I, S>(&mut self, posting_id: PostingId, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for term in terms {
            let term = term.as_ref();
            match self.postings.get_mut(term) {
                Some(ids) => ids.push(posting_id),
                None => {
                    self.postings.insert(term.to_string(), vec![posting_id]);
                }
            }
            self.posting_count += 1;
        }
    }

    /// Entries by ascending term, each posting list in ascending order
    pub fn sorted_entries(&self) -> Vec<(Term, Vec<PostingId>)> {
        self.postings
            .iter()
            .map(|(term, ids)| {
                let mut sorted = ids.clone();
                sorted.sort_unstable();
                (term.clone(), sorted)
            })
            .collect()
    }

    /// Posting lists in append order, unsorted
    pub fn get(&self, term: &str) -> Option<&[PostingId]> {
        self.postings.get(term).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Number of distinct terms
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// Number of (term, id) pairs appended
    pub fn posting_count(&self) -> usize {
        self.posting_count
    }

    pub fn clear(&mut self) {
        self.postings.clear();
        self.posting_count = 0;
    }

    /// Move all postings out, leaving the accumulator empty
    pub fn take(&mut self) -> PostingAccumulator {
        std::mem::take(self)
    }

    /// Re-append every posting of `other`
    pub fn absorb(&mut self, other: PostingAccumulator) {
        for (term, ids) in other.postings {
            self.posting_count += ids.len();
            self.postings.entry(term).or_default().extend(ids);
        }
    }
}
