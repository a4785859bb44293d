pub mod accumulator;
pub mod build;
pub mod codec;
pub mod merge;
pub mod pool;
pub mod stats;
pub mod types;
pub mod writer;

pub use accumulator::PostingAccumulator;
pub use build::{build_index_from_file, BuildSummary, IndexBuilder};
pub use codec::{read_records, RecordCursor};
pub use merge::{BlockMerger, MergeSummary};
pub use pool::{open_all, OpenFiles};
pub use types::*;
pub use writer::{BlockWriter, FlushedBlock};
