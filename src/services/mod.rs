pub mod entry_processor;
pub mod feed_assembler;

pub use entry_processor::{EntryProcessor, ProcessedEntry};
pub use feed_assembler::FeedAssembler;
