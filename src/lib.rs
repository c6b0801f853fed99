mod splitter;

pub use splitter::{SplitError, SplitReport, WrittenFile, split_file};
