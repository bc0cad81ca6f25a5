//! Historical-data summarization: bound the size of multi-day input by
//! keeping a recent window verbatim and collapsing older records into
//! per-week aggregates.

mod summarize;

pub use summarize::{summarize, HistoricalWindow};
