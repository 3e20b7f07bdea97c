//! Formatters from raw documents to display records

mod detail;
mod summary;

pub use detail::{
    format_detail, reading_time, word_count, PostDetail, RenderedBlock, DEFAULT_WORDS_PER_MINUTE,
};
pub use summary::{format_summary, PostSummary};
