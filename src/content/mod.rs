//! Content module - typed views over repository documents

mod post;

pub use post::{Banner, ContentBlock, Post, PostData, PostHeader, TypedDocument, POST_TYPE};
