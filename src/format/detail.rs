//! Post pages

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cms::Document;
use crate::content::{ContentBlock, TypedDocument};
use crate::error::Result;
use crate::helpers::{parse_timestamp, DateFormatter};
use crate::richtext;

/// Assumed reading speed
pub const DEFAULT_WORDS_PER_MINUTE: u32 = 200;

/// A content section with its body rendered to HTML
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedBlock {
    pub heading: String,
    pub html: String,
}

/// Display-ready post
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostDetail {
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<DateTime<Utc>>,
    pub last_publication_date: Option<DateTime<Utc>>,
    pub display_date: String,
    /// Set when the post was republished after its first publication
    pub edited: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub banner_url: String,
    pub banner_alt: Option<String>,
    pub content: Vec<RenderedBlock>,
    /// Whole minutes, rounded up
    pub reading_time: u32,
}

/// Turn a raw post document into a full page model.
///
/// Links to other posts inside the body are resolved under `root`.
pub fn format_detail(
    document: &Document,
    dates: &DateFormatter,
    words_per_minute: u32,
    root: &str,
) -> Result<PostDetail> {
    let TypedDocument::Post(post) = TypedDocument::parse(document)?;

    let first = post.first_publication_date.as_deref().and_then(parse_timestamp);
    let last = post.last_publication_date.as_deref().and_then(parse_timestamp);
    let edited = match (first, last) {
        (Some(first), Some(last)) if last != first => Some(dates.format_with_time(Some(&last))),
        _ => None,
    };

    let reading_time = reading_time(&post.data.content, words_per_minute);
    let content = post
        .data
        .content
        .iter()
        .map(|block| RenderedBlock {
            heading: block.heading.clone(),
            html: richtext::as_html(&block.body, root),
        })
        .collect();

    Ok(PostDetail {
        id: post.id,
        uid: post.uid,
        first_publication_date: first,
        last_publication_date: last,
        display_date: dates.format_str(post.first_publication_date.as_deref()),
        edited,
        title: post.data.header.title,
        subtitle: post.data.header.subtitle,
        author: post.data.header.author,
        banner_url: post.data.banner.url,
        banner_alt: post.data.banner.alt,
        content,
        reading_time,
    })
}

/// Words in the bodies of all blocks; headings are not counted
pub fn word_count(blocks: &[ContentBlock]) -> usize {
    blocks
        .iter()
        .map(|block| richtext::as_text(&block.body).split_whitespace().count())
        .sum()
}

/// Estimated minutes to read, rounded up; no content reads in 0 minutes
pub fn reading_time(blocks: &[ContentBlock], words_per_minute: u32) -> u32 {
    let words_per_minute = match words_per_minute {
        0 => DEFAULT_WORDS_PER_MINUTE,
        n => n,
    } as usize;
    word_count(blocks).div_ceil(words_per_minute) as u32
}
