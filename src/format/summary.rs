//! Listing entries

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cms::Document;
use crate::content::{Post, PostHeader};
use crate::error::Result;
use crate::helpers::{parse_timestamp, DateFormatter};

/// Display-ready listing entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostSummary {
    pub uid: String,
    /// Original timestamp, kept so the date can be reformatted later
    pub first_publication_date: Option<DateTime<Utc>>,
    /// e.g. "15 Mar 2021"
    pub display_date: String,
    pub title: String,
    pub subtitle: String,
    pub author: String,
}

/// Turn a raw post document into a listing entry
pub fn format_summary(document: &Document, dates: &DateFormatter) -> Result<PostSummary> {
    let post = Post::<PostHeader>::from_document(document)?;
    let first_publication_date = post.first_publication_date.as_deref().and_then(parse_timestamp);

    Ok(PostSummary {
        uid: post.uid,
        display_date: dates.format_str(post.first_publication_date.as_deref()),
        first_publication_date,
        title: post.data.title,
        subtitle: post.data.subtitle,
        author: post.data.author,
    })
}
