//! Previous/next post resolution
//!
//! Neighbors come from two single-document queries anchored on the current
//! post's id. How `after` treats ties and boundaries is up to the content
//! repository; nothing is re-sorted or tie-broken here.

use serde::Serialize;

use crate::cms::{ApiPage, ContentClient, Ordering, Predicate, QueryOptions, FIRST_PUBLICATION_DATE};
use crate::content::POST_TYPE;
use crate::error::Result;
use crate::format::{format_summary, PostSummary};
use crate::helpers::DateFormatter;

/// Chronologically adjacent posts; `None` at a boundary or on failure
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Neighbors {
    /// Older post
    pub prev: Option<PostSummary>,
    /// Newer post
    pub next: Option<PostSummary>,
}

/// Resolve the posts published just before and after the document `id`.
///
/// Never fails: a query or formatting error degrades to "no neighbor".
pub async fn resolve_neighbors(
    client: &dyn ContentClient,
    id: &str,
    dates: &DateFormatter,
) -> Neighbors {
    let predicates = [Predicate::document_type(POST_TYPE)];
    let next_options = QueryOptions::with_page_size(1)
        .after(id)
        .ordered_by(Ordering::asc(FIRST_PUBLICATION_DATE));
    let prev_options = QueryOptions::with_page_size(1)
        .after(id)
        .ordered_by(Ordering::desc(FIRST_PUBLICATION_DATE));

    let (next, prev) = tokio::join!(
        client.query(&predicates, &next_options),
        client.query(&predicates, &prev_options)
    );

    Neighbors {
        prev: first_summary("previous", id, prev, dates),
        next: first_summary("next", id, next, dates),
    }
}

fn first_summary(
    which: &str,
    id: &str,
    result: Result<ApiPage>,
    dates: &DateFormatter,
) -> Option<PostSummary> {
    let page = match result {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("Could not resolve {} post of {}: {}", which, id, e);
            return None;
        }
    };

    let document = page.results.into_iter().next()?;
    match format_summary(&document, dates) {
        Ok(summary) => Some(summary),
        Err(e) => {
            tracing::warn!("Skipping {} post of {}: {}", which, id, e);
            None
        }
    }
}
