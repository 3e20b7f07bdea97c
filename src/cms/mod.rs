//! Content repository access
//!
//! The [`ContentClient`] trait is the seam between page generation and the
//! headless CMS. [`PrismicClient`] talks to the remote API over HTTP and
//! [`MemoryContentClient`] serves a fixed document set for offline builds
//! and tests.

mod document;
mod memory;
mod prismic;
mod query;

pub use document::{ApiPage, Document};
pub use memory::MemoryContentClient;
pub use prismic::PrismicClient;
pub use query::{
    orderings_query, predicates_query, Ordering, Predicate, QueryOptions, FIRST_PUBLICATION_DATE,
    LAST_PUBLICATION_DATE,
};

use async_trait::async_trait;

use crate::error::Result;

/// Query interface over a remote content repository
#[async_trait]
pub trait ContentClient: Send + Sync {
    /// Run a predicate query and return the first page of results
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<ApiPage>;

    /// Follow a continuation cursor from a previous page
    async fn fetch_page(&self, cursor: &str) -> Result<ApiPage>;

    /// Fetch a single document by type and uid
    async fn get_by_uid(&self, document_type: &str, uid: &str) -> Result<Option<Document>> {
        let page = self
            .query(
                &[Predicate::uid(document_type, uid)],
                &QueryOptions::with_page_size(1),
            )
            .await?;
        Ok(page.results.into_iter().next())
    }
}

/// Collect every document of a type by following cursors to the last page
pub async fn collect_all(
    client: &dyn ContentClient,
    document_type: &str,
    page_size: u32,
) -> Result<Vec<Document>> {
    let mut page = client
        .query(
            &[Predicate::document_type(document_type)],
            &QueryOptions::with_page_size(page_size),
        )
        .await?;
    let mut documents = std::mem::take(&mut page.results);

    while let Some(cursor) = page.next_page.take() {
        page = client.fetch_page(&cursor).await?;
        documents.append(&mut page.results);
    }

    Ok(documents)
}
