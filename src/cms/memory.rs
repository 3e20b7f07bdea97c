//! In-memory content repository
//!
//! Serves a fixed set of documents with the same paging contract as the
//! remote API. Used for offline builds from a JSON fixture and in tests.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::query::field_value;
use super::{
    ApiPage, ContentClient, Document, Ordering, Predicate, QueryOptions, FIRST_PUBLICATION_DATE,
    LAST_PUBLICATION_DATE,
};
use crate::error::{Error, Result};
use crate::helpers::parse_timestamp;

const CURSOR_PREFIX: &str = "memory:";

/// Page size used when a query asks for zero
const DEFAULT_PAGE_SIZE: u32 = 20;

/// Everything needed to reproduce a page of a query
#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemoryCursor {
    predicates: Vec<Predicate>,
    options: QueryOptions,
    page: u32,
}

/// Content client over a fixed document list
#[derive(Debug, Clone, Default)]
pub struct MemoryContentClient {
    documents: Vec<Document>,
}

/// Fixture files may hold a bare document array or a saved search page
#[derive(Deserialize)]
#[serde(untagged)]
enum Fixture {
    Documents(Vec<Document>),
    Page(ApiPage),
}

impl MemoryContentClient {
    /// Documents are served in the given order unless a query sorts them
    pub fn new(documents: Vec<Document>) -> Self {
        Self { documents }
    }

    /// Load documents from a JSON fixture file
    pub fn from_fixture<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let documents = match serde_json::from_str::<Fixture>(&content)? {
            Fixture::Documents(documents) => documents,
            Fixture::Page(page) => page.results,
        };
        tracing::debug!(
            "Loaded {} documents from {:?}",
            documents.len(),
            path.as_ref()
        );
        Ok(Self::new(documents))
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Filter, sort and anchor the result set of a query
    fn select(&self, predicates: &[Predicate], options: &QueryOptions) -> Vec<&Document> {
        let mut selected: Vec<&Document> = self
            .documents
            .iter()
            .filter(|doc| predicates.iter().all(|p| p.matches(doc)))
            .collect();

        if !options.orderings.is_empty() {
            selected.sort_by(|a, b| {
                for ordering in &options.orderings {
                    let order = sort_key(a, ordering).cmp(&sort_key(b, ordering));
                    let order = if ordering.descending {
                        order.reverse()
                    } else {
                        order
                    };
                    if order != std::cmp::Ordering::Equal {
                        return order;
                    }
                }
                std::cmp::Ordering::Equal
            });
        }

        if let Some(anchor) = &options.after {
            // An anchor outside the result set yields nothing
            match selected.iter().position(|doc| &doc.id == anchor) {
                Some(pos) => selected = selected.split_off(pos + 1),
                None => selected.clear(),
            }
        }

        selected
    }

    fn page(&self, cursor: MemoryCursor) -> Result<ApiPage> {
        let selected = self.select(&cursor.predicates, &cursor.options);
        let page_size = match cursor.options.page_size {
            0 => DEFAULT_PAGE_SIZE,
            n => n,
        } as usize;

        let total = selected.len();
        let total_pages = total.div_ceil(page_size).max(1);
        let page = cursor.page.max(1) as usize;
        let results: Vec<Document> = selected
            .into_iter()
            .skip((page - 1) * page_size)
            .take(page_size)
            .cloned()
            .collect();

        let next_page = if page < total_pages {
            Some(encode_cursor(&MemoryCursor {
                page: page as u32 + 1,
                ..cursor.clone()
            })?)
        } else {
            None
        };
        let prev_page = if page > 1 {
            Some(encode_cursor(&MemoryCursor {
                page: page as u32 - 1,
                ..cursor.clone()
            })?)
        } else {
            None
        };

        Ok(ApiPage {
            page: page as u32,
            results_per_page: page_size as u32,
            total_results_size: total as u32,
            total_pages: total_pages as u32,
            next_page,
            prev_page,
            results,
        })
    }
}

fn encode_cursor(cursor: &MemoryCursor) -> Result<String> {
    Ok(format!("{}{}", CURSOR_PREFIX, serde_json::to_string(cursor)?))
}

fn decode_cursor(cursor: &str) -> Result<MemoryCursor> {
    let body = cursor
        .strip_prefix(CURSOR_PREFIX)
        .ok_or_else(|| Error::InvalidCursor(cursor.to_string()))?;
    serde_json::from_str(body).map_err(|_| Error::InvalidCursor(cursor.to_string()))
}

/// Comparable key for an ordering field; dates are normalised to UTC
fn sort_key(document: &Document, ordering: &Ordering) -> Option<String> {
    let value = field_value(document, &ordering.field)?;
    if ordering.field == FIRST_PUBLICATION_DATE || ordering.field == LAST_PUBLICATION_DATE {
        parse_timestamp(&value).map(|date| date.to_rfc3339())
    } else {
        Some(value)
    }
}

#[async_trait]
impl ContentClient for MemoryContentClient {
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<ApiPage> {
        self.page(MemoryCursor {
            predicates: predicates.to_vec(),
            options: options.clone(),
            page: 1,
        })
    }

    async fn fetch_page(&self, cursor: &str) -> Result<ApiPage> {
        self.page(decode_cursor(cursor)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn post(n: u32) -> Document {
        Document {
            id: format!("id{}", n),
            uid: Some(format!("post-{}", n)),
            document_type: "posts".to_string(),
            first_publication_date: Some(format!("2021-03-{:02}T10:00:00+0000", n)),
            last_publication_date: None,
            data: json!({ "title": format!("Post {}", n) }),
        }
    }

    fn client() -> MemoryContentClient {
        // Stored newest first, like the remote default
        MemoryContentClient::new(vec![post(3), post(2), post(1)])
    }

    fn uids(page: &ApiPage) -> Vec<&str> {
        page.results.iter().map(|d| d.label()).collect()
    }

    #[tokio::test]
    async fn test_pages_follow_cursor() {
        let client = client();
        let first = client
            .query(
                &[Predicate::document_type("posts")],
                &QueryOptions::with_page_size(2),
            )
            .await
            .unwrap();
        assert_eq!(uids(&first), vec!["post-3", "post-2"]);
        assert_eq!(first.total_pages, 2);

        let cursor = first.next_page.clone().unwrap();
        let second = client.fetch_page(&cursor).await.unwrap();
        assert_eq!(uids(&second), vec!["post-1"]);
        assert!(second.next_page.is_none());
        assert!(second.prev_page.is_some());
    }

    #[tokio::test]
    async fn test_after_with_orderings() {
        let client = client();
        let predicates = [Predicate::document_type("posts")];

        let next = client
            .query(
                &predicates,
                &QueryOptions::with_page_size(1)
                    .after("id2")
                    .ordered_by(Ordering::asc(FIRST_PUBLICATION_DATE)),
            )
            .await
            .unwrap();
        assert_eq!(uids(&next), vec!["post-3"]);

        let prev = client
            .query(
                &predicates,
                &QueryOptions::with_page_size(1)
                    .after("id2")
                    .ordered_by(Ordering::desc(FIRST_PUBLICATION_DATE)),
            )
            .await
            .unwrap();
        assert_eq!(uids(&prev), vec!["post-1"]);
    }

    #[tokio::test]
    async fn test_unknown_anchor_is_empty() {
        let page = client()
            .query(&[], &QueryOptions::with_page_size(5).after("missing"))
            .await
            .unwrap();
        assert!(page.results.is_empty());
        assert!(page.next_page.is_none());
    }

    #[tokio::test]
    async fn test_get_by_uid() {
        let client = client();
        let found = client.get_by_uid("posts", "post-2").await.unwrap();
        assert_eq!(found.map(|d| d.id), Some("id2".to_string()));
        assert!(client.get_by_uid("posts", "nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_invalid_cursor() {
        let err = client().fetch_page("https://elsewhere").await.unwrap_err();
        assert!(matches!(err, Error::InvalidCursor(_)));
    }

    #[test]
    fn test_fixture_accepts_search_page() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("posts.json");
        let page = ApiPage::single(vec![post(1)]);
        fs::write(&path, serde_json::to_string(&page).unwrap()).unwrap();

        let client = MemoryContentClient::from_fixture(&path).unwrap();
        assert_eq!(client.documents().len(), 1);
    }

    #[tokio::test]
    async fn test_collect_all_follows_every_cursor() {
        let client = client();
        let all = crate::cms::collect_all(&client, "posts", 1).await.unwrap();
        assert_eq!(all.len(), 3);
    }
}
