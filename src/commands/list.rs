//! List posts

use anyhow::Result;
use std::io::Write;
use std::time::Duration;

use crate::listing::{ListingController, LoadMore};
use crate::Spacetraveling;

/// Print the post listing, following every page when `all` is set
pub async fn run(app: &Spacetraveling, all: bool) -> Result<()> {
    let listing = ListingController::start(
        app.client()?,
        app.config.dates(),
        app.config.listing.page_size,
    )
    .await?;

    if all {
        load_all(&listing).await?;
    }

    let stdout = std::io::stdout();
    print_listing(&listing, &mut stdout.lock())
}

/// Attempts per page before a retryable failure is reported
const LOAD_ATTEMPTS: u32 = 3;

const RETRY_DELAY: Duration = Duration::from_millis(200);

/// Keep loading until the cursor runs out.
///
/// Transient repository failures are retried a few times; anything else fails
/// straight away.
pub async fn load_all(listing: &ListingController) -> Result<()> {
    let mut attempt = 1;
    loop {
        match listing.load_more().await {
            LoadMore::Appended(_) => attempt = 1,
            LoadMore::Busy => tokio::task::yield_now().await,
            LoadMore::Exhausted => return Ok(()),
            LoadMore::Failed(e) if e.is_retryable() && attempt < LOAD_ATTEMPTS => {
                tracing::warn!("Retrying page load ({}/{}): {}", attempt, LOAD_ATTEMPTS, e);
                tokio::time::sleep(RETRY_DELAY * attempt).await;
                attempt += 1;
            }
            LoadMore::Failed(e) => return Err(e.into()),
        }
    }
}

fn print_listing<W: Write>(listing: &ListingController, out: &mut W) -> Result<()> {
    let posts = listing.posts();
    writeln!(out, "Posts ({}):", posts.len())?;
    for post in posts {
        writeln!(
            out,
            "  {} - {} [{}] by {}",
            post.display_date, post.title, post.uid, post.author
        )?;
    }
    if listing.has_more() {
        writeln!(out, "  ... more available (use --all)")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cms::{ApiPage, ContentClient, Document, MemoryContentClient, Predicate, QueryOptions};
    use crate::error::Error;
    use crate::helpers::DateFormatter;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn post(n: u32) -> Document {
        Document {
            id: format!("id{}", n),
            uid: Some(format!("post-{}", n)),
            document_type: "posts".to_string(),
            first_publication_date: Some(format!("2021-03-{:02}T10:00:00.000Z", n + 10)),
            last_publication_date: None,
            data: json!({ "title": format!("Post {}", n), "subtitle": "s", "author": "Joseph Oliveira" }),
        }
    }

    fn memory() -> MemoryContentClient {
        MemoryContentClient::new(vec![post(5), post(4), post(3)])
    }

    async fn listing_with(client: Arc<dyn ContentClient>) -> ListingController {
        ListingController::start(client, DateFormatter::default(), 1)
            .await
            .unwrap()
    }

    async fn listing() -> ListingController {
        listing_with(Arc::new(memory())).await
    }

    /// Continuation fetches fail with `error` until `failures` runs out
    struct Failing {
        inner: MemoryContentClient,
        failures: AtomicUsize,
        error: fn(&str) -> Error,
    }

    #[async_trait]
    impl ContentClient for Failing {
        async fn query(
            &self,
            predicates: &[Predicate],
            options: &QueryOptions,
        ) -> crate::error::Result<ApiPage> {
            self.inner.query(predicates, options).await
        }

        async fn fetch_page(&self, cursor: &str) -> crate::error::Result<ApiPage> {
            let failing = self
                .failures
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failing {
                return Err((self.error)(cursor));
            }
            self.inner.fetch_page(cursor).await
        }
    }

    fn bad_gateway(cursor: &str) -> Error {
        Error::Status {
            status: 502,
            url: cursor.to_string(),
        }
    }

    fn invalid_cursor(cursor: &str) -> Error {
        Error::InvalidCursor(cursor.to_string())
    }

    #[tokio::test]
    async fn test_print_first_page() {
        let listing = listing().await;
        let mut out = Vec::new();
        print_listing(&listing, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with("Posts (1):"));
        assert!(out.contains("15 Mar 2021 - Post 5 [post-5] by Joseph Oliveira"));
        assert!(out.contains("more available"));
    }

    #[tokio::test]
    async fn test_load_all() {
        let listing = listing().await;
        load_all(&listing).await.unwrap();
        assert_eq!(listing.len(), 3);
        assert!(!listing.has_more());
    }

    #[tokio::test]
    async fn test_load_all_retries_transient_failures() {
        let listing = listing_with(Arc::new(Failing {
            inner: memory(),
            failures: AtomicUsize::new(1),
            error: bad_gateway,
        }))
        .await;

        load_all(&listing).await.unwrap();
        assert_eq!(listing.len(), 3);
    }

    #[tokio::test]
    async fn test_load_all_gives_up_after_repeated_failures() {
        let listing = listing_with(Arc::new(Failing {
            inner: memory(),
            failures: AtomicUsize::new(LOAD_ATTEMPTS as usize),
            error: bad_gateway,
        }))
        .await;

        let err = load_all(&listing).await.unwrap_err();
        assert!(err.to_string().contains("502"));
        assert_eq!(listing.len(), 1);
    }

    #[tokio::test]
    async fn test_load_all_fails_fast_on_permanent_errors() {
        let listing = listing_with(Arc::new(Failing {
            inner: memory(),
            failures: AtomicUsize::new(1),
            error: invalid_cursor,
        }))
        .await;

        // A retry would have succeeded and appended the rest
        assert!(load_all(&listing).await.is_err());
        assert_eq!(listing.len(), 1);
    }
}
