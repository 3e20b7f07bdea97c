//! Listing page state and "load more" pagination
//!
//! A [`ListingController`] holds the summaries shown so far and the cursor of
//! the next page. Summaries are only ever appended, in the order the content
//! repository delivers them.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::cms::{ApiPage, ContentClient, Predicate, QueryOptions};
use crate::content::POST_TYPE;
use crate::error::{Error, Result};
use crate::format::{format_summary, PostSummary};
use crate::helpers::DateFormatter;

/// Listing props handed to the page layer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostsPagination {
    pub next_page: Option<String>,
    pub results: Vec<PostSummary>,
}

impl PostsPagination {
    /// Format a raw page; any malformed post fails the whole page
    pub fn from_page(page: ApiPage, dates: &DateFormatter) -> Result<Self> {
        let results = page
            .results
            .iter()
            .map(|document| format_summary(document, dates))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            next_page: page.next_page,
            results,
        })
    }

    /// Query the first page of posts
    pub async fn first_page(
        client: &dyn ContentClient,
        page_size: u32,
        dates: &DateFormatter,
    ) -> Result<Self> {
        let page = client
            .query(
                &[Predicate::document_type(POST_TYPE)],
                &QueryOptions::with_page_size(page_size),
            )
            .await?;
        Self::from_page(page, dates)
    }
}

/// Outcome of [`ListingController::load_more`]
#[derive(Debug)]
pub enum LoadMore {
    /// This many posts were appended
    Appended(usize),
    /// No cursor left; nothing was fetched
    Exhausted,
    /// Another load is still outstanding; nothing was fetched
    Busy,
    /// The fetch failed; state is unchanged and the call may be retried
    Failed(Error),
}

struct ListingState {
    posts: Vec<PostSummary>,
    cursor: Option<String>,
}

/// Incrementally growing list of posts
pub struct ListingController {
    client: Arc<dyn ContentClient>,
    dates: DateFormatter,
    state: Mutex<ListingState>,
    in_flight: AtomicBool,
}

impl ListingController {
    pub fn new(client: Arc<dyn ContentClient>, dates: DateFormatter, initial: PostsPagination) -> Self {
        Self {
            client,
            dates,
            state: Mutex::new(ListingState {
                posts: initial.results,
                cursor: initial.next_page,
            }),
            in_flight: AtomicBool::new(false),
        }
    }

    /// Start a listing from the first page of posts
    pub async fn start(
        client: Arc<dyn ContentClient>,
        dates: DateFormatter,
        page_size: u32,
    ) -> Result<Self> {
        let initial = PostsPagination::first_page(client.as_ref(), page_size, &dates).await?;
        Ok(Self::new(client, dates, initial))
    }

    fn lock(&self) -> MutexGuard<'_, ListingState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn posts(&self) -> Vec<PostSummary> {
        self.lock().posts.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().posts.is_empty()
    }

    pub fn cursor(&self) -> Option<String> {
        self.lock().cursor.clone()
    }

    /// Whether "load more" should be offered
    pub fn has_more(&self) -> bool {
        self.lock().cursor.is_some()
    }

    /// Whether a load is outstanding
    pub fn is_loading(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Current state as listing props
    pub fn snapshot(&self) -> PostsPagination {
        let state = self.lock();
        PostsPagination {
            next_page: state.cursor.clone(),
            results: state.posts.clone(),
        }
    }

    /// Fetch the page at the cursor and append it.
    ///
    /// At most one load runs at a time. Dropping the returned future before
    /// it completes releases the guard and leaves the state untouched.
    pub async fn load_more(&self) -> LoadMore {
        let Some(_guard) = InFlight::acquire(&self.in_flight) else {
            return LoadMore::Busy;
        };
        let Some(cursor) = self.cursor() else {
            return LoadMore::Exhausted;
        };

        let page = match self.client.fetch_page(&cursor).await {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("Loading more posts failed: {}", e);
                return LoadMore::Failed(e);
            }
        };

        let more = match PostsPagination::from_page(page, &self.dates) {
            Ok(more) => more,
            Err(e) => {
                tracing::warn!("Loaded page could not be formatted: {}", e);
                return LoadMore::Failed(e);
            }
        };

        let count = more.results.len();
        let mut state = self.lock();
        state.posts.extend(more.results);
        state.cursor = more.next_page;
        tracing::debug!("Appended {} posts, {} shown", count, state.posts.len());

        LoadMore::Appended(count)
    }
}

/// Set while a load is outstanding, cleared on drop
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
