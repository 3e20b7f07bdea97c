//! Site server with session-scoped "load more" and on-demand post pages

use anyhow::Result;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::cms::ContentClient;
use crate::generator::{Generator, PostPage};
use crate::helpers::url_for;
use crate::listing::{ListingController, LoadMore, PostsPagination};
use crate::templates::{ListingData, STYLESHEET};
use crate::Spacetraveling;

/// Cookie carrying the listing session id
pub const SESSION_COOKIE: &str = "st_session";

/// Sessions idle this long are dropped
const SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// A value with the time it was produced
struct Cached<T> {
    value: T,
    at: Instant,
}

impl<T> Cached<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            at: Instant::now(),
        }
    }

    /// `None` never expires
    fn is_fresh(&self, revalidate_secs: Option<u64>) -> bool {
        revalidate_secs.map_or(true, |secs| self.at.elapsed() < Duration::from_secs(secs))
    }
}

struct Session {
    listing: Arc<ListingController>,
    last_seen: Instant,
}

/// Server state
pub struct ServerState {
    app: Spacetraveling,
    generator: Generator,
    sessions: Mutex<HashMap<String, Session>>,
    listing: Mutex<Option<Cached<PostsPagination>>>,
    pages: Mutex<HashMap<String, Cached<String>>>,
}

impl ServerState {
    pub fn new(app: &Spacetraveling, client: Arc<dyn ContentClient>) -> Result<Self> {
        Ok(Self {
            app: app.clone(),
            generator: Generator::new(app, client)?,
            sessions: Mutex::new(HashMap::new()),
            listing: Mutex::new(None),
            pages: Mutex::new(HashMap::new()),
        })
    }

    fn home(&self) -> String {
        url_for(&self.app.config.root, "/")
    }

    /// First listing page, rebuilt once older than `listing.revalidate_secs`
    async fn initial_listing(&self) -> Result<PostsPagination> {
        let ttl = self.app.config.listing.revalidate_secs;
        let cached = lock(&self.listing)
            .as_ref()
            .filter(|cached| cached.is_fresh(ttl))
            .map(|cached| cached.value.clone());
        if let Some(pagination) = cached {
            return Ok(pagination);
        }

        let pagination = self.generator.first_page().await?;
        *lock(&self.listing) = Some(Cached::new(pagination.clone()));
        Ok(pagination)
    }

    fn touch(&self, id: &str) -> Option<Arc<ListingController>> {
        let mut sessions = lock(&self.sessions);
        let session = sessions.get_mut(id)?;
        session.last_seen = Instant::now();
        Some(session.listing.clone())
    }

    /// Look up the caller's listing, starting a new session when needed.
    ///
    /// Returns the new session id when one was created.
    async fn session(&self, headers: &HeaderMap) -> Result<(Arc<ListingController>, Option<String>)> {
        if let Some(listing) = session_id(headers).and_then(|id| self.touch(&id)) {
            return Ok((listing, None));
        }

        let initial = self.initial_listing().await?;
        let listing = Arc::new(ListingController::new(
            self.generator.client().clone(),
            self.generator.dates().clone(),
            initial,
        ));

        let id = Uuid::new_v4().to_string();
        let mut sessions = lock(&self.sessions);
        sessions.retain(|_, session| session.last_seen.elapsed() < SESSION_IDLE);
        sessions.insert(
            id.clone(),
            Session {
                listing: listing.clone(),
                last_seen: Instant::now(),
            },
        );
        tracing::debug!("New listing session {} ({} active)", id, sessions.len());

        Ok((listing, Some(id)))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn session_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Build the router
pub fn router(state: Arc<ServerState>) -> Router {
    let public_dir = state.app.public_dir.clone();
    let root = state.app.config.root.trim_end_matches('/').to_string();

    let routes = Router::new()
        .route("/", get(listing_handler))
        .route("/load-more", post(load_more_handler))
        .route("/post/:slug", get(post_handler))
        .route("/styles.css", get(stylesheet_handler))
        .fallback_service(ServeDir::new(public_dir).append_index_html_on_directories(true))
        .with_state(state);

    let routes = if root.is_empty() {
        routes
    } else {
        Router::new().nest(&root, routes)
    };

    routes.layer(TraceLayer::new_for_http())
}

/// Start the server
pub async fn start(app: &Spacetraveling, ip: &str, port: u16) -> Result<()> {
    let state = Arc::new(ServerState::new(app, app.client()?)?);
    let service = router(state);

    // Parse address - handle "localhost" specially
    let bind_ip = if ip == "localhost" { "127.0.0.1" } else { ip };
    let addr: SocketAddr = format!("{}:{}", bind_ip, port).parse()?;

    println!("Server running at http://{}:{}", ip, port);
    println!("Press Ctrl+C to stop.");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, service).await?;

    Ok(())
}

async fn listing_handler(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let (listing, new_session) = match state.session(&headers).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("Listing unavailable: {:#}", e);
            return (StatusCode::BAD_GATEWAY, "Content repository unavailable").into_response();
        }
    };

    let root = &state.app.config.root;
    let data = ListingData::new(root, &listing.snapshot())
        .with_load_more(url_for(root, "load-more"), listing.is_loading());

    let mut response = match state.generator.render_listing(data) {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!("Failed to render listing: {:#}", e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Server error").into_response();
        }
    };

    if let Some(id) = new_session {
        let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
        if let Ok(value) = HeaderValue::from_str(&cookie) {
            response.headers_mut().insert(header::SET_COOKIE, value);
        }
    }
    response
}

async fn load_more_handler(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    match session_id(&headers).and_then(|id| state.touch(&id)) {
        Some(listing) => match listing.load_more().await {
            LoadMore::Appended(count) => tracing::debug!("Loaded {} more posts", count),
            LoadMore::Exhausted => tracing::debug!("No more posts to load"),
            LoadMore::Busy => tracing::debug!("Load already in progress"),
            LoadMore::Failed(e) if e.is_retryable() => {
                tracing::warn!("Load more failed, the button stays for a retry: {}", e)
            }
            LoadMore::Failed(e) => tracing::error!("Load more failed: {}", e),
        },
        None => tracing::debug!("Load more without a session"),
    }
    Redirect::to(&state.home()).into_response()
}

async fn post_handler(State(state): State<Arc<ServerState>>, Path(slug): Path<String>) -> Response {
    let ttl = state.app.config.post.revalidate_secs;
    let cached = lock(&state.pages)
        .get(&slug)
        .map(|page| (page.value.clone(), page.is_fresh(ttl)));

    if let Some((html, true)) = cached.as_ref() {
        return Html(html.clone()).into_response();
    }

    match state.generator.render_post(&slug).await {
        Ok(PostPage::Rendered(html)) => {
            lock(&state.pages).insert(slug, Cached::new(html.clone()));
            Html(html).into_response()
        }
        Ok(PostPage::NotFound) => {
            lock(&state.pages).remove(&slug);
            Redirect::temporary(&state.home()).into_response()
        }
        Err(e) => match cached {
            Some((html, _)) => {
                tracing::warn!("Serving stale post {:?}: {:#}", slug, e);
                Html(html).into_response()
            }
            None => {
                tracing::error!("Failed to render post {:?}: {:#}", slug, e);
                (StatusCode::BAD_GATEWAY, "Content repository unavailable").into_response()
            }
        },
    }
}

async fn stylesheet_handler() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLESHEET)
}
