//! Generator module - renders listing and post pages with the built-in templates

use anyhow::{Context as _, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cms::{collect_all, ContentClient, Document};
use crate::content::POST_TYPE;
use crate::error::Error;
use crate::format::format_detail;
use crate::helpers::{url_for, DateFormatter};
use crate::listing::{ListingController, LoadMore, PostsPagination};
use crate::neighbors::resolve_neighbors;
use crate::templates::{ListingData, PostPageData, SiteData, TemplateRenderer, STYLESHEET};
use crate::Spacetraveling;

/// Outcome of rendering a post by slug
#[derive(Debug)]
pub enum PostPage {
    Rendered(String),
    /// No post with this uid; callers redirect to the listing
    NotFound,
}

/// Page generator backed by a content client
pub struct Generator {
    app: Spacetraveling,
    client: Arc<dyn ContentClient>,
    renderer: TemplateRenderer,
    dates: DateFormatter,
    site: SiteData,
}

impl Generator {
    /// Create a new generator
    pub fn new(app: &Spacetraveling, client: Arc<dyn ContentClient>) -> Result<Self> {
        let renderer = TemplateRenderer::new()?;

        Ok(Self {
            dates: app.config.dates(),
            site: SiteData::from_config(&app.config),
            app: app.clone(),
            client,
            renderer,
        })
    }

    pub fn client(&self) -> &Arc<dyn ContentClient> {
        &self.client
    }

    pub fn dates(&self) -> &DateFormatter {
        &self.dates
    }

    /// Generate the entire site
    pub async fn generate(&self) -> Result<()> {
        let public_dir = &self.app.public_dir;
        fs::create_dir_all(public_dir)?;

        write_file(&public_dir.join("styles.css"), STYLESHEET)?;

        // Listing: page 1 is the index, later pages repeat everything loaded so far
        let pagination = self.first_page().await?;
        write_file(
            &public_dir.join("posts.json"),
            &serde_json::to_string_pretty(&pagination)?,
        )?;
        let pages = self.generate_listing_pages(pagination).await?;
        tracing::info!("Generated {} listing pages", pages);

        // Post pages
        let documents = collect_all(
            self.client.as_ref(),
            POST_TYPE,
            self.app.config.post.paths_page_size,
        )
        .await
        .context("Failed to enumerate posts")?;

        for document in &documents {
            let uid = document.uid.as_deref().unwrap_or_default();
            if !is_path_segment(uid) {
                anyhow::bail!("Post {} has an unusable uid {:?}", document.label(), uid);
            }
            let html = self
                .render_document(document)
                .await
                .with_context(|| format!("Failed to render post {}", document.label()))?;
            write_file(&public_dir.join("post").join(uid).join("index.html"), &html)?;
        }

        tracing::info!("Generated {} post pages", documents.len());
        Ok(())
    }

    /// Write `index.html` and `page/<n>/index.html` until the cursor runs out
    async fn generate_listing_pages(&self, first: PostsPagination) -> Result<usize> {
        let root = &self.app.config.root;
        let listing = ListingController::new(self.client.clone(), self.dates.clone(), first);
        let mut page = 1;

        loop {
            let mut data = ListingData::new(root, &listing.snapshot());
            if listing.has_more() {
                data = data.with_next_link(listing_page_path(root, page + 1));
            }
            write_file(&self.listing_page_file(page), &self.render_listing(data)?)?;

            match listing.load_more().await {
                LoadMore::Appended(_) => page += 1,
                LoadMore::Exhausted => return Ok(page),
                LoadMore::Busy => anyhow::bail!("Listing page {} is already loading", page + 1),
                LoadMore::Failed(e) => {
                    return Err(e).with_context(|| format!("Failed to load listing page {}", page + 1))
                }
            }
        }
    }

    fn listing_page_file(&self, page: usize) -> PathBuf {
        let public_dir = &self.app.public_dir;
        if page == 1 {
            public_dir.join("index.html")
        } else {
            public_dir.join("page").join(page.to_string()).join("index.html")
        }
    }

    /// Query and format the first listing page
    pub async fn first_page(&self) -> Result<PostsPagination> {
        PostsPagination::first_page(
            self.client.as_ref(),
            self.app.config.listing.page_size,
            &self.dates,
        )
        .await
        .context("Failed to load the post listing")
    }

    /// Render the listing page
    pub fn render_listing(&self, listing: ListingData) -> Result<String> {
        self.renderer.render_listing(&self.site, &listing)
    }

    /// Render the post page for a slug.
    ///
    /// Unknown slugs and documents that cannot be formatted are reported as
    /// [`PostPage::NotFound`]; only transport and template failures are errors.
    pub async fn render_post(&self, slug: &str) -> Result<PostPage> {
        let document = match self.client.get_by_uid(POST_TYPE, slug).await? {
            Some(document) => document,
            None => {
                tracing::debug!("No post with uid {:?}", slug);
                return Ok(PostPage::NotFound);
            }
        };

        match self.render_document(&document).await {
            Ok(html) => Ok(PostPage::Rendered(html)),
            Err(e) => match e.downcast_ref::<Error>() {
                Some(Error::MalformedDocument { .. } | Error::UnexpectedDocumentType { .. }) => {
                    tracing::warn!("Not rendering post {:?}: {}", slug, e);
                    Ok(PostPage::NotFound)
                }
                _ => Err(e),
            },
        }
    }

    /// Render a post page, neighbors included
    async fn render_document(&self, document: &Document) -> Result<String> {
        let detail = format_detail(
            document,
            &self.dates,
            self.app.config.post.words_per_minute,
            &self.app.config.root,
        )?;
        let neighbors = resolve_neighbors(self.client.as_ref(), &detail.id, &self.dates).await;
        let page = PostPageData::new(&self.app.config.root, detail, &neighbors);
        self.renderer.render_post(&self.site, &page)
    }
}

/// Link to a pre-rendered listing page
fn listing_page_path(root: &str, page: usize) -> String {
    if page == 1 {
        url_for(root, "/")
    } else {
        url_for(root, &format!("page/{}/", page))
    }
}

/// Whether a uid can be used as a single directory name
fn is_path_segment(uid: &str) -> bool {
    !uid.is_empty() && uid != "." && uid != ".." && !uid.contains(['/', '\\'])
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;
    tracing::debug!("Generated: {:?}", path);
    Ok(())
}
