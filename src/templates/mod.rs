//! Built-in templates using the Tera template engine
//!
//! Templates and the stylesheet are embedded in the binary. Autoescaping is
//! on for every `.html` template; rendered rich text is the only value marked
//! `safe`.

use anyhow::Result;
use serde::Serialize;
use tera::{Context, Tera};

use crate::config::SiteConfig;
use crate::format::{PostDetail, PostSummary, RenderedBlock};
use crate::helpers::{post_path, url_for};
use crate::listing::PostsPagination;
use crate::neighbors::Neighbors;

/// Embedded stylesheet, written to `public/styles.css`
pub const STYLESHEET: &str = include_str!("spacetraveling/styles.css");

/// Template renderer with the embedded theme
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    /// Create a new renderer with all templates loaded
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();

        // Leave `/` alone so paths survive in attributes
        tera.set_escape_fn(escape_html);

        tera.add_raw_templates(vec![
            ("layout.html", include_str!("spacetraveling/layout.html")),
            ("index.html", include_str!("spacetraveling/index.html")),
            ("post.html", include_str!("spacetraveling/post.html")),
            // Partials
            (
                "partials/header.html",
                include_str!("spacetraveling/partials/header.html"),
            ),
            (
                "partials/post_card.html",
                include_str!("spacetraveling/partials/post_card.html"),
            ),
            (
                "partials/post_nav.html",
                include_str!("spacetraveling/partials/post_nav.html"),
            ),
        ])?;

        Ok(Self { tera })
    }

    /// Render a template with given context
    pub fn render(&self, template_name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(template_name, context)?)
    }

    /// Render the listing page
    pub fn render_listing(&self, site: &SiteData, listing: &ListingData) -> Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("listing", listing);
        self.render("index.html", &context)
    }

    /// Render a post page
    pub fn render_post(&self, site: &SiteData, post: &PostPageData) -> Result<String> {
        let mut context = Context::new();
        context.insert("site", site);
        context.insert("post", post);
        self.render("post.html", &context)
    }
}

fn escape_html(input: &str) -> String {
    html_escape::encode_double_quoted_attribute(input).into_owned()
}

/// Data structures for template context

#[derive(Debug, Clone, Serialize)]
pub struct SiteData {
    pub title: String,
    pub language: String,
    pub root: String,
    pub stylesheet: String,
}

impl SiteData {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.title.clone(),
            language: config.language.clone(),
            root: url_for(&config.root, "/"),
            stylesheet: url_for(&config.root, "styles.css"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostCard {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub path: String,
}

impl PostCard {
    pub fn from_summary(root: &str, summary: &PostSummary) -> Self {
        Self {
            title: summary.title.clone(),
            subtitle: summary.subtitle.clone(),
            author: summary.author.clone(),
            date: summary.display_date.clone(),
            path: post_path(root, &summary.uid),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ListingData {
    pub posts: Vec<PostCard>,
    pub has_more: bool,
    pub loading: bool,
    /// Form action of the "load more" button
    pub load_more_url: Option<String>,
    /// Pre-rendered next page, linked when there is no form
    pub next_link: Option<String>,
}

impl ListingData {
    pub fn new(root: &str, pagination: &PostsPagination) -> Self {
        Self {
            posts: pagination
                .results
                .iter()
                .map(|summary| PostCard::from_summary(root, summary))
                .collect(),
            has_more: pagination.next_page.is_some(),
            loading: false,
            load_more_url: None,
            next_link: None,
        }
    }

    pub fn with_load_more(mut self, url: String, loading: bool) -> Self {
        self.load_more_url = Some(url);
        self.loading = loading;
        self
    }

    pub fn with_next_link(mut self, url: String) -> Self {
        self.next_link = Some(url);
        self
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NavPost {
    pub title: String,
    pub path: String,
}

impl NavPost {
    fn from_summary(root: &str, summary: &PostSummary) -> Self {
        Self {
            title: summary.title.clone(),
            path: post_path(root, &summary.uid),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostPageData {
    pub title: String,
    pub subtitle: String,
    pub author: String,
    pub date: String,
    pub edited: Option<String>,
    pub banner_url: String,
    pub banner_alt: String,
    pub reading_time: u32,
    pub content: Vec<RenderedBlock>,
    pub prev: Option<NavPost>,
    pub next: Option<NavPost>,
}

impl PostPageData {
    pub fn new(root: &str, detail: PostDetail, neighbors: &Neighbors) -> Self {
        let banner_alt = detail
            .banner_alt
            .filter(|alt| !alt.is_empty())
            .unwrap_or_else(|| detail.title.clone());
        Self {
            title: detail.title,
            subtitle: detail.subtitle,
            author: detail.author,
            date: detail.display_date,
            edited: detail.edited,
            banner_url: detail.banner_url,
            banner_alt,
            reading_time: detail.reading_time,
            content: detail.content,
            prev: neighbors.prev.as_ref().map(|p| NavPost::from_summary(root, p)),
            next: neighbors.next.as_ref().map(|p| NavPost::from_summary(root, p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(uid: &str, title: &str) -> PostSummary {
        PostSummary {
            uid: uid.to_string(),
            first_publication_date: None,
            display_date: "15 Mar 2021".to_string(),
            title: title.to_string(),
            subtitle: "Pensando em sincronização".to_string(),
            author: "Joseph Oliveira".to_string(),
        }
    }

    fn site() -> SiteData {
        SiteData::from_config(&SiteConfig::default())
    }

    fn detail() -> PostDetail {
        PostDetail {
            id: "id1".to_string(),
            uid: "como-utilizar-hooks".to_string(),
            first_publication_date: None,
            last_publication_date: None,
            display_date: "15 Mar 2021".to_string(),
            edited: None,
            title: "Como utilizar Hooks".to_string(),
            subtitle: String::new(),
            author: "Joseph Oliveira".to_string(),
            banner_url: "https://images.test/banner.png".to_string(),
            banner_alt: None,
            content: vec![RenderedBlock {
                heading: "Proin et varius".to_string(),
                html: "<p>Lorem <strong>ipsum</strong></p>".to_string(),
            }],
            reading_time: 4,
        }
    }

    #[test]
    fn test_listing_with_load_more() {
        let renderer = TemplateRenderer::new().unwrap();
        let pagination = PostsPagination {
            next_page: Some("https://cms.test/page2".to_string()),
            results: vec![summary("como-utilizar-hooks", "Como utilizar <Hooks>")],
        };
        let listing = ListingData::new("/", &pagination).with_load_more("/load-more".to_string(), false);
        let html = renderer.render_listing(&site(), &listing).unwrap();

        assert!(html.contains(r#"href="/post/como-utilizar-hooks""#));
        assert!(html.contains("Como utilizar &lt;Hooks&gt;"));
        assert!(html.contains("15 Mar 2021"));
        assert!(html.contains("Carregar mais posts"));
        assert!(html.contains(r#"href="/styles.css""#));
    }

    #[test]
    fn test_listing_without_cursor_has_no_button() {
        let renderer = TemplateRenderer::new().unwrap();
        let pagination = PostsPagination {
            next_page: None,
            results: vec![summary("a", "A")],
        };
        let listing = ListingData::new("/", &pagination).with_load_more("/load-more".to_string(), false);
        let html = renderer.render_listing(&site(), &listing).unwrap();
        assert!(!html.contains("Carregar mais posts"));
    }

    #[test]
    fn test_static_listing_links_next_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let pagination = PostsPagination {
            next_page: Some("cursor".to_string()),
            results: vec![summary("a", "A")],
        };
        let listing = ListingData::new("/", &pagination).with_next_link("/page/2/".to_string());
        let html = renderer.render_listing(&site(), &listing).unwrap();
        assert!(html.contains(r#"<a class="loading-more" href="/page/2/">Carregar mais posts</a>"#));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn test_loading_button_is_disabled() {
        let renderer = TemplateRenderer::new().unwrap();
        let pagination = PostsPagination {
            next_page: Some("cursor".to_string()),
            results: vec![],
        };
        let listing = ListingData::new("/", &pagination).with_load_more("/load-more".to_string(), true);
        let html = renderer.render_listing(&site(), &listing).unwrap();
        assert!(html.contains("Carregando..."));
        assert!(html.contains("disabled"));
    }

    #[test]
    fn test_post_page() {
        let renderer = TemplateRenderer::new().unwrap();
        let neighbors = Neighbors {
            prev: Some(summary("older", "Post antigo")),
            next: None,
        };
        let post = PostPageData::new("/", detail(), &neighbors);
        let html = renderer.render_post(&site(), &post).unwrap();

        assert!(html.contains("<title>Como utilizar Hooks | Spacetraveling</title>"));
        assert!(html.contains("4 min"));
        assert!(html.contains("<p>Lorem <strong>ipsum</strong></p>"));
        assert!(html.contains(r#"alt="Como utilizar Hooks""#));
        assert!(html.contains(r#"href="/post/older""#));
        assert!(html.contains("Post anterior"));
        assert!(!html.contains("Próximo post"));
        assert!(!html.contains("editado em"));
    }

    #[test]
    fn test_edited_post() {
        let renderer = TemplateRenderer::new().unwrap();
        let mut detail = detail();
        detail.edited = Some("19 Mar 2021, às 15:49".to_string());
        let post = PostPageData::new("/", detail, &Neighbors::default());
        let html = renderer.render_post(&site(), &post).unwrap();
        assert!(html.contains("* editado em 19 Mar 2021, às 15:49"));
        assert!(!html.contains("post-nav"));
    }
}
