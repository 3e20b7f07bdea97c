//! spacetraveling: a blog front-end over a headless CMS
//!
//! Posts live in a remote content repository. This crate formats them into
//! listing entries and post pages, paginates the listing with a "load more"
//! cursor, and links each post to its chronological neighbors. Pages are
//! rendered with embedded Tera templates, either ahead of time into the
//! public directory or on demand by the built-in server.

pub mod cms;
pub mod commands;
pub mod config;
pub mod content;
pub mod error;
pub mod format;
pub mod generator;
pub mod helpers;
pub mod listing;
pub mod neighbors;
pub mod richtext;
pub mod server;
pub mod templates;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cms::{ContentClient, MemoryContentClient, PrismicClient};

/// The main application
#[derive(Clone)]
pub struct Spacetraveling {
    /// Site configuration
    pub config: config::SiteConfig,
    /// Base directory
    pub base_dir: PathBuf,
    /// Public (output) directory
    pub public_dir: PathBuf,
}

impl Spacetraveling {
    /// Load `_config.yml` from a directory and apply environment overrides
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        let config_path = base_dir.join("_config.yml");

        let mut config = if config_path.exists() {
            config::SiteConfig::load(&config_path)
                .with_context(|| format!("Failed to load {:?}", config_path))?
        } else {
            config::SiteConfig::default()
        };
        config.apply_env();

        Ok(Self::with_config(base_dir, config))
    }

    /// Use an explicit configuration
    pub fn with_config<P: AsRef<Path>>(base_dir: P, config: config::SiteConfig) -> Self {
        let base_dir = base_dir.as_ref().to_path_buf();
        let public_dir = base_dir.join(&config.public_dir);

        Self {
            config,
            base_dir,
            public_dir,
        }
    }

    /// Content client for the configured repository.
    ///
    /// `cms.fixtures` selects the in-memory client over the remote API.
    pub fn client(&self) -> Result<Arc<dyn ContentClient>> {
        match &self.config.cms.fixtures {
            Some(fixtures) => {
                let path = self.base_dir.join(fixtures);
                let client = MemoryContentClient::from_fixture(&path)
                    .with_context(|| format!("Failed to load fixtures {:?}", path))?;
                tracing::info!("Serving {} documents from {:?}", client.documents().len(), path);
                Ok(Arc::new(client))
            }
            None => Ok(Arc::new(PrismicClient::new(&self.config.cms)?)),
        }
    }

    /// Generate the static site
    pub async fn generate(&self) -> Result<()> {
        commands::generate::run(self).await
    }

    /// Clean the public directory
    pub fn clean(&self) -> Result<()> {
        commands::clean::run(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_site_config() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("_config.yml"),
            "title: Meu Blog\npublic_dir: dist\ncms:\n  fixtures: posts.json\n",
        )
        .unwrap();

        let app = Spacetraveling::new(dir.path()).unwrap();
        assert_eq!(app.config.title, "Meu Blog");
        assert_eq!(app.public_dir, dir.path().join("dist"));
    }

    #[test]
    fn test_client_from_fixtures() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("posts.json"),
            r#"[{ "id": "id1", "uid": "a", "type": "posts", "data": {} }]"#,
        )
        .unwrap();
        let mut config = config::SiteConfig::default();
        config.cms.fixtures = Some("posts.json".to_string());

        let app = Spacetraveling::with_config(dir.path(), config);
        assert!(app.client().is_ok());
    }

    #[test]
    fn test_client_requires_endpoint() {
        let dir = TempDir::new().unwrap();
        let app = Spacetraveling::with_config(dir.path(), config::SiteConfig::default());
        assert!(app.client().is_err());
    }
}
