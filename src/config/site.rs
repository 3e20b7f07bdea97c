//! Site configuration (_config.yml)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::format::DEFAULT_WORDS_PER_MINUTE;
use crate::helpers::DateFormatter;

/// Environment variable overriding `cms.endpoint`
pub const ENDPOINT_ENV: &str = "PRISMIC_API_ENDPOINT";

/// Environment variable overriding `cms.access_token`
pub const ACCESS_TOKEN_ENV: &str = "PRISMIC_ACCESS_TOKEN";

/// Main site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    // Site
    pub title: String,
    pub language: String,
    pub timezone: String,

    // URL
    pub root: String,

    // Directory
    pub public_dir: String,

    // Content repository
    pub cms: CmsConfig,

    // Pages
    pub listing: ListingConfig,
    pub post: PostConfig,

    // Store any additional fields
    #[serde(flatten)]
    pub extra: HashMap<String, serde_yaml::Value>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Spacetraveling".to_string(),
            language: "pt-BR".to_string(),
            timezone: "UTC".to_string(),

            root: "/".to_string(),

            public_dir: "public".to_string(),

            cms: CmsConfig::default(),

            listing: ListingConfig::default(),
            post: PostConfig::default(),

            extra: HashMap::new(),
        }
    }
}

impl SiteConfig {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        let config: SiteConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Apply `PRISMIC_*` overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from any key lookup
    pub fn apply_overrides<F: Fn(&str) -> Option<String>>(&mut self, lookup: F) {
        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.is_empty()) {
            tracing::debug!("Using content endpoint from {}", ENDPOINT_ENV);
            self.cms.endpoint = endpoint;
        }
        if let Some(token) = lookup(ACCESS_TOKEN_ENV).filter(|v| !v.is_empty()) {
            self.cms.access_token = Some(token);
        }
    }

    /// Date formatter for the configured language and timezone
    pub fn dates(&self) -> DateFormatter {
        DateFormatter::from_settings(&self.language, &self.timezone)
    }
}

/// Content repository connection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CmsConfig {
    /// API root, e.g. `https://<repo>.cdn.prismic.io/api/v2`
    pub endpoint: String,
    pub access_token: Option<String>,
    pub timeout_secs: u64,
    /// Serve documents from this JSON file instead of the remote API
    pub fixtures: Option<String>,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            access_token: None,
            timeout_secs: 10,
            fixtures: None,
        }
    }
}

/// Listing page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingConfig {
    pub page_size: u32,
    /// Seconds before a served listing is rebuilt; `None` never rebuilds
    pub revalidate_secs: Option<u64>,
}

impl Default for ListingConfig {
    fn default() -> Self {
        Self {
            page_size: 1,
            revalidate_secs: None,
        }
    }
}

/// Post page configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PostConfig {
    pub words_per_minute: u32,
    /// Seconds before a served post page is rebuilt
    pub revalidate_secs: Option<u64>,
    /// Page size used when enumerating posts to pre-render
    pub paths_page_size: u32,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            words_per_minute: DEFAULT_WORDS_PER_MINUTE,
            revalidate_secs: Some(60 * 60 * 24),
            paths_page_size: 100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SiteConfig::default();
        assert_eq!(config.title, "Spacetraveling");
        assert_eq!(config.listing.page_size, 1);
        assert_eq!(config.listing.revalidate_secs, None);
        assert_eq!(config.post.words_per_minute, 200);
        assert_eq!(config.post.revalidate_secs, Some(86400));
    }

    #[test]
    fn test_parse_config() {
        let yaml = r#"
title: Meu Blog
timezone: America/Sao_Paulo
cms:
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
listing:
  page_size: 5
  revalidate_secs: 1800
"#;
        let config: SiteConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.title, "Meu Blog");
        assert_eq!(config.cms.endpoint, "https://spacetraveling.cdn.prismic.io/api/v2");
        assert_eq!(config.cms.timeout_secs, 10);
        assert_eq!(config.listing.page_size, 5);
        assert_eq!(config.listing.revalidate_secs, Some(1800));
        assert_eq!(config.post.paths_page_size, 100);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = SiteConfig::default();
        config.apply_overrides(|key| match key {
            ENDPOINT_ENV => Some("https://other.cdn.prismic.io/api/v2".to_string()),
            ACCESS_TOKEN_ENV => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.cms.endpoint, "https://other.cdn.prismic.io/api/v2");
        assert!(config.cms.access_token.is_none());
    }
}
