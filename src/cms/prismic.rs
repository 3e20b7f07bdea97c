//! HTTP client for the Prismic REST API (v2)

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::sync::OnceCell;

use super::document::ApiInfo;
use super::{orderings_query, predicates_query, ApiPage, ContentClient, Predicate, QueryOptions};
use crate::config::CmsConfig;
use crate::error::{Error, Result};

/// Remote content client
///
/// Built from an explicit [`CmsConfig`]; there is no shared global client.
pub struct PrismicClient {
    http: reqwest::Client,
    endpoint: String,
    access_token: Option<String>,
    master_ref: OnceCell<String>,
}

impl PrismicClient {
    /// Create a client for the configured repository endpoint
    pub fn new(config: &CmsConfig) -> Result<Self> {
        let endpoint = config.endpoint.trim().trim_end_matches('/').to_string();
        if endpoint.is_empty() {
            return Err(Error::Config(
                "cms.endpoint is not set (or PRISMIC_API_ENDPOINT)".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("spacetraveling/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            endpoint,
            access_token: config.access_token.clone().filter(|t| !t.is_empty()),
            master_ref: OnceCell::new(),
        })
    }

    /// The master ref every search must be pinned to, fetched once
    async fn master_ref(&self) -> Result<&str> {
        let reference = self
            .master_ref
            .get_or_try_init(|| async {
                let info: ApiInfo = self.get_json(&self.endpoint, &[]).await?;
                let master = info
                    .refs
                    .into_iter()
                    .find(|r| r.is_master_ref)
                    .map(|r| r.reference)
                    .ok_or(Error::NoMasterRef)?;
                tracing::debug!("Resolved master ref {}", master);
                Ok::<_, Error>(master)
            })
            .await?;
        Ok(reference.as_str())
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let mut request = self.http.get(url).query(params);
        if let Some(token) = &self.access_token {
            if !url.contains("access_token=") {
                request = request.query(&[("access_token", token)]);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl ContentClient for PrismicClient {
    async fn query(&self, predicates: &[Predicate], options: &QueryOptions) -> Result<ApiPage> {
        let reference = self.master_ref().await?.to_string();
        let mut params = vec![
            ("ref", reference),
            ("q", predicates_query(predicates)),
            ("pageSize", options.page_size.to_string()),
        ];
        if let Some(after) = &options.after {
            params.push(("after", after.clone()));
        }
        if !options.orderings.is_empty() {
            params.push(("orderings", orderings_query(&options.orderings)));
        }

        let url = format!("{}/documents/search", self.endpoint);
        tracing::debug!("Querying {} with {:?}", url, params);
        self.get_json(&url, &params).await
    }

    async fn fetch_page(&self, cursor: &str) -> Result<ApiPage> {
        if !(cursor.starts_with("https://") || cursor.starts_with("http://")) {
            return Err(Error::InvalidCursor(cursor.to_string()));
        }
        tracing::debug!("Fetching continuation {}", cursor);
        self.get_json(cursor, &[]).await
    }
}
