//! Wire shapes of the content API

use serde::{Deserialize, Serialize};

/// A content record as returned by the repository
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Repository-internal identity, used as the `after` anchor
    pub id: String,

    /// Routable identifier, unique per document type
    #[serde(default)]
    pub uid: Option<String>,

    /// Document type name, e.g. `posts`
    #[serde(rename = "type")]
    pub document_type: String,

    #[serde(default)]
    pub first_publication_date: Option<String>,

    #[serde(default)]
    pub last_publication_date: Option<String>,

    /// Type-specific payload, validated when formatted
    #[serde(default)]
    pub data: serde_json::Value,
}

impl Document {
    /// Name used in logs and errors: the uid when present, the id otherwise
    pub fn label(&self) -> &str {
        self.uid.as_deref().unwrap_or(&self.id)
    }
}

/// One page of query results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiPage {
    #[serde(default = "first_page")]
    pub page: u32,

    #[serde(default)]
    pub results_per_page: u32,

    #[serde(default)]
    pub total_results_size: u32,

    #[serde(default)]
    pub total_pages: u32,

    /// Continuation cursor, `None` on the last page
    #[serde(default)]
    pub next_page: Option<String>,

    #[serde(default)]
    pub prev_page: Option<String>,

    #[serde(default)]
    pub results: Vec<Document>,
}

fn first_page() -> u32 {
    1
}

impl ApiPage {
    /// A page with the given results and no continuation
    pub fn single(results: Vec<Document>) -> Self {
        let size = results.len() as u32;
        Self {
            page: 1,
            results_per_page: size,
            total_results_size: size,
            total_pages: 1,
            next_page: None,
            prev_page: None,
            results,
        }
    }
}

/// API root response, only the refs are needed
#[derive(Debug, Deserialize)]
pub(crate) struct ApiInfo {
    #[serde(default)]
    pub refs: Vec<ApiRef>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiRef {
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(rename = "isMasterRef", default)]
    pub is_master_ref: bool,
}
