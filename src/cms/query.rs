//! Predicates, orderings and paging options

use serde::{Deserialize, Serialize};

use super::Document;

/// Field path of the first publication timestamp
pub const FIRST_PUBLICATION_DATE: &str = "document.first_publication_date";

/// Field path of the last publication timestamp
pub const LAST_PUBLICATION_DATE: &str = "document.last_publication_date";

/// A query filter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    /// Exact equality on a field path
    At { path: String, value: String },
}

impl Predicate {
    pub fn at(path: impl Into<String>, value: impl Into<String>) -> Self {
        Predicate::At {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Filter on document type
    pub fn document_type(document_type: &str) -> Self {
        Self::at("document.type", document_type)
    }

    /// Filter on a document's uid
    pub fn uid(document_type: &str, uid: &str) -> Self {
        Self::at(format!("my.{}.uid", document_type), uid)
    }

    /// Render in the API's predicate syntax, e.g. `[at(document.type, "posts")]`
    pub fn to_query_fragment(&self) -> String {
        match self {
            Predicate::At { path, value } => {
                let value = value.replace('\\', "\\\\").replace('"', "\\\"");
                format!("[at({}, \"{}\")]", path, value)
            }
        }
    }

    /// Evaluate against a document locally
    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Predicate::At { path, value } => {
                field_value(document, path).as_deref() == Some(value.as_str())
            }
        }
    }
}

/// Combine predicates into the `q` parameter
pub fn predicates_query(predicates: &[Predicate]) -> String {
    let fragments: Vec<String> = predicates.iter().map(Predicate::to_query_fragment).collect();
    format!("[{}]", fragments.join(""))
}

/// Sort directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub field: String,
    pub descending: bool,
}

impl Ordering {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            descending: true,
        }
    }

    fn to_query_fragment(&self) -> String {
        if self.descending {
            format!("{} desc", self.field)
        } else {
            self.field.clone()
        }
    }
}

/// Combine orderings into the `orderings` parameter
pub fn orderings_query(orderings: &[Ordering]) -> String {
    let fragments: Vec<String> = orderings.iter().map(Ordering::to_query_fragment).collect();
    format!("[{}]", fragments.join(","))
}

/// Paging and sorting options for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub page_size: u32,
    /// Return only documents after this document id
    pub after: Option<String>,
    pub orderings: Vec<Ordering>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page_size: 20,
            after: None,
            orderings: Vec::new(),
        }
    }
}

impl QueryOptions {
    pub fn with_page_size(page_size: u32) -> Self {
        Self {
            page_size,
            ..Self::default()
        }
    }

    pub fn after(mut self, id: impl Into<String>) -> Self {
        self.after = Some(id.into());
        self
    }

    pub fn ordered_by(mut self, ordering: Ordering) -> Self {
        self.orderings.push(ordering);
        self
    }
}

/// Read a field path from a document as a string
pub(crate) fn field_value(document: &Document, path: &str) -> Option<String> {
    match path {
        "document.type" => Some(document.document_type.clone()),
        "document.id" => Some(document.id.clone()),
        FIRST_PUBLICATION_DATE => document.first_publication_date.clone(),
        LAST_PUBLICATION_DATE => document.last_publication_date.clone(),
        _ => {
            let rest = path.strip_prefix("my.")?;
            let (document_type, field) = rest.split_once('.')?;
            if document_type != document.document_type {
                return None;
            }
            if field == "uid" {
                return document.uid.clone();
            }
            match document.data.get(field)? {
                serde_json::Value::String(s) => Some(s.clone()),
                serde_json::Value::Null => None,
                other => Some(other.to_string()),
            }
        }
    }
}
