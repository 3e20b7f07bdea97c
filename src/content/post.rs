//! Typed views of CMS documents
//!
//! The wire payload is schema-free JSON. It is decoded into these types at the
//! formatting boundary so a missing field is an explicit error instead of an
//! empty value on the page.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

use crate::cms::Document;
use crate::error::{Error, Result};
use crate::richtext::{self, RichText};

/// Document type name of blog posts
pub const POST_TYPE: &str = "posts";

/// A document decoded according to its type
#[derive(Debug, Clone)]
pub enum TypedDocument {
    Post(Post<PostData>),
}

impl TypedDocument {
    /// Decode a document, failing on unknown types or missing fields
    pub fn parse(document: &Document) -> Result<Self> {
        match document.document_type.as_str() {
            POST_TYPE => Ok(TypedDocument::Post(Post::from_document(document)?)),
            other => Err(Error::UnexpectedDocumentType {
                document: document.label().to_string(),
                found: other.to_string(),
            }),
        }
    }
}

/// A post with its payload decoded as `T`
#[derive(Debug, Clone)]
pub struct Post<T> {
    pub id: String,
    pub uid: String,
    pub first_publication_date: Option<String>,
    pub last_publication_date: Option<String>,
    pub data: T,
}

impl<T: DeserializeOwned> Post<T> {
    /// Decode a `posts` document.
    ///
    /// Only the fields of `T` are required, so listings can decode
    /// [`PostHeader`] without needing a banner or body.
    pub fn from_document(document: &Document) -> Result<Self> {
        if document.document_type != POST_TYPE {
            return Err(Error::UnexpectedDocumentType {
                document: document.label().to_string(),
                found: document.document_type.clone(),
            });
        }

        let uid = document
            .uid
            .clone()
            .filter(|uid| !uid.is_empty())
            .ok_or_else(|| Error::malformed(&document.id, "missing field `uid`"))?;

        let data = T::deserialize(&document.data)
            .map_err(|e| Error::malformed(&uid, e.to_string()))?;

        Ok(Self {
            id: document.id.clone(),
            uid,
            first_publication_date: document.first_publication_date.clone(),
            last_publication_date: document.last_publication_date.clone(),
            data,
        })
    }
}

/// Fields a listing entry needs
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostHeader {
    #[serde(deserialize_with = "text_field")]
    pub title: String,
    #[serde(deserialize_with = "text_field")]
    pub subtitle: String,
    #[serde(deserialize_with = "text_field")]
    pub author: String,
}

/// Full post payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PostData {
    #[serde(flatten)]
    pub header: PostHeader,
    pub banner: Banner,
    pub content: Vec<ContentBlock>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Banner {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A titled section of a post
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentBlock {
    #[serde(default, deserialize_with = "nullable_text_field")]
    pub heading: String,
    pub body: RichText,
}

/// Text fields arrive as plain strings or as single-block rich text
#[derive(Deserialize)]
#[serde(untagged)]
enum TextField {
    Plain(String),
    Rich(RichText),
}

impl TextField {
    fn into_string(self) -> String {
        match self {
            TextField::Plain(text) => text,
            TextField::Rich(blocks) => richtext::as_text(&blocks),
        }
    }
}

fn text_field<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<String, D::Error> {
    Ok(TextField::deserialize(deserializer)?.into_string())
}

fn nullable_text_field<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    Ok(Option::<TextField>::deserialize(deserializer)?
        .map(TextField::into_string)
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(data: serde_json::Value) -> Document {
        Document {
            id: "YFH1".to_string(),
            uid: Some("como-utilizar-hooks".to_string()),
            document_type: POST_TYPE.to_string(),
            first_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
            last_publication_date: Some("2021-03-15T19:25:28+0000".to_string()),
            data,
        }
    }

    #[test]
    fn test_header_does_not_need_body() {
        let doc = document(json!({
            "title": "Como utilizar Hooks",
            "subtitle": "Pensando em sincronização em vez de ciclos de vida",
            "author": "Joseph Oliveira"
        }));
        let post = Post::<PostHeader>::from_document(&doc).unwrap();
        assert_eq!(post.uid, "como-utilizar-hooks");
        assert_eq!(post.data.author, "Joseph Oliveira");

        let err = TypedDocument::parse(&doc).unwrap_err();
        assert!(err.to_string().contains("banner"), "{}", err);
    }

    #[test]
    fn test_rich_text_title_is_flattened() {
        let doc = document(json!({
            "title": [{ "type": "heading1", "text": "Criando um app", "spans": [] }],
            "subtitle": "Tudo sobre como criar",
            "author": "Danilo Vieira",
            "banner": { "url": "https://images.prismic.io/banner.png" },
            "content": [{ "heading": null, "body": [] }]
        }));
        let TypedDocument::Post(post) = TypedDocument::parse(&doc).unwrap();
        assert_eq!(post.data.header.title, "Criando um app");
        assert_eq!(post.data.content[0].heading, "");
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let mut doc = document(json!({}));
        doc.document_type = "pages".to_string();
        assert!(matches!(
            TypedDocument::parse(&doc),
            Err(Error::UnexpectedDocumentType { .. })
        ));
    }

    #[test]
    fn test_missing_uid_is_malformed() {
        let mut doc = document(json!({ "title": "a", "subtitle": "b", "author": "c" }));
        doc.uid = None;
        let err = Post::<PostHeader>::from_document(&doc).unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }
}
