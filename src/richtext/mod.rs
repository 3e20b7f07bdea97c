//! Structured rich text
//!
//! The CMS stores formatted text as a list of blocks, each carrying plain
//! text plus character-offset spans for emphasis and links. This module
//! renders that structure to HTML or flattens it to plain text.

use html_escape::{encode_double_quoted_attribute, encode_text};
use serde::{Deserialize, Serialize};

use crate::helpers::post_path;

/// A rich-text value: an ordered list of blocks
pub type RichText = Vec<RichTextBlock>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BlockKind {
    Heading1,
    Heading2,
    Heading3,
    Heading4,
    Heading5,
    Heading6,
    Paragraph,
    Preformatted,
    ListItem,
    OListItem,
    Image,
    Embed,
    #[serde(other)]
    Unknown,
}

impl BlockKind {
    fn has_text(self) -> bool {
        !matches!(self, BlockKind::Image | BlockKind::Embed | BlockKind::Unknown)
    }
}

/// One block of rich text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextBlock {
    #[serde(rename = "type")]
    pub kind: BlockKind,

    #[serde(default)]
    pub text: String,

    #[serde(default)]
    pub spans: Vec<Span>,

    /// Image source
    #[serde(default)]
    pub url: Option<String>,

    /// Image alt text
    #[serde(default)]
    pub alt: Option<String>,

    #[serde(default)]
    pub oembed: Option<Embed>,
}

impl RichTextBlock {
    /// A span-free block, handy for building content by hand
    pub fn plain(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Embed {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
    #[serde(rename = "type", default)]
    pub embed_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unknown,
}

/// Formatting applied to the characters `start..end` of a block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default)]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub link_type: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    /// Uid of a linked document
    #[serde(default)]
    pub uid: Option<String>,
    /// Class name of a label span
    #[serde(default)]
    pub label: Option<String>,
}

/// Flatten rich text to plain text, one space between blocks
pub fn as_text(blocks: &[RichTextBlock]) -> String {
    blocks
        .iter()
        .filter(|block| block.kind.has_text())
        .map(|block| block.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render rich text to HTML.
///
/// Text is escaped; embed blocks carry provider HTML which is emitted as-is.
/// Links to other posts are resolved under `root`.
pub fn as_html(blocks: &[RichTextBlock], root: &str) -> String {
    let mut html = String::new();
    let mut open_list: Option<BlockKind> = None;

    for block in blocks {
        let list = matches!(block.kind, BlockKind::ListItem | BlockKind::OListItem);
        if open_list.is_some() && open_list != Some(block.kind) {
            html.push_str(list_close(open_list));
            open_list = None;
        }
        if list && open_list.is_none() {
            html.push_str(if block.kind == BlockKind::ListItem {
                "<ul>"
            } else {
                "<ol>"
            });
            open_list = Some(block.kind);
        }
        html.push_str(&render_block(block, root));
    }
    html.push_str(list_close(open_list));

    html
}

fn list_close(list: Option<BlockKind>) -> &'static str {
    match list {
        Some(BlockKind::ListItem) => "</ul>",
        Some(BlockKind::OListItem) => "</ol>",
        _ => "",
    }
}

fn render_block(block: &RichTextBlock, root: &str) -> String {
    let inner = || render_spans(&block.text, &block.spans, root);
    match block.kind {
        BlockKind::Heading1 => format!("<h1>{}</h1>", inner()),
        BlockKind::Heading2 => format!("<h2>{}</h2>", inner()),
        BlockKind::Heading3 => format!("<h3>{}</h3>", inner()),
        BlockKind::Heading4 => format!("<h4>{}</h4>", inner()),
        BlockKind::Heading5 => format!("<h5>{}</h5>", inner()),
        BlockKind::Heading6 => format!("<h6>{}</h6>", inner()),
        BlockKind::Paragraph => format!("<p>{}</p>", inner()),
        BlockKind::Preformatted => format!("<pre>{}</pre>", inner()),
        BlockKind::ListItem | BlockKind::OListItem => format!("<li>{}</li>", inner()),
        BlockKind::Image => match &block.url {
            Some(url) => format!(
                r#"<p class="block-img"><img src="{}" alt="{}" /></p>"#,
                encode_double_quoted_attribute(url),
                encode_double_quoted_attribute(block.alt.as_deref().unwrap_or(""))
            ),
            None => String::new(),
        },
        BlockKind::Embed => match &block.oembed {
            Some(embed) => format!(
                r#"<div data-oembed="{}" data-oembed-type="{}">{}</div>"#,
                encode_double_quoted_attribute(embed.embed_url.as_deref().unwrap_or("")),
                encode_double_quoted_attribute(embed.embed_type.as_deref().unwrap_or("")),
                embed.html.as_deref().unwrap_or("")
            ),
            None => String::new(),
        },
        BlockKind::Unknown => String::new(),
    }
}

/// A span with its bounds converted to char indices
struct Mark<'a> {
    start: usize,
    end: usize,
    span: &'a Span,
}

/// Apply spans to a block's text.
///
/// Span offsets count UTF-16 code units. Spans are sorted outermost-first; a
/// span ending inside another is closed together with everything opened
/// after it, and those are reopened.
fn render_spans(text: &str, spans: &[Span], root: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let len = chars.len();

    // UTF-16 offset of each char, plus the total length
    let mut offsets = Vec::with_capacity(len + 1);
    let mut offset = 0;
    for c in &chars {
        offsets.push(offset);
        offset += c.len_utf16();
    }
    offsets.push(offset);
    let char_index = |units: usize| offsets.partition_point(|&o| o < units).min(len);

    let mut marks: Vec<Mark> = spans
        .iter()
        .map(|span| Mark {
            start: char_index(span.start),
            end: char_index(span.end),
            span,
        })
        .filter(|mark| mark.start < mark.end)
        .collect();
    marks.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::new();
    let mut pending = String::new();
    let mut open: Vec<&Mark> = Vec::new();
    let mut next = 0;

    for i in 0..=len {
        if open.iter().any(|mark| mark.end == i) {
            flush(&mut out, &mut pending);
            let mut reopen = Vec::new();
            while let Some(mark) = open.pop() {
                out.push_str(&close_tag(mark.span, root));
                if mark.end != i {
                    reopen.push(mark);
                }
                if !open.iter().any(|mark| mark.end == i) {
                    break;
                }
            }
            for mark in reopen.into_iter().rev() {
                out.push_str(&open_tag(mark.span, root));
                open.push(mark);
            }
        }

        while next < marks.len() && marks[next].start == i {
            flush(&mut out, &mut pending);
            out.push_str(&open_tag(marks[next].span, root));
            open.push(&marks[next]);
            next += 1;
        }

        if i < len {
            if chars[i] == '\n' {
                flush(&mut out, &mut pending);
                out.push_str("<br />");
            } else {
                pending.push(chars[i]);
            }
        }
    }
    flush(&mut out, &mut pending);

    out
}

fn flush(out: &mut String, pending: &mut String) {
    if !pending.is_empty() {
        out.push_str(&encode_text(pending));
        pending.clear();
    }
}

fn open_tag(span: &Span, root: &str) -> String {
    match span.kind {
        SpanKind::Strong => "<strong>".to_string(),
        SpanKind::Em => "<em>".to_string(),
        SpanKind::Hyperlink => match link_href(span, root) {
            Some(href) => {
                let target = span
                    .data
                    .as_ref()
                    .and_then(|d| d.target.as_deref())
                    .map(|t| {
                        format!(
                            r#" target="{}" rel="noopener""#,
                            encode_double_quoted_attribute(t)
                        )
                    })
                    .unwrap_or_default();
                format!(
                    r#"<a href="{}"{}>"#,
                    encode_double_quoted_attribute(&href),
                    target
                )
            }
            None => String::new(),
        },
        SpanKind::Label => match span.data.as_ref().and_then(|d| d.label.as_deref()) {
            Some(label) => format!(
                r#"<span class="{}">"#,
                encode_double_quoted_attribute(label)
            ),
            None => "<span>".to_string(),
        },
        SpanKind::Unknown => String::new(),
    }
}

fn close_tag(span: &Span, root: &str) -> String {
    match span.kind {
        SpanKind::Strong => "</strong>".to_string(),
        SpanKind::Em => "</em>".to_string(),
        SpanKind::Hyperlink if link_href(span, root).is_some() => "</a>".to_string(),
        SpanKind::Label => "</span>".to_string(),
        _ => String::new(),
    }
}

/// Resolve a hyperlink span; document links point at the post route
fn link_href(span: &Span, root: &str) -> Option<String> {
    let data = span.data.as_ref()?;
    match data.link_type.as_deref() {
        Some("Document") => data.uid.as_deref().map(|uid| post_path(root, uid)),
        _ => data.url.clone(),
    }
}
