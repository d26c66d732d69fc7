//! Web page loading: fetch a URL and keep its visible text.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Node, Selector};

use crate::error::LoaderError;
use crate::models::{Document, DocumentMetadata};
use crate::utils::{is_valid_url, normalize_whitespace};

const USER_AGENT: &str = concat!("premchat/", env!("CARGO_PKG_VERSION"));

/// Elements whose text never reaches the reader.
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "svg", "head"];

/// Elements that end a paragraph in the extracted text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "h1", "h2", "h3", "h4", "h5", "h6", "tr", "br", "section", "article",
    "blockquote", "pre", "table", "ul", "ol", "header", "footer", "main", "nav",
];

/// Source of documents for a URL.
#[async_trait]
pub trait PageLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Vec<Document>, LoaderError>;
}

#[derive(Debug, Clone)]
pub struct WebLoader {
    client: Client,
}

impl WebLoader {
    pub fn new(timeout: Duration) -> Result<Self, LoaderError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageLoader for WebLoader {
    /// Fetch `url` and return it as a single document; empty pages yield nothing.
    async fn load(&self, url: &str) -> Result<Vec<Document>, LoaderError> {
        if !is_valid_url(url) {
            return Err(LoaderError::InvalidUrl(url.to_string()));
        }

        tracing::debug!(url, "fetching page");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoaderError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let is_html = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_none_or(|ct| ct.contains("html"));
        let body = response.text().await?;

        let document = if is_html {
            html_to_document(&body, url)
        } else {
            Document::from_source(normalize_whitespace(&body), url)
        };

        if document.page_content.is_empty() {
            return Ok(Vec::new());
        }
        Ok(vec![document])
    }
}

/// Extract visible text, title and language from an HTML page.
pub fn html_to_document(html: &str, source: &str) -> Document {
    let page = Html::parse_document(html);

    let title = Selector::parse("title").ok().and_then(|sel| {
        page.select(&sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty())
    });

    let language = page
        .root_element()
        .value()
        .attr("lang")
        .map(str::to_string);

    let mut text = String::new();
    collect_text(page.root_element(), &mut text);

    Document::new(
        normalize_whitespace(&text),
        DocumentMetadata {
            source: source.to_string(),
            title,
            language,
        },
    )
}

/// Inline fragments are joined by spaces; block elements are closed by a blank line.
fn collect_text(element: ElementRef<'_>, text: &mut String) {
    let name = element.value().name();
    if HIDDEN_ELEMENTS.contains(&name) {
        return;
    }

    for child in element.children() {
        match child.value() {
            Node::Text(fragment) => {
                let fragment = fragment.trim();
                if !fragment.is_empty() {
                    text.push_str(fragment);
                    text.push(' ');
                }
            }
            Node::Element(_) => {
                if let Some(child) = ElementRef::wrap(child) {
                    collect_text(child, text);
                }
            }
            _ => {}
        }
    }

    if BLOCK_ELEMENTS.contains(&name) {
        text.push_str("\n\n");
    }
}
