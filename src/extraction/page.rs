//! A parsed page as the job strategies see it.

use std::io::Cursor;

use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::dom::{block_text, collapse_whitespace, element_text};

static TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").expect("static selector"));

const FALLBACK_URL: &str = "http://localhost/";

/// Main-content extraction result.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ReadabilityResult {
    pub title: String,
    /// Cleaned article HTML.
    pub content: String,
    pub text_content: String,
}

/// Run the readability algorithm over `html`. Pages it cannot handle yield an
/// empty result rather than an error.
pub fn extract_readability(html: &str, url: &str) -> ReadabilityResult {
    let parsed_url = Url::parse(url).or_else(|_| Url::parse(FALLBACK_URL));
    let Ok(parsed_url) = parsed_url else {
        return ReadabilityResult::default();
    };

    let mut cursor = Cursor::new(html.as_bytes());
    match readability::extractor::extract(&mut cursor, &parsed_url) {
        Ok(product) => ReadabilityResult {
            title: collapse_whitespace(&product.title),
            content: product.content,
            text_content: product.text.trim().to_string(),
        },
        Err(_) => {
            debug!(url, "readability found no content");
            ReadabilityResult::default()
        }
    }
}

/// Page HTML plus the text views derived from it once.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub url: String,
    pub html: String,
    pub document: Html,
    /// `<title>` text.
    pub title: String,
    /// Visible text, one line per block element.
    pub text: String,
    /// Readability main content; empty when the page has no article body.
    pub main_text: String,
}

impl PageContent {
    pub fn new(html: impl Into<String>, url: impl Into<String>) -> Self {
        let html = html.into();
        let url = url.into();
        let document = Html::parse_document(&html);
        let title = document
            .select(&TITLE)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let text = block_text(document.root_element());
        let main_text = extract_readability(&html, &url).text_content;

        Self {
            url,
            html,
            document,
            title,
            text,
            main_text,
        }
    }

    /// Main content if readability found any, else the whole page text.
    pub fn best_text(&self) -> &str {
        if self.main_text.is_empty() {
            &self.text
        } else {
            &self.main_text
        }
    }
}
