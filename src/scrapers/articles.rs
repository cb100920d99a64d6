//! Generic `<article>` scraper.
//!
//! News front pages wrap each story teaser in an `<article>` element holding a
//! heading and a short paragraph. This module pulls those two pieces of text
//! out of every matching element, in document order.

use crate::config::SelectorConfig;
use crate::models::Article;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::debug;

/// Compiled CSS selectors for one page layout.
#[derive(Debug, Clone)]
pub struct ArticleSelectors {
    article: Selector,
    title: Selector,
    description: Selector,
}

impl ArticleSelectors {
    /// Compile the selectors named in the configuration.
    pub fn new(config: &SelectorConfig) -> Result<Self, Box<dyn Error>> {
        Ok(Self {
            article: compile(&config.article)?,
            title: compile(&config.title)?,
            description: compile(&config.description)?,
        })
    }
}

fn compile(selector: &str) -> Result<Selector, Box<dyn Error>> {
    Selector::parse(selector)
        .map_err(|e| format!("invalid CSS selector {selector:?}: {e}").into())
}

/// Extract every article from an HTML document.
///
/// The title is the text of the first heading inside the article and the
/// description the text of the first paragraph. Missing pieces fall back to
/// `"No title"` / `"No description"`. A page without articles yields an
/// empty vector.
pub fn extract_articles(html: &str, selectors: &ArticleSelectors) -> Vec<Article> {
    let document = Html::parse_document(html);
    let articles: Vec<Article> = document
        .select(&selectors.article)
        .map(|element| {
            Article::from_parts(
                first_text(element, &selectors.title),
                first_text(element, &selectors.description),
            )
        })
        .collect();

    debug!(count = articles.len(), "Extracted article elements");
    articles
}

fn first_text(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(|found| found.text().collect::<String>())
}
