//! Data models for scraped articles.
//!
//! An [`Article`] is the only record that flows through the pipeline. It is
//! created by the collector, cleaned by the normalizer, and serialized by the
//! archiver. Collections are plain `Vec<Article>` kept in source order.

use serde::{Deserialize, Serialize};

/// Title used when an article element has no heading.
pub const NO_TITLE: &str = "No title";

/// Description used when an article element has no paragraph.
pub const NO_DESCRIPTION: &str = "No description";

/// A single scraped article.
///
/// Both fields are always present. The collector fills in [`NO_TITLE`] or
/// [`NO_DESCRIPTION`] when the page does not provide them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Article {
    /// The article headline.
    pub title: String,
    /// The short teaser text shown under the headline.
    pub description: String,
}

impl Article {
    /// Build an article, substituting the fallback literals for missing fields.
    pub fn from_parts(title: Option<String>, description: Option<String>) -> Self {
        Self {
            title: title.unwrap_or_else(|| NO_TITLE.to_string()),
            description: description.unwrap_or_else(|| NO_DESCRIPTION.to_string()),
        }
    }
}
