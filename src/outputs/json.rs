//! JSON output for the archived articles.
//!
//! The file holds a single JSON array of `{"title", "description"}` objects,
//! UTF-8 encoded, in collection order.

use crate::models::Article;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `articles` and overwrite the file at `path`.
///
/// The parent directory must already exist.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
#[instrument(level = "info", skip_all, fields(path = %path.display(), count = articles.len()))]
pub async fn write_articles(path: &Path, articles: &[Article]) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string(articles)?;

    if let Err(e) = fs::write(path, json.as_bytes()).await {
        error!(error = %e, "Failed to write JSON");
        return Err(e.into());
    }
    info!(bytes = json.len(), "Wrote articles JSON");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, description: &str) -> Article {
        Article {
            title: title.to_string(),
            description: description.to_string(),
        }
    }

    #[tokio::test]
    async fn test_write_articles_creates_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");

        write_articles(&path, &[article("A", "a"), article("B", "b")])
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let items = value.as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["title"], "A");
        assert_eq!(items[1]["description"], "b");
    }

    #[tokio::test]
    async fn test_write_articles_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");
        std::fs::write(&path, "previous contents that are much longer than the new ones").unwrap();

        write_articles(&path, &[]).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[tokio::test]
    async fn test_write_articles_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("articles.json");

        write_articles(&path, &[article("کراچی", "naïve café")]).await.unwrap();

        let back: Vec<Article> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back, vec![article("کراچی", "naïve café")]);
    }

    #[tokio::test]
    async fn test_write_articles_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("articles.json");
        assert!(write_articles(&path, &[]).await.is_err());
    }
}
