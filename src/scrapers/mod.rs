//! Collector stage: fetch source pages and extract their articles.
//!
//! Sources are fetched one after another, in the order they are configured,
//! and their articles are concatenated in that same order. Nothing here
//! retries or times out; a failed fetch fails the whole stage and the retry
//! policy in [`crate::pipeline`] decides what happens next.

pub mod articles;

use crate::models::Article;
use articles::{ArticleSelectors, extract_articles};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::error::Error;
use tracing::{info, instrument};

/// Something that can return the body of a page.
pub trait PageFetcher {
    /// Fetch `url` and return the response body as text.
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>>;
}

/// [`PageFetcher`] backed by a plain `reqwest` client.
///
/// No timeout or extra headers are configured.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PageFetcher for HttpFetcher {
    #[instrument(level = "info", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        info!(bytes = body.len(), "Fetched page");
        Ok(body)
    }
}

/// Fetch every source and concatenate the extracted articles.
///
/// # Errors
///
/// Returns the first fetch error; later sources are not requested.
#[instrument(level = "info", skip_all, fields(sources = sources.len()))]
pub async fn collect<F: PageFetcher>(
    fetcher: &F,
    sources: &[String],
    selectors: &ArticleSelectors,
) -> Result<Vec<Article>, Box<dyn Error>> {
    let per_source: Vec<Vec<Article>> = stream::iter(sources)
        .then(|url| async move {
            let html = fetcher.fetch(url).await?;
            let articles = extract_articles(&html, selectors);
            info!(%url, count = articles.len(), "Scraped source");
            Ok::<_, Box<dyn Error>>(articles)
        })
        .try_collect()
        .await?;

    let articles: Vec<Article> = per_source.into_iter().flatten().collect();
    info!(count = articles.len(), "Collected articles from all sources");
    Ok(articles)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::SelectorConfig;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Serves canned pages and remembers which urls were requested.
    #[derive(Debug, Default)]
    pub(crate) struct FakeFetcher {
        pub pages: HashMap<String, String>,
        pub requested: RefCell<Vec<String>>,
    }

    impl FakeFetcher {
        pub fn with_pages(pages: &[(&str, &str)]) -> Self {
            Self {
                pages: pages
                    .iter()
                    .map(|(url, body)| (url.to_string(), body.to_string()))
                    .collect(),
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl PageFetcher for FakeFetcher {
        async fn fetch(&self, url: &str) -> Result<String, Box<dyn Error>> {
            self.requested.borrow_mut().push(url.to_string());
            self.pages
                .get(url)
                .cloned()
                .ok_or_else(|| format!("connection refused: {url}").into())
        }
    }

    /// Serve a single HTTP response on a local port and return its url.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 2048];
            let _ = socket.read(&mut request).await;
            let response = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });
        format!("http://{addr}/")
    }

    fn selectors() -> ArticleSelectors {
        ArticleSelectors::new(&SelectorConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn test_http_fetcher_returns_body() {
        let url = serve_once("200 OK", "<article><h2>X</h2></article>").await;
        let body = HttpFetcher::new().fetch(&url).await.unwrap();
        assert_eq!(body, "<article><h2>X</h2></article>");
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_server_error() {
        let url = serve_once("500 Internal Server Error", "<article><h2>X</h2></article>").await;
        assert!(HttpFetcher::new().fetch(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_http_fetcher_rejects_not_found() {
        let url = serve_once("404 Not Found", "<article><h2>Gone</h2></article>").await;
        assert!(HttpFetcher::new().fetch(&url).await.is_err());
    }

    #[tokio::test]
    async fn test_collect_concatenates_in_source_order() {
        let fetcher = FakeFetcher::with_pages(&[
            ("https://a.test", "<article><h2>A</h2><p>a</p></article>"),
            ("https://b.test", "<article><h2>B</h2><p>b</p></article>"),
        ]);
        let sources = vec!["https://a.test".to_string(), "https://b.test".to_string()];

        let articles = collect(&fetcher, &sources, &selectors()).await.unwrap();
        let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
        assert_eq!(*fetcher.requested.borrow(), sources);
    }

    #[tokio::test]
    async fn test_collect_empty_page_contributes_nothing() {
        let fetcher = FakeFetcher::with_pages(&[
            ("https://a.test", "<html><body>maintenance</body></html>"),
            ("https://b.test", "<article><h2>B</h2></article>"),
        ]);
        let sources = vec!["https://a.test".to_string(), "https://b.test".to_string()];

        let articles = collect(&fetcher, &sources, &selectors()).await.unwrap();
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].description, "No description");
    }

    #[tokio::test]
    async fn test_collect_stops_at_first_failure() {
        let fetcher = FakeFetcher::with_pages(&[(
            "https://b.test",
            "<article><h2>B</h2></article>",
        )]);
        let sources = vec!["https://a.test".to_string(), "https://b.test".to_string()];

        let result = collect(&fetcher, &sources, &selectors()).await;
        assert!(result.is_err());
        assert_eq!(*fetcher.requested.borrow(), vec!["https://a.test"]);
    }
}
