use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use tracing::{debug, info};

use crate::error::FetchError;

const SEARCH_URL: &str = "https://html.duckduckgo.com/html/";
const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/117.0.0.0 Safari/537.36";
const PAGE_UA: &str = "Mozilla/5.0";

/// Query string → raw HTML of a search results page.
#[async_trait]
pub trait SearchFetcher {
    async fn search(&self, query: &str) -> Result<String, FetchError>;
}

/// URL → raw HTML of a profile page.
#[async_trait]
pub trait PageFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Plain reqwest-backed fetcher. One attempt per call; the client timeout
/// is the only time limit.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    async fn get_text(&self, request: reqwest::RequestBuilder, url: &str) -> Result<String, FetchError> {
        let start = Instant::now();
        let response = request.send().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|source| FetchError::Request {
            url: url.to_string(),
            source,
        })?;
        debug!(
            "GET {} -> {} ({} bytes, {}ms)",
            url,
            status.as_u16(),
            body.len(),
            start.elapsed().as_millis()
        );
        Ok(body)
    }
}

fn search_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(REFERER, HeaderValue::from_static("https://duckduckgo.com/"));
    headers
}

#[async_trait]
impl SearchFetcher for HttpFetcher {
    async fn search(&self, query: &str) -> Result<String, FetchError> {
        info!("Searching: {}", query);
        let request = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", query)])
            .headers(search_headers());
        self.get_text(request, SEARCH_URL).await
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let request = self.client.get(url).header(USER_AGENT, PAGE_UA);
        self.get_text(request, url).await
    }
}
