use crate::config::FetchConfig;
use crate::network::errors::FetchError;
use crate::network::identity::CrawlerIdentity;
use crate::network::{AsyncResult, FetchedPage, PageSource};
use reqwest::header::HeaderMap;
use reqwest::Client;
use std::time::Instant;

// * The HTTP engine behind every audit.
// * One pooled client, fixed timeout, honest user agent.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    inner: Client,
    identity: CrawlerIdentity,
}

impl PageFetcher {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_config(&FetchConfig::default())
    }

    pub fn with_config(config: &FetchConfig) -> Result<Self, FetchError> {
        let identity = CrawlerIdentity::with_user_agent(&config.user_agent);

        let mut headers = HeaderMap::new();
        identity.apply_to_headers(&mut headers)?;

        let client = Client::builder()
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            inner: client,
            identity,
        })
    }

    pub fn identity(&self) -> &CrawlerIdentity {
        &self.identity
    }

    // * Fetches a URL. Anything outside 2xx is a FetchError, never a page.
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        Self::fetch_with(self.inner.clone(), url.to_string()).await
    }

    async fn fetch_with(client: Client, url: String) -> Result<FetchedPage, FetchError> {
        if url::Url::parse(&url).is_err() {
            return Err(FetchError::InvalidUrl(url));
        }

        let started = Instant::now();
        let resp = client
            .get(&url)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, e))?;
        let status = resp.status();

        if !status.is_success() {
            tracing::debug!(url = %url, status = status.as_u16(), "Non-success response");
            return Err(FetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        let final_url = resp.url().to_string();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::from_reqwest(&url, e))?;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        crate::ops::telemetry::record_fetch_duration(elapsed_ms as f64 / 1000.0);

        Ok(FetchedPage {
            url,
            final_url,
            status: status.as_u16(),
            body,
            elapsed_ms,
        })
    }
}

impl PageSource for PageFetcher {
    fn fetch_page(&self, url: &str) -> AsyncResult<FetchedPage> {
        Box::pin(Self::fetch_with(self.inner.clone(), url.to_string()))
    }
}
