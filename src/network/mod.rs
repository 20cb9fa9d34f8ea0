pub mod client;
pub mod errors;
pub mod identity;

use serde::Serialize;
use std::future::Future;
use std::pin::Pin;

pub use client::PageFetcher;
pub use errors::FetchError;
pub use identity::CrawlerIdentity;

/// A successfully fetched document
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedPage {
    /// URL as requested
    pub url: String,
    /// URL after redirects
    pub final_url: String,
    pub status: u16,
    #[serde(skip)]
    pub body: String,
    pub elapsed_ms: u64,
}

/// Type alias for async fetch results
pub type AsyncResult<T> = Pin<Box<dyn Future<Output = Result<T, FetchError>> + Send>>;

/// Anything that can hand the auditor raw HTML for a URL.
///
/// The live implementation is [`PageFetcher`]; tests swap in canned pages.
pub trait PageSource: Send + Sync {
    fn fetch_page(&self, url: &str) -> AsyncResult<FetchedPage>;
}
