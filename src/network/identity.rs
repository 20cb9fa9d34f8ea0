use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, USER_AGENT};

use crate::config::constants::DEFAULT_USER_AGENT;
use crate::network::errors::FetchError;

// * CrawlerIdentity is the header set every audit fetch presents.
// * The bot identifies itself openly; site owners can allow/deny it in robots.txt.
#[derive(Debug, Clone)]
pub struct CrawlerIdentity {
    pub user_agent: String,
    /// Token matched against robots.txt `User-agent:` groups
    pub robots_token: String,
    pub accept: &'static str,
    pub accept_language: &'static str,
}

impl Default for CrawlerIdentity {
    fn default() -> Self {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }
}

impl CrawlerIdentity {
    pub fn with_user_agent(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            robots_token: Self::product_token(user_agent),
            accept: "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            accept_language: "en-US,en;q=0.9",
        }
    }

    // * "Mozilla/5.0 (compatible; SEOSentinel/0.1; +url)" -> "SEOSentinel"
    fn product_token(user_agent: &str) -> String {
        user_agent
            .split(|c: char| c == ';' || c == '(' || c == ')' || c.is_whitespace())
            .filter(|part| !part.is_empty())
            .filter(|part| !part.starts_with("Mozilla") && !part.starts_with('+'))
            .find(|part| *part != "compatible")
            .and_then(|part| part.split('/').next())
            .unwrap_or("*")
            .to_string()
    }

    // * Applies the configured identity to a mutable HeaderMap.
    pub fn apply_to_headers(&self, headers: &mut HeaderMap) -> Result<(), FetchError> {
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&self.user_agent)
                .map_err(|_| FetchError::InvalidHeader("User-Agent"))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static(self.accept));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(self.accept_language));
        Ok(())
    }
}
