//! Search-engine seam and the DuckDuckGo HTML engine.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};

use crate::core::{SearchQuery, SearchResult};
use crate::error::FetchError;

/// Default DuckDuckGo HTML endpoint.
pub const DUCKDUCKGO_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Browser-like user agent; the HTML endpoint rejects obvious bots.
pub(crate) const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Returns result URLs for a search query.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Engine name for logging.
    fn name(&self) -> &'static str;

    /// Runs a query and returns at most `limit` results.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on transport failures or non-success status.
    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<SearchResult>, FetchError>;
}

/// Search engine backed by DuckDuckGo's HTML results page.
#[derive(Debug, Clone)]
pub struct DuckDuckGoEngine {
    client: reqwest::Client,
    endpoint: String,
    timeout: Duration,
}

impl DuckDuckGoEngine {
    /// Creates an engine with the given request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        Self::with_endpoint(DUCKDUCKGO_ENDPOINT, timeout)
    }

    /// Creates an engine against a custom endpoint (used for testing).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn with_endpoint(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            timeout,
        })
    }

    /// Parses DuckDuckGo result markup.
    fn parse_results(html: &str, limit: usize) -> Vec<SearchResult> {
        let document = Html::parse_document(html);
        let (Ok(result_sel), Ok(link_sel), Ok(snippet_sel)) = (
            Selector::parse("div.result"),
            Selector::parse("a.result__a"),
            Selector::parse(".result__snippet"),
        ) else {
            return Vec::new();
        };

        let mut seen = std::collections::HashSet::new();
        let mut results = Vec::new();

        for result in document.select(&result_sel) {
            if results.len() >= limit {
                break;
            }
            if result
                .value()
                .classes()
                .any(|c| c == "result--ad" || c == "result--ads")
            {
                continue;
            }

            let Some(link) = result.select(&link_sel).next() else {
                continue;
            };
            let Some(url) = link.value().attr("href").and_then(resolve_href) else {
                continue;
            };
            if !seen.insert(url.clone()) {
                continue;
            }

            let title = element_text(link);
            let snippet = result
                .select(&snippet_sel)
                .next()
                .map(element_text)
                .unwrap_or_default();

            results.push(SearchResult {
                title: if title.is_empty() {
                    title_from_url(&url)
                } else {
                    title
                },
                url,
                snippet,
            });
        }

        results
    }
}

#[async_trait]
impl SearchEngine for DuckDuckGoEngine {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(
        &self,
        query: &SearchQuery,
        limit: usize,
    ) -> Result<Vec<SearchResult>, FetchError> {
        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(query.as_str()));
        tracing::debug!(url = %url, "fetching search results");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(&url, &e, self.timeout))?;

        if !response.status().is_success() {
            return Err(FetchError::Status {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(&url, &e, self.timeout))?;
        let results = Self::parse_results(&body, limit);

        if results.is_empty() {
            tracing::warn!(query = %query, "no search results found");
        } else {
            tracing::info!(query = %query, count = results.len(), "search completed");
        }
        Ok(results)
    }
}

/// Maps a reqwest error onto [`FetchError`].
pub(crate) fn map_reqwest_error(url: &str, error: &reqwest::Error, timeout: Duration) -> FetchError {
    if error.is_timeout() {
        return FetchError::Timeout {
            url: url.to_string(),
            timeout,
        };
    }
    FetchError::Network {
        url: url.to_string(),
        message: error.to_string(),
    }
}

/// Resolves a result link, unwrapping DuckDuckGo's `uddg=` redirect.
fn resolve_href(href: &str) -> Option<String> {
    let url = if let Some(pos) = href.find("uddg=") {
        let encoded = &href[pos + "uddg=".len()..];
        let encoded = encoded.split('&').next().unwrap_or(encoded);
        urlencoding::decode(encoded).ok()?.into_owned()
    } else if let Some(rest) = href.strip_prefix("//") {
        format!("https://{rest}")
    } else {
        href.to_string()
    };

    let is_http = url.starts_with("http://") || url.starts_with("https://");
    (is_http && !url.contains("duckduckgo.com")).then_some(url)
}

/// Collapsed text content of an element.
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Host part of a URL, used as a title fallback.
fn title_from_url(url: &str) -> String {
    url.split("//")
        .nth(1)
        .and_then(|rest| rest.split('/').next())
        .map_or_else(|| url.to_string(), str::to_string)
}
