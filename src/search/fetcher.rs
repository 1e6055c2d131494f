//! Page fetcher seam and the HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use scraper::{Html, Selector};

use super::engine::{USER_AGENT, map_reqwest_error};
use crate::core::truncate_text;
use crate::error::FetchError;

/// Retrieves the readable text of a web page.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns its extracted text (possibly empty).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on invalid URLs, transport failures,
    /// non-success status, or timeout.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Fetches pages over HTTP and extracts their paragraph text.
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_content_length: usize,
}

impl HttpPageFetcher {
    /// Creates a fetcher with the given timeout and content limit.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Client`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration, max_content_length: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Client {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            timeout,
            max_content_length,
        })
    }

    /// Joins the text of every `<p>` element.
    fn extract_paragraphs(html: &str) -> String {
        let document = Html::parse_document(html);
        let Ok(paragraph) = Selector::parse("p") else {
            return String::new();
        };

        document
            .select(&paragraph)
            .map(|p| {
                p.text()
                    .collect::<String>()
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
            });
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| map_reqwest_error(url, &e, self.timeout))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response
            .text()
            .await
            .map_err(|e| map_reqwest_error(url, &e, self.timeout))?;

        let text = Self::extract_paragraphs(&html);
        tracing::debug!(url, chars = text.chars().count(), "page fetched");
        Ok(truncate_text(&text, self.max_content_length))
    }
}
