//! Concurrent web searcher.
//!
//! Fans each round's queries out to the [`SearchEngine`], then fans the
//! resulting URLs out to the [`PageFetcher`]. Both phases run on a
//! [`JoinSet`] bounded by a semaphore, so dropping the search future
//! aborts every outstanding request. Evidence is returned in dispatch
//! order regardless of completion order.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::engine::SearchEngine;
use super::fetcher::PageFetcher;
use crate::agent::AgentConfig;
use crate::core::{Evidence, SearchQuery, SearchResult};
use crate::error::FetchError;

/// Turns search queries into evidence.
pub struct WebSearcher {
    engine: Arc<dyn SearchEngine>,
    fetcher: Arc<dyn PageFetcher>,
    results_per_query: usize,
    request_timeout: Duration,
    max_content_length: usize,
    max_concurrency: usize,
}

impl WebSearcher {
    /// Creates a searcher over the given engine and fetcher.
    #[must_use]
    pub fn new(
        engine: Arc<dyn SearchEngine>,
        fetcher: Arc<dyn PageFetcher>,
        config: &AgentConfig,
    ) -> Self {
        Self {
            engine,
            fetcher,
            results_per_query: config.search_results_per_query,
            request_timeout: config.request_timeout,
            max_content_length: config.max_content_length,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    /// Searches every query and fetches every result page.
    ///
    /// Failures are logged and skipped; the result may be empty.
    pub async fn search(&self, queries: &[SearchQuery]) -> Vec<Evidence> {
        if queries.is_empty() || self.results_per_query == 0 {
            return Vec::new();
        }

        let results = self.run_engine(queries).await;
        if results.is_empty() {
            return Vec::new();
        }
        self.fetch_all(results).await
    }

    /// Runs all engine queries, returning unique results in query order.
    async fn run_engine(&self, queries: &[SearchQuery]) -> Vec<SearchResult> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();

        for (idx, query) in queries.iter().enumerate() {
            let sem = Arc::clone(&semaphore);
            let engine = Arc::clone(&self.engine);
            let query = query.clone();
            let limit = self.results_per_query;
            let timeout = self.request_timeout;

            tasks.spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return (idx, query, Ok(Vec::new()));
                };
                let result = match tokio::time::timeout(timeout, engine.search(&query, limit)).await
                {
                    Ok(result) => result,
                    Err(_) => Err(FetchError::Timeout {
                        url: format!("search:{query}"),
                        timeout,
                    }),
                };
                (idx, query, result)
            });
        }

        let mut batches: Vec<(usize, Vec<SearchResult>)> = Vec::with_capacity(queries.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, _, Ok(mut results))) => {
                    results.truncate(self.results_per_query);
                    batches.push((idx, results));
                }
                Ok((_, query, Err(e))) => {
                    tracing::warn!(query = %query, error = %e, "search failed");
                }
                Err(e) => tracing::warn!(error = %e, "search task failed"),
            }
        }
        batches.sort_by_key(|(idx, _)| *idx);

        let mut seen = HashSet::new();
        batches
            .into_iter()
            .flat_map(|(_, results)| results)
            .filter(|r| seen.insert(r.url.clone()))
            .collect()
    }

    /// Fetches every result page, returning evidence in result order.
    async fn fetch_all(&self, results: Vec<SearchResult>) -> Vec<Evidence> {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrency));
        let mut tasks = JoinSet::new();
        let expected = results.len();

        for (idx, result) in results.into_iter().enumerate() {
            let sem = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&self.fetcher);
            let timeout = self.request_timeout;
            let max_len = self.max_content_length;

            tasks.spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return (idx, None);
                };
                let fetched = match tokio::time::timeout(timeout, fetcher.fetch(&result.url)).await {
                    Ok(fetched) => fetched,
                    Err(_) => Err(FetchError::Timeout {
                        url: result.url.clone(),
                        timeout,
                    }),
                };
                (idx, to_evidence(result, fetched, max_len))
            });
        }

        let mut gathered: Vec<(usize, Evidence)> = Vec::with_capacity(expected);
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((idx, Some(evidence))) => gathered.push((idx, evidence)),
                Ok((_, None)) => {}
                Err(e) => tracing::warn!(error = %e, "fetch task failed"),
            }
        }
        gathered.sort_by_key(|(idx, _)| *idx);

        tracing::debug!(
            fetched = gathered.len(),
            attempted = expected,
            "round fetch complete"
        );
        gathered.into_iter().map(|(_, evidence)| evidence).collect()
    }
}

/// Builds evidence from a fetch outcome, falling back to the result snippet
/// when the page yields no text. Returns `None` when nothing usable remains.
fn to_evidence(
    result: SearchResult,
    fetched: Result<String, FetchError>,
    max_content_length: usize,
) -> Option<Evidence> {
    let page_text = match fetched {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(url = %result.url, error = %e, "fetch failed, skipping");
            return None;
        }
    };

    let text = if page_text.trim().is_empty() {
        result.snippet.trim().to_string()
    } else {
        page_text
    };

    if text.is_empty() {
        tracing::debug!(url = %result.url, "no extractable text, skipping");
        return None;
    }

    Some(Evidence::new(
        result.url,
        result.title,
        &text,
        max_content_length,
    ))
}

impl std::fmt::Debug for WebSearcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSearcher")
            .field("engine", &self.engine.name())
            .field("results_per_query", &self.results_per_query)
            .field("request_timeout", &self.request_timeout)
            .field("max_concurrency", &self.max_concurrency)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    /// Engine returning fixed results per query.
    struct FixedEngine {
        results: HashMap<String, Vec<SearchResult>>,
    }

    #[async_trait]
    impl SearchEngine for FixedEngine {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn search(
            &self,
            query: &SearchQuery,
            limit: usize,
        ) -> Result<Vec<SearchResult>, FetchError> {
            match self.results.get(query.as_str()) {
                Some(results) => Ok(results.iter().take(limit).cloned().collect()),
                None => Err(FetchError::Network {
                    url: query.to_string(),
                    message: "engine down".to_string(),
                }),
            }
        }
    }

    /// Fetcher with per-URL delays, recording the fetch order.
    struct DelayFetcher {
        pages: HashMap<String, (u64, Result<String, FetchError>)>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl PageFetcher for DelayFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(url.to_string());
            }
            let (delay_ms, result) = self.pages.get(url).cloned().unwrap_or((
                0,
                Err(FetchError::Status {
                    url: url.to_string(),
                    status: 404,
                }),
            ));
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            result
        }
    }

    fn result(url: &str, snippet: &str) -> SearchResult {
        SearchResult {
            url: url.to_string(),
            title: url.to_string(),
            snippet: snippet.to_string(),
        }
    }

    fn config() -> AgentConfig {
        AgentConfig::builder()
            .api_key("test")
            .search_results_per_query(2)
            .request_timeout(Duration::from_millis(300))
            .max_content_length(50)
            .build()
            .unwrap_or_else(|_| unreachable!())
    }

    #[tokio::test]
    async fn test_evidence_in_dispatch_order_with_failures_skipped() {
        let engine = FixedEngine {
            results: HashMap::from([
                (
                    "q1".to_string(),
                    vec![result("https://a", ""), result("https://b", "b snippet")],
                ),
                (
                    "q2".to_string(),
                    vec![result("https://a", ""), result("https://c", "")],
                ),
            ]),
        };
        let fetcher = DelayFetcher {
            pages: HashMap::from([
                ("https://a".to_string(), (100, Ok("page a".to_string()))),
                ("https://b".to_string(), (0, Ok(String::new()))),
                (
                    "https://c".to_string(),
                    (
                        0,
                        Err(FetchError::Network {
                            url: "https://c".to_string(),
                            message: "refused".to_string(),
                        }),
                    ),
                ),
            ]),
            calls: Mutex::new(Vec::new()),
        };
        let fetcher = Arc::new(fetcher);
        let searcher = WebSearcher::new(Arc::new(engine), fetcher.clone(), &config());

        let queries = [
            SearchQuery::new("q1"),
            SearchQuery::new("broken"),
            SearchQuery::new("q2"),
        ];
        let evidence = searcher.search(&queries).await;

        let urls: Vec<&str> = evidence.iter().map(|e| e.url.as_str()).collect();
        assert_eq!(urls, vec!["https://a", "https://b"]);
        assert_eq!(evidence[0].text, "page a");
        assert_eq!(evidence[1].text, "b snippet");

        let calls = fetcher.calls.lock().map(|c| c.len()).unwrap_or_default();
        assert_eq!(calls, 3, "duplicate URL fetched once");
    }

    #[tokio::test]
    async fn test_slow_fetch_times_out() {
        let engine = FixedEngine {
            results: HashMap::from([(
                "q".to_string(),
                vec![result("https://slow", "snippet"), result("https://fast", "")],
            )]),
        };
        let fetcher = DelayFetcher {
            pages: HashMap::from([
                ("https://slow".to_string(), (5_000, Ok("late".to_string()))),
                ("https://fast".to_string(), (0, Ok("x".repeat(80)))),
            ]),
            calls: Mutex::new(Vec::new()),
        };
        let searcher = WebSearcher::new(Arc::new(engine), Arc::new(fetcher), &config());

        let evidence = searcher.search(&[SearchQuery::new("q")]).await;
        assert_eq!(evidence.len(), 1);
        assert_eq!(evidence[0].url, "https://fast");
        assert_eq!(evidence[0].text, format!("{}...", "x".repeat(50)));
    }

    #[tokio::test]
    async fn test_empty_queries() {
        let engine = FixedEngine {
            results: HashMap::new(),
        };
        let fetcher = DelayFetcher {
            pages: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        };
        let searcher = WebSearcher::new(Arc::new(engine), Arc::new(fetcher), &config());
        assert!(searcher.search(&[]).await.is_empty());
    }
}
