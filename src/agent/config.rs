//! Agent configuration with builder pattern and environment variable support.
//!
//! Configuration is resolved in order: explicit values → environment variables → defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AgentError;

/// Default provider name (any OpenAI-compatible endpoint).
pub const DEFAULT_PROVIDER: &str = "openai";
/// Default completion endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1";
/// Default completion model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 0.5;
/// Default completion token limit.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;
/// Default search retry budget.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default results fetched per search query.
pub const DEFAULT_RESULTS_PER_QUERY: usize = 2;
/// Default per-request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
/// Default maximum characters kept per page.
pub const DEFAULT_MAX_CONTENT_LENGTH: usize = 2048;
/// Default provider attempts for query generation.
pub const DEFAULT_GENERATION_ATTEMPTS: u32 = 3;
/// Default number of candidates for complex queries.
pub const DEFAULT_CANDIDATE_COUNT: usize = 3;
/// Default length at which a query counts as complex.
pub const DEFAULT_COMPLEX_QUERY_CHARS: usize = 200;
/// Default consecutive no-progress rounds before the loop stops.
pub const DEFAULT_STAGNATION_LIMIT: u32 = 3;
/// Default maximum concurrent searches and fetches.
pub const DEFAULT_MAX_CONCURRENCY: usize = 8;
/// Default deadline for one HTTP request, in seconds.
pub const DEFAULT_REQUEST_DEADLINE_SECS: u64 = 120;

/// Configuration for the agent system.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    /// LLM provider name (e.g., "openai").
    pub provider: String,
    /// API key for the provider.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Completion model.
    pub model: String,
    /// Sampling temperature for answer synthesis.
    pub temperature: f32,
    /// Maximum tokens per completion.
    pub max_tokens: u32,
    /// Default retry budget for the refinement loop.
    pub max_retries: u32,
    /// Search results fetched per generated query.
    pub search_results_per_query: usize,
    /// Timeout applied to each provider call, search and page fetch.
    pub request_timeout: Duration,
    /// Maximum characters of page text kept per evidence entry.
    pub max_content_length: usize,
    /// Provider attempts before query generation falls back to the raw query.
    pub query_generation_attempts: u32,
    /// Candidates generated for complex search queries.
    pub candidate_count: usize,
    /// Query length (in characters) at which a query counts as complex.
    pub complex_query_chars: usize,
    /// Consecutive rounds without new sources before the loop stops.
    pub stagnation_limit: u32,
    /// Maximum concurrent searches and fetches.
    pub max_concurrency: usize,
    /// Whether text-classified queries are answered without searching.
    ///
    /// When `false`, every non-math query goes through the search route.
    pub direct_answers: bool,
    /// Use the strict evidence-evaluation prompt.
    pub strict_evaluation: bool,
    /// Verbose output: CLI answers carry a round and source summary.
    pub debug: bool,
    /// Directory containing prompt template files.
    ///
    /// When set, system prompts are loaded from markdown files in this
    /// directory, falling back to compiled-in defaults for any missing files.
    pub prompt_dir: Option<PathBuf>,
    /// Deadline for a single HTTP `/ask` request.
    pub request_deadline: Duration,
}

impl AgentConfig {
    /// Creates a new builder for `AgentConfig`.
    #[must_use]
    pub fn builder() -> AgentConfigBuilder {
        AgentConfigBuilder::default()
    }

    /// Creates configuration from environment variables with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key is found.
    pub fn from_env() -> Result<Self, AgentError> {
        Self::builder().from_env().build()
    }
}

/// Builder for [`AgentConfig`].
#[derive(Debug, Clone, Default)]
pub struct AgentConfigBuilder {
    provider: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    max_retries: Option<u32>,
    search_results_per_query: Option<usize>,
    request_timeout: Option<Duration>,
    max_content_length: Option<usize>,
    query_generation_attempts: Option<u32>,
    candidate_count: Option<usize>,
    complex_query_chars: Option<usize>,
    stagnation_limit: Option<u32>,
    max_concurrency: Option<usize>,
    direct_answers: Option<bool>,
    strict_evaluation: Option<bool>,
    debug: Option<bool>,
    prompt_dir: Option<PathBuf>,
    request_deadline: Option<Duration>,
}

impl AgentConfigBuilder {
    /// Populates unset fields from environment variables.
    #[must_use]
    pub fn from_env(self) -> Self {
        self.from_lookup(|key| std::env::var(key).ok())
    }

    /// Populates unset fields from an arbitrary variable source.
    ///
    /// Values that fail to parse are ignored.
    #[must_use]
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let secs = |key: &str| lookup(key).and_then(|v| parse_secs(&v));

        if self.provider.is_none() {
            self.provider = lookup("ASKWEB_PROVIDER");
        }
        if self.api_key.is_none() {
            self.api_key = lookup("GROQ_API_KEY")
                .or_else(|| lookup("GROQ_API"))
                .filter(|k| !k.trim().is_empty());
        }
        if self.base_url.is_none() {
            self.base_url = lookup("GROQ_BASE_URL");
        }
        if self.model.is_none() {
            self.model = lookup("GROQ_MODEL");
        }
        if self.temperature.is_none() {
            self.temperature = parse_var(&lookup, "GROQ_TEMPERATURE");
        }
        if self.max_tokens.is_none() {
            self.max_tokens = parse_var(&lookup, "GROQ_MAX_TOKENS");
        }
        if self.max_retries.is_none() {
            self.max_retries = parse_var(&lookup, "MAX_RETRIES");
        }
        if self.search_results_per_query.is_none() {
            self.search_results_per_query = parse_var(&lookup, "SEARCH_RESULTS_PER_QUERY");
        }
        if self.request_timeout.is_none() {
            self.request_timeout = secs("REQUEST_TIMEOUT");
        }
        if self.max_content_length.is_none() {
            self.max_content_length = parse_var(&lookup, "MAX_CONTENT_LENGTH");
        }
        if self.query_generation_attempts.is_none() {
            self.query_generation_attempts = parse_var(&lookup, "QUERY_GENERATION_ATTEMPTS");
        }
        if self.candidate_count.is_none() {
            self.candidate_count = parse_var(&lookup, "ASKWEB_CANDIDATES");
        }
        if self.complex_query_chars.is_none() {
            self.complex_query_chars = parse_var(&lookup, "ASKWEB_COMPLEX_QUERY_CHARS");
        }
        if self.max_concurrency.is_none() {
            self.max_concurrency = parse_var(&lookup, "ASKWEB_MAX_CONCURRENCY");
        }
        if self.debug.is_none() {
            self.debug = lookup("DEBUG_MODE").and_then(|v| parse_bool(&v));
        }
        if self.prompt_dir.is_none() {
            self.prompt_dir = lookup("ASKWEB_PROMPT_DIR").map(PathBuf::from);
        }
        if self.request_deadline.is_none() {
            self.request_deadline = secs("ASKWEB_REQUEST_DEADLINE");
        }
        self
    }

    /// Sets the LLM provider name.
    #[must_use]
    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    /// Sets the API key.
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the completion model.
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the completion token limit.
    #[must_use]
    pub const fn max_tokens(mut self, n: u32) -> Self {
        self.max_tokens = Some(n);
        self
    }

    /// Sets the default retry budget.
    #[must_use]
    pub const fn max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }

    /// Sets the number of results fetched per search query.
    #[must_use]
    pub const fn search_results_per_query(mut self, n: usize) -> Self {
        self.search_results_per_query = Some(n);
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub const fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Sets the maximum characters kept per page.
    #[must_use]
    pub const fn max_content_length(mut self, n: usize) -> Self {
        self.max_content_length = Some(n);
        self
    }

    /// Sets the provider attempts for query generation.
    #[must_use]
    pub const fn query_generation_attempts(mut self, n: u32) -> Self {
        self.query_generation_attempts = Some(n);
        self
    }

    /// Sets the number of candidates for complex queries.
    #[must_use]
    pub const fn candidate_count(mut self, n: usize) -> Self {
        self.candidate_count = Some(n);
        self
    }

    /// Sets the complex-query length threshold.
    #[must_use]
    pub const fn complex_query_chars(mut self, n: usize) -> Self {
        self.complex_query_chars = Some(n);
        self
    }

    /// Sets the stagnation limit.
    #[must_use]
    pub const fn stagnation_limit(mut self, n: u32) -> Self {
        self.stagnation_limit = Some(n);
        self
    }

    /// Sets the maximum concurrency.
    #[must_use]
    pub const fn max_concurrency(mut self, n: usize) -> Self {
        self.max_concurrency = Some(n);
        self
    }

    /// Enables or disables direct (non-searched) text answers.
    #[must_use]
    pub const fn direct_answers(mut self, enabled: bool) -> Self {
        self.direct_answers = Some(enabled);
        self
    }

    /// Selects the strict evaluation prompt.
    #[must_use]
    pub const fn strict_evaluation(mut self, strict: bool) -> Self {
        self.strict_evaluation = Some(strict);
        self
    }

    /// Enables debug mode.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = Some(debug);
        self
    }

    /// Sets the prompt template directory.
    #[must_use]
    pub fn prompt_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.prompt_dir = Some(dir.into());
        self
    }

    /// Sets the HTTP request deadline.
    #[must_use]
    pub const fn request_deadline(mut self, deadline: Duration) -> Self {
        self.request_deadline = Some(deadline);
        self
    }

    /// Builds the [`AgentConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::ApiKeyMissing`] if no API key was set.
    pub fn build(self) -> Result<AgentConfig, AgentError> {
        let api_key = self
            .api_key
            .filter(|k| !k.trim().is_empty())
            .ok_or(AgentError::ApiKeyMissing)?;

        Ok(AgentConfig {
            provider: self
                .provider
                .unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            api_key,
            base_url: self
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            model: self.model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            max_tokens: self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            search_results_per_query: self
                .search_results_per_query
                .unwrap_or(DEFAULT_RESULTS_PER_QUERY),
            request_timeout: self
                .request_timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            max_content_length: self
                .max_content_length
                .unwrap_or(DEFAULT_MAX_CONTENT_LENGTH),
            query_generation_attempts: self
                .query_generation_attempts
                .unwrap_or(DEFAULT_GENERATION_ATTEMPTS),
            candidate_count: self.candidate_count.unwrap_or(DEFAULT_CANDIDATE_COUNT),
            complex_query_chars: self
                .complex_query_chars
                .unwrap_or(DEFAULT_COMPLEX_QUERY_CHARS),
            stagnation_limit: self.stagnation_limit.unwrap_or(DEFAULT_STAGNATION_LIMIT),
            max_concurrency: self
                .max_concurrency
                .unwrap_or(DEFAULT_MAX_CONCURRENCY)
                .max(1),
            direct_answers: self.direct_answers.unwrap_or(true),
            strict_evaluation: self.strict_evaluation.unwrap_or(false),
            debug: self.debug.unwrap_or(false),
            prompt_dir: self.prompt_dir,
            request_deadline: self
                .request_deadline
                .unwrap_or(Duration::from_secs(DEFAULT_REQUEST_DEADLINE_SECS)),
        })
    }
}

/// Reads `key` and parses it as `T`, ignoring unparseable values.
fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Parses a boolean flag value (`true`/`1`/`yes`/`on` and their negatives).
fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Parses a duration given in (possibly fractional) seconds.
fn parse_secs(value: &str) -> Option<Duration> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite() && *s > 0.0)
        .map(Duration::from_secs_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_builder_defaults() {
        let config = AgentConfig::builder()
            .api_key("test-key")
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, DEFAULT_PROVIDER);
        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.search_results_per_query, 2);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.max_content_length, 2048);
        assert_eq!(config.query_generation_attempts, 3);
        assert!(config.direct_answers);
        assert!(!config.strict_evaluation);
    }

    #[test]
    fn test_builder_missing_api_key() {
        let result = AgentConfig::builder().build();
        assert_eq!(result.err(), Some(AgentError::ApiKeyMissing));

        let result = AgentConfig::builder().api_key("   ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_custom_values() {
        let config = AgentConfig::builder()
            .api_key("key")
            .provider("custom")
            .model("mixtral-8x7b")
            .max_concurrency(0)
            .max_retries(5)
            .request_timeout(Duration::from_secs(30))
            .strict_evaluation(true)
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.provider, "custom");
        assert_eq!(config.model, "mixtral-8x7b");
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.strict_evaluation);
    }

    #[test]
    fn test_lookup_fills_unset_fields() {
        let config = AgentConfig::builder()
            .max_retries(7)
            .from_lookup(lookup(&[
                ("GROQ_API", "env-key"),
                ("MAX_RETRIES", "1"),
                ("SEARCH_RESULTS_PER_QUERY", "4"),
                ("REQUEST_TIMEOUT", "2.5"),
                ("GROQ_TEMPERATURE", "0.2"),
                ("DEBUG_MODE", "True"),
                ("ASKWEB_REQUEST_DEADLINE", "30"),
            ]))
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.api_key, "env-key");
        assert_eq!(config.max_retries, 7);
        assert_eq!(config.search_results_per_query, 4);
        assert_eq!(config.request_timeout, Duration::from_millis(2500));
        assert!((config.temperature - 0.2).abs() < f32::EPSILON);
        assert!(config.debug);
        assert_eq!(config.request_deadline, Duration::from_secs(30));
    }

    #[test]
    fn test_lookup_parses_numeric_settings() {
        let config = AgentConfig::builder()
            .from_lookup(lookup(&[
                ("GROQ_API_KEY", "k"),
                ("GROQ_TEMPERATURE", "0.9"),
                ("GROQ_MAX_TOKENS", "512"),
                ("MAX_RETRIES", " 4 "),
                ("SEARCH_RESULTS_PER_QUERY", "5"),
                ("MAX_CONTENT_LENGTH", "900"),
                ("QUERY_GENERATION_ATTEMPTS", "2"),
                ("ASKWEB_CANDIDATES", "4"),
                ("ASKWEB_COMPLEX_QUERY_CHARS", "150"),
                ("ASKWEB_MAX_CONCURRENCY", "3"),
            ]))
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert!((config.temperature - 0.9).abs() < f32::EPSILON);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.max_retries, 4);
        assert_eq!(config.search_results_per_query, 5);
        assert_eq!(config.max_content_length, 900);
        assert_eq!(config.query_generation_attempts, 2);
        assert_eq!(config.candidate_count, 4);
        assert_eq!(config.complex_query_chars, 150);
        assert_eq!(config.max_concurrency, 3);
    }

    #[test]
    fn test_lookup_prefers_primary_key_and_ignores_garbage() {
        let config = AgentConfig::builder()
            .from_lookup(lookup(&[
                ("GROQ_API_KEY", "primary"),
                ("GROQ_API", "alias"),
                ("MAX_RETRIES", "lots"),
                ("REQUEST_TIMEOUT", "-3"),
            ]))
            .build()
            .unwrap_or_else(|_| unreachable!());
        assert_eq!(config.api_key, "primary");
        assert_eq!(config.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(
            config.request_timeout,
            Duration::from_secs(DEFAULT_TIMEOUT_SECS)
        );
    }
}
