//! Error types for askweb.
//!
//! Errors are split by layer: [`AgentError`] for the completion provider
//! and configuration, [`FetchError`] for page and search-engine retrieval,
//! [`WorkflowError`] for per-query failures the caller must see, and
//! [`CommandError`] for the CLI layer. [`Error`] unifies them.

use std::time::Duration;

use thiserror::Error;

/// Convenience result alias using the crate-level [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Completion provider or configuration failure.
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Workflow failure for a single query.
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// Page or search-engine retrieval failure.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// CLI command failure.
    #[error(transparent)]
    Command(#[from] CommandError),

    /// I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the completion provider and agent configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AgentError {
    /// No API key was configured.
    #[error(
        "API key is missing. Provide it via the GROQ_API_KEY environment variable or the --api-key option"
    )]
    ApiKeyMissing,

    /// The configured provider name is not known.
    #[error("unsupported provider: {name}")]
    UnsupportedProvider {
        /// Provider name that was requested.
        name: String,
    },

    /// The provider rejected the credentials.
    #[error("provider authentication failed: {message}")]
    Authentication {
        /// Provider error message.
        message: String,
    },

    /// The provider is throttling requests.
    #[error("provider rate limit exceeded: {message}")]
    RateLimited {
        /// Provider error message.
        message: String,
    },

    /// The request did not complete in time.
    #[error("provider request timed out: {message}")]
    Timeout {
        /// Transport error message.
        message: String,
    },

    /// Any other API or transport failure.
    #[error("provider request failed: {message}")]
    ApiRequest {
        /// Error message.
        message: String,
        /// HTTP status, when known.
        status: Option<u16>,
    },

    /// The provider answered with nothing usable.
    #[error("{agent} agent returned an empty response")]
    EmptyResponse {
        /// Name of the agent that made the call.
        agent: &'static str,
    },
}

impl AgentError {
    /// Returns `true` for transient failures that may succeed on retry
    /// (timeouts, rate limits, transport errors).
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout { .. } | Self::EmptyResponse { .. } => true,
            Self::ApiRequest { status, .. } => match status {
                Some(code) => *code >= 500,
                None => true,
            },
            Self::ApiKeyMissing | Self::UnsupportedProvider { .. } | Self::Authentication { .. } => {
                false
            }
        }
    }

    /// Returns `true` when the failure is caused by missing or rejected
    /// credentials.
    #[must_use]
    pub const fn is_credential_error(&self) -> bool {
        matches!(self, Self::ApiKeyMissing | Self::Authentication { .. })
    }
}

/// Errors raised while retrieving search results or page content.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The URL could not be used.
    #[error("invalid URL: {url}")]
    InvalidUrl {
        /// Offending URL.
        url: String,
    },

    /// Transport-level failure.
    #[error("network error for {url}: {message}")]
    Network {
        /// Requested URL.
        url: String,
        /// Transport error message.
        message: String,
    },

    /// Non-success HTTP status.
    #[error("HTTP {status} for {url}")]
    Status {
        /// Requested URL.
        url: String,
        /// Response status code.
        status: u16,
    },

    /// The fetch exceeded its timeout.
    #[error("timed out after {timeout:?} fetching {url}")]
    Timeout {
        /// Requested URL.
        url: String,
        /// Timeout that elapsed.
        timeout: Duration,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client: {message}")]
    Client {
        /// Builder error message.
        message: String,
    },
}

/// Errors that end a single workflow invocation.
#[derive(Error, Debug)]
pub enum WorkflowError {
    /// The query text is unusable.
    #[error("invalid query: {message}")]
    InvalidQuery {
        /// Why the query was rejected.
        message: String,
    },

    /// A negative retry budget was supplied.
    #[error("max_retries must be >= 0 (got {value})")]
    InvalidRetryBudget {
        /// Supplied value.
        value: i64,
    },

    /// No answer could be synthesized because the provider failed.
    #[error("unable to synthesize an answer: {source}")]
    Synthesis {
        /// Underlying provider failure.
        #[source]
        source: AgentError,
    },

    /// The request deadline elapsed.
    #[error("query timed out after {after:?}")]
    TimedOut {
        /// Deadline that elapsed.
        after: Duration,
    },

    /// The query was cancelled by the user.
    #[error("query cancelled")]
    Cancelled,
}

/// Errors raised by CLI commands.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Generic command execution failure.
    #[error("{0}")]
    ExecutionFailed(String),

    /// Invalid command arguments.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
