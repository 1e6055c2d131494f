//! Web search: engine and page-fetcher seams plus the concurrent searcher.

pub mod engine;
pub mod fetcher;
pub mod searcher;

pub use engine::{DUCKDUCKGO_ENDPOINT, DuckDuckGoEngine, SearchEngine};
pub use fetcher::{HttpPageFetcher, PageFetcher};
pub use searcher::WebSearcher;
