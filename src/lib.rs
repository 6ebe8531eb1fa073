//! ZAKUPKI CONTRACT SCRAPER
//! Walks the contract search results of the public procurement registry page by page,
//! pulls a [`Contract`] out of every listing block and saves the lot as JSON or CSV.

mod error;
mod macros;

pub mod config;
pub mod export;
pub mod model;
pub mod parse;
pub mod process;
pub mod request;
pub mod retry;
pub mod sink;
pub mod throttle;

pub use config::Config;
pub use error::{Error, Result};
pub use export::{export, OutputFormat};
pub use model::Contract;
pub use parse::{ContractExtractor, DateGroupAnomaly};
pub use process::{process_site, CrawlProgress, CrawlState, Crawler, RunSummary};
pub use request::{Fetch, FetchConfig, PageFetcher};
pub use retry::{RetryPolicy, Retrying};
pub use sink::{ConsoleSink, Level, LogEvent, LogSink, MemorySink, TracingSink};
pub use throttle::PageDelay;

pub const DEFAULT_ENDPOINT: &str = "https://zakupki.gov.ru/epz/contract/search/results.html";
pub const DEFAULT_BASE_URL: &str = "https://zakupki.gov.ru";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
/// The registry shows 10 entries per page by default.
const EXPECTED_CONTRACTS_PER_PAGE: usize = 10;
