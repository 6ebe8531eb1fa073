use std::path::PathBuf;

use chrono::Local;
use tracing::debug;

use crate::config::Config;
use crate::export::{export, OutputFormat};
use crate::model::Contract;
use crate::parse::ContractExtractor;
use crate::request::{Fetch, PageFetcher};
use crate::retry::Retrying;
use crate::sink::LogSink;
use crate::throttle::PageDelay;
use crate::{info_time, Error, Result, EXPECTED_CONTRACTS_PER_PAGE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Idle,
    Running { page: u32 },
    Done,
}

/// Reported after every page, whatever its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlProgress {
    pub page: u32,
    pub total_pages: u32,
    pub records_so_far: usize,
}

impl CrawlProgress {
    pub fn fraction(&self) -> f64 {
        f64::from(self.page) / f64::from(self.total_pages.max(1))
    }
}

type ProgressFn<'a> = Box<dyn FnMut(CrawlProgress) + 'a>;

/// Only the first few pages are reserved up front, `extend` grows the rest.
const MAX_PRESIZED_PAGES: usize = 100;

fn presized_capacity(total_pages: u32) -> usize {
    (total_pages as usize).min(MAX_PRESIZED_PAGES) * EXPECTED_CONTRACTS_PER_PAGE
}

/// Walks result pages one after another, extracting every listing block.
///
/// A page that can't be fetched is logged and contributes nothing, the crawl
/// carries on with the next page.
pub struct Crawler<'a, F, S> {
    fetcher: F,
    extractor: ContractExtractor,
    sink: S,
    delay: PageDelay,
    state: CrawlState,
    on_page: Option<ProgressFn<'a>>,
}

impl<'a, F: Fetch, S: LogSink> Crawler<'a, F, S> {
    pub fn new(fetcher: F, extractor: ContractExtractor, sink: S, delay: PageDelay) -> Self {
        Self {
            fetcher,
            extractor,
            sink,
            delay,
            state: CrawlState::Idle,
            on_page: None,
        }
    }

    pub fn on_page(mut self, f: impl FnMut(CrawlProgress) + 'a) -> Self {
        self.on_page = Some(Box::new(f));
        self
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    /// Crawls pages `1..=total_pages` in order and returns every record found.
    pub async fn run(&mut self, total_pages: u32) -> Vec<Contract> {
        let mut aggregate = Vec::with_capacity(presized_capacity(total_pages));

        for page in 1..=total_pages {
            self.state = CrawlState::Running { page };

            let page_ok = match self.process_page(page).await {
                Some(contracts) => {
                    aggregate.extend(contracts);
                    true
                }
                None => false,
            };

            if let Some(on_page) = self.on_page.as_mut() {
                on_page(CrawlProgress {
                    page,
                    total_pages,
                    records_so_far: aggregate.len(),
                });
            }

            let pause = self.delay.after_page(page_ok);
            debug!(page, pause_ms = pause.as_millis() as u64, "page done");
            tokio::time::sleep(pause).await;
        }

        self.state = CrawlState::Done;
        aggregate
    }

    /// Fetches and parses one page. `None` means the page couldn't be fetched.
    async fn process_page(&self, page: u32) -> Option<Vec<Contract>> {
        self.sink.info(&format!("Requesting page {page}..."));

        let html = match self.fetcher.fetch(page).await {
            Ok(html) => html,
            Err(e) => {
                self.sink.error(&e.to_string());
                self.sink.info(&format!("Finished page {page} without contracts"));
                return None;
            }
        };

        self.sink
            .info(&format!("Received a response, parsing page {page}..."));
        let contracts = self.parse_page(page, &html);
        self.sink.success(&format!(
            "Finished page {page}: {} contract(s)",
            contracts.len()
        ));
        Some(contracts)
    }

    fn parse_page(&self, page: u32, html: &str) -> Vec<Contract> {
        let blocks = self.extractor.split_blocks(html);
        let mut contracts = Vec::with_capacity(blocks.len());

        for (i, block) in blocks.iter().enumerate() {
            let (contract, anomaly) = self.extractor.parse_with_diagnostics(block);
            let n = i + 1;
            if let Some(anomaly) = anomaly {
                self.sink.warning(&format!(
                    "Contract {n} on page {page}: {}",
                    anomaly.describe()
                ));
            }
            self.sink
                .info(&format!("Processed contract {n} on page {page}"));
            contracts.push(contract);
        }
        contracts
    }
}

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub records: usize,
    pub format: OutputFormat,
    pub path: PathBuf,
}

/// Crawls the configured page range and exports everything that was collected.
///
/// A run that collects nothing at all is an error and writes no file.
pub async fn process_site<S: LogSink>(config: &Config, sink: S) -> Result<RunSummary> {
    let start_time = Local::now();
    info_time!("Started scraping {} page(s)", config.pages);

    let fetcher = Retrying::new(
        PageFetcher::new(&config.fetch_config())?,
        config.retry_policy(),
    );
    let extractor = ContractExtractor::new(config.base_url.clone())?;
    let mut crawler =
        Crawler::new(fetcher, extractor, &sink, config.page_delay()).on_page(|p| {
            sink.info(&format!(
                "Page {} of {} done ({:.0}%), {} contract(s) so far",
                p.page,
                p.total_pages,
                p.fraction() * 100.0,
                p.records_so_far
            ))
        });
    let contracts = crawler.run(config.pages).await;
    info_time!(start_time, "Collected {} contract(s)", contracts.len());

    if contracts.is_empty() {
        sink.error("No contracts were collected.");
        return Err(Error::NoRecords {
            pages: config.pages,
        });
    }

    finish_export(&contracts, config, &sink)
}

fn finish_export<S: LogSink>(
    contracts: &[Contract],
    config: &Config,
    sink: &S,
) -> Result<RunSummary> {
    let name = config.output_name();
    sink.info(&format!("Saving data as {}...", config.format));

    let path = export(contracts, config.format, &config.output_dir, &name).map_err(|e| {
        sink.error(&format!("Failed to save data: {e}"));
        e
    })?;

    sink.success(&format!("Data saved to {}", path.display()));
    Ok(RunSummary {
        records: contracts.len(),
        format: config.format,
        path,
    })
}
