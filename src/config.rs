use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::export::{default_output_name, OutputFormat};
use crate::request::FetchConfig;
use crate::retry::{RetryPolicy, DEFAULT_MAX_ATTEMPTS};
use crate::throttle::PageDelay;
use crate::{DEFAULT_BASE_URL, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT};

/// Scrape contract listings from the procurement registry and save them as JSON or CSV.
#[derive(Debug, Clone, Parser)]
#[command(version, about)]
pub struct Config {
    /// Number of result pages to scrape, starting from page 1.
    #[arg(short, long, env = "ZAKUPKI_PAGES", default_value_t = 1,
          value_parser = clap::value_parser!(u32).range(1..=100))]
    pub pages: u32,

    #[arg(short, long, env = "ZAKUPKI_FORMAT", value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,

    /// Output file name without extension. Defaults to `contracts_<timestamp>`.
    #[arg(short, long, env = "ZAKUPKI_OUTPUT_NAME")]
    pub output_name: Option<String>,

    #[arg(short = 'd', long, env = "ZAKUPKI_OUTPUT_DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Search results endpoint, `page=<n>` is appended to its query.
    #[arg(long, env = "ZAKUPKI_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: Url,

    /// Relative links in the listing are resolved against this URL.
    #[arg(long, env = "ZAKUPKI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: Url,

    #[arg(long, env = "ZAKUPKI_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub user_agent: String,

    /// Pause after every page, in milliseconds.
    #[arg(long, env = "ZAKUPKI_DELAY_MS", default_value_t = 1000)]
    pub delay_ms: u64,

    /// Double the pause after failed pages, up to `--max-delay-ms`.
    #[arg(long, env = "ZAKUPKI_ADAPTIVE_DELAY")]
    pub adaptive_delay: bool,

    #[arg(long, env = "ZAKUPKI_MAX_DELAY_MS", default_value_t = 30_000)]
    pub max_delay_ms: u64,

    /// Attempts per page, 1 disables retries.
    #[arg(long, env = "ZAKUPKI_ATTEMPTS", default_value_t = DEFAULT_MAX_ATTEMPTS)]
    pub attempts: u32,

    /// Base backoff between attempts, in milliseconds.
    #[arg(long, env = "ZAKUPKI_BACKOFF_MS", default_value_t = 1000)]
    pub backoff_ms: u64,

    #[arg(long, env = "ZAKUPKI_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,
}

impl Config {
    pub fn fetch_config(&self) -> FetchConfig {
        FetchConfig {
            endpoint: self.endpoint.clone(),
            user_agent: self.user_agent.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        let base = Duration::from_millis(self.backoff_ms);
        RetryPolicy::new(self.attempts, base, base.saturating_mul(32))
    }

    pub fn page_delay(&self) -> PageDelay {
        let base = Duration::from_millis(self.delay_ms);
        if self.adaptive_delay {
            PageDelay::adaptive(base, Duration::from_millis(self.max_delay_ms))
        } else {
            PageDelay::Fixed(base)
        }
    }

    pub fn output_name(&self) -> String {
        self.output_name.clone().unwrap_or_else(default_output_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::FailureType;

    #[test]
    fn defaults_match_the_registry() {
        let config = Config::parse_from(["zakupki-scrap"]);
        assert_eq!(config.pages, 1);
        assert_eq!(config.format, OutputFormat::Json);
        assert_eq!(config.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.page_delay(), PageDelay::Fixed(Duration::from_secs(1)));
        assert_eq!(config.retry_policy().max_attempts(), DEFAULT_MAX_ATTEMPTS);
        assert!(config.output_name().starts_with("contracts_"));
    }

    #[test]
    fn page_count_is_bounded() {
        assert!(Config::try_parse_from(["zakupki-scrap", "--pages", "0"]).is_err());
        assert!(Config::try_parse_from(["zakupki-scrap", "--pages", "101"]).is_err());

        let config =
            Config::try_parse_from(["zakupki-scrap", "-p", "3", "-f", "csv", "-o", "run"]).unwrap();
        assert_eq!(config.pages, 3);
        assert_eq!(config.format, OutputFormat::Csv);
        assert_eq!(config.output_name(), "run");
    }

    #[test]
    fn huge_delays_saturate() {
        let max = u64::MAX.to_string();
        let config = Config::parse_from([
            "zakupki-scrap",
            "--backoff-ms",
            max.as_str(),
            "--max-delay-ms",
            max.as_str(),
            "--adaptive-delay",
        ]);

        let policy = config.retry_policy().without_jitter();
        let backoff = policy.next_delay(FailureType::Transient, 2).unwrap();
        assert!(backoff >= Duration::from_millis(u64::MAX));

        let mut delay = config.page_delay();
        assert_eq!(delay.after_page(false), Duration::from_millis(u64::MAX));
    }
}
