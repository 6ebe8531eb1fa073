use std::process::ExitCode;

use chrono::Local;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use zakupki_scrap::{info_time, process::process_site, Config, ConsoleSink};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let start_time = Local::now();
    let config = Config::parse();

    match process_site(&config, ConsoleSink).await {
        Ok(summary) => {
            println!(
                "Scraping finished! Collected {} contracts into {}",
                summary.records,
                summary.path.display()
            );
            info_time!(start_time, "Full program time:");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
