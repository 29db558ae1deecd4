use anyhow::{Context, Result};
use chrono::Datelike;
use clap::Parser;
use serde::Serialize;
use std::{path::PathBuf, process::ExitCode, time::Duration};
use tracing_subscriber::EnvFilter;

use reviewbot::config::{default_output_path, parse_window, profile_dir};
use reviewbot::{BrowserConfig, RunConfig};

#[derive(Parser, Debug)]
#[command(version, about = "Scrape the negative reviews of a Steam game into CSV")]
struct Cli {
    /// Steam app id of the game
    #[arg(long, default_value_t = 1180320)]
    app_id: u32,
    /// Game name written into every row
    #[arg(long, default_value = "三国杀")]
    game_name: String,
    /// Region label written into every row
    #[arg(long, default_value = "中国")]
    region: String,
    /// Review language filter of the listing
    #[arg(long, default_value = "schinese")]
    language: String,
    /// Stop once this many reviews are loaded
    #[arg(long, default_value_t = 50000, value_parser = clap::value_parser!(u64).range(1..))]
    max_reviews: u64,
    /// Stop after this many scrolls in a row load nothing new
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..))]
    stall_limit: u32,
    /// Milliseconds to let the page settle after each scroll
    #[arg(long, default_value_t = 2000)]
    settle_ms: u64,
    /// Milliseconds to wait for the first review card
    #[arg(long, default_value_t = 20000)]
    listing_wait_ms: u64,
    /// Milliseconds to wait for each field of a review card
    #[arg(long, default_value_t = 5000)]
    field_wait_ms: u64,
    /// Year assumed for dates without one (defaults to the current year)
    #[arg(long)]
    fallback_year: Option<i32>,
    /// CSV output (defaults to steam_reviews_<app id>_<date>.csv)
    #[arg(long)]
    output: Option<PathBuf>,
    /// Chrome binary to launch
    #[arg(long)]
    chrome: Option<PathBuf>,
    /// Run Chrome in headful mode
    #[arg(long)]
    headful: bool,
    /// Browser window size
    #[arg(long, default_value = "1920x1080", value_parser = parse_window)]
    window: (u32, u32),
    /// Named Chrome profile for persistent sessions
    #[arg(long, default_value = "default")]
    profile: String,
    /// Override the Chrome user-data-dir
    #[arg(long)]
    user_data_dir: Option<PathBuf>,
    /// Locale / Accept-Language override
    #[arg(long, default_value = "zh-CN")]
    locale: String,
}

impl Cli {
    fn into_config(self) -> Result<RunConfig> {
        let today = chrono::Local::now().date_naive();
        Ok(RunConfig {
            app_id: self.app_id,
            game_name: self.game_name,
            region: self.region,
            language: self.language,
            max_reviews: usize::try_from(self.max_reviews).context("--max-reviews is too large")?,
            stall_limit: self.stall_limit,
            settle: Duration::from_millis(self.settle_ms),
            listing_wait: Duration::from_millis(self.listing_wait_ms),
            field_wait: Duration::from_millis(self.field_wait_ms),
            fallback_year: self.fallback_year.unwrap_or_else(|| today.year()),
            output: self
                .output
                .unwrap_or_else(|| default_output_path(self.app_id, today)),
            browser: BrowserConfig {
                chrome_path: self.chrome,
                headful: self.headful,
                window: self.window,
                user_data_dir: profile_dir(&self.profile, self.user_data_dir),
                locale: Some(self.locale),
            },
        })
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = Cli::parse().into_config()?;

    // headless_chrome blocks, keep it off the async workers
    let report = tokio::task::spawn_blocking(move || reviewbot::run(&cfg))
        .await
        .context("scrape task panicked")?;

    print_json(&report)?;
    Ok(ExitCode::from(report.status.exit_code()))
}

fn print_json<T: Serialize>(v: T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&v)?);
    Ok(())
}
