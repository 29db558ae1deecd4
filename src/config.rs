use std::{path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use url::Url;

const STEAM_COMMUNITY: &str = "https://steamcommunity.com";

/// Everything one scraping run needs. Built once by the binary and passed down.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub app_id: u32,
    pub game_name: String,
    pub region: String,
    /// `filterLanguage` value of the listing.
    pub language: String,
    pub max_reviews: usize,
    pub stall_limit: u32,
    pub settle: Duration,
    pub listing_wait: Duration,
    pub field_wait: Duration,
    /// Year assumed for dates that only carry month and day.
    pub fallback_year: i32,
    pub output: PathBuf,
    pub browser: BrowserConfig,
}

#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Chrome binary; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    pub headful: bool,
    pub window: (u32, u32),
    pub user_data_dir: PathBuf,
    /// Accept-Language sent with the spoofed user agent.
    pub locale: Option<String>,
}

impl RunConfig {
    pub fn listing_url(&self) -> Result<Url> {
        listing_url(self.app_id, &self.language)
    }
}

/// Most recent negative reviews of `app_id`, filtered to one review language.
pub fn listing_url(app_id: u32, language: &str) -> Result<Url> {
    let mut url = Url::parse(STEAM_COMMUNITY)?
        .join(&format!("app/{}/negativereviews/", app_id))
        .with_context(|| format!("cannot build listing url for app {}", app_id))?;
    url.query_pairs_mut()
        .append_pair("browsefilter", "mostrecent")
        .append_pair("snr", "1_5_100010_")
        .append_pair("filterLanguage", language);
    Ok(url)
}

pub fn default_output_path(app_id: u32, date: chrono::NaiveDate) -> PathBuf {
    PathBuf::from(format!(
        "steam_reviews_{}_{}.csv",
        app_id,
        date.format("%Y%m%d")
    ))
}

pub fn profile_dir(profile: &str, override_dir: Option<PathBuf>) -> PathBuf {
    if let Some(p) = override_dir {
        return p;
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".reviewbot")
        .join("profiles")
        .join(profile)
}

/// Parses `WIDTHxHEIGHT`, as accepted by `--window`.
pub fn parse_window(s: &str) -> Result<(u32, u32), String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {:?}", s))?;
    let w = w.trim().parse().map_err(|_| format!("bad width in {:?}", s))?;
    let h = h.trim().parse().map_err(|_| format!("bad height in {:?}", s))?;
    Ok((w, h))
}
