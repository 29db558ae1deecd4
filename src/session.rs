use std::{
    ffi::OsStr,
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};

use anyhow::{anyhow, Context, Result};
use headless_chrome::{Browser, Element, LaunchOptionsBuilder, Tab};
use serde::Serialize;
use tracing::{debug, error, info};

use crate::{
    collector::{collect, CollectStats, CollectorLimits, Listing, StopReason},
    config::{BrowserConfig, RunConfig},
    extract::{RecordContext, ReviewCard},
    sink::CsvSink,
};

pub const CARD_SELECTOR: &str = ".apphub_Card";

const SCROLL_TO_BOTTOM: &str = "window.scrollTo(0, document.body.scrollHeight);";
const COUNT_CARDS: &str = "document.querySelectorAll('.apphub_Card').length";

// Chrome drops the connection after this long without protocol traffic.
const IDLE_BROWSER_TIMEOUT: Duration = Duration::from_secs(300);

/// The first review card never showed up.
#[derive(Debug)]
pub struct ListingTimeout {
    pub waited: Duration,
}

impl fmt::Display for ListingTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "review listing did not load within {}s, check the network connection and the app id",
            self.waited.as_secs()
        )
    }
}

/// A Chrome process with one tab. Dropping it closes the tab and kills the
/// browser.
pub struct ChromeSession {
    browser: Browser,
    tab: Arc<Tab>,
}

impl ChromeSession {
    pub fn launch(cfg: &BrowserConfig) -> Result<Self> {
        std::fs::create_dir_all(&cfg.user_data_dir).with_context(|| {
            format!("cannot create profile dir {}", cfg.user_data_dir.display())
        })?;

        let mut args: Vec<&OsStr> = vec![
            OsStr::new("--disable-gpu"),
            OsStr::new("--disable-extensions"),
            OsStr::new("--blink-settings=imagesEnabled=false"),
            OsStr::new("--disable-dev-shm-usage"),
            OsStr::new("--no-first-run"),
            OsStr::new("--no-default-browser-check"),
        ];
        if !cfg.headful {
            args.push(OsStr::new("--headless=new"));
        }

        let launch_opts = LaunchOptionsBuilder::default()
            .headless(!cfg.headful)
            .window_size(Some(cfg.window))
            .path(cfg.chrome_path.clone())
            .user_data_dir(Some(cfg.user_data_dir.clone()))
            .idle_browser_timeout(IDLE_BROWSER_TIMEOUT)
            .args(args)
            .build()
            .map_err(|e| anyhow!("invalid Chrome launch options: {}", e))?;

        let browser = Browser::new(launch_opts).context("cannot launch Chrome")?;
        let tab = browser.new_tab()?;
        tab.set_user_agent(&ua_generator::ua::spoof_ua(), cfg.locale.as_deref(), None)?;
        info!(pid = ?browser.get_process_id(), "browser session started");

        Ok(Self { browser, tab })
    }

    /// Navigates to `url` and waits up to `wait` for the first review card.
    /// A page load that outlasts `wait` counts as a listing timeout too.
    pub fn open(&self, url: &str, wait: Duration) -> Result<()> {
        self.tab.set_default_timeout(wait);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("navigation to {} failed", url))?
            .wait_until_navigated()
            .context(ListingTimeout { waited: wait })?;
        self.tab
            .wait_for_element_with_custom_timeout(CARD_SELECTOR, wait)
            .context(ListingTimeout { waited: wait })?;
        Ok(())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            debug!(error = %e, "tab did not close cleanly");
        }
        info!(pid = ?self.browser.get_process_id(), "browser session closed");
    }
}

pub struct ChromeCard<'a>(Element<'a>);

impl ReviewCard for ChromeCard<'_> {
    fn text(&self, selector: &str) -> Result<String> {
        Ok(self.0.find_element(selector)?.get_inner_text()?)
    }

    fn wait_text(&self, selector: &str, timeout: Duration) -> Result<String> {
        Ok(self
            .0
            .wait_for_element_with_custom_timeout(selector, timeout)?
            .get_inner_text()?)
    }
}

impl Listing for ChromeSession {
    type Card<'a>
        = ChromeCard<'a>
    where
        Self: 'a;

    fn cards(&self) -> Result<Vec<ChromeCard<'_>>> {
        // find_elements errors on an empty match, so count first.
        let count = self
            .tab
            .evaluate(COUNT_CARDS, false)?
            .value
            .and_then(|v| v.as_u64())
            .unwrap_or(0);
        if count == 0 {
            return Ok(Vec::new());
        }
        let cards = self.tab.find_elements(CARD_SELECTOR)?;
        Ok(cards.into_iter().map(ChromeCard).collect())
    }

    fn load_more(&self) -> Result<()> {
        self.tab.evaluate(SCROLL_TO_BOTTOM, false)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// The configured number of reviews became visible.
    Completed,
    /// The listing stopped growing.
    Stalled,
    /// The listing never loaded.
    Timeout,
    Failed,
}

impl RunStatus {
    /// Status of a run that ended with `err`.
    pub fn of_error(err: &anyhow::Error) -> Self {
        if err.downcast_ref::<ListingTimeout>().is_some() {
            RunStatus::Timeout
        } else {
            RunStatus::Failed
        }
    }

    pub fn exit_code(self) -> u8 {
        match self {
            RunStatus::Completed | RunStatus::Stalled => 0,
            RunStatus::Failed => 1,
            RunStatus::Timeout => 2,
        }
    }
}

impl From<StopReason> for RunStatus {
    fn from(reason: StopReason) -> Self {
        match reason {
            StopReason::MaxReviews => RunStatus::Completed,
            StopReason::Stalled => RunStatus::Stalled,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RunReport {
    pub status: RunStatus,
    pub url: String,
    pub output: String,
    pub reviews_visible: usize,
    pub reviews_saved: usize,
    pub reviews_skipped: usize,
    pub cycles: u32,
    pub error: Option<String>,
    pub elapsed_ms: u64,
}

/// Runs one scrape end to end. Errors are logged and folded into the report;
/// the browser is gone by the time this returns.
pub fn run(cfg: &RunConfig) -> RunReport {
    let start = Instant::now();
    let mut stats = CollectStats::default();

    let (status, error) = match scrape(cfg, &mut stats) {
        Ok(reason) => (RunStatus::from(reason), None),
        Err(e) => {
            let status = RunStatus::of_error(&e);
            let message = format!("{:#}", e);
            error!(?status, error = %message, "scrape aborted");
            (status, Some(message))
        }
    };

    let output = dunce::canonicalize(&cfg.output).unwrap_or_else(|_| cfg.output.clone());
    info!(
        saved = stats.saved,
        skipped = stats.skipped,
        output = %output.display(),
        "saved {} reviews",
        stats.saved
    );

    RunReport {
        status,
        url: cfg
            .listing_url()
            .map(|u| u.to_string())
            .unwrap_or_default(),
        output: output.display().to_string(),
        reviews_visible: stats.visible,
        reviews_saved: stats.saved,
        reviews_skipped: stats.skipped,
        cycles: stats.cycles,
        error,
        elapsed_ms: start.elapsed().as_millis() as u64,
    }
}

fn scrape(cfg: &RunConfig, stats: &mut CollectStats) -> Result<StopReason> {
    let url = cfg.listing_url()?;
    let sink = CsvSink::create(&cfg.output)?;

    let session = ChromeSession::launch(&cfg.browser)?;
    info!(%url, "opening negative review listing");
    session.open(url.as_str(), cfg.listing_wait)?;

    let ctx = RecordContext {
        game_name: cfg.game_name.clone(),
        region: cfg.region.clone(),
        fallback_year: cfg.fallback_year,
    };
    let limits = CollectorLimits {
        max_reviews: cfg.max_reviews,
        stall_limit: cfg.stall_limit,
        settle: cfg.settle,
        field_wait: cfg.field_wait,
    };
    info!("loading more reviews");
    collect(&session, &sink, &ctx, &limits, stats)
}
