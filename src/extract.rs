use std::{sync::LazyLock, time::Duration};

use anyhow::{Context, Result};
use regex::Regex;
use tracing::debug;

use crate::record::ReviewRecord;

/// Prefix of the "posted on" line inside review bodies and date labels.
pub const POSTED_MARKER: &str = "发布于：";
/// Author written when no name can be read off the card.
pub const ANONYMOUS_AUTHOR: &str = "匿名用户";

pub const AUTHOR_SELECTOR: &str = ".apphub_CardContentAuthorName a:last-child";
pub const AUTHOR_FALLBACK_SELECTOR: &str = ".apphub_CardContentAuthorName";
pub const BODY_SELECTOR: &str = ".apphub_CardTextContent";
pub const LABEL_SELECTOR: &str = ".title";
pub const DATE_SELECTOR: &str = ".date_posted";
pub const HOURS_SELECTOR: &str = ".hours";

static FULL_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{4})\s*年\s*(\d{1,2})\s*月\s*(\d{1,2})\s*日").expect("valid full date regex")
});

static MONTH_DAY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2})\s*月\s*(\d{1,2})\s*日").expect("valid month-day regex")
});

// ASCII and fullwidth digits only; other scripts do not map onto f64 input.
static NUMERAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9０-９]+\.?[0-9０-９]*)").expect("valid numeral regex")
});

/// A rendered review card that can be queried by CSS selector.
pub trait ReviewCard {
    /// Inner text of the first descendant matching `selector`.
    fn text(&self, selector: &str) -> Result<String>;

    /// Like [`ReviewCard::text`], but polls for up to `timeout` before giving up.
    fn wait_text(&self, selector: &str, timeout: Duration) -> Result<String>;
}

impl<T: ReviewCard + ?Sized> ReviewCard for &T {
    fn text(&self, selector: &str) -> Result<String> {
        (**self).text(selector)
    }

    fn wait_text(&self, selector: &str, timeout: Duration) -> Result<String> {
        (**self).wait_text(selector, timeout)
    }
}

/// Values shared by every record of a run.
#[derive(Debug, Clone)]
pub struct RecordContext {
    pub game_name: String,
    pub region: String,
    pub fallback_year: i32,
}

/// Reads one card into a record.
///
/// The author falls back to [`ANONYMOUS_AUTHOR`]; every other field must show
/// up within `field_wait`, otherwise the whole card is rejected.
pub fn extract_review<C: ReviewCard + ?Sized>(
    card: &C,
    ctx: &RecordContext,
    field_wait: Duration,
) -> Result<ReviewRecord> {
    let author = extract_author(card);

    let body = card
        .wait_text(BODY_SELECTOR, field_wait)
        .context("review body")?;
    let recommended = card
        .wait_text(LABEL_SELECTOR, field_wait)
        .context("recommendation label")?;
    let date = card
        .wait_text(DATE_SELECTOR, field_wait)
        .context("posting date")?;
    let hours = card
        .wait_text(HOURS_SELECTOR, field_wait)
        .context("playtime")?;

    Ok(ReviewRecord {
        game_name: ctx.game_name.clone(),
        region: ctx.region.clone(),
        posted_at: normalize_date(&date, ctx.fallback_year),
        author,
        playtime_hours: normalize_playtime(&hours),
        body: clean_body(&body),
        recommended: recommended.trim().to_string(),
    })
}

pub fn extract_author<C: ReviewCard + ?Sized>(card: &C) -> String {
    for selector in [AUTHOR_SELECTOR, AUTHOR_FALLBACK_SELECTOR] {
        match card.text(selector) {
            Ok(name) if !name.trim().is_empty() => return name.trim().to_string(),
            Ok(_) => {}
            Err(e) => debug!(selector, error = %e, "author lookup failed"),
        }
    }
    ANONYMOUS_AUTHOR.to_string()
}

/// Drops the "posted on" line and surrounding whitespace from a review body.
pub fn clean_body(text: &str) -> String {
    text.lines()
        .filter(|line| !line.starts_with(POSTED_MARKER))
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// `2024年3月5日` and `3月5日` become `YYYY-MM-DD`; anything else is returned
/// as-is minus the posted marker.
pub fn normalize_date(text: &str, fallback_year: i32) -> String {
    if let Some(caps) = FULL_DATE_RE.captures(text) {
        return format!("{}-{:0>2}-{:0>2}", &caps[1], &caps[2], &caps[3]);
    }
    if let Some(caps) = MONTH_DAY_RE.captures(text) {
        return format!("{}-{:0>2}-{:0>2}", fallback_year, &caps[1], &caps[2]);
    }
    text.replace(POSTED_MARKER, "")
}

/// First numeral in `text` with one fractional digit, or `"0.0"`.
pub fn normalize_playtime(text: &str) -> String {
    NUMERAL_RE
        .captures(text)
        .and_then(|caps| to_ascii_numeral(&caps[1]).parse::<f64>().ok())
        .map(|hours| format!("{:.1}", hours))
        .unwrap_or_else(|| "0.0".to_string())
}

fn to_ascii_numeral(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '０'..='９' => char::from(b'0' + (c as u32 - '０' as u32) as u8),
            c => c,
        })
        .collect()
}
