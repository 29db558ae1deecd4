use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    extract::{extract_review, RecordContext, ReviewCard},
    sink::CsvSink,
};

/// A lazily loaded listing of review cards.
pub trait Listing {
    type Card<'a>: ReviewCard
    where
        Self: 'a;

    /// All cards currently rendered, in page order.
    fn cards(&self) -> Result<Vec<Self::Card<'_>>>;

    /// Asks the page to render more cards.
    fn load_more(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct CollectorLimits {
    pub max_reviews: usize,
    /// Consecutive cycles without new cards before giving up.
    pub stall_limit: u32,
    /// Pause after each `load_more`.
    pub settle: Duration,
    pub field_wait: Duration,
}

impl Default for CollectorLimits {
    fn default() -> Self {
        Self {
            max_reviews: 50_000,
            stall_limit: 30,
            settle: Duration::from_secs(2),
            field_wait: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    MaxReviews,
    Stalled,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectStats {
    pub cycles: u32,
    /// Highest number of cards seen at once.
    pub visible: usize,
    pub saved: usize,
    pub skipped: usize,
}

/// Scrolls through `listing` until `max_reviews` cards are visible or the
/// listing stops growing for `stall_limit` cycles.
///
/// Only cards past the last handled index are extracted. A card that fails
/// extraction is logged and never retried. `stats` is kept current so that a
/// caller still sees partial progress when this returns an error.
pub fn collect<L: Listing>(
    listing: &L,
    sink: &CsvSink,
    ctx: &RecordContext,
    limits: &CollectorLimits,
    stats: &mut CollectStats,
) -> Result<StopReason> {
    let mut last_saved = 0usize;
    let mut stalls = 0u32;

    while stats.visible < limits.max_reviews && stalls < limits.stall_limit {
        stats.cycles += 1;
        let cards = listing.cards().context("cannot list review cards")?;
        let visible = cards.len();

        if visible > stats.visible {
            stats.visible = visible;
            info!("loaded {} reviews", visible);
            stalls = 0;
        } else {
            stalls += 1;
            debug!(stalls, visible, "no new reviews this cycle");
        }

        if visible > last_saved {
            let mut batch = sink.batch()?;
            for (index, card) in cards.iter().enumerate().skip(last_saved) {
                match extract_review(card, ctx, limits.field_wait) {
                    Ok(record) => {
                        batch.write(&record)?;
                        stats.saved += 1;
                    }
                    Err(e) => {
                        stats.skipped += 1;
                        let error = format!("{:#}", e);
                        warn!(index, %error, "skipping review");
                    }
                }
            }
            last_saved = visible;
        }

        listing.load_more().context("cannot load more reviews")?;
        if !limits.settle.is_zero() {
            std::thread::sleep(limits.settle);
        }
    }

    let reason = if stats.visible >= limits.max_reviews {
        StopReason::MaxReviews
    } else {
        StopReason::Stalled
    };
    Ok(reason)
}
