//! Scrapes the negative-review listing of a Steam game into a CSV file.
//!
//! The listing is rendered lazily, so the collector scrolls a headless Chrome
//! tab, extracts only the cards that appeared since the previous cycle and
//! appends them to the output file right away.

pub mod collector;
pub mod config;
pub mod extract;
pub mod record;
pub mod session;
pub mod sink;

pub use collector::{collect, CollectStats, CollectorLimits, Listing, StopReason};
pub use config::{BrowserConfig, RunConfig};
pub use extract::{extract_review, RecordContext, ReviewCard};
pub use record::ReviewRecord;
pub use session::{run, RunReport, RunStatus};
pub use sink::CsvSink;
