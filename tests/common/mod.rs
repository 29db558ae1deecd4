#![allow(dead_code)]

use std::{
    cell::Cell,
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{anyhow, Result};
use reviewbot::{extract, Listing, RecordContext, ReviewCard};

/// A review card backed by a selector -> text map.
#[derive(Debug, Clone, Default)]
pub struct FakeCard {
    fields: HashMap<&'static str, String>,
}

impl FakeCard {
    pub fn with(mut self, selector: &'static str, text: &str) -> Self {
        self.fields.insert(selector, text.to_string());
        self
    }

    /// A card carrying every field, numbered so rows can be told apart.
    pub fn complete(n: usize) -> Self {
        FakeCard::default()
            .with(extract::AUTHOR_SELECTOR, &format!("player{}", n))
            .with(extract::AUTHOR_FALLBACK_SELECTOR, &format!("player{}\n已拥有 3 件产品", n))
            .with(extract::BODY_SELECTOR, &format!("发布于：3月{}日\n第 {} 条差评", n % 28 + 1, n))
            .with(extract::LABEL_SELECTOR, "不推荐")
            .with(extract::DATE_SELECTOR, &format!("发布于：3月{}日", n % 28 + 1))
            .with(extract::HOURS_SELECTOR, &format!("总时数 {}.5 小时", n))
    }

    pub fn without(mut self, selector: &str) -> Self {
        self.fields.remove(selector);
        self
    }
}

impl ReviewCard for FakeCard {
    fn text(&self, selector: &str) -> Result<String> {
        self.fields
            .get(selector)
            .cloned()
            .ok_or_else(|| anyhow!("no element matches {}", selector))
    }

    fn wait_text(&self, selector: &str, _timeout: Duration) -> Result<String> {
        self.text(selector)
            .map_err(|_| anyhow!("timed out waiting for {}", selector))
    }
}

/// Shows `page` more cards every time the collector scrolls.
pub struct FakeListing {
    cards: Vec<FakeCard>,
    page: usize,
    shown: Cell<usize>,
    pub scrolls: Cell<u32>,
}

impl FakeListing {
    pub fn new(cards: Vec<FakeCard>, page: usize) -> Self {
        let shown = page.min(cards.len());
        Self {
            cards,
            page,
            shown: Cell::new(shown),
            scrolls: Cell::new(0),
        }
    }
}

impl Listing for FakeListing {
    type Card<'a> = &'a FakeCard;

    fn cards(&self) -> Result<Vec<&FakeCard>> {
        Ok(self.cards[..self.shown.get()].iter().collect())
    }

    fn load_more(&self) -> Result<()> {
        self.scrolls.set(self.scrolls.get() + 1);
        self.shown
            .set((self.shown.get() + self.page).min(self.cards.len()));
        Ok(())
    }
}

/// Shows `counts[n]` cards on cycle `n`, then keeps the last count.
pub struct ScriptedListing {
    cards: Vec<FakeCard>,
    counts: Vec<usize>,
    cycle: Cell<usize>,
}

impl ScriptedListing {
    pub fn new(cards: Vec<FakeCard>, counts: Vec<usize>) -> Self {
        Self {
            cards,
            counts,
            cycle: Cell::new(0),
        }
    }
}

impl Listing for ScriptedListing {
    type Card<'a> = &'a FakeCard;

    fn cards(&self) -> Result<Vec<&FakeCard>> {
        let at = self.cycle.get().min(self.counts.len() - 1);
        let shown = self.counts[at].min(self.cards.len());
        Ok(self.cards[..shown].iter().collect())
    }

    fn load_more(&self) -> Result<()> {
        self.cycle.set(self.cycle.get() + 1);
        Ok(())
    }
}

pub fn context() -> RecordContext {
    RecordContext {
        game_name: "三国杀".to_string(),
        region: "中国".to_string(),
        fallback_year: 2025,
    }
}

pub fn temp_csv(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!(
        "reviewbot_{}_{}.csv",
        name,
        std::process::id()
    ));
    let _ = fs::remove_file(&path);
    path
}

/// Header and rows of a file written by the sink, BOM stripped.
pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let raw = fs::read_to_string(path).expect("read csv");
    let text = raw.strip_prefix('\u{feff}').expect("utf-8 bom");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());
    let header = reader
        .headers()
        .expect("header")
        .iter()
        .map(str::to_string)
        .collect();
    let rows = reader
        .records()
        .map(|r| r.expect("row").iter().map(str::to_string).collect())
        .collect();
    (header, rows)
}
