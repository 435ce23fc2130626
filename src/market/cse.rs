//! Colombo Stock Exchange mover tables.
//!
//! Both component pages render one `<table>` whose body rows read
//! `symbol | price | change | change % | volume | turnover`.

use super::model::RawRow;
use super::provider::{MarketDataError, MoverSource};
use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::time::Duration;

pub const DEFAULT_GAINERS_URL: &str =
    "https://www.cse.lk/pages/percentage-gainers/percentage-gainers.component.html";
pub const DEFAULT_ACTIVE_URL: &str =
    "https://www.cse.lk/pages/most-active-volumes/most-active-volumes.component.html";

const GAINERS_LIMIT: usize = 20;
const ACTIVE_LIMIT: usize = 30;

const SYMBOL_CELL: usize = 0;
const PRICE_CELL: usize = 1;
const PCT_CELL: usize = 3;
const VOLUME_CELL: usize = 4;
const TURNOVER_CELL: usize = 5;

/// Which table a page holds; decides how an unparseable change is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverTable {
    /// Rows without a numeric change are dropped
    Gainers,
    /// Rows without a numeric change count as 0%
    Active,
}

impl MoverTable {
    fn limit(self) -> usize {
        match self {
            MoverTable::Gainers => GAINERS_LIMIT,
            MoverTable::Active => ACTIVE_LIMIT,
        }
    }
}

/// Scrapes the CSE percentage-gainers and most-active pages
pub struct CseTableSource {
    client: reqwest::Client,
    gainers_url: String,
    active_url: String,
}

impl CseTableSource {
    pub fn new(gainers_url: impl Into<String>, active_url: impl Into<String>) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            gainers_url: gainers_url.into(),
            active_url: active_url.into(),
        })
    }

    async fn fetch_table(&self, url: &str, table: MoverTable) -> Result<Vec<RawRow>, MarketDataError> {
        log::debug!("Fetching {table:?} table from {url}");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(MarketDataError::HttpStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        let html = response.text().await?;
        let rows = parse_table(&html, table)?;
        log::info!("📊 Parsed {} {table:?} rows", rows.len());
        Ok(rows)
    }
}

#[async_trait]
impl MoverSource for CseTableSource {
    fn name(&self) -> &str {
        "CSE"
    }

    async fn gainers(&self) -> Result<Vec<RawRow>, MarketDataError> {
        self.fetch_table(&self.gainers_url, MoverTable::Gainers).await
    }

    async fn active(&self) -> Result<Vec<RawRow>, MarketDataError> {
        self.fetch_table(&self.active_url, MoverTable::Active).await
    }
}

/// Extract mover rows from a CSE table page
pub fn parse_table(html: &str, table: MoverTable) -> Result<Vec<RawRow>, MarketDataError> {
    let row_selector = selector("table tbody tr")?;
    let cell_selector = selector("td")?;
    let document = Html::parse_document(html);

    let mut rows = Vec::new();
    for tr in document.select(&row_selector) {
        let cells: Vec<String> = tr.select(&cell_selector).map(cell_text).collect();
        let cell = |i: usize| cells.get(i).map(String::as_str).unwrap_or("");

        let symbol = cell(SYMBOL_CELL);
        if symbol.is_empty() {
            continue;
        }

        let pct = parse_number(cell(PCT_CELL));
        if pct.is_none() && table == MoverTable::Gainers {
            continue;
        }

        rows.push(RawRow {
            symbol: symbol.to_string(),
            pct: Some(pct.unwrap_or(0.0)),
            price: parse_number(cell(PRICE_CELL)),
            volume: parse_count(cell(VOLUME_CELL)),
            turnover: parse_number(cell(TURNOVER_CELL)),
        });

        if rows.len() == table.limit() {
            break;
        }
    }
    Ok(rows)
}

fn selector(css: &str) -> Result<Selector, MarketDataError> {
    Selector::parse(css).map_err(|e| MarketDataError::ParseError(format!("Invalid CSS selector {css}: {e:?}")))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<String>().trim().to_string()
}

/// Parse "1,234.50" or "+4.25 %" style cells
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .chars()
        .filter(|c| !matches!(c, ',' | '%') && !c.is_whitespace())
        .collect();
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_count(text: &str) -> Option<u64> {
    let cleaned: String = text.chars().filter(|c| *c != ',' && !c.is_whitespace()).collect();
    cleaned.parse::<u64>().ok()
}
