use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::market::MarketDataError;

const ITEMS_PER_FEED: usize = 20;
const MAX_ITEMS: usize = 120;
const USER_AGENT: &str = "CSE-Bot/1.0";

/// Number of headlines in a swing watch message
pub const SWING_PICKS: usize = 6;
const WATCHLIST_SCORE: u32 = 10;
const FRESH_SCORE: u32 = 3;
const FRESH_HOURS: i64 = 6;

static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// A configured RSS feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feed {
    pub source: String,
    pub url: String,
}

impl Feed {
    pub fn new(source: &str, url: &str) -> Self {
        Self {
            source: source.to_string(),
            url: url.to_string(),
        }
    }
}

pub fn default_feeds() -> Vec<Feed> {
    vec![
        Feed::new("CSE Announcements", "https://www.cse.lk/api/announcements/rss"),
        Feed::new("Daily FT", "https://www.ft.lk/rssfeed"),
        Feed::new("EconomyNext", "https://economynext.com/feed/"),
        Feed::new("NewsWire Business", "https://www.newswire.lk/category/business/feed/"),
    ]
}

/// Company-name hints used to tag headlines with a ticker
const TICKER_HINTS: &[(&str, &[&str])] = &[
    ("LOLC.N", &["LOLC", "Lanka Orix"]),
    ("HAYL.N", &["Hayleys", "Hayleys PLC"]),
    ("COMB.N", &["Commercial Bank", "ComBank", "COMB"]),
    ("JKH.N", &["John Keells", "JKH"]),
];

/// Headline with an optional inferred ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub date: DateTime<Utc>,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticker: Option<String>,
}

/// Source of recent market headlines
#[async_trait]
pub trait NewsSource: Send + Sync {
    /// Newest first. Individual feed failures are absorbed.
    async fn latest(&self) -> Vec<NewsItem>;
}

/// Polls a list of RSS feeds concurrently
pub struct RssNewsSource {
    client: reqwest::Client,
    feeds: Vec<Feed>,
}

impl RssNewsSource {
    pub fn new(feeds: Vec<Feed>) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self { client, feeds })
    }

    async fn fetch_feed(&self, feed: &Feed) -> Result<Vec<NewsItem>, MarketDataError> {
        let response = self.client.get(&feed.url).send().await?;
        if !response.status().is_success() {
            return Err(MarketDataError::HttpStatus {
                status: response.status().as_u16(),
                url: feed.url.clone(),
            });
        }

        let content = response.bytes().await?;
        parse_feed(&content[..], &feed.source, Utc::now())
    }
}

#[async_trait]
impl NewsSource for RssNewsSource {
    async fn latest(&self) -> Vec<NewsItem> {
        let results = futures::future::join_all(self.feeds.iter().map(|feed| async move {
            (feed, self.fetch_feed(feed).await)
        }))
        .await;

        let mut items = Vec::new();
        for (feed, result) in results {
            match result {
                Ok(feed_items) => items.extend(feed_items),
                Err(e) => log::warn!("⚠️ Feed error for {}: {e}", feed.source),
            }
        }

        sort_newest_first(&mut items);
        items.truncate(MAX_ITEMS);
        log::info!("📰 Collected {} headlines from {} feeds", items.len(), self.feeds.len());
        items
    }
}

/// Parse one RSS document.
///
/// The date comes from `pubDate` (RFC 2822) or else the Dublin Core `dc:date`
/// (ISO 8601). Items with neither are stamped `now`.
pub fn parse_feed(content: &[u8], source: &str, now: DateTime<Utc>) -> Result<Vec<NewsItem>, MarketDataError> {
    let channel = rss::Channel::read_from(content)
        .map_err(|e| MarketDataError::ParseError(format!("Failed to parse RSS feed {source}: {e}")))?;

    let items = channel
        .items()
        .iter()
        .take(ITEMS_PER_FEED)
        .map(|item| {
            let title = item.title().unwrap_or_default().to_string();
            let url = item.link().map(str::to_string);
            let date = item_date(item).unwrap_or(now);
            let summary = item
                .content()
                .or(item.description())
                .map(strip_tags)
                .filter(|s| !s.is_empty());
            let ticker = guess_ticker(&title, summary.as_deref().unwrap_or(""));

            NewsItem {
                id: format!("{source}-{}-{}", url.as_deref().unwrap_or(&title), date.to_rfc3339()),
                title,
                url,
                date,
                source: source.to_string(),
                summary,
                ticker,
            }
        })
        .collect();
    Ok(items)
}

fn item_date(item: &rss::Item) -> Option<DateTime<Utc>> {
    let published = item
        .pub_date()
        .and_then(|d| DateTime::parse_from_rfc2822(d.trim()).ok());
    let dublin_core = || {
        item.dublin_core_ext()
            .and_then(|dc| dc.dates().first())
            .and_then(|d| DateTime::parse_from_rfc3339(d.trim()).ok())
    };
    published.or_else(dublin_core).map(|d| d.with_timezone(&Utc))
}

/// First ticker whose hints appear in the title or summary (case-insensitive)
pub fn guess_ticker(title: &str, summary: &str) -> Option<String> {
    let haystack = format!("{title} {summary}").to_lowercase();
    TICKER_HINTS
        .iter()
        .find(|(_, hints)| hints.iter().any(|h| haystack.contains(&h.to_lowercase())))
        .map(|(ticker, _)| ticker.to_string())
}

/// Remove `<...>` markup; a lone `<` is kept as text
fn strip_tags(html: &str) -> String {
    HTML_TAG.replace_all(html, "").trim().to_string()
}

pub fn sort_newest_first(items: &mut [NewsItem]) {
    items.sort_by(|a, b| b.date.cmp(&a.date));
}

/// Tickers with at least one headline
pub fn news_tickers(items: &[NewsItem]) -> HashSet<String> {
    items.iter().filter_map(|n| n.ticker.clone()).collect()
}

/// Pick headlines for the swing watch: watchlist tickers first, then fresh ones
pub fn swing_picks(items: &[NewsItem], watchlist: &[String], now: DateTime<Utc>) -> Vec<NewsItem> {
    let mut scored: Vec<(u32, &NewsItem)> = items
        .iter()
        .map(|item| {
            let on_watchlist = item.ticker.as_ref().is_some_and(|t| watchlist.contains(t));
            let fresh = now - item.date < Duration::hours(FRESH_HOURS);
            let score = if on_watchlist { WATCHLIST_SCORE } else { 0 } + if fresh { FRESH_SCORE } else { 0 };
            (score, item)
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored.into_iter().take(SWING_PICKS).map(|(_, item)| item.clone()).collect()
}
