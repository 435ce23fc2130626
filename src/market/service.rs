use super::cse::CseTableSource;
use super::float::{FloatCache, FloatLookup, SystemClock};
use super::merge::{compare_activity, merge};
use super::model::MoverRecord;
use super::provider::{MarketDataError, MoverSource};
use super::ranking::{rank, Ranking, Thresholds};
use super::yahoo::YahooFloatProvider;
use crate::config::BotConfig;
use crate::news::{news_tickers, swing_picks, NewsItem, NewsSource, RssNewsSource};
use chrono::Utc;
use futures::future::join_all;
use std::collections::HashSet;
use std::sync::Arc;

/// Watchlist seeds never exceed this many records
const SEED_LIMIT: usize = 8;
/// Low-float message size and its minimum before falling back
const LOW_FLOAT_PICKS: usize = 5;
const LOW_FLOAT_MIN: usize = 3;

/// Result of a day-trade ranking run
#[derive(Debug, Clone)]
pub struct DaytradeReport {
    pub ranking: Ranking,
    /// The mover pool was empty and was seeded from the watchlist
    pub seeded: bool,
}

/// Low-float movers with the headlines used to annotate them
#[derive(Debug, Clone)]
pub struct LowFloatReport {
    pub picks: Vec<MoverRecord>,
    pub news: Vec<NewsItem>,
}

/// Service tying the mover tables, float lookups and news feeds together.
///
/// One instance lives for the whole process so the float cache is shared
/// between runs.
pub struct MoverService {
    source: Box<dyn MoverSource>,
    float_lookup: FloatLookup,
    news: Box<dyn NewsSource>,
    thresholds: Thresholds,
    watchlist: Vec<String>,
    float_lookup_limit: usize,
}

impl MoverService {
    /// Create the service with the CSE, Yahoo and RSS adapters
    pub fn new(config: &BotConfig) -> Result<Self, MarketDataError> {
        let source = CseTableSource::new(config.gainers_url.clone(), config.active_url.clone())?;
        let provider = YahooFloatProvider::new(config.quote_summary_url.clone())?;
        let cache = FloatCache::new(config.float_cache_ttl, Arc::new(SystemClock));
        let news = RssNewsSource::new(config.feeds.clone())?;

        log::info!(
            "Mover service initialized (min volume {}, min change {}%, float TTL {}h)",
            config.thresholds.min_volume,
            config.thresholds.min_pct_change,
            config.float_cache_ttl.num_hours()
        );

        Ok(Self::with_parts(
            Box::new(source),
            FloatLookup::new(Arc::new(provider), cache),
            Box::new(news),
            config,
        ))
    }

    pub fn with_parts(
        source: Box<dyn MoverSource>,
        float_lookup: FloatLookup,
        news: Box<dyn NewsSource>,
        config: &BotConfig,
    ) -> Self {
        Self {
            source,
            float_lookup,
            news,
            thresholds: config.thresholds,
            watchlist: config.watchlist.clone(),
            float_lookup_limit: config.float_lookup_limit,
        }
    }

    /// Merged, classified movers in canonical pool order.
    ///
    /// A failing table counts as empty. Only the most active movers get a
    /// float lookup; the rest keep unknown float status.
    pub async fn movers(&self) -> Vec<MoverRecord> {
        let (gainers, active) = tokio::join!(self.source.gainers(), self.source.active());
        let gainers = gainers.unwrap_or_else(|e| {
            log::warn!("⚠️ {} gainers table unavailable: {e}", self.source.name());
            Vec::new()
        });
        let active = active.unwrap_or_else(|e| {
            log::warn!("⚠️ {} active table unavailable: {e}", self.source.name());
            Vec::new()
        });

        let mut movers = merge(&gainers, &active);

        let limit = self.float_lookup_limit.min(movers.len());
        let classified = join_all(
            movers[..limit]
                .iter()
                .map(|m| self.float_lookup.classify(&m.symbol)),
        )
        .await;
        for (record, (info, low_float)) in movers.iter_mut().zip(classified) {
            record.apply_float(info.as_ref(), low_float);
        }

        log::info!(
            "📈 {} movers merged from {} gainers and {} active rows",
            movers.len(),
            gainers.len(),
            active.len()
        );
        movers
    }

    pub async fn news(&self) -> Vec<NewsItem> {
        self.news.latest().await
    }

    /// Rank today's movers for the day-trade message
    pub async fn daytrade(&self) -> DaytradeReport {
        let (movers, news) = tokio::join!(self.movers(), self.news());
        let tickers = news_tickers(&news);

        let seeded = movers.is_empty();
        let pool = if seeded {
            log::warn!("⚠️ No movers available, seeding pool from watchlist and news");
            seed_pool(&self.watchlist, &news)
        } else {
            movers
        };

        let ranking = rank(&pool, &tickers, &self.thresholds);
        log::info!("🏁 Day-trade ranking: {} picks from {} tier", ranking.picks.len(), ranking.tier);
        DaytradeReport { ranking, seeded }
    }

    /// Most active confirmed low-float movers, or the most active movers when
    /// too few are low float
    pub async fn low_float(&self) -> LowFloatReport {
        let (movers, news) = tokio::join!(self.movers(), self.news());
        LowFloatReport {
            picks: low_float_picks(&movers),
            news,
        }
    }

    /// Headlines for the swing watch
    pub async fn swing(&self) -> Vec<NewsItem> {
        let news = self.news().await;
        swing_picks(&news, &self.watchlist, Utc::now())
    }

    /// Headlines tagged with a ticker (after normalization)
    pub async fn news_for(&self, symbol: &str) -> Vec<NewsItem> {
        let symbol = super::symbol::normalize(symbol.trim()).to_uppercase();
        self.news()
            .await
            .into_iter()
            .filter(|n| n.ticker.as_deref().is_some_and(|t| t.eq_ignore_ascii_case(&symbol)))
            .collect()
    }
}

/// Placeholder pool from watchlist and news tickers, used only when no movers
/// could be fetched at all
pub fn seed_pool(watchlist: &[String], news: &[NewsItem]) -> Vec<MoverRecord> {
    let mut seen = HashSet::new();
    watchlist
        .iter()
        .cloned()
        .chain(news.iter().filter_map(|n| n.ticker.clone()))
        .filter(|symbol| seen.insert(symbol.clone()))
        .take(SEED_LIMIT)
        .map(|symbol| MoverRecord {
            volume: Some(0),
            turnover: Some(0.0),
            low_float: Some(false),
            ..MoverRecord::new(symbol, 0.0)
        })
        .collect()
}

pub fn low_float_picks(movers: &[MoverRecord]) -> Vec<MoverRecord> {
    let mut picks: Vec<MoverRecord> = movers.iter().filter(|m| m.is_low_float()).cloned().collect();
    picks.sort_by(compare_activity);
    picks.truncate(LOW_FLOAT_PICKS);

    if picks.len() >= LOW_FLOAT_MIN {
        picks
    } else {
        movers.iter().take(LOW_FLOAT_MIN).cloned().collect()
    }
}
