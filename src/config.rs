use std::env;
use std::str::FromStr;

use chrono::Duration;
use log::warn;

use crate::market::cse::{DEFAULT_ACTIVE_URL, DEFAULT_GAINERS_URL};
use crate::market::float::DEFAULT_FLOAT_TTL_HOURS;
use crate::market::yahoo::DEFAULT_QUOTE_SUMMARY_URL;
use crate::market::{MarketDataError, Thresholds};
use crate::news::{Feed, default_feeds};

const DEFAULT_WATCHLIST: &str = "LOLC.N,HAYL.N,COMB.N,JKH.N";
const DEFAULT_FLOAT_LOOKUP_LIMIT: usize = 25;

/// Runtime configuration read from the environment
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Activity thresholds for the day-trade shortlist
    pub thresholds: Thresholds,
    /// Tickers used for swing picks and to seed an empty mover pool
    pub watchlist: Vec<String>,
    /// Chats that receive scheduled broadcasts
    pub chat_ids: Vec<String>,
    pub gainers_url: String,
    pub active_url: String,
    pub quote_summary_url: String,
    pub feeds: Vec<Feed>,
    /// Lifetime of cached float lookups, always positive
    pub float_cache_ttl: Duration,
    /// How many of the most active movers get a float lookup
    pub float_lookup_limit: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            watchlist: split_list(DEFAULT_WATCHLIST),
            chat_ids: Vec::new(),
            gainers_url: DEFAULT_GAINERS_URL.to_string(),
            active_url: DEFAULT_ACTIVE_URL.to_string(),
            quote_summary_url: DEFAULT_QUOTE_SUMMARY_URL.to_string(),
            feeds: default_feeds(),
            float_cache_ttl: Duration::hours(DEFAULT_FLOAT_TTL_HOURS),
            float_lookup_limit: DEFAULT_FLOAT_LOOKUP_LIMIT,
        }
    }
}

impl BotConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or invalid values keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            thresholds: Thresholds {
                min_volume: parse_or(get("DAYTRADE_MIN_VOL"), "DAYTRADE_MIN_VOL", defaults.thresholds.min_volume),
                min_pct_change: parse_or(
                    get("DAYTRADE_MIN_PCT"),
                    "DAYTRADE_MIN_PCT",
                    defaults.thresholds.min_pct_change,
                ),
            },
            watchlist: get("WATCHLIST").map(|v| split_list(&v)).unwrap_or(defaults.watchlist),
            chat_ids: get("TELEGRAM_CHAT_IDS").map(|v| split_list(&v)).unwrap_or_default(),
            gainers_url: get("CSE_GAINERS_URL").unwrap_or(defaults.gainers_url),
            active_url: get("CSE_ACTIVE_URL").unwrap_or(defaults.active_url),
            quote_summary_url: get("YAHOO_QUOTE_SUMMARY_URL").unwrap_or(defaults.quote_summary_url),
            feeds: defaults.feeds,
            float_cache_ttl: cache_ttl(get("FLOAT_CACHE_TTL_HOURS"), defaults.float_cache_ttl),
            float_lookup_limit: parse_or(get("FLOAT_LOOKUP_LIMIT"), "FLOAT_LOOKUP_LIMIT", defaults.float_lookup_limit),
        }
    }

    /// Chat ids for broadcasts, or a configuration error when none are set
    pub fn require_chat_ids(&self) -> Result<&[String], MarketDataError> {
        if self.chat_ids.is_empty() {
            return Err(MarketDataError::ConfigError("No TELEGRAM_CHAT_IDS set".to_string()));
        }
        Ok(&self.chat_ids)
    }
}

fn parse_or<T: FromStr + Copy>(value: Option<String>, key: &str, default: T) -> T {
    match value {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("⚠️ Invalid value for {key}: '{raw}', using default");
            default
        }),
        None => default,
    }
}

/// Positive whole hours that fit in a `Duration`, else the default
fn cache_ttl(value: Option<String>, default: Duration) -> Duration {
    let Some(raw) = value else {
        return default;
    };
    match raw.parse::<i64>().ok().filter(|h| *h > 0).and_then(Duration::try_hours) {
        Some(ttl) => ttl,
        None => {
            warn!("⚠️ Invalid value for FLOAT_CACHE_TTL_HOURS: '{raw}', using default");
            default
        }
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::MoverService;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> BotConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.thresholds.min_volume, 100_000);
        assert_eq!(config.thresholds.min_pct_change, 3.0);
        assert_eq!(config.watchlist, vec!["LOLC.N", "HAYL.N", "COMB.N", "JKH.N"]);
        assert!(config.chat_ids.is_empty());
        assert_eq!(config.float_cache_ttl, Duration::hours(6));
        assert_eq!(config.float_lookup_limit, 25);
        assert_eq!(config.feeds.len(), 4);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("DAYTRADE_MIN_VOL", "250000"),
            ("DAYTRADE_MIN_PCT", " 4.5 "),
            ("TELEGRAM_CHAT_IDS", "123, -100456 ,,@cse_channel"),
            ("WATCHLIST", "DIAL.N"),
        ]);

        assert_eq!(config.thresholds.min_volume, 250_000);
        assert_eq!(config.thresholds.min_pct_change, 4.5);
        assert_eq!(config.chat_ids, vec!["123", "-100456", "@cse_channel"]);
        assert_eq!(config.watchlist, vec!["DIAL.N"]);
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config_from(&[("DAYTRADE_MIN_VOL", "lots"), ("FLOAT_LOOKUP_LIMIT", "-1")]);
        assert_eq!(config.thresholds.min_volume, 100_000);
        assert_eq!(config.float_lookup_limit, 25);
    }

    #[test]
    fn test_cache_ttl_rejects_non_positive_and_out_of_range() {
        for raw in ["0", "-3", "9999999999999999", "six"] {
            let config = config_from(&[("FLOAT_CACHE_TTL_HOURS", raw)]);
            assert_eq!(config.float_cache_ttl, Duration::hours(6), "value {raw}");
        }

        let config = config_from(&[("FLOAT_CACHE_TTL_HOURS", "12")]);
        assert_eq!(config.float_cache_ttl, Duration::hours(12));
        assert!(MoverService::new(&config_from(&[("FLOAT_CACHE_TTL_HOURS", "9999999999999999")])).is_ok());
    }

    #[test]
    fn test_require_chat_ids() {
        assert!(matches!(
            config_from(&[]).require_chat_ids(),
            Err(MarketDataError::ConfigError(_))
        ));
        assert_eq!(config_from(&[("TELEGRAM_CHAT_IDS", "1")]).require_chat_ids().unwrap(), ["1"]);
    }
}
