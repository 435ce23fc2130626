//! Day-trade ranking engine.
//!
//! Turns a classified mover pool into a short, ordered list of candidates:
//!
//! 1. A shortlist cascade picks the first tier with at least
//!    [`MIN_TIER_SIZE`] members, so a quiet session still yields candidates.
//! 2. The shortlist (capped at [`SCORING_POOL_LIMIT`]) is scored by rank
//!    within the pool on change, volume and turnover, plus flat bonuses for
//!    news and confirmed low float.
//! 3. The top [`TOP_PICKS`] by score are returned.
//!
//! Ranking is by position, not magnitude, so volume in millions and change in
//! single-digit percent weigh in on the same scale.
//!
//! Everything here is pure and infallible: an empty pool ranks to an empty
//! list.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::merge::{compare_activity, desc_missing_last};
use super::model::{MoverRecord, ScoredMover};

pub const DEFAULT_MIN_VOLUME: u64 = 100_000;
pub const DEFAULT_MIN_PCT_CHANGE: f64 = 3.0;

/// A tier must reach this many members to be used
pub const MIN_TIER_SIZE: usize = 3;
/// Tier C keeps at most this many of the most liquid movers
pub const LIQUIDITY_TIER_LIMIT: usize = 8;
/// At most this many shortlisted movers are scored
pub const SCORING_POOL_LIMIT: usize = 12;
/// Number of picks returned
pub const TOP_PICKS: usize = 5;

const PCT_WEIGHT: f64 = 0.40;
const VOLUME_WEIGHT: f64 = 0.40;
const TURNOVER_WEIGHT: f64 = 0.10;
const NEWS_BONUS: f64 = 0.10;
const LOW_FLOAT_BONUS: f64 = 0.10;

/// Activity thresholds for the filtered tiers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub min_volume: u64,
    pub min_pct_change: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            min_volume: DEFAULT_MIN_VOLUME,
            min_pct_change: DEFAULT_MIN_PCT_CHANGE,
        }
    }
}

impl Thresholds {
    /// Volume or change clears its threshold. Missing volume counts as 0.
    pub fn is_active(&self, record: &MoverRecord) -> bool {
        record.volume.unwrap_or(0) >= self.min_volume || record.pct >= self.min_pct_change
    }
}

/// Shortlist tier that produced the scoring pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tier {
    /// Confirmed low float and active
    Strict,
    /// Active, float status ignored
    RelaxedFloat,
    /// Most liquid by turnover
    LiquidityOnly,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Strict => write!(f, "low float + active"),
            Tier::RelaxedFloat => write!(f, "active"),
            Tier::LiquidityOnly => write!(f, "liquidity"),
        }
    }
}

/// Result of a ranking run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    pub tier: Tier,
    pub picks: Vec<ScoredMover>,
}

/// Run the cascade and return the first tier with enough members.
///
/// The liquidity tier is returned even when it is short, since it is drawn
/// from the whole pool.
pub fn shortlist(pool: &[MoverRecord], thresholds: &Thresholds) -> (Tier, Vec<MoverRecord>) {
    let strict: Vec<MoverRecord> = pool
        .iter()
        .filter(|m| m.is_low_float() && thresholds.is_active(m))
        .cloned()
        .collect();
    if strict.len() >= MIN_TIER_SIZE {
        return (Tier::Strict, strict);
    }

    let relaxed: Vec<MoverRecord> = pool
        .iter()
        .filter(|m| thresholds.is_active(m))
        .cloned()
        .collect();
    if relaxed.len() >= MIN_TIER_SIZE {
        return (Tier::RelaxedFloat, relaxed);
    }

    let mut liquid = pool.to_vec();
    liquid.sort_by(|a, b| desc_missing_last(a.turnover, b.turnover));
    liquid.truncate(LIQUIDITY_TIER_LIMIT);
    (Tier::LiquidityOnly, liquid)
}

/// Map a 1-based rank among `total` to [0, 1], best rank scoring 1
pub fn norm_score(rank: usize, total: usize) -> f64 {
    if total <= 1 {
        return 1.0;
    }
    1.0 - (rank.saturating_sub(1)) as f64 / (total - 1) as f64
}

/// 1-based descending ranks, indexed like `values`.
///
/// Ties keep input order and missing values rank after every present one.
pub fn ranks(values: &[Option<f64>]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| desc_missing_last(values[a], values[b]));

    let mut ranks = vec![0; values.len()];
    for (position, index) in order.into_iter().enumerate() {
        ranks[index] = position + 1;
    }
    ranks
}

/// Score every record in the pool
pub fn score(pool: &[MoverRecord], news_tickers: &HashSet<String>) -> Vec<ScoredMover> {
    let total = pool.len();
    let pct_ranks = ranks(&pool.iter().map(|m| Some(m.pct)).collect::<Vec<_>>());
    let volume_ranks = ranks(&pool.iter().map(|m| m.volume.map(|v| v as f64)).collect::<Vec<_>>());
    let turnover_ranks = ranks(&pool.iter().map(|m| m.turnover).collect::<Vec<_>>());

    pool.iter()
        .enumerate()
        .map(|(i, record)| {
            let has_news = news_tickers.contains(&record.symbol);
            // unknown float status earns no bonus
            let low_float = record.is_low_float();

            let trade_score = PCT_WEIGHT * norm_score(pct_ranks[i], total)
                + VOLUME_WEIGHT * norm_score(volume_ranks[i], total)
                + TURNOVER_WEIGHT * norm_score(turnover_ranks[i], total)
                + if has_news { NEWS_BONUS } else { 0.0 }
                + if low_float { LOW_FLOAT_BONUS } else { 0.0 };

            ScoredMover {
                record: record.clone(),
                trade_score,
                has_news,
            }
        })
        .collect()
}

/// Rank a classified pool into at most [`TOP_PICKS`] candidates
pub fn rank(pool: &[MoverRecord], news_tickers: &HashSet<String>, thresholds: &Thresholds) -> Ranking {
    let (tier, mut shortlisted) = shortlist(pool, thresholds);
    shortlisted.truncate(SCORING_POOL_LIMIT);

    let mut scored = score(&shortlisted, news_tickers);
    let picks = if scored.len() < MIN_TIER_SIZE {
        scored.sort_by(|a, b| compare_activity(&a.record, &b.record));
        scored.truncate(MIN_TIER_SIZE);
        scored
    } else {
        scored.sort_by(|a, b| b.trade_score.partial_cmp(&a.trade_score).unwrap_or(Ordering::Equal));
        scored.truncate(TOP_PICKS);
        scored
    };

    log::debug!("Ranked {} movers via {tier} tier into {} picks", pool.len(), picks.len());
    Ranking { tier, picks }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;
    const MAX_TRADE_SCORE: f64 = PCT_WEIGHT + VOLUME_WEIGHT + TURNOVER_WEIGHT + NEWS_BONUS + LOW_FLOAT_BONUS;

    fn mover(symbol: &str, pct: f64, volume: Option<u64>, low_float: Option<bool>) -> MoverRecord {
        MoverRecord {
            volume,
            low_float,
            ..MoverRecord::new(symbol, pct)
        }
    }

    fn no_news() -> HashSet<String> {
        HashSet::new()
    }

    fn symbols(picks: &[ScoredMover]) -> Vec<&str> {
        picks.iter().map(|p| p.record.symbol.as_str()).collect()
    }

    #[test]
    fn test_norm_score_extremes_and_monotonic() {
        for total in 1..=12 {
            let scores: Vec<f64> = (1..=total).map(|rank| norm_score(rank, total)).collect();

            assert_eq!(scores.iter().filter(|s| **s == 1.0).count(), 1);
            if total > 1 {
                assert_eq!(scores.iter().filter(|s| **s == 0.0).count(), 1);
            }
            assert!(scores.windows(2).all(|w| w[0] >= w[1]));
        }
        assert_eq!(norm_score(1, 0), 1.0);
        assert!((norm_score(2, 3) - 0.5).abs() < EPSILON);
    }

    #[test]
    fn test_ranks_ties_keep_order_and_missing_last() {
        let values = vec![Some(5.0), None, Some(9.0), Some(5.0)];
        assert_eq!(ranks(&values), vec![2, 4, 1, 3]);
    }

    #[test]
    fn test_tier_a_wins_when_large_enough() {
        let pool = vec![
            mover("A", 5.0, Some(10), Some(true)),
            mover("B", 0.5, Some(200_000), Some(true)),
            mover("C", 4.0, None, Some(true)),
            mover("D", 9.0, Some(900_000), Some(false)),
            mover("E", 9.0, Some(900_000), None),
        ];

        let (tier, list) = shortlist(&pool, &Thresholds::default());
        assert_eq!(tier, Tier::Strict);
        assert_eq!(list.iter().map(|m| m.symbol.as_str()).collect::<Vec<_>>(), vec!["A", "B", "C"]);
    }

    #[test]
    fn test_tier_a_excludes_unknown_float() {
        let pool = vec![
            mover("A", 5.0, None, None),
            mover("B", 5.0, None, None),
            mover("C", 5.0, None, None),
        ];

        let (tier, list) = shortlist(&pool, &Thresholds::default());
        assert_eq!(tier, Tier::RelaxedFloat);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_scenario_reaches_liquidity_tier() {
        let pool = vec![
            mover("A", 5.0, Some(200_000), Some(true)),
            mover("B", 2.0, Some(50_000), Some(false)),
            mover("C", 8.0, Some(10_000), Some(false)),
        ];
        let news: HashSet<String> = ["A".to_string()].into_iter().collect();
        let thresholds = Thresholds {
            min_volume: 100_000,
            min_pct_change: 3.0,
        };

        let (tier, list) = shortlist(&pool, &thresholds);
        assert_eq!(tier, Tier::LiquidityOnly);
        assert_eq!(list.len(), 3);

        let ranking = rank(&pool, &news, &thresholds);
        assert_eq!(ranking.tier, Tier::LiquidityOnly);
        assert_eq!(ranking.picks.len(), 3);
        assert_eq!(ranking.picks[0].record.symbol, "A");
        assert!(ranking.picks[0].has_news);
    }

    #[test]
    fn test_liquidity_tier_sorted_by_turnover_and_capped() {
        let pool: Vec<MoverRecord> = (0..10)
            .map(|i| MoverRecord {
                turnover: if i == 0 { None } else { Some(i as f64) },
                ..MoverRecord::new(format!("S{i}"), 0.0)
            })
            .collect();

        let (tier, list) = shortlist(&pool, &Thresholds::default());
        assert_eq!(tier, Tier::LiquidityOnly);
        assert_eq!(list.len(), LIQUIDITY_TIER_LIMIT);
        assert_eq!(list[0].symbol, "S9");
        assert_eq!(list[7].symbol, "S2");
    }

    #[test]
    fn test_scoring_pool_capped_at_twelve() {
        let pool: Vec<MoverRecord> = (0..20)
            .map(|i| mover(&format!("S{i}"), 10.0 + i as f64, Some(1_000_000), None))
            .collect();

        let ranking = rank(&pool, &no_news(), &Thresholds::default());
        assert_eq!(ranking.tier, Tier::RelaxedFloat);
        // equal volumes rank by position, which favours the front of the pool
        assert_eq!(symbols(&ranking.picks), vec!["S0", "S1", "S2", "S3", "S4"]);

        let scored = score(&pool[..SCORING_POOL_LIMIT], &no_news());
        assert!((scored[0].trade_score - 0.5).abs() < EPSILON);
        assert!((scored[11].trade_score - 0.4).abs() < EPSILON);
    }

    #[test]
    fn test_score_ceiling() {
        let pool = vec![
            MoverRecord {
                turnover: Some(1_000.0),
                ..mover("BEST", 9.0, Some(500_000), Some(true))
            },
            MoverRecord {
                turnover: Some(1.0),
                ..mover("WORST", 1.0, Some(1), None)
            },
        ];
        let news: HashSet<String> = ["BEST".to_string()].into_iter().collect();

        let scored = score(&pool, &news);
        // 0.9 from the weighted ranks plus both bonuses
        assert!((scored[0].trade_score - MAX_TRADE_SCORE).abs() < EPSILON);
        assert!(scored[1].trade_score.abs() < EPSILON);
    }

    #[test]
    fn test_score_bounds_hold_for_any_pool() {
        let pool: Vec<MoverRecord> = (0..7)
            .map(|i| MoverRecord {
                turnover: Some((i * 37 % 5) as f64),
                ..mover(&format!("S{i}"), (i as f64) - 3.0, Some(i * 11 % 4), Some(i % 2 == 0))
            })
            .collect();
        let news: HashSet<String> = ["S1".to_string(), "S4".to_string()].into_iter().collect();

        for scored in score(&pool, &news) {
            assert!(scored.trade_score >= 0.0);
            assert!(scored.trade_score <= MAX_TRADE_SCORE + EPSILON);
        }
    }

    #[test]
    fn test_float_bonus_only_for_confirmed_low_float() {
        for (low_float, expected) in [(None, 0.9), (Some(false), 0.9), (Some(true), 1.0)] {
            let pool = vec![mover("ONLY", 1.0, Some(1), low_float)];
            let scored = score(&pool, &no_news());
            assert!((scored[0].trade_score - expected).abs() < EPSILON);
        }
    }

    #[test]
    fn test_picks_sorted_by_score() {
        let pool = vec![
            mover("LOW_ACTIVITY", 3.5, Some(120_000), None),
            mover("MID", 6.0, Some(300_000), None),
            mover("HOT", 12.0, Some(900_000), Some(true)),
            mover("NEWSY", 4.0, Some(150_000), None),
        ];
        let news: HashSet<String> = ["NEWSY".to_string()].into_iter().collect();

        let ranking = rank(&pool, &news, &Thresholds::default());
        assert_eq!(ranking.tier, Tier::RelaxedFloat);
        assert_eq!(symbols(&ranking.picks), vec!["HOT", "MID", "NEWSY", "LOW_ACTIVITY"]);
        assert!(ranking
            .picks
            .windows(2)
            .all(|w| w[0].trade_score >= w[1].trade_score));
    }

    #[test]
    fn test_small_pool_falls_back_to_activity_order() {
        let pool = vec![mover("QUIET", 9.0, Some(10), None), mover("BUSY", 1.0, Some(5_000), None)];

        let ranking = rank(&pool, &no_news(), &Thresholds::default());
        assert_eq!(ranking.tier, Tier::LiquidityOnly);
        assert_eq!(symbols(&ranking.picks), vec!["BUSY", "QUIET"]);
    }

    #[test]
    fn test_shortlist_minimum_size() {
        for size in 0..6 {
            let pool: Vec<MoverRecord> = (0..size).map(|i| mover(&format!("S{i}"), 0.0, None, None)).collect();
            let ranking = rank(&pool, &no_news(), &Thresholds::default());

            assert!(ranking.picks.len() >= size.min(MIN_TIER_SIZE));
            assert_eq!(ranking.picks.is_empty(), pool.is_empty());
        }
    }

    #[test]
    fn test_empty_pool() {
        let ranking = rank(&[], &no_news(), &Thresholds::default());
        assert!(ranking.picks.is_empty());
        assert_eq!(ranking.tier, Tier::LiquidityOnly);
    }
}
