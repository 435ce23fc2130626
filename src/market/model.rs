use serde::{Deserialize, Serialize};

/// One row scraped from a mover table, before symbol normalization
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    /// Ticker as printed by the exchange (e.g., "XYZ.N0000")
    pub symbol: String,

    /// Percentage change, `None` when the cell did not parse
    pub pct: Option<f64>,

    /// Last traded price
    pub price: Option<f64>,

    /// Shares traded today
    pub volume: Option<u64>,

    /// Value traded today in LKR
    pub turnover: Option<f64>,
}

/// Canonical mover record, one per normalized symbol
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoverRecord {
    /// Canonical ticker (unique within a pool)
    pub symbol: String,

    /// Percentage change; missing upstream values are stored as 0
    pub pct: f64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub volume: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub turnover: Option<f64>,

    /// `None` means float status is unknown or was never evaluated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low_float: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub float_shares: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub shares_outstanding: Option<f64>,
}

impl MoverRecord {
    /// Create a bare record with only a symbol and change
    pub fn new(symbol: impl Into<String>, pct: f64) -> Self {
        Self {
            symbol: symbol.into(),
            pct,
            ..Default::default()
        }
    }

    /// Confirmed low float. Unknown status is not low float here.
    pub fn is_low_float(&self) -> bool {
        self.low_float == Some(true)
    }

    /// Attach float figures and the classification derived from them
    pub fn apply_float(&mut self, info: Option<&FloatInfo>, low_float: Option<bool>) {
        self.low_float = low_float;
        self.float_shares = info.and_then(|i| i.float_shares);
        self.shares_outstanding = info.and_then(|i| i.shares_outstanding);
    }
}

/// Float figures returned by a float lookup
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FloatInfo {
    pub float_shares: Option<f64>,
    pub shares_outstanding: Option<f64>,
    /// Lookup symbol that produced the figures
    pub source: Option<String>,
}

/// A mover with its composite ranking score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoredMover {
    #[serde(flatten)]
    pub record: MoverRecord,

    /// Weighted rank score plus flat bonuses, in [0, 1.1]
    pub trade_score: f64,

    /// Whether a news item mentions this symbol
    pub has_news: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_float_unknown_is_not_confirmed() {
        let mut record = MoverRecord::new("LOLC.N", 4.2);
        assert!(!record.is_low_float());

        record.low_float = Some(false);
        assert!(!record.is_low_float());

        record.low_float = Some(true);
        assert!(record.is_low_float());
    }

    #[test]
    fn test_apply_float_without_info_clears_figures() {
        let mut record = MoverRecord::new("JKH.N", 1.0);
        record.float_shares = Some(1.0);
        record.apply_float(None, None);

        assert!(record.low_float.is_none());
        assert!(record.float_shares.is_none());
        assert!(record.shares_outstanding.is_none());
    }

    #[test]
    fn test_scored_mover_serializes_flat() {
        let scored = ScoredMover {
            record: MoverRecord {
                volume: Some(1200),
                low_float: Some(true),
                ..MoverRecord::new("HAYL.N", 5.0)
            },
            trade_score: 0.9,
            has_news: true,
        };

        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["symbol"], "HAYL.N");
        assert_eq!(json["volume"], 1200);
        assert_eq!(json["lowFloat"], true);
        assert_eq!(json["hasNews"], true);
        assert!(json.get("turnover").is_none());
    }
}
