use super::model::FloatInfo;
use super::provider::{FloatProvider, MarketDataError};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_QUOTE_SUMMARY_URL: &str = "https://query1.finance.yahoo.com/v10/finance/quoteSummary";

const USER_AGENT: &str = "cse-movers/1.0";

/// Yahoo Finance float provider using the quoteSummary endpoint
pub struct YahooFloatProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooFloatProvider {
    pub fn new(base_url: impl Into<String>) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url_for(&self, candidate: &str) -> String {
        format!(
            "{}/{}?modules=defaultKeyStatistics%2Cprice",
            self.base_url,
            urlencoding::encode(candidate)
        )
    }
}

#[async_trait]
impl FloatProvider for YahooFloatProvider {
    fn name(&self) -> &str {
        "Yahoo Finance"
    }

    async fn fetch(&self, candidate: &str) -> Result<Option<FloatInfo>, MarketDataError> {
        let url = self.url_for(candidate);
        log::debug!("Fetching float figures: {url}");

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            // Yahoo answers 404 for unknown symbols; treat every non-2xx as "no figures"
            log::debug!("Yahoo returned {} for {candidate}", response.status());
            return Ok(None);
        }

        let body: Value = response.json().await?;
        Ok(parse_quote_summary(&body, candidate))
    }
}

/// Extract float figures from a quoteSummary response body
pub fn parse_quote_summary(body: &Value, candidate: &str) -> Option<FloatInfo> {
    let stats = body.pointer("/quoteSummary/result/0/defaultKeyStatistics")?;
    let float_shares = share_count(stats.get("floatShares"));
    let shares_outstanding = share_count(stats.get("sharesOutstanding"));

    if float_shares.is_none() && shares_outstanding.is_none() {
        return None;
    }

    Some(FloatInfo {
        float_shares,
        shares_outstanding,
        source: Some(candidate.to_string()),
    })
}

/// Accepts `{"raw": n, "fmt": ...}` or a bare number. Zero means unknown.
fn share_count(field: Option<&Value>) -> Option<f64> {
    let field = field?;
    field
        .get("raw")
        .and_then(Value::as_f64)
        .or_else(|| field.as_f64())
        .filter(|n| *n > 0.0)
}
