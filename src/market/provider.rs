use async_trait::async_trait;

use super::model::{FloatInfo, RawRow};

/// Error types for market data operations
#[derive(Debug, thiserror::Error)]
pub enum MarketDataError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Upstream answered with a non-success status
    #[error("HTTP {status} from {url}")]
    HttpStatus { status: u16, url: String },

    /// Failed to parse response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<reqwest::Error> for MarketDataError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_decode() {
            MarketDataError::ParseError(error.to_string())
        } else {
            MarketDataError::NetworkError(error.to_string())
        }
    }
}

/// Source of the two raw mover tables published by the exchange
#[async_trait]
pub trait MoverSource: Send + Sync {
    /// Get the source name
    fn name(&self) -> &str;

    /// Percentage-gainers table
    async fn gainers(&self) -> Result<Vec<RawRow>, MarketDataError>;

    /// Most-active-by-volume table
    async fn active(&self) -> Result<Vec<RawRow>, MarketDataError>;
}

/// Looks up float figures for one concrete symbol format.
///
/// `Ok(None)` means the provider answered but has no figures for the symbol.
#[async_trait]
pub trait FloatProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self, candidate: &str) -> Result<Option<FloatInfo>, MarketDataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = MarketDataError::HttpStatus {
            status: 503,
            url: "https://www.cse.lk/x".to_string(),
        };
        assert_eq!(format!("{}", error), "HTTP 503 from https://www.cse.lk/x");

        let error = MarketDataError::ConfigError("No TELEGRAM_CHAT_IDS set".to_string());
        assert_eq!(
            format!("{}", error),
            "Configuration error: No TELEGRAM_CHAT_IDS set"
        );
    }
}
