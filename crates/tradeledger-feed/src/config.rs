//! Feed endpoints and timeouts.

use std::time::Duration;

/// Public bitcoincharts API root.
pub const DEFAULT_BASE_URL: &str = "https://api.bitcoincharts.com/v1";

/// Configuration for [`crate::HttpFeed`].
#[derive(Debug, Clone)]
pub struct FeedConfig {
    /// JSON market listing.
    pub markets_url: String,

    /// JSON weighted price snapshot.
    pub weighted_url: String,

    /// CSV trade delta, queried with `symbol` and `start`.
    pub trades_url: String,

    /// Directory of `<symbol>.csv.gz` full histories.
    pub history_url: String,

    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,

    /// Timeout for receiving response headers, and for reading a whole JSON body.
    pub request_timeout: Duration,

    /// Timeout for each body chunk of a CSV stream.
    pub read_timeout: Duration,

    pub user_agent: String,
}

impl FeedConfig {
    /// Endpoints laid out the bitcoincharts way under `base`.
    pub fn with_base_url(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            markets_url: format!("{base}/markets.json"),
            weighted_url: format!("{base}/weighted_prices.json"),
            trades_url: format!("{base}/trades.csv"),
            history_url: format!("{base}/csv"),
            ..Self::default()
        }
    }
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            markets_url: format!("{DEFAULT_BASE_URL}/markets.json"),
            weighted_url: format!("{DEFAULT_BASE_URL}/weighted_prices.json"),
            trades_url: format!("{DEFAULT_BASE_URL}/trades.csv"),
            history_url: format!("{DEFAULT_BASE_URL}/csv"),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            user_agent: concat!("tradeledger/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}
