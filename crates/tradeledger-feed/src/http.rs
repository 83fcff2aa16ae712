//! HTTP implementation of [`RemoteFeed`].

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use tradeledger_core::{MarketListing, WeightedPrices};

use crate::config::FeedConfig;
use crate::decode::{Encoding, RecordStream};
use crate::error::{FeedError, Result};
use crate::remote::RemoteFeed;
use crate::source::ByteSource;

/// Feed client over HTTP.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpFeed {
    client: Client,
    config: FeedConfig,
}

impl HttpFeed {
    pub fn new(config: FeedConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.clone())
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    async fn get(&self, url: Url) -> Result<Response> {
        debug!(%url, "GET");
        let response = bounded(
            self.config.request_timeout,
            url.as_str(),
            self.client.get(url.clone()).send(),
        )
        .await??;
        Ok(response.error_for_status()?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self.get(parse_url(url, &[])?).await?;
        Ok(bounded(self.config.request_timeout, url, response.json::<T>()).await??)
    }

    async fn get_stream(&self, label: String, url: Url, encoding: Encoding) -> Result<RecordStream> {
        let body = HttpBody {
            url: url.to_string(),
            read_timeout: self.config.read_timeout,
            response: self.get(url).await?,
        };
        Ok(RecordStream::new(label, Box::new(body), encoding))
    }
}

#[async_trait]
impl RemoteFeed for HttpFeed {
    async fn markets(&self) -> Result<Vec<MarketListing>> {
        self.get_json(&self.config.markets_url).await
    }

    async fn weighted_prices(&self) -> Result<WeightedPrices> {
        self.get_json(&self.config.weighted_url).await
    }

    async fn trades(&self, symbol: &str, start: i64) -> Result<RecordStream> {
        let start = start.to_string();
        let url = parse_url(
            &self.config.trades_url,
            &[("symbol", symbol), ("start", start.as_str())],
        )?;
        self.get_stream(format!("trades {symbol}"), url, Encoding::Plain)
            .await
    }

    async fn history(&self, symbol: &str) -> Result<RecordStream> {
        let url = format!(
            "{}/{}.csv.gz",
            self.config.history_url.trim_end_matches('/'),
            symbol
        );
        let url = parse_url(&url, &[])?;
        self.get_stream(format!("history {symbol}"), url, Encoding::Gzip)
            .await
    }
}

/// A response body read chunk by chunk, each read bounded by a timeout.
struct HttpBody {
    url: String,
    read_timeout: Duration,
    response: Response,
}

#[async_trait]
impl ByteSource for HttpBody {
    async fn next_chunk(&mut self) -> Result<Option<Bytes>> {
        Ok(bounded(self.read_timeout, &self.url, self.response.chunk()).await??)
    }
}

async fn bounded<F: Future>(timeout: Duration, url: &str, fut: F) -> Result<F::Output> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| FeedError::Timeout {
            url: url.to_owned(),
            timeout,
        })
}

fn parse_url(url: &str, params: &[(&str, &str)]) -> Result<Url> {
    let parsed = if params.is_empty() {
        Url::parse(url)
    } else {
        Url::parse_with_params(url, params)
    };
    parsed.map_err(|e| FeedError::InvalidUrl {
        url: url.to_owned(),
        reason: e.to_string(),
    })
}
