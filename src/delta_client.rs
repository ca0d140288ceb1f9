use anyhow::{Context, Result};
use reqwest::{Client, header};
use tracing::debug;

use crate::config;
use crate::error::DeltaError;
use crate::models::{CandleResponse, ListResponse, Product, Ticker};

/// Lookback window for the history endpoint, in Unix seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct CandleQuery {
    pub resolution: String,
    pub start: i64,
    pub end: i64,
}

/// Read-only exchange endpoints the harvest run depends on.
#[allow(async_fn_in_trait)]
pub trait ExchangeApi {
    async fn fetch_tickers(&self) -> Result<Vec<Ticker>>;

    async fn fetch_products(&self) -> Result<Vec<Product>>;

    async fn fetch_candles(&self, symbol: &str, query: &CandleQuery) -> Result<CandleResponse>;

    /// Spot price of `symbol` from the ticker listing.
    async fn fetch_spot_price(&self, symbol: &str) -> Result<f64> {
        let tickers = self.fetch_tickers().await.context("Failed to fetch tickers")?;
        Ok(find_spot_price(&tickers, symbol)?)
    }
}

/// Find the spot price of `symbol` in a ticker listing.
pub fn find_spot_price(tickers: &[Ticker], symbol: &str) -> Result<f64, DeltaError> {
    let ticker = tickers
        .iter()
        .find(|t| t.symbol == symbol)
        .ok_or_else(|| DeltaError::TickerNotFound(symbol.to_string()))?;

    match &ticker.spot_price {
        Some(price) => price.as_f64("spot_price"),
        None => Err(DeltaError::InvalidNumber {
            field: "spot_price",
            value: "null".to_string(),
        }),
    }
}

// -----------------------------------------------
// CLIENT
// -----------------------------------------------
pub struct DeltaClient {
    client: Client,
    base_url: String,
}

impl DeltaClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and return the body. Non-2xx statuses are errors.
    async fn fetch_json(&self, url: &str) -> Result<String, DeltaError> {
        let res = self.client.get(url).send().await?;
        let status = res.status();
        debug!(url, status = status.as_u16(), "response");

        let text = res.text().await?;
        if !status.is_success() {
            let preview: String = text.chars().take(200).collect();
            return Err(DeltaError::Request(format!("{} from {}: {}", status, url, preview)));
        }

        Ok(text)
    }
}

impl ExchangeApi for DeltaClient {
    async fn fetch_tickers(&self) -> Result<Vec<Ticker>> {
        let text = self
            .fetch_json(&config::tickers_url(&self.base_url))
            .await
            .context("Failed to fetch tickers")?;
        let listing: ListResponse<Ticker> = serde_json::from_str(&text)
            .map_err(DeltaError::from)
            .context("Failed to parse tickers")?;

        Ok(listing.result)
    }

    async fn fetch_products(&self) -> Result<Vec<Product>> {
        let text = self
            .fetch_json(&config::products_url(&self.base_url))
            .await
            .context("Failed to fetch products")?;
        let listing: ListResponse<Product> = serde_json::from_str(&text)
            .map_err(DeltaError::from)
            .context("Failed to parse products")?;

        Ok(listing.result)
    }

    /// The status code is not checked: error bodies still carry
    /// `success: false` and are skipped by the caller.
    async fn fetch_candles(&self, symbol: &str, query: &CandleQuery) -> Result<CandleResponse> {
        let url = config::history_candles_url(
            &self.base_url,
            symbol,
            &query.resolution,
            query.start,
            query.end,
        );

        let res = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(DeltaError::from)
            .with_context(|| format!("Candle request failed for {}", symbol))?;
        debug!(symbol, status = res.status().as_u16(), "candle response");

        let text = res.text().await.map_err(DeltaError::from)?;
        let response: CandleResponse = serde_json::from_str(&text)
            .map_err(DeltaError::from)
            .with_context(|| format!("Failed to parse candles for {}", symbol))?;

        Ok(response)
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.insert(header::ACCEPT, header::HeaderValue::from_static(config::HEADER_ACCEPT_JSON));

    Client::builder()
        .default_headers(headers)
        .gzip(true)
        .user_agent(config::USER_AGENT)
        .timeout(config::HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}
