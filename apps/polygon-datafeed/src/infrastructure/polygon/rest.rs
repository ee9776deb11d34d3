//! Polygon REST Gateway
//!
//! HTTP adapter implementing [`MarketDataGateway`] against Polygon's
//! reference and aggregates endpoints. The API key travels as an `apiKey`
//! query parameter on every request.
//!
//! Endpoints:
//!
//! - `GET /v3/reference/tickers?search=...` — symbol search
//! - `GET /v3/reference/tickers/{ticker}` — symbol resolution
//! - `GET /v2/aggs/ticker/{ticker}/range/{m}/{timespan}/{from}/{to}` — bars

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::application::ports::{GatewayError, MarketDataGateway};
use crate::domain::bars::{Bar, Timespan};
use crate::domain::symbols::{
    DEFAULT_SESSION, DEFAULT_TIMEZONE, SymbolInfo, SymbolSearchResult,
};

use super::auth::ApiKey;
use super::messages::{AggregatesResponse, TickerDetailResponse, TickerListResponse, TickerRecord};

/// Default REST endpoint.
pub const DEFAULT_REST_URL: &str = "https://api.polygon.io";

/// Resolution tokens every resolved symbol advertises.
const SUPPORTED_RESOLUTIONS: [&str; 5] = ["1", "45", "60", "240", "1D"];

/// Maximum aggregate records requested per fetch.
const AGGREGATE_LIMIT: u32 = 50_000;

// =============================================================================
// REST Client
// =============================================================================

/// HTTP client for Polygon's pull-side endpoints.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: String,
    api_key: ApiKey,
}

impl RestClient {
    /// Create a new REST client.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: ApiKey) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            api_key,
        }
    }

    /// Client against the production endpoint.
    #[must_use]
    pub fn production(api_key: ApiKey) -> Self {
        Self::new(DEFAULT_REST_URL, api_key)
    }

    /// Issue a GET request and decode the JSON response body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GatewayError> {
        let url = format!("{}{path}", self.base_url);

        let response = self
            .http
            .get(&url)
            .query(query)
            .query(&[("apiKey", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::warn!(%status, %path, "provider request failed");
            return Err(GatewayError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl MarketDataGateway for RestClient {
    async fn search_symbols(
        &self,
        query: &str,
        limit: u32,
    ) -> Result<Vec<SymbolSearchResult>, GatewayError> {
        let response: TickerListResponse = self
            .get_json(
                "/v3/reference/tickers",
                &[
                    ("search", query.to_string()),
                    ("market", "stocks".to_string()),
                    ("active", "true".to_string()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(response
            .results
            .iter()
            .map(search_result_from_record)
            .collect())
    }

    async fn resolve_symbol(&self, ticker: &str) -> Result<SymbolInfo, GatewayError> {
        let response: TickerDetailResponse = self
            .get_json(&format!("/v3/reference/tickers/{ticker}"), &[])
            .await?;

        response
            .results
            .as_ref()
            .map(symbol_info_from_record)
            .ok_or_else(|| GatewayError::SymbolNotFound(ticker.to_string()))
    }

    async fn fetch_bars(
        &self,
        ticker: &str,
        multiplier: u32,
        timespan: Timespan,
        from_ms: i64,
        to_ms: i64,
    ) -> Result<Vec<Bar>, GatewayError> {
        let path = format!(
            "/v2/aggs/ticker/{ticker}/range/{multiplier}/{}/{from_ms}/{to_ms}",
            timespan.as_str()
        );

        let response: AggregatesResponse = self
            .get_json(
                &path,
                &[
                    ("adjusted", "true".to_string()),
                    ("sort", "asc".to_string()),
                    ("limit", AGGREGATE_LIMIT.to_string()),
                ],
            )
            .await?;

        tracing::debug!(
            ticker,
            count = response.results_count,
            from_ms,
            to_ms,
            "fetched aggregate bars"
        );

        Ok(response.results.iter().map(Bar::from).collect())
    }
}

// =============================================================================
// Record Mapping
// =============================================================================

fn search_result_from_record(record: &TickerRecord) -> SymbolSearchResult {
    SymbolSearchResult {
        symbol: record.ticker.clone(),
        full_name: record.ticker.clone(),
        description: record.name.clone(),
        exchange: record.primary_exchange.clone().unwrap_or_default(),
        ticker: record.ticker.clone(),
        symbol_type: record
            .ticker_type
            .clone()
            .unwrap_or_else(|| "stock".to_string()),
    }
}

fn symbol_info_from_record(record: &TickerRecord) -> SymbolInfo {
    SymbolInfo {
        name: record.ticker.clone(),
        ticker: record.ticker.clone(),
        description: record
            .description
            .clone()
            .unwrap_or_else(|| record.name.clone()),
        symbol_type: record
            .ticker_type
            .clone()
            .unwrap_or_else(|| "stock".to_string()),
        exchange: record.primary_exchange.clone().unwrap_or_default(),
        timezone: DEFAULT_TIMEZONE.to_string(),
        session: DEFAULT_SESSION.to_string(),
        pricescale: 100,
        minmov: 1,
        has_intraday: true,
        has_daily: true,
        sector: record.sic_description.clone(),
        supported_resolutions: SUPPORTED_RESOLUTIONS.iter().map(ToString::to_string).collect(),
    }
}
