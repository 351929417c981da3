//! Exchange rate client
//!
//! Fetches a USD-based rate table and derives KRW conversion rates for USD
//! and JPY. Any failure yields the fixed fallback rates.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use super::{ExchangeRates, FetchError};
use crate::cache::{get_or_stale, Cache};

/// Shared store for fetched rates
pub type RatesCache = Arc<dyn Cache<ExchangeRates>>;

/// Rate table response, keyed by currency code
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// Client for fetching currency conversion rates
#[derive(Clone)]
pub struct RatesClient {
    /// HTTP client for making requests
    http_client: Client,
    /// USD-based rate table endpoint
    base_url: String,
    /// Upper bound on the lookup
    timeout: Duration,
    /// Optional cache with the lifetime of fetched rates
    cache: Option<(RatesCache, chrono::Duration)>,
}

impl RatesClient {
    /// Creates a client for the given endpoint
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(Client::new(), base_url, timeout)
    }

    /// Creates a client with a custom HTTP client
    pub fn with_client(http_client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            timeout,
            cache: None,
        }
    }

    /// Keeps fetched rates in `cache` for `ttl`
    pub fn with_cache(mut self, cache: RatesCache, ttl: chrono::Duration) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    /// Source identifier used as the cache key
    pub fn source(&self) -> &str {
        &self.base_url
    }

    /// Fetches rates, never failing
    ///
    /// Fresh cached rates are served without a request. A failed refresh
    /// serves the expired cached rates if held, else the fixed defaults.
    pub async fn fetch_exchange_rates(&self) -> ExchangeRates {
        let result = match &self.cache {
            Some((cache, ttl)) => {
                get_or_stale(cache.as_ref(), self.source(), *ttl, move || self.fetch_rates()).await
            }
            None => self.fetch_rates().await,
        };

        match result {
            Ok(rates) => rates,
            Err(e) => {
                warn!(url = %self.base_url, error = %e, "Failed to fetch exchange rates, using defaults");
                ExchangeRates::default()
            }
        }
    }

    /// Fetches rates, reporting why it failed
    pub async fn fetch_rates(&self) -> Result<ExchangeRates, FetchError> {
        let response = self
            .http_client
            .get(&self.base_url)
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        let text = response.text().await?;
        let table: RatesResponse = serde_json::from_str(&text)?;

        let rates = parse_rates(&table.rates)?;
        debug!(
            usd_to_krw = rates.usd_to_krw,
            jpy_to_krw = rates.jpy_to_krw,
            "Fetched exchange rates"
        );
        Ok(rates)
    }
}

/// Derives KRW rates from a USD-based table
fn parse_rates(table: &HashMap<String, f64>) -> Result<ExchangeRates, FetchError> {
    let rate = |code: &str| {
        table
            .get(code)
            .copied()
            .ok_or_else(|| FetchError::MissingRate(code.to_string()))
    };
    ExchangeRates::from_usd_base(rate("KRW")?, rate("JPY")?)
}
