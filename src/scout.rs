//! Request orchestration for Price Scout
//!
//! `PriceScout` wires the TTL caches, the outbound clients, the trend matcher
//! and the fan-out builder together. Each lookup is a sequential chain of
//! point lookups and always produces a complete `ScoutReport`, degrading to
//! stale or fallback values when a source is unavailable.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::cache::{Cache, Clock, SystemClock, TtlCache};
use crate::config::ScoutConfig;
use crate::data::{
    DatasetCache, DatasetClient, ExchangeRates, PriceDataset, RatesCache, RatesClient,
    Translator, TrendRecord,
};
use crate::fanout::{build_fan_out, FanOutQuery, SearchLink};
use crate::matcher::match_trend;

/// Everything the presentation layer renders for one query
#[derive(Debug, Clone, Serialize)]
pub struct ScoutReport {
    /// Query as the user typed it
    pub query: String,
    /// Raw and translated keywords with their encoded forms
    pub fan_out: FanOutQuery,
    /// Marketplace search links built from the fan-out
    pub links: Vec<SearchLink>,
    /// Price history of the matched product, if any
    pub trend: Option<TrendRecord>,
    /// Current conversion rates, or the fallback pair
    pub rates: ExchangeRates,
}

/// Resolves product queries against cached external signals
pub struct PriceScout {
    /// Endpoints, lifetimes and languages
    config: ScoutConfig,
    /// Price dataset source, caching through `dataset_cache`
    dataset_client: DatasetClient,
    /// Exchange rate source, caching through `rates_cache`
    rates_client: RatesClient,
    /// Keyword translation source
    translator: Translator,
    dataset_cache: DatasetCache,
    rates_cache: RatesCache,
}

impl PriceScout {
    /// Creates a scout with fresh caches on the system clock
    pub fn new(config: ScoutConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a scout whose caches expire on `clock`
    pub fn with_clock(config: ScoutConfig, clock: Arc<dyn Clock>) -> Self {
        Self::with_caches(
            config,
            Arc::new(TtlCache::<Arc<PriceDataset>>::with_clock(clock.clone())),
            Arc::new(TtlCache::<ExchangeRates>::with_clock(clock)),
        )
    }

    /// Creates a scout around existing caches
    ///
    /// Lets several scouts (or a long-lived process) share cached signals, or
    /// swaps in another `Cache` implementation.
    pub fn with_caches(
        config: ScoutConfig,
        dataset_cache: DatasetCache,
        rates_cache: RatesCache,
    ) -> Self {
        let dataset_client =
            DatasetClient::new(config.dataset_url.clone(), config.dataset_timeout)
                .with_cache(dataset_cache.clone(), config.dataset_ttl);
        let rates_client = RatesClient::new(config.rates_url.clone(), config.rates_timeout)
            .with_cache(rates_cache.clone(), config.rates_ttl);

        Self {
            dataset_client,
            rates_client,
            translator: Translator::new(config.translate_url.clone(), config.translate_timeout),
            config,
            dataset_cache,
            rates_cache,
        }
    }

    /// Returns the active configuration
    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    /// Returns the price dataset, fresh, stale or empty
    pub async fn price_dataset(&self) -> Arc<PriceDataset> {
        self.dataset_client.fetch_price_dataset().await
    }

    /// Returns the exchange rates, fresh, stale or the default pair
    pub async fn exchange_rates(&self) -> ExchangeRates {
        self.rates_client.fetch_exchange_rates().await
    }

    /// Builds the raw and translated search fragments for `query`
    pub async fn fan_out(&self, query: &str) -> FanOutQuery {
        build_fan_out(query, &self.translator, &self.config.target_lang).await
    }

    /// Resolves `query` against the current dataset
    pub async fn match_trend(&self, query: &str) -> Option<TrendRecord> {
        let dataset = self.price_dataset().await;
        match_trend(query, &dataset)
    }

    /// Runs every lookup for `query` and collects the results
    pub async fn lookup(&self, query: &str) -> ScoutReport {
        let fan_out = self.fan_out(query).await;
        let trend = self.match_trend(query).await;
        let rates = self.exchange_rates().await;

        info!(
            query,
            translated = %fan_out.translated_keyword,
            matched = trend.is_some(),
            "Lookup complete"
        );

        ScoutReport {
            query: query.to_string(),
            links: fan_out.links(),
            fan_out,
            trend,
            rates,
        }
    }

    /// Drops cached signals so the next lookup refetches them
    pub fn invalidate(&self) {
        self.dataset_cache.invalidate(self.dataset_client.source());
        self.rates_cache.invalidate(self.rates_client.source());
    }
}
