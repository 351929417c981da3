//! Price dataset client
//!
//! Downloads the published price-trend CSV and parses it into a
//! `PriceDataset`. Headers are trimmed and matched case-insensitively; extra
//! columns are ignored.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, warn};

use super::{FetchError, PriceDataset, PriceRow};
use crate::cache::{get_or_stale, Cache};

/// Columns every dataset must carry
const REQUIRED_COLUMNS: [&str; 4] = ["keyword", "name", "dates", "prices"];

/// Shared store for loaded datasets
pub type DatasetCache = Arc<dyn Cache<Arc<PriceDataset>>>;

/// Client for loading the price dataset
#[derive(Clone)]
pub struct DatasetClient {
    /// HTTP client for making requests
    http_client: Client,
    /// Published CSV location
    url: Option<String>,
    /// Upper bound on the download
    timeout: Duration,
    /// Optional cache with the lifetime of a loaded dataset
    cache: Option<(DatasetCache, chrono::Duration)>,
}

impl DatasetClient {
    /// Creates an uncached client for the given source
    pub fn new(url: Option<String>, timeout: Duration) -> Self {
        Self::with_client(Client::new(), url, timeout)
    }

    /// Creates an uncached client with a custom HTTP client
    pub fn with_client(http_client: Client, url: Option<String>, timeout: Duration) -> Self {
        Self {
            http_client,
            url,
            timeout,
            cache: None,
        }
    }

    /// Keeps loaded datasets in `cache` for `ttl`
    pub fn with_cache(mut self, cache: DatasetCache, ttl: chrono::Duration) -> Self {
        self.cache = Some((cache, ttl));
        self
    }

    /// Source identifier used as the cache key
    pub fn source(&self) -> &str {
        self.url.as_deref().unwrap_or("dataset")
    }

    /// Loads the dataset, never failing
    ///
    /// - Serves a fresh cached dataset without a download
    /// - Otherwise downloads, caching the result on success
    /// - On failure serves the expired cached dataset if one is held
    /// - Falls back to an empty dataset when nothing is held
    pub async fn fetch_price_dataset(&self) -> Arc<PriceDataset> {
        let result = match &self.cache {
            Some((cache, ttl)) => {
                get_or_stale(cache.as_ref(), self.source(), *ttl, move || self.load()).await
            }
            None => self.load().await,
        };

        match result {
            Ok(dataset) => dataset,
            Err(FetchError::NotConfigured(_)) => {
                debug!("No dataset source configured, using empty dataset");
                Arc::default()
            }
            Err(e) => {
                warn!(source = self.source(), error = %e, "Failed to load price dataset");
                Arc::default()
            }
        }
    }

    async fn load(&self) -> Result<Arc<PriceDataset>, FetchError> {
        Ok(Arc::new(self.fetch_dataset().await?))
    }

    /// Loads the dataset, reporting why it failed
    pub async fn fetch_dataset(&self) -> Result<PriceDataset, FetchError> {
        let url = self
            .url
            .as_deref()
            .ok_or(FetchError::NotConfigured("dataset"))?;

        let response = self
            .http_client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        let text = response.text().await?;
        let dataset = parse_dataset(&text)?;

        debug!(url, rows = dataset.len(), "Loaded price dataset");
        Ok(dataset)
    }
}

/// Parses CSV text into a dataset
///
/// A header-only body yields an empty dataset. Records shorter than the header
/// read their missing fields as empty strings.
pub fn parse_dataset(text: &str) -> Result<PriceDataset, FetchError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|header| header.trim().to_lowercase())
        .collect();

    let mut positions = [0usize; 4];
    for (slot, column) in positions.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = headers
            .iter()
            .position(|header| header == column)
            .ok_or_else(|| FetchError::MissingColumn(column.to_string()))?;
    }
    let [keyword, name, dates, prices] = positions;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |index: usize| record.get(index).unwrap_or_default().to_string();
        rows.push(PriceRow {
            keyword: field(keyword),
            name: field(name),
            dates: field(dates),
            prices: field(prices),
        });
    }

    Ok(PriceDataset::new(rows))
}
