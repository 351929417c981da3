//! Runtime configuration for Price Scout
//!
//! Holds every endpoint, cache lifetime, timeout and language setting the core
//! needs. The presentation layer builds one `ScoutConfig` and passes it in;
//! the core keeps no global settings of its own.

use chrono::Duration as CacheTtl;
use std::time::Duration;

/// Default USD-based exchange rate endpoint
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";

/// Default translation endpoint
pub const DEFAULT_TRANSLATE_URL: &str = "https://translate.googleapis.com/translate_a/single";

/// Configuration for sources, cache lifetimes and timeouts
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Published CSV with `keyword`, `name`, `dates`, `prices` columns
    pub dataset_url: Option<String>,
    /// Rate table endpoint against a USD base
    pub rates_url: String,
    /// Translation endpoint
    pub translate_url: String,
    /// Language for cross-border searches
    pub target_lang: String,
    /// How long a loaded dataset stays fresh
    pub dataset_ttl: CacheTtl,
    /// How long fetched exchange rates stay fresh
    pub rates_ttl: CacheTtl,
    /// Upper bound on the dataset download
    pub dataset_timeout: Duration,
    /// Upper bound on the rate lookup
    pub rates_timeout: Duration,
    /// Upper bound on a translation call
    pub translate_timeout: Duration,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            dataset_url: None,
            rates_url: DEFAULT_RATES_URL.to_string(),
            translate_url: DEFAULT_TRANSLATE_URL.to_string(),
            target_lang: "en".to_string(),
            dataset_ttl: CacheTtl::minutes(10),
            rates_ttl: CacheTtl::hours(1),
            dataset_timeout: Duration::from_secs(10),
            rates_timeout: Duration::from_secs(3),
            translate_timeout: Duration::from_secs(1),
        }
    }
}

impl ScoutConfig {
    /// Sets the dataset source
    pub fn with_dataset_url(mut self, url: impl Into<String>) -> Self {
        self.dataset_url = Some(url.into());
        self
    }

    /// Sets the exchange rate source
    pub fn with_rates_url(mut self, url: impl Into<String>) -> Self {
        self.rates_url = url.into();
        self
    }

    /// Sets the translation source
    pub fn with_translate_url(mut self, url: impl Into<String>) -> Self {
        self.translate_url = url.into();
        self
    }

    /// Sets the language for cross-border searches
    pub fn with_target_lang(mut self, lang: impl Into<String>) -> Self {
        self.target_lang = lang.into();
        self
    }

    /// Sets every outbound timeout to the same bound
    pub fn with_timeouts(mut self, timeout: Duration) -> Self {
        self.dataset_timeout = timeout;
        self.rates_timeout = timeout;
        self.translate_timeout = timeout;
        self
    }
}
