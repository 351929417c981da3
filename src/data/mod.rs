//! Core data models for Price Scout
//!
//! This module contains the data types shared by the outbound clients, the
//! trend matcher and the fan-out builder: the price dataset, trend records,
//! exchange rates, and the error types for fetching and row parsing.

pub mod dataset;
pub mod rates;
pub mod translate;

pub use dataset::{parse_dataset, DatasetCache, DatasetClient};
pub use rates::{RatesCache, RatesClient};
pub use translate::{contains_source_script, Translator};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fallback USD to KRW rate when the rate source is unavailable
pub const DEFAULT_USD_TO_KRW: f64 = 1450.0;

/// Fallback KRW per 100 JPY when the rate source is unavailable
pub const DEFAULT_JPY_TO_KRW: f64 = 950.0;

/// Errors that can occur when talking to an external source
///
/// These never leave the core: every boundary converts them into a fallback
/// value after logging.
#[derive(Debug, Error)]
pub enum FetchError {
    /// HTTP request failed (connection, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Source answered with a non-success status
    #[error("Unexpected HTTP status: {0}")]
    Status(u16),

    /// Dataset body is not valid CSV
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// Response body is not the expected JSON
    #[error("Failed to parse JSON response: {0}")]
    Json(#[from] serde_json::Error),

    /// Dataset lacks a required column
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Rate table lacks a required currency
    #[error("Missing rate for currency: {0}")]
    MissingRate(String),

    /// Rate is zero, negative or not finite
    #[error("Invalid rate for {code}: {value}")]
    InvalidRate { code: String, value: f64 },

    /// No endpoint configured for this source
    #[error("No {0} source configured")]
    NotConfigured(&'static str),

    /// Translation response carried no text segment
    #[error("Translation response contained no text")]
    EmptyTranslation,
}

/// A dataset row that cannot become a trend record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RowError {
    /// A price token is not a number
    #[error("Price token is not numeric: '{token}'")]
    BadPrice { token: String },

    /// Dates and prices have different cardinality
    #[error("Row has {dates} dates but {prices} prices")]
    LengthMismatch { dates: usize, prices: usize },
}

/// A single row of the price dataset, kept verbatim
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRow {
    /// Match key for user queries
    pub keyword: String,
    /// Display name of the product
    pub name: String,
    /// Comma-delimited observation dates
    pub dates: String,
    /// Comma-delimited prices, one per date
    pub prices: String,
}

/// The price-trend dataset, rows in their stored order
///
/// An empty dataset is a valid value and is what every failed load yields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceDataset {
    rows: Vec<PriceRow>,
}

impl PriceDataset {
    /// Creates a dataset from rows in stored order
    pub fn new(rows: Vec<PriceRow>) -> Self {
        Self { rows }
    }

    /// Returns the number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the dataset has no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the row at `index`, if any
    pub fn get(&self, index: usize) -> Option<&PriceRow> {
        self.rows.get(index)
    }

    /// Iterates rows in stored order
    pub fn rows(&self) -> impl Iterator<Item = &PriceRow> {
        self.rows.iter()
    }
}

/// A matched product with its price history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    /// Display name of the product
    pub name: String,
    /// Observation dates, oldest first as stored
    pub dates: Vec<String>,
    /// Prices, one per date
    pub prices: Vec<f64>,
}

impl TrendRecord {
    /// Builds a trend record from a dataset row
    ///
    /// Splits `dates` and `prices` on commas. Rejects the row if any price
    /// token fails to parse or the two sequences differ in length, rather than
    /// truncating.
    pub fn from_row(row: &PriceRow) -> Result<Self, RowError> {
        let dates: Vec<String> = row
            .dates
            .split(',')
            .map(|token| token.trim().to_string())
            .collect();

        let prices = row
            .prices
            .split(',')
            .map(|token| {
                let token = token.trim();
                token
                    .parse::<f64>()
                    .ok()
                    .filter(|price| price.is_finite())
                    .ok_or_else(|| RowError::BadPrice {
                        token: token.to_string(),
                    })
            })
            .collect::<Result<Vec<f64>, RowError>>()?;

        if dates.len() != prices.len() {
            return Err(RowError::LengthMismatch {
                dates: dates.len(),
                prices: prices.len(),
            });
        }

        Ok(Self {
            name: row.name.trim().to_string(),
            dates,
            prices,
        })
    }

    /// Returns the most recent price
    pub fn latest(&self) -> Option<f64> {
        self.prices.last().copied()
    }

    /// Returns the lowest recorded price
    pub fn lowest(&self) -> Option<f64> {
        self.prices.iter().copied().reduce(f64::min)
    }

    /// Returns the highest recorded price
    pub fn highest(&self) -> Option<f64> {
        self.prices.iter().copied().reduce(f64::max)
    }

    /// Returns the relative change from the first to the last price
    ///
    /// `-0.1` means the price dropped by 10%. Returns `None` with fewer than
    /// two prices or a zero starting price.
    pub fn change_ratio(&self) -> Option<f64> {
        if self.prices.len() < 2 {
            return None;
        }
        let first = *self.prices.first()?;
        let last = *self.prices.last()?;
        if first == 0.0 {
            return None;
        }
        Some((last - first) / first)
    }
}

/// Currency conversion rates into KRW
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    /// KRW per 1 USD
    pub usd_to_krw: f64,
    /// KRW per 100 JPY
    pub jpy_to_krw: f64,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self {
            usd_to_krw: DEFAULT_USD_TO_KRW,
            jpy_to_krw: DEFAULT_JPY_TO_KRW,
        }
    }
}

impl ExchangeRates {
    /// Derives rates from a USD-based table
    ///
    /// `jpy_to_krw` is quoted per 100 yen: `usd_to_krw / usd_to_jpy * 100`.
    pub fn from_usd_base(usd_to_krw: f64, usd_to_jpy: f64) -> Result<Self, FetchError> {
        let usd_to_krw = positive_rate("KRW", usd_to_krw)?;
        let usd_to_jpy = positive_rate("JPY", usd_to_jpy)?;
        let jpy_to_krw = positive_rate("JPY/KRW", usd_to_krw / usd_to_jpy * 100.0)?;
        Ok(Self {
            usd_to_krw,
            jpy_to_krw,
        })
    }

    /// Converts a USD amount to KRW
    pub fn usd_to_krw(&self, amount: f64) -> f64 {
        amount * self.usd_to_krw
    }

    /// Converts a JPY amount to KRW
    pub fn jpy_to_krw(&self, amount: f64) -> f64 {
        amount * self.jpy_to_krw / 100.0
    }

    /// Returns true if these are the fixed fallback rates
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

fn positive_rate(code: &str, value: f64) -> Result<f64, FetchError> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(FetchError::InvalidRate {
            code: code.to_string(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(keyword: &str, dates: &str, prices: &str) -> PriceRow {
        PriceRow {
            keyword: keyword.to_string(),
            name: format!("{} name", keyword),
            dates: dates.to_string(),
            prices: prices.to_string(),
        }
    }

    #[test]
    fn test_trend_record_from_valid_row() {
        let record = TrendRecord::from_row(&row("아이폰15", "d1,d2,d3", "100,95,90"))
            .expect("Row should parse");

        assert_eq!(record.name, "아이폰15 name");
        assert_eq!(record.dates, vec!["d1", "d2", "d3"]);
        assert_eq!(record.prices, vec![100.0, 95.0, 90.0]);
    }

    #[test]
    fn test_trend_record_trims_tokens() {
        let record = TrendRecord::from_row(&row("x", " 2024-01 , 2024-02 ", " 1.5 , 2 "))
            .expect("Row should parse");

        assert_eq!(record.dates, vec!["2024-01", "2024-02"]);
        assert_eq!(record.prices, vec![1.5, 2.0]);
    }

    #[test]
    fn test_trend_record_rejects_non_numeric_price() {
        let result = TrendRecord::from_row(&row("x", "d1,d2,d3", "100,abc,90"));

        assert_eq!(
            result,
            Err(RowError::BadPrice {
                token: "abc".to_string()
            })
        );
    }

    #[test]
    fn test_trend_record_rejects_empty_prices() {
        let result = TrendRecord::from_row(&row("x", "d1", ""));
        assert!(matches!(result, Err(RowError::BadPrice { .. })));
    }

    #[test]
    fn test_trend_record_rejects_length_mismatch() {
        let result = TrendRecord::from_row(&row("x", "d1,d2", "100,95,90"));

        assert_eq!(
            result,
            Err(RowError::LengthMismatch {
                dates: 2,
                prices: 3
            })
        );
    }

    #[test]
    fn test_trend_record_rejects_nan_price() {
        let result = TrendRecord::from_row(&row("x", "d1", "NaN"));
        assert!(result.is_err());
    }

    #[test]
    fn test_trend_summary() {
        let record = TrendRecord::from_row(&row("x", "d1,d2,d3,d4", "200,180,220,150"))
            .expect("Row should parse");

        assert_eq!(record.latest(), Some(150.0));
        assert_eq!(record.lowest(), Some(150.0));
        assert_eq!(record.highest(), Some(220.0));
        assert!((record.change_ratio().unwrap() - (-0.25)).abs() < 1e-9);
    }

    #[test]
    fn test_change_ratio_needs_two_prices() {
        let record = TrendRecord::from_row(&row("x", "d1", "100")).unwrap();
        assert!(record.change_ratio().is_none());

        let zero_start = TrendRecord::from_row(&row("x", "d1,d2", "0,100")).unwrap();
        assert!(zero_start.change_ratio().is_none());
    }

    #[test]
    fn test_dataset_accessors() {
        let dataset = PriceDataset::new(vec![row("a", "d1", "1"), row("b", "d1", "2")]);

        assert_eq!(dataset.len(), 2);
        assert!(!dataset.is_empty());
        assert_eq!(dataset.get(1).map(|r| r.keyword.as_str()), Some("b"));
        assert!(dataset.get(2).is_none());
        assert!(PriceDataset::default().is_empty());
    }

    #[test]
    fn test_exchange_rates_default() {
        let rates = ExchangeRates::default();
        assert_eq!(rates.usd_to_krw, 1450.0);
        assert_eq!(rates.jpy_to_krw, 950.0);
        assert!(rates.is_default());
    }

    #[test]
    fn test_exchange_rates_from_usd_base() {
        let rates = ExchangeRates::from_usd_base(1400.0, 150.0).expect("Rates should be valid");

        assert_eq!(rates.usd_to_krw, 1400.0);
        assert!((rates.jpy_to_krw - 933.333_333).abs() < 1e-3);
        assert!(!rates.is_default());
    }

    #[test]
    fn test_exchange_rates_reject_non_positive() {
        assert!(matches!(
            ExchangeRates::from_usd_base(0.0, 150.0),
            Err(FetchError::InvalidRate { .. })
        ));
        assert!(matches!(
            ExchangeRates::from_usd_base(1400.0, -1.0),
            Err(FetchError::InvalidRate { .. })
        ));
        assert!(ExchangeRates::from_usd_base(f64::INFINITY, 150.0).is_err());
    }

    #[test]
    fn test_exchange_rates_reject_derived_rate_out_of_range() {
        // Both inputs are valid but the cross rate underflows to zero or overflows
        assert!(matches!(
            ExchangeRates::from_usd_base(1e-300, 1e300),
            Err(FetchError::InvalidRate { ref code, .. }) if code == "JPY/KRW"
        ));
        assert!(matches!(
            ExchangeRates::from_usd_base(1e300, 1e-300),
            Err(FetchError::InvalidRate { ref code, .. }) if code == "JPY/KRW"
        ));
    }

    #[test]
    fn test_exchange_rate_conversions() {
        let rates = ExchangeRates {
            usd_to_krw: 1400.0,
            jpy_to_krw: 900.0,
        };

        assert!((rates.usd_to_krw(2.5) - 3500.0).abs() < 1e-9);
        assert!((rates.jpy_to_krw(1000.0) - 9000.0).abs() < 1e-9);
    }

    #[test]
    fn test_trend_record_serialization_roundtrip() {
        let original = TrendRecord::from_row(&row("x", "d1,d2", "10,20")).unwrap();
        let json = serde_json::to_string(&original).expect("Should serialize");
        let restored: TrendRecord = serde_json::from_str(&json).expect("Should deserialize");
        assert_eq!(original, restored);
    }
}
