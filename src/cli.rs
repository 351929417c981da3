//! Command-line interface parsing for Price Scout
//!
//! This module handles parsing of CLI arguments using clap and turns them into
//! the `ScoutConfig` the core runs with.

use clap::Parser;
use thiserror::Error;

use crate::config::ScoutConfig;

/// Languages the cross-border keyword can be translated into
pub const SUPPORTED_LANGS: [&str; 9] = ["en", "ja", "zh-CN", "zh-TW", "vi", "th", "de", "fr", "es"];

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The target language is not supported
    #[error("Invalid language: '{0}'. Valid languages: en, ja, zh-CN, zh-TW, vi, th, de, fr, es")]
    InvalidLanguage(String),
}

/// Price Scout - price trends, marketplace links and exchange rates for a product
#[derive(Parser, Debug)]
#[command(name = "pricescout")]
#[command(about = "Price trends, marketplace links and exchange rates for a product query")]
#[command(version)]
pub struct Cli {
    /// Product to look up
    ///
    /// Examples:
    ///   pricescout 아이폰 15
    ///   pricescout "galaxy s24" --target-lang ja
    #[arg(value_name = "QUERY", required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Published CSV with keyword, name, dates and prices columns
    #[arg(long, value_name = "URL", env = "PRICESCOUT_DATASET_URL")]
    pub dataset_url: Option<String>,

    /// Language for cross-border marketplace searches
    #[arg(long, value_name = "LANG", default_value = "en")]
    pub target_lang: String,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Returns the query words joined by single spaces
    pub fn query_text(&self) -> String {
        self.query.join(" ")
    }
}

/// Parses a language argument into its canonical code
///
/// Matching is case-insensitive, so `JA` and `zh-cn` are accepted.
pub fn parse_lang_arg(s: &str) -> Result<String, CliError> {
    SUPPORTED_LANGS
        .iter()
        .find(|lang| lang.eq_ignore_ascii_case(s.trim()))
        .map(|lang| lang.to_string())
        .ok_or_else(|| CliError::InvalidLanguage(s.to_string()))
}

impl ScoutConfig {
    /// Creates a ScoutConfig from parsed CLI arguments.
    ///
    /// # Returns
    /// * `Ok(ScoutConfig)` with defaults overridden by the arguments
    /// * `Err(CliError)` if an invalid language was specified
    pub fn from_cli(cli: &Cli) -> Result<Self, CliError> {
        let mut config = ScoutConfig::default().with_target_lang(parse_lang_arg(&cli.target_lang)?);
        if let Some(url) = &cli.dataset_url {
            config = config.with_dataset_url(url.clone());
        }
        Ok(config)
    }
}
