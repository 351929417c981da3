//! Best-effort keyword translation
//!
//! Translates Korean queries into the cross-border search language. Queries
//! without Hangul are returned untouched with no network call, and any
//! failure returns the original text.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;
use tracing::{debug, warn};

use super::FetchError;

/// Language queries are typed in
const SOURCE_LANG: &str = "ko";

/// Returns true if `text` contains Hangul syllables or compatibility jamo
pub fn contains_source_script(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{3131}'..='\u{318E}'))
}

/// Client for translating search keywords
#[derive(Debug, Clone)]
pub struct Translator {
    /// HTTP client for making requests
    http_client: Client,
    /// Translation endpoint
    base_url: String,
    /// Upper bound on a single call
    timeout: Duration,
}

impl Translator {
    /// Creates a translator for the given endpoint
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(Client::new(), base_url, timeout)
    }

    /// Creates a translator with a custom HTTP client
    pub fn with_client(http_client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            timeout,
        }
    }

    /// Translates `text` into `target_lang`, or returns it unchanged
    ///
    /// Never fails: text without Hangul is returned as-is, and a timeout,
    /// error status or malformed response also yields the original text.
    pub async fn translate(&self, text: &str, target_lang: &str) -> String {
        if !contains_source_script(text) {
            return text.to_string();
        }

        match self.try_translate(text, target_lang).await {
            Ok(translated) => translated,
            Err(e) => {
                warn!(text, target_lang, error = %e, "Translation failed, keeping original keyword");
                text.to_string()
            }
        }
    }

    /// Issues one translation request, reporting why it failed
    pub async fn try_translate(&self, text: &str, target_lang: &str) -> Result<String, FetchError> {
        let response = self
            .http_client
            .get(&self.base_url)
            .query(&[
                ("client", "gtx"),
                ("sl", SOURCE_LANG),
                ("tl", target_lang),
                ("dt", "t"),
                ("q", text),
            ])
            .timeout(self.timeout)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        let text_body = response.text().await?;
        let body: Value = serde_json::from_str(&text_body)?;

        let translated = first_segment(&body).ok_or(FetchError::EmptyTranslation)?;
        debug!(original = text, translated, "Translated keyword");
        Ok(translated.to_string())
    }
}

/// Extracts the first translated segment from a nested response
///
/// The response looks like `[[["iPhone 15", "아이폰 15", ...], ...], ...]`.
fn first_segment(body: &Value) -> Option<&str> {
    body.get(0)?
        .get(0)?
        .get(0)?
        .as_str()
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}
