//! Query fan-out to marketplace destinations
//!
//! Turns one raw keyword into the encoded query fragments used to build
//! search links: the raw keyword for domestic marketplaces and its translation
//! for cross-border ones.

use serde::Serialize;

use crate::data::Translator;

/// Which keyword a destination searches with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Market {
    /// Searched with the raw keyword
    Domestic,
    /// Searched with the translated keyword
    CrossBorder,
}

/// A marketplace search endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Destination {
    /// Display name
    pub name: &'static str,
    /// Search URL prefix; the encoded keyword is appended
    pub search_prefix: &'static str,
    /// Which keyword this destination uses
    pub market: Market,
}

/// Marketplaces searched for every query
static DESTINATIONS: &[Destination] = &[
    Destination {
        name: "Naver Shopping",
        search_prefix: "https://search.shopping.naver.com/search/all?query=",
        market: Market::Domestic,
    },
    Destination {
        name: "Coupang",
        search_prefix: "https://www.coupang.com/np/search?q=",
        market: Market::Domestic,
    },
    Destination {
        name: "Danawa",
        search_prefix: "https://search.danawa.com/dsearch.php?query=",
        market: Market::Domestic,
    },
    Destination {
        name: "Bunjang",
        search_prefix: "https://m.bunjang.co.kr/search/products?q=",
        market: Market::Domestic,
    },
    Destination {
        name: "Amazon",
        search_prefix: "https://www.amazon.com/s?k=",
        market: Market::CrossBorder,
    },
    Destination {
        name: "eBay",
        search_prefix: "https://www.ebay.com/sch/i.html?_nkw=",
        market: Market::CrossBorder,
    },
    Destination {
        name: "AliExpress",
        search_prefix: "https://www.aliexpress.com/wholesale?SearchText=",
        market: Market::CrossBorder,
    },
    Destination {
        name: "Amazon Japan",
        search_prefix: "https://www.amazon.co.jp/s?k=",
        market: Market::CrossBorder,
    },
    Destination {
        name: "Mercari Japan",
        search_prefix: "https://jp.mercari.com/search?keyword=",
        market: Market::CrossBorder,
    },
];

/// Returns every destination
pub fn all_destinations() -> &'static [Destination] {
    DESTINATIONS
}

/// A ready-to-open search link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchLink {
    /// Destination display name
    pub destination: &'static str,
    /// Which keyword the link uses
    pub market: Market,
    /// Full search URL
    pub url: String,
}

/// Raw and translated keywords with their URL-encoded forms
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FanOutQuery {
    /// Keyword as the user typed it
    pub raw_keyword: String,
    /// `raw_keyword` percent-encoded for a query string
    pub encoded_raw_keyword: String,
    /// Keyword in the cross-border search language
    pub translated_keyword: String,
    /// `translated_keyword` percent-encoded for a query string
    pub encoded_translated_keyword: String,
}

impl FanOutQuery {
    /// Builds the fan-out from an already translated keyword
    pub fn new(raw_keyword: &str, translated_keyword: &str) -> Self {
        Self {
            raw_keyword: raw_keyword.to_string(),
            encoded_raw_keyword: encode_keyword(raw_keyword),
            translated_keyword: translated_keyword.to_string(),
            encoded_translated_keyword: encode_keyword(translated_keyword),
        }
    }

    /// Returns the encoded keyword a market searches with
    pub fn encoded_for(&self, market: Market) -> &str {
        match market {
            Market::Domestic => &self.encoded_raw_keyword,
            Market::CrossBorder => &self.encoded_translated_keyword,
        }
    }

    /// Builds a search link for every destination
    pub fn links(&self) -> Vec<SearchLink> {
        all_destinations()
            .iter()
            .map(|destination| SearchLink {
                destination: destination.name,
                market: destination.market,
                url: format!(
                    "{}{}",
                    destination.search_prefix,
                    self.encoded_for(destination.market)
                ),
            })
            .collect()
    }
}

/// Percent-encodes a keyword for a URL query-string position
///
/// Everything except unreserved ASCII (`A-Z a-z 0-9 - . _ ~`) is escaped, so
/// spaces, `&`, `=` and non-ASCII text are all safe to embed.
pub fn encode_keyword(keyword: &str) -> String {
    urlencoding::encode(keyword).into_owned()
}

/// Translates `raw_keyword` and builds its fan-out
pub async fn build_fan_out(
    raw_keyword: &str,
    translator: &Translator,
    target_lang: &str,
) -> FanOutQuery {
    let translated = translator.translate(raw_keyword, target_lang).await;
    FanOutQuery::new(raw_keyword, &translated)
}
