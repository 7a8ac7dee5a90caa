//! Market data: live quotes with a static fallback
//!
//! `MarketDataService` wraps a `MarketDataProvider` with a per-ticker TTL
//! cache. Any provider failure turns into a fallback record instead of an
//! error, so callers always get something to show.

pub mod cache;
pub mod fallback;
pub mod yahoo;

pub use cache::TtlCache;
pub use fallback::{fallback_stock_data, LIMITED_DATA_NOTE};
pub use yahoo::YahooFinanceProvider;

use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataSource {
    #[serde(rename = "Yahoo Finance (Limited)")]
    Live,
    #[serde(rename = "Fallback Data")]
    Fallback,
}

impl DataSource {
    pub fn label(&self) -> &'static str {
        match self {
            DataSource::Live => "Yahoo Finance (Limited)",
            DataSource::Fallback => "Fallback Data",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Descriptive fields a provider may or may not return
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompanyProfile {
    pub long_name: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub market_cap: Option<u64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub volume: Option<u64>,
}

/// Raw provider answer: recent closes (oldest first) plus profile
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Quote {
    pub closes: Vec<f64>,
    pub profile: CompanyProfile,
}

/// A stock record, either live or from the fallback table. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StockData {
    pub symbol: String,
    pub company_name: String,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub current_price: Option<f64>,
    pub previous_close: Option<f64>,
    pub price_change: Option<f64>,
    pub price_change_percent: Option<f64>,
    pub market_cap: Option<u64>,
    pub pe_ratio: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: Option<f64>,
    pub fifty_two_week_low: Option<f64>,
    pub volume: Option<u64>,
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl StockData {
    pub fn is_fallback(&self) -> bool {
        self.source == DataSource::Fallback
    }

    /// Build a live record from provider output. `None` when there is no history.
    pub fn from_quote(symbol: &str, quote: Quote) -> Option<Self> {
        let current = *quote.closes.last()?;
        let previous = if quote.closes.len() > 1 {
            quote.closes[quote.closes.len() - 2]
        } else {
            current
        };

        let change = current - previous;
        let change_percent = if previous != 0.0 {
            change / previous * 100.0
        } else {
            0.0
        };

        let profile = quote.profile;

        Some(Self {
            symbol: symbol.to_string(),
            company_name: profile.long_name.unwrap_or_else(|| symbol.to_string()),
            sector: profile.sector,
            industry: profile.industry,
            current_price: Some(round2(current)),
            previous_close: Some(round2(previous)),
            price_change: Some(round2(change)),
            price_change_percent: Some(round2(change_percent)),
            market_cap: profile.market_cap,
            pe_ratio: profile.pe_ratio,
            dividend_yield: profile.dividend_yield,
            fifty_two_week_high: profile.fifty_two_week_high,
            fifty_two_week_low: profile.fifty_two_week_low,
            volume: profile.volume,
            source: DataSource::Live,
            error_msg: None,
            note: None,
        })
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

const MAX_SYMBOL_LEN: usize = 12;

/// Trim and upper-case a ticker.
///
/// `None` when nothing is left or the text is not ticker-shaped: only ASCII
/// letters, digits and `.`, `^`, `=`, `-` (as in `BRK.B`, `^GSPC`, `EURUSD=X`)
/// up to 12 characters.
pub fn normalize_symbol(raw: &str) -> Option<String> {
    let symbol = raw.trim().to_ascii_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '^' | '=' | '-'));

    valid.then_some(symbol)
}

/// Source of live market data
#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch(&self, symbol: &str) -> Result<Quote>;
}

pub struct MarketDataService {
    provider: Arc<dyn MarketDataProvider>,
    cache: TtlCache<StockData>,
}

impl MarketDataService {
    pub fn new(provider: Arc<dyn MarketDataProvider>, cache_ttl_secs: i64) -> Self {
        Self {
            provider,
            cache: TtlCache::with_ttl_secs(cache_ttl_secs),
        }
    }

    /// Live data when available, the fallback record otherwise.
    pub async fn get_stock_data(&self, raw_symbol: &str) -> StockData {
        let Some(symbol) = normalize_symbol(raw_symbol) else {
            warn!(symbol = %raw_symbol.trim(), "Rejected malformed ticker");
            return fallback_stock_data(&raw_symbol.trim().to_uppercase(), "Invalid ticker symbol");
        };

        if let Some(cached) = self.cache.get(&symbol) {
            debug!(symbol = %symbol, "Market data cache hit");
            return cached;
        }

        info!(symbol = %symbol, provider = self.provider.name(), "Fetching market data");

        let reason = match self.provider.fetch(&symbol).await {
            Ok(quote) => match StockData::from_quote(&symbol, quote) {
                Some(data) => {
                    self.cache.insert(&symbol, data.clone());
                    return data;
                }
                None => "No historical data available".to_string(),
            },
            Err(e) => e.to_string(),
        };

        warn!(symbol = %symbol, "Using fallback stock data: {}", reason);
        fallback_stock_data(&symbol, &reason)
    }
}
