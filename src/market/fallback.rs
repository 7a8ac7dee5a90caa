//! Static placeholder data used when the live provider is unavailable

use super::{DataSource, StockData};

/// Shown alongside every fallback record
pub const LIMITED_DATA_NOTE: &str =
    "Using AI analysis instead of real-time data due to API limitations";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FallbackProfile {
    pub name: &'static str,
    pub sector: &'static str,
}

const KNOWN_TICKERS: &[(&str, FallbackProfile)] = &[
    ("AAPL", FallbackProfile { name: "Apple Inc.", sector: "Technology" }),
    ("GOOGL", FallbackProfile { name: "Alphabet Inc.", sector: "Technology" }),
    ("MSFT", FallbackProfile { name: "Microsoft Corporation", sector: "Technology" }),
    ("NVDA", FallbackProfile { name: "NVIDIA Corporation", sector: "Technology" }),
    ("TSLA", FallbackProfile { name: "Tesla, Inc.", sector: "Automotive" }),
    ("AMZN", FallbackProfile { name: "Amazon.com Inc.", sector: "E-commerce" }),
];

/// Look up a known ticker (already upper-cased)
pub fn known_profile(symbol: &str) -> Option<FallbackProfile> {
    KNOWN_TICKERS
        .iter()
        .find(|(ticker, _)| *ticker == symbol)
        .map(|(_, profile)| *profile)
}

/// Build the placeholder record for `symbol`, carrying the failure reason.
pub fn fallback_stock_data(symbol: &str, reason: &str) -> StockData {
    let (company_name, sector) = match known_profile(symbol) {
        Some(profile) => (profile.name.to_string(), profile.sector.to_string()),
        None => (format!("{} Corporation", symbol), "Unknown".to_string()),
    };

    StockData {
        symbol: symbol.to_string(),
        company_name,
        sector: Some(sector),
        industry: None,
        current_price: None,
        previous_close: None,
        price_change: None,
        price_change_percent: None,
        market_cap: None,
        pe_ratio: None,
        dividend_yield: None,
        fifty_two_week_high: None,
        fifty_two_week_low: None,
        volume: None,
        source: DataSource::Fallback,
        error_msg: Some(format!("API Error: {}", reason)),
        note: Some(LIMITED_DATA_NOTE.to_string()),
    }
}
