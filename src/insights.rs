//! Predefined queries behind the UI's buttons

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Topic {
    pub name: &'static str,
    pub query: &'static str,
}

pub const TRENDING_TOPICS: &[Topic] = &[
    Topic { name: "AI News", query: "latest artificial intelligence news" },
    Topic { name: "Tech Trends", query: "latest technology trends 2024" },
    Topic { name: "Market News", query: "stock market news today" },
    Topic { name: "Crypto Updates", query: "cryptocurrency news today" },
];

/// One-click queries for the chat tab
pub const QUICK_QUERIES: &[Topic] = &[
    Topic {
        name: "NVDA Stock Analysis",
        query: "Get the latest analyst recommendations and stock price for NVDA",
    },
    Topic { name: "Tesla News", query: "Get the most recent news about Tesla (TSLA)" },
    Topic {
        name: "Market Trends",
        query: "Search for the latest stock market trends and analysis",
    },
    Topic {
        name: "Apple Fundamentals",
        query: "Get fundamental analysis for Apple (AAPL) stock",
    },
];

pub const POPULAR_STOCKS: &[&str] = &["NVDA", "AAPL", "GOOGL", "MSFT", "TSLA", "AMZN"];

pub const MARKET_OVERVIEW_QUERY: &str =
    "Get current market overview including major indices performance and market sentiment";

/// Case-insensitive lookup by display name
pub fn find_topic(name: &str) -> Option<&'static Topic> {
    TRENDING_TOPICS
        .iter()
        .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
}

pub fn quick_stock_query(symbol: &str) -> String {
    format!("Analyze {} stock with current data and recent news", symbol)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    #[default]
    CompleteAnalysis,
    CurrentPriceAndMetrics,
    FinancialAnalysis,
    MarketResearch,
}

impl AnalysisType {
    pub fn label(&self) -> &'static str {
        match self {
            AnalysisType::CompleteAnalysis => "Complete Analysis",
            AnalysisType::CurrentPriceAndMetrics => "Current Price & Metrics",
            AnalysisType::FinancialAnalysis => "Financial Analysis",
            AnalysisType::MarketResearch => "Market Research",
        }
    }

    pub fn query_for(&self, symbol: &str) -> String {
        match self {
            AnalysisType::CompleteAnalysis => {
                format!("Provide a comprehensive financial analysis for {}", symbol)
            }
            AnalysisType::CurrentPriceAndMetrics => {
                format!("Analyze the stock metrics and trends for {}", symbol)
            }
            AnalysisType::FinancialAnalysis => {
                format!("Provide detailed financial analysis for {}", symbol)
            }
            AnalysisType::MarketResearch => {
                format!("Research market sentiment and developments for {}", symbol)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::is_finance_query;

    #[test]
    fn test_find_topic() {
        assert_eq!(find_topic("market news").map(|t| t.query), Some("stock market news today"));
        assert!(find_topic("sports").is_none());
    }

    #[test]
    fn test_quick_stock_query_routes_to_finance() {
        for symbol in POPULAR_STOCKS {
            assert!(is_finance_query(&quick_stock_query(symbol)));
        }
    }

    #[test]
    fn test_analysis_queries() {
        assert_eq!(
            AnalysisType::default().query_for("NVDA"),
            "Provide a comprehensive financial analysis for NVDA"
        );
        assert_eq!(AnalysisType::MarketResearch.label(), "Market Research");
        let parsed: AnalysisType = serde_json::from_str("\"current_price_and_metrics\"").unwrap();
        assert_eq!(parsed, AnalysisType::CurrentPriceAndMetrics);
    }
}
