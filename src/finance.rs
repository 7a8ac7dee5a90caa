//! Finance agent
//!
//! Turns a stock record into a markdown table and asks the model for a
//! narrative analysis of it. The model's text is returned untouched.

use crate::error::AssistantError;
use crate::llm::{complete_or_message, ChatCompletion, ChatMessage};
use crate::market::{normalize_symbol, MarketDataService, StockData};
use std::sync::Arc;
use tracing::{info, warn};

const LIVE_SYSTEM_PROMPT: &str = "You are a financial analysis agent. Analyze the provided stock data and provide insights, recommendations, and analysis. Format your response in markdown with tables where appropriate. If some data shows 'N/A' or 'API Limited', acknowledge this and focus on available data.";

const LIMITED_SYSTEM_PROMPT: &str = "You are a financial analysis agent. The user is asking about a stock but real-time data is unavailable due to API limitations. Provide a comprehensive analysis based on your knowledge of the company, including general investment considerations, company background, market position, and typical financial metrics to look for. Be honest about data limitations but still provide valuable insights.";

const GENERAL_SYSTEM_PROMPT: &str = "You are a financial analysis agent. Provide financial insights and analysis. Format your response in markdown with tables where appropriate.";

pub struct FinanceAgent {
    llm: Arc<dyn ChatCompletion>,
    market: Arc<MarketDataService>,
}

impl FinanceAgent {
    pub fn new(llm: Arc<dyn ChatCompletion>, market: Arc<MarketDataService>) -> Self {
        Self { llm, market }
    }

    pub fn market(&self) -> &MarketDataService {
        &self.market
    }

    pub fn is_configured(&self) -> bool {
        self.llm.is_configured()
    }

    /// Analyze `query`, grounding it in market data when a ticker is given.
    pub async fn analyze(&self, query: &str, symbol: Option<&str>) -> String {
        if !self.is_configured() {
            warn!("Finance agent skipped: no API key");
            return AssistantError::MissingCredential.user_message();
        }

        let messages = match symbol.and_then(normalize_symbol) {
            Some(symbol) => {
                let data = self.market.get_stock_data(&symbol).await;
                info!(symbol = %symbol, source = %data.source, "Finance agent analysis");
                build_stock_messages(query, &data)
            }
            None => vec![
                ChatMessage::system(GENERAL_SYSTEM_PROMPT),
                ChatMessage::user(query),
            ],
        };

        complete_or_message(self.llm.as_ref(), &messages).await
    }

    /// Analyze an already-fetched record (the stock dashboard shows both).
    pub async fn analyze_record(&self, query: &str, data: &StockData) -> String {
        let messages = build_stock_messages(query, data);
        complete_or_message(self.llm.as_ref(), &messages).await
    }
}

fn build_stock_messages(query: &str, data: &StockData) -> Vec<ChatMessage> {
    let stock_info = render_stock_info(data);

    if data.is_fallback() {
        let sector = data.sector.as_deref().unwrap_or("Unknown");
        vec![
            ChatMessage::system(LIMITED_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Analyze {} ({}) in the {} sector. Query: {}\n\n{}\nNote: Real-time data unavailable due to API limits. Please provide analysis based on your knowledge.",
                data.symbol, data.company_name, sector, query, stock_info
            )),
        ]
    } else {
        vec![
            ChatMessage::system(LIVE_SYSTEM_PROMPT),
            ChatMessage::user(format!(
                "Analyze this stock data and query: {}\n\nStock Data:\n{}",
                query, stock_info
            )),
        ]
    }
}

/// Markdown block describing a stock record.
pub fn render_stock_info(data: &StockData) -> String {
    let mut out = String::new();

    if data.is_fallback() {
        out.push_str(&format!(
            "**Stock Analysis for {} ({})**\n\n",
            data.company_name, data.symbol
        ));
        out.push_str(&format!(
            "⚠️ **Note**: {}\n\n",
            data.note.as_deref().unwrap_or("Using AI analysis due to API limitations")
        ));
        out.push_str("| Information | Value |\n");
        out.push_str("|-------------|-------|\n");
        out.push_str(&format!("| Company | {} |\n", data.company_name));
        out.push_str(&format!("| Sector | {} |\n", text_or_na(&data.sector)));
        out.push_str(&format!("| Data Source | {} |\n", data.source));
        out.push_str("| API Status | Limited due to rate limiting |\n\n");
        out.push_str(&format!(
            "**Error Details**: {}\n",
            data.error_msg.as_deref().unwrap_or("API rate limit exceeded")
        ));
        return out;
    }

    let change = match (data.price_change, data.price_change_percent) {
        (Some(change), Some(percent)) => format!(
            "{} ${:.2} ({:.2}%)",
            change_indicator(change),
            change,
            percent
        ),
        _ => "N/A".to_string(),
    };

    out.push_str(&format!(
        "**Stock Information for {} ({})**\n\n",
        data.company_name, data.symbol
    ));
    out.push_str("| Metric | Value |\n");
    out.push_str("|--------|-------|\n");
    out.push_str(&format!("| Current Price | {} |\n", dollars(data.current_price)));
    out.push_str(&format!("| Previous Close | {} |\n", dollars(data.previous_close)));
    out.push_str(&format!("| Price Change | {} |\n", change));
    out.push_str(&format!(
        "| Market Cap | {} |\n",
        data.market_cap
            .map(|cap| format!("${}", thousands(cap)))
            .unwrap_or_else(|| "N/A".to_string())
    ));
    out.push_str(&format!("| P/E Ratio | {} |\n", number(data.pe_ratio)));
    out.push_str(&format!("| Dividend Yield | {} |\n", number(data.dividend_yield)));
    out.push_str(&format!("| 52 Week High | {} |\n", dollars(data.fifty_two_week_high)));
    out.push_str(&format!("| 52 Week Low | {} |\n", dollars(data.fifty_two_week_low)));
    out.push_str(&format!("| Sector | {} |\n", text_or_na(&data.sector)));
    out.push_str(&format!("| Industry | {} |\n", text_or_na(&data.industry)));
    out.push_str(&format!(
        "| Volume | {} |\n",
        data.volume.map(thousands).unwrap_or_else(|| "N/A".to_string())
    ));
    out.push_str(&format!("| Data Source | {} |\n", data.source));

    out
}

fn change_indicator(change: f64) -> &'static str {
    if change > 0.0 {
        "📈"
    } else if change < 0.0 {
        "📉"
    } else {
        "➡️"
    }
}

fn dollars(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

fn number(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}", v))
        .unwrap_or_else(|| "N/A".to_string())
}

fn text_or_na(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("N/A")
}

fn thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
