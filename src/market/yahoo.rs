//! Yahoo Finance client
//!
//! Closes come from the v8 chart endpoint. Sector, industry, valuation and
//! dividend figures only exist in v10 `quoteSummary`, fetched alongside.

use super::{CompanyProfile, MarketDataProvider, Quote};
use crate::config::Settings;
use crate::error::AssistantError;
use crate::Result;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::{error, warn};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; multi-agent-assistant/0.1)";
const CHART_PATH: &[&str] = &["v8", "finance", "chart"];
const SUMMARY_PATH: &[&str] = &["v10", "finance", "quoteSummary"];
const SUMMARY_MODULES: &str = "price,summaryDetail,assetProfile";

pub struct YahooFinanceProvider {
    client: Client,
    base_url: Url,
}

impl YahooFinanceProvider {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(8)
            .timeout(settings.http_timeout)
            .user_agent(USER_AGENT)
            .build()?;

        let base_url = Url::parse(&settings.market_data_base_url).map_err(|e| {
            AssistantError::Config(format!(
                "invalid MARKET_DATA_BASE_URL {}: {}",
                settings.market_data_base_url, e
            ))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AssistantError::Config(format!(
                "MARKET_DATA_BASE_URL cannot be a base: {}",
                settings.market_data_base_url
            )));
        }

        Ok(Self { client, base_url })
    }

    /// `{base}/{prefix..}/{symbol}`, the symbol percent-encoded as one segment
    fn endpoint(&self, prefix: &[&str], symbol: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(prefix).push(symbol);
        }
        url
    }

    async fn fetch_chart(&self, symbol: &str) -> Result<ChartResult> {
        let url = self.endpoint(CHART_PATH, symbol);

        let response = self
            .client
            .get(url)
            .query(&[("range", "5d"), ("interval", "1d")])
            .send()
            .await
            .map_err(|e| {
                error!("Yahoo Finance request failed for {}: {}", symbol, e);
                AssistantError::MarketData(format!("request failed: {}", e))
            })?;

        let status = response.status();
        let body: ChartEnvelope = response
            .json()
            .await
            .map_err(|e| AssistantError::MarketData(format!("invalid chart response: {}", e)))?;

        if let Some(err) = body.chart.error {
            return Err(AssistantError::MarketData(format!(
                "{}: {}",
                err.code, err.description
            )));
        }

        if !status.is_success() {
            return Err(AssistantError::MarketData(format!(
                "Yahoo Finance returned {}",
                status
            )));
        }

        body.chart
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| AssistantError::MarketData("empty chart result".to_string()))
    }

    async fn fetch_summary(&self, symbol: &str) -> Result<SummaryResult> {
        let url = self.endpoint(SUMMARY_PATH, symbol);

        let response = self
            .client
            .get(url)
            .query(&[("modules", SUMMARY_MODULES)])
            .send()
            .await
            .map_err(|e| AssistantError::MarketData(format!("summary request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssistantError::MarketData(format!(
                "quoteSummary returned {}",
                status
            )));
        }

        let body: SummaryEnvelope = response
            .json()
            .await
            .map_err(|e| AssistantError::MarketData(format!("invalid summary response: {}", e)))?;

        body.quote_summary
            .result
            .and_then(|r| r.into_iter().next())
            .ok_or_else(|| AssistantError::MarketData("empty summary result".to_string()))
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooFinanceProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    /// Price history decides success; the company summary is best effort and
    /// only fills descriptive fields.
    async fn fetch(&self, symbol: &str) -> Result<Quote> {
        let (chart, summary) = tokio::join!(self.fetch_chart(symbol), self.fetch_summary(symbol));
        let chart = chart?;

        let closes = chart
            .indicators
            .quote
            .into_iter()
            .next()
            .map(|q| q.close.into_iter().flatten().collect())
            .unwrap_or_default();

        let mut profile = chart.meta.into_profile();
        match summary {
            Ok(summary) => summary.merge_into(&mut profile),
            Err(e) => warn!(symbol = %symbol, "Company summary unavailable: {}", e),
        }

        Ok(Quote { closes, profile })
    }
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: ChartMeta,
    #[serde(default)]
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteSeries>,
}

#[derive(Debug, Deserialize)]
struct QuoteSeries {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// The chart `meta` block: names, 52-week range and volume only
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    long_name: Option<String>,
    short_name: Option<String>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    regular_market_volume: Option<u64>,
}

impl ChartMeta {
    fn into_profile(self) -> CompanyProfile {
        CompanyProfile {
            long_name: self.long_name.or(self.short_name),
            fifty_two_week_high: self.fifty_two_week_high,
            fifty_two_week_low: self.fifty_two_week_low,
            volume: self.regular_market_volume,
            ..CompanyProfile::default()
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryEnvelope {
    quote_summary: QuoteSummary,
}

#[derive(Debug, Deserialize)]
struct QuoteSummary {
    result: Option<Vec<SummaryResult>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryResult {
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetail,
    #[serde(default)]
    asset_profile: AssetProfile,
}

/// `{ "raw": 1.5, "fmt": "1.50" }`; empty objects stand for missing values
#[derive(Debug, Default, Deserialize)]
struct Figure {
    raw: Option<f64>,
}

fn raw(figure: Option<Figure>) -> Option<f64> {
    figure.and_then(|f| f.raw)
}

fn raw_count(figure: Option<Figure>) -> Option<u64> {
    raw(figure).filter(|v| *v >= 0.0).map(|v| v.round() as u64)
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    long_name: Option<String>,
    short_name: Option<String>,
    market_cap: Option<Figure>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<Figure>,
    dividend_yield: Option<Figure>,
    market_cap: Option<Figure>,
    fifty_two_week_high: Option<Figure>,
    fifty_two_week_low: Option<Figure>,
    volume: Option<Figure>,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
    industry: Option<String>,
}

impl SummaryResult {
    fn merge_into(self, profile: &mut CompanyProfile) {
        let SummaryResult {
            price,
            summary_detail: detail,
            asset_profile,
        } = self;

        profile.long_name = profile
            .long_name
            .take()
            .or(price.long_name)
            .or(price.short_name);
        profile.sector = asset_profile.sector.filter(|s| !s.is_empty());
        profile.industry = asset_profile.industry.filter(|s| !s.is_empty());
        profile.market_cap = raw_count(price.market_cap).or(raw_count(detail.market_cap));
        profile.pe_ratio = raw(detail.trailing_pe);
        profile.dividend_yield = raw(detail.dividend_yield);
        profile.fifty_two_week_high = profile
            .fifty_two_week_high
            .or(raw(detail.fifty_two_week_high));
        profile.fifty_two_week_low = profile
            .fifty_two_week_low
            .or(raw(detail.fifty_two_week_low));
        profile.volume = profile.volume.or(raw_count(detail.volume));
    }
}
