//! Query router
//!
//! Decides whether a query is about finance by a plain keyword test and
//! composes the finance and web search answers into one markdown document.

use crate::config::{SearchBackend, Settings};
use crate::finance::FinanceAgent;
use crate::llm::{ChatCompletion, GroqClient};
use crate::market::{normalize_symbol, MarketDataService, YahooFinanceProvider};
use crate::search::{DuckDuckGoSearch, SearchProvider, WebSearchAgent};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Static keyword list — lower-case substrings
const FINANCE_KEYWORDS: &[&str] = &[
    "stock",
    "price",
    "financial",
    "investment",
    "market",
    "analyst",
    "recommendation",
    "earnings",
];

pub const FINANCE_HEADER: &str = "## 📊 Financial Analysis";
pub const NEWS_HEADER: &str = "## 🌐 Latest News & Web Search";
pub const SEARCH_HEADER: &str = "## 🌐 Web Search Results";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    #[default]
    MultiAgent,
    WebSearch,
    Finance,
}

impl AgentKind {
    pub const ALL: [AgentKind; 3] = [AgentKind::MultiAgent, AgentKind::WebSearch, AgentKind::Finance];

    pub fn display_name(&self) -> &'static str {
        match self {
            AgentKind::MultiAgent => "Multi-Agent System",
            AgentKind::WebSearch => "Web Search Agent",
            AgentKind::Finance => "Finance Agent",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentKind::MultiAgent => "Combines web search and financial analysis capabilities",
            AgentKind::WebSearch => "Searches the web for general information",
            AgentKind::Finance => "Provides financial data, stock analysis, and market insights",
        }
    }
}

impl fmt::Display for AgentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Lower-cased substring match against the finance keyword list
pub fn is_finance_query(query: &str) -> bool {
    let query = query.to_lowercase();
    FINANCE_KEYWORDS.iter().any(|kw| query.contains(kw))
}

pub struct MultiAgentSystem {
    finance: FinanceAgent,
    web: WebSearchAgent,
}

impl MultiAgentSystem {
    pub fn new(finance: FinanceAgent, web: WebSearchAgent) -> Self {
        Self { finance, web }
    }

    /// Wire the production clients (Groq, Yahoo Finance, DuckDuckGo).
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let llm: Arc<dyn ChatCompletion> = Arc::new(GroqClient::new(settings)?);
        let market = Arc::new(MarketDataService::new(
            Arc::new(YahooFinanceProvider::new(settings)?),
            settings.cache_ttl_secs,
        ));
        let search: Option<Arc<dyn SearchProvider>> = match settings.search_backend {
            SearchBackend::DuckDuckGo => Some(Arc::new(DuckDuckGoSearch::new(settings)?)),
            SearchBackend::None => None,
        };

        info!(
            model = %settings.model,
            search = ?settings.search_backend,
            cache_ttl_secs = settings.cache_ttl_secs,
            "Multi-agent system initialized"
        );

        Ok(Self::new(
            FinanceAgent::new(llm.clone(), market),
            WebSearchAgent::new(llm, search),
        ))
    }

    pub fn finance(&self) -> &FinanceAgent {
        &self.finance
    }

    pub fn web(&self) -> &WebSearchAgent {
        &self.web
    }

    /// Run the agent the user picked.
    pub async fn dispatch(&self, agent: AgentKind, query: &str, symbol: Option<&str>) -> String {
        match agent {
            AgentKind::WebSearch => self.web.search(query).await,
            AgentKind::Finance => self.finance.analyze(query, symbol).await,
            AgentKind::MultiAgent => self.respond(query, symbol).await,
        }
    }

    /// Finance + news when the query is about finance and names a ticker,
    /// plain web search otherwise.
    pub async fn respond(&self, query: &str, symbol: Option<&str>) -> String {
        let symbol = symbol.and_then(normalize_symbol);

        match symbol {
            Some(symbol) if is_finance_query(query) => {
                info!(symbol = %symbol, "Routing to finance + web search");

                let news_query = format!("latest news and analysis for {}", symbol);
                let (finance, web) = tokio::join!(
                    self.finance.analyze(query, Some(symbol.as_str())),
                    self.web.search(&news_query),
                );

                format!(
                    "\n{}\n{}\n\n{}\n{}\n\n---\n*Analysis combining real-time financial data and web search results*\n",
                    FINANCE_HEADER, finance, NEWS_HEADER, web
                )
            }
            _ => {
                info!("Routing to web search");

                let web = self.web.search(query).await;
                format!(
                    "\n{}\n{}\n\n---\n*Information gathered from web search*\n",
                    SEARCH_HEADER, web
                )
            }
        }
    }
}

/// Shared handle used by the API layer
pub type SharedSystem = Arc<MultiAgentSystem>;

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::error::MISSING_KEY_MESSAGE;
    use crate::market::tests::StubProvider;
    use crate::search::tests::{RecordingLlm, StubSearch};
    use wiremock::matchers::any;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) struct Fixture {
        pub system: MultiAgentSystem,
        pub llm: Arc<RecordingLlm>,
        pub provider: Arc<StubProvider>,
        pub search: Arc<StubSearch>,
    }

    pub(crate) fn fixture() -> Fixture {
        let llm = Arc::new(RecordingLlm::answering("model says hi"));
        let provider = Arc::new(StubProvider::with_closes(vec![100.0, 105.0]));
        let search = Arc::new(StubSearch::new(false));

        let chat: Arc<dyn ChatCompletion> = llm.clone();
        let market = Arc::new(MarketDataService::new(provider.clone(), 300));
        let system = MultiAgentSystem::new(
            FinanceAgent::new(chat.clone(), market),
            WebSearchAgent::new(chat, Some(search.clone())),
        );

        Fixture {
            system,
            llm,
            provider,
            search,
        }
    }

    #[test]
    fn test_finance_keywords() {
        assert!(is_finance_query("Analyze NVDA STOCK"));
        assert!(is_finance_query("latest analyst recommendations"));
        assert!(is_finance_query("Q3 earnings call"));
        assert!(!is_finance_query("Search for recent AI news"));
        assert!(!is_finance_query(""));
    }

    #[test]
    fn test_agent_names() {
        assert_eq!(AgentKind::default(), AgentKind::MultiAgent);
        assert_eq!(AgentKind::Finance.to_string(), "Finance Agent");
        assert_eq!(
            serde_json::to_string(&AgentKind::WebSearch).unwrap(),
            "\"web_search\""
        );
    }

    #[tokio::test]
    async fn test_finance_query_with_ticker_uses_both_paths() {
        let f = fixture();

        let out = f.system.respond("What is the stock price outlook?", Some("nvda")).await;

        assert!(out.contains(FINANCE_HEADER));
        assert!(out.contains(NEWS_HEADER));
        assert!(!out.contains(SEARCH_HEADER));
        assert_eq!(f.provider.calls(), 1);
        assert_eq!(f.search.calls(), 1);
        assert_eq!(f.llm.calls(), 2);
        assert!(f
            .llm
            .user_prompts()
            .iter()
            .any(|p| p.starts_with("Search for information about: latest news and analysis for NVDA")));
    }

    #[tokio::test]
    async fn test_finance_query_without_ticker_searches_only() {
        let f = fixture();

        let out = f.system.respond("stock market news", None).await;

        assert!(out.contains(SEARCH_HEADER));
        assert!(!out.contains(FINANCE_HEADER));
        assert_eq!(f.provider.calls(), 0);
        assert_eq!(f.llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_non_finance_query_ignores_ticker() {
        let f = fixture();

        let out = f.system.respond("who founded the company?", Some("AAPL")).await;

        assert!(out.contains("*Information gathered from web search*"));
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_ticker_is_no_ticker() {
        let f = fixture();
        f.system.respond("stock price", Some("   ")).await;
        assert_eq!(f.provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_from_settings_without_key_still_builds() {
        let settings = Settings {
            search_backend: SearchBackend::None,
            ..Settings::default()
        };
        assert!(MultiAgentSystem::from_settings(&settings).is_ok());
    }

    #[tokio::test]
    async fn test_missing_key_reaches_no_upstream() {
        let server = MockServer::start().await;
        Mock::given(any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let settings = Settings {
            groq_api_key: None,
            groq_base_url: format!("{}/openai/v1/chat/completions", server.uri()),
            market_data_base_url: server.uri(),
            search_backend: SearchBackend::DuckDuckGo,
            search_base_url: server.uri(),
            ..Settings::default()
        };
        let system = MultiAgentSystem::from_settings(&settings).unwrap();

        let out = system.respond("stock price outlook", Some("NVDA")).await;
        assert!(out.contains(MISSING_KEY_MESSAGE));
        let out = system.dispatch(AgentKind::WebSearch, "AI news", None).await;
        assert_eq!(out, MISSING_KEY_MESSAGE);
        let out = system.dispatch(AgentKind::Finance, "outlook", Some("AAPL")).await;
        assert_eq!(out, MISSING_KEY_MESSAGE);

        let received = server.received_requests().await.unwrap_or_default();
        assert!(received.is_empty());
    }

    #[tokio::test]
    async fn test_dispatch_by_agent() {
        let f = fixture();

        let web = f.system.dispatch(AgentKind::WebSearch, "stock price", Some("NVDA")).await;
        assert_eq!(web, "model says hi");
        assert_eq!(f.provider.calls(), 0);

        let finance = f.system.dispatch(AgentKind::Finance, "anything", Some("NVDA")).await;
        assert_eq!(finance, "model says hi");
        assert_eq!(f.provider.calls(), 1);
    }
}
