//! Multi-Agent Assistant
//!
//! A thin orchestration layer that:
//! - Routes free-text queries to a web search agent or a finance agent
//! - Grounds finance answers in live market data, with a static fallback
//! - Caches market-data lookups per ticker for a short window
//! - Composes agent answers into one markdown document
//! - Keeps per-session history in memory
//!
//! FLOW:
//! QUERY → ROUTE → FETCH (market / search) → PROMPT → COMPOSE

pub mod api;
pub mod config;
pub mod error;
pub mod finance;
pub mod history;
pub mod insights;
pub mod llm;
pub mod market;
pub mod router;
pub mod search;
pub mod ui;

pub use error::Result;

// Re-export common types
pub use config::Settings;
pub use router::{is_finance_query, AgentKind, MultiAgentSystem};
