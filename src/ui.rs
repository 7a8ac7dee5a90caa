//! Static web UI
//!
//! A single page with the chat, stock analysis, web search and quick
//! insights tabs. It only calls the JSON API and shows the markdown it gets.

pub const INDEX_HTML: &str = include_str!("../static/index.html");
