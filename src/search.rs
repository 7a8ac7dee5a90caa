//! Web search agent
//!
//! The agent is a prompt template over the chat-completion endpoint. When a
//! search provider is configured its results are pasted into the prompt so
//! the model can cite real sources.

use crate::config::Settings;
use crate::error::AssistantError;
use crate::llm::{complete_or_message, ChatCompletion, ChatMessage};
use crate::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

const MAX_HITS: usize = 5;

const SYSTEM_PROMPT: &str = "You are a web search agent. Provide comprehensive information about the query as if you searched the web. Always include sources and current information. Format your response in markdown.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub url: String,
}

#[async_trait::async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &'static str;
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>>;
}

/// DuckDuckGo Instant Answer API
pub struct DuckDuckGoSearch {
    client: Client,
    base_url: String,
}

impl DuckDuckGoSearch {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(60))
            .timeout(settings.http_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: settings.search_base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait::async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &'static str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .get(format!("{}/", self.base_url))
            .query(&[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ])
            .send()
            .await
            .map_err(|e| AssistantError::Search(format!("request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AssistantError::Search(format!(
                "DuckDuckGo returned {}",
                response.status()
            )));
        }

        let answer: InstantAnswer = response
            .json()
            .await
            .map_err(|e| AssistantError::Search(format!("invalid response: {}", e)))?;

        Ok(answer.into_hits())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    heading: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Entry {
        #[serde(rename = "Text")]
        text: String,
        #[serde(rename = "FirstURL")]
        first_url: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl InstantAnswer {
    fn into_hits(self) -> Vec<SearchHit> {
        let mut hits = Vec::new();

        if !self.abstract_text.is_empty() {
            hits.push(SearchHit {
                title: self.heading.clone(),
                snippet: self.abstract_text,
                url: self.abstract_url,
            });
        }

        let mut stack: Vec<RelatedTopic> = self.related_topics.into_iter().rev().collect();
        while let Some(topic) = stack.pop() {
            if hits.len() >= MAX_HITS {
                break;
            }
            match topic {
                RelatedTopic::Entry { text, first_url } => {
                    let title = text.split(" - ").next().unwrap_or(&text).to_string();
                    hits.push(SearchHit {
                        title,
                        snippet: text,
                        url: first_url,
                    });
                }
                RelatedTopic::Group { topics } => stack.extend(topics.into_iter().rev()),
            }
        }

        hits.truncate(MAX_HITS);
        hits
    }
}

pub struct WebSearchAgent {
    llm: Arc<dyn ChatCompletion>,
    provider: Option<Arc<dyn SearchProvider>>,
}

impl WebSearchAgent {
    pub fn new(llm: Arc<dyn ChatCompletion>, provider: Option<Arc<dyn SearchProvider>>) -> Self {
        Self { llm, provider }
    }

    pub async fn search(&self, query: &str) -> String {
        if !self.llm.is_configured() {
            warn!("Web search agent skipped: no API key");
            return AssistantError::MissingCredential.user_message();
        }

        info!("Web search agent: {}", query);

        let hits = match &self.provider {
            Some(provider) => match provider.search(query).await {
                Ok(hits) => hits,
                Err(e) => {
                    warn!(provider = provider.name(), "Search grounding unavailable: {}", e);
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        let messages = [
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(build_user_prompt(query, &hits)),
        ];

        complete_or_message(self.llm.as_ref(), &messages).await
    }
}

fn build_user_prompt(query: &str, hits: &[SearchHit]) -> String {
    let mut prompt = format!("Search for information about: {}", query);

    if !hits.is_empty() {
        prompt.push_str("\n\nSearch results:\n");
        for (i, hit) in hits.iter().enumerate() {
            prompt.push_str(&format!(
                "{}. {}: {} ({})\n",
                i + 1,
                hit.title,
                hit.snippet,
                hit.url
            ));
        }
    }

    prompt
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::Role;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Chat stub that records prompts and echoes a fixed answer
    pub(crate) struct RecordingLlm {
        pub answer: String,
        pub prompts: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl RecordingLlm {
        pub(crate) fn answering(answer: &str) -> Self {
            Self {
                answer: answer.to_string(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }

        pub(crate) fn user_prompts(&self) -> Vec<String> {
            self.prompts
                .lock()
                .unwrap()
                .iter()
                .filter_map(|msgs| msgs.iter().find(|m| m.role == Role::User))
                .map(|m| m.content.clone())
                .collect()
        }
    }

    #[async_trait::async_trait]
    impl ChatCompletion for RecordingLlm {
        async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
            self.prompts.lock().unwrap().push(messages.to_vec());
            Ok(self.answer.clone())
        }
    }

    pub(crate) struct StubSearch {
        pub calls: AtomicUsize,
        pub fail: bool,
    }

    impl StubSearch {
        pub(crate) fn new(fail: bool) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail,
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SearchProvider for StubSearch {
        fn name(&self) -> &'static str {
            "stub"
        }

        async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AssistantError::Search("offline".into()));
            }
            Ok(vec![SearchHit {
                title: "Result".into(),
                snippet: format!("About {}", query),
                url: "https://example.com/result".into(),
            }])
        }
    }

    #[tokio::test]
    async fn test_prompt_without_provider() {
        let llm = Arc::new(RecordingLlm::answering("## Findings"));
        let agent = WebSearchAgent::new(llm.clone(), None);

        let answer = agent.search("latest AI developments").await;

        assert_eq!(answer, "## Findings");
        assert_eq!(
            llm.user_prompts(),
            vec!["Search for information about: latest AI developments".to_string()]
        );
    }

    #[tokio::test]
    async fn test_hits_are_added_to_prompt() {
        let llm = Arc::new(RecordingLlm::answering("ok"));
        let search = Arc::new(StubSearch::new(false));
        let agent = WebSearchAgent::new(llm.clone(), Some(search.clone()));

        agent.search("rust").await;

        assert_eq!(search.calls(), 1);
        let prompt = &llm.user_prompts()[0];
        assert!(prompt.contains("Search results:"));
        assert!(prompt.contains("https://example.com/result"));
    }

    #[tokio::test]
    async fn test_provider_failure_still_answers() {
        let llm = Arc::new(RecordingLlm::answering("fallback answer"));
        let agent = WebSearchAgent::new(llm.clone(), Some(Arc::new(StubSearch::new(true))));

        assert_eq!(agent.search("rust").await, "fallback answer");
        assert!(!llm.user_prompts()[0].contains("Search results:"));
    }

    #[tokio::test]
    async fn test_duckduckgo_flattens_topics() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "nvidia"))
            .and(query_param("format", "json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Heading": "Nvidia",
                "AbstractText": "Nvidia Corporation is an American technology company.",
                "AbstractURL": "https://en.wikipedia.org/wiki/Nvidia",
                "RelatedTopics": [
                    { "Text": "GeForce - A brand of GPUs", "FirstURL": "https://duckduckgo.com/GeForce" },
                    { "Name": "Products", "Topics": [
                        { "Text": "CUDA - Parallel computing platform", "FirstURL": "https://duckduckgo.com/CUDA" }
                    ]}
                ]
            })))
            .mount(&server)
            .await;

        let settings = Settings {
            search_base_url: server.uri(),
            ..Settings::default()
        };
        let hits = DuckDuckGoSearch::new(&settings).unwrap().search("nvidia").await.unwrap();

        assert_eq!(hits.len(), 3);
        assert_eq!(hits[0].title, "Nvidia");
        assert_eq!(hits[1].title, "GeForce");
        assert_eq!(hits[2].url, "https://duckduckgo.com/CUDA");
    }
}
