//! Session history storage
//!
//! Keeps the exchanges of each browser session in insertion order. Nothing
//! survives a restart.

use crate::router::AgentKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use tokio::sync::RwLock;
use uuid::Uuid;

/// How many exchanges the UI shows
pub const DISPLAY_LIMIT: usize = 5;

/// A single user query and the answer it produced
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Interaction {
    pub interaction_id: Uuid,
    pub user_text: String,
    pub agent_text: String,
    pub timestamp: DateTime<Utc>,
    pub agent: AgentKind,
}

impl Interaction {
    pub fn new(user_text: String, agent_text: String, agent: AgentKind) -> Self {
        Self {
            interaction_id: Uuid::new_v4(),
            user_text,
            agent_text,
            timestamp: Utc::now(),
            agent,
        }
    }

    /// Clock time shown next to the user's message
    pub fn display_time(&self) -> String {
        self.timestamp.format("%H:%M:%S").to_string()
    }
}

/// Ordered exchanges of one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionHistory {
    interactions: VecDeque<Interaction>,
}

impl SessionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, interaction: Interaction) {
        self.interactions.push_back(interaction);
    }

    /// The last `count` exchanges, oldest first
    pub fn recent(&self, count: usize) -> Vec<Interaction> {
        let skip = self.interactions.len().saturating_sub(count);
        self.interactions.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    pub fn clear(&mut self) {
        self.interactions.clear();
    }
}

/// Map a client-supplied session name to a stable id.
pub fn session_uuid(session: Option<&str>) -> Uuid {
    match session {
        Some(v) if !v.trim().is_empty() => {
            Uuid::parse_str(v).unwrap_or_else(|_| stable_uuid_from_string(v))
        }
        _ => stable_uuid_from_string("default-session"),
    }
}

fn stable_uuid_from_string(input: &str) -> Uuid {
    let hash = Sha256::digest(input.as_bytes());
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&hash[..16]);

    // Set UUID version (4) and variant (RFC4122) bits.
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;

    Uuid::from_bytes(bytes)
}

/// In-memory histories keyed by session
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, SessionHistory>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, session: Uuid, interaction: Interaction) {
        let mut sessions = self.sessions.write().await;
        sessions.entry(session).or_default().push(interaction);
    }

    pub async fn recent(&self, session: Uuid, count: usize) -> Vec<Interaction> {
        let sessions = self.sessions.read().await;
        sessions
            .get(&session)
            .map(|h| h.recent(count))
            .unwrap_or_default()
    }

    pub async fn len(&self, session: Uuid) -> usize {
        let sessions = self.sessions.read().await;
        sessions.get(&session).map(|h| h.len()).unwrap_or(0)
    }

    pub async fn clear(&self, session: Uuid) {
        let mut sessions = self.sessions.write().await;
        if let Some(history) = sessions.get_mut(&session) {
            history.clear();
        }
    }
}
