use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry as it arrived from a feed document, before the ledger has seen it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// A persisted ledger record. `score` counts repeat sightings and is frozen
/// once `published` flips to true; `published` never reverts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub guid: String,
    pub title: String,
    pub link: String,
    pub source: String,
    pub published_at: Option<DateTime<Utc>>,
    pub score: i64,
    pub published: bool,
    pub first_seen: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "newswatch/0.1".to_string(),
            timeout_seconds: 30,
            max_retries: 3,
            retry_delay_seconds: 5,
            max_redirects: 5,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("feed parse error: {0}")]
    Parse(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store operation {op} timed out")]
    StoreTimeout { op: &'static str },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("duplicate key: {guid}")]
    DuplicateKey { guid: String },

    #[error("item not found: {guid}")]
    NotFound { guid: String },

    #[error("publish transport error: {0}")]
    Publish(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
