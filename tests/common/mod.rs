#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use newswatch::{Candidate, FeedSource, Item, ItemStore, PipelineError, Publisher, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

pub fn candidate(guid: &str, title: &str) -> Candidate {
    Candidate {
        guid: guid.to_string(),
        title: title.to_string(),
        link: format!("https://example.com/{}", guid),
        source: "Example Wire".to_string(),
        published_at: None,
    }
}

/// In-memory ledger mirroring the SQL semantics of `PgItemStore`.
/// `first_seen` is a deterministic counter so tie-break ordering is testable.
#[derive(Default)]
pub struct MemoryStore {
    items: Mutex<BTreeMap<String, Item>>,
    seq: Mutex<i64>,
}

impl MemoryStore {
    pub fn get(&self, guid: &str) -> Option<Item> {
        self.items.lock().unwrap().get(guid).cloned()
    }

    pub fn score(&self, guid: &str) -> Option<i64> {
        self.get(guid).map(|item| item.score)
    }

    pub fn is_published(&self, guid: &str) -> Option<bool> {
        self.get(guid).map(|item| item.published)
    }
}

#[async_trait]
impl ItemStore for MemoryStore {
    async fn exists(&self, guid: &str) -> Result<bool> {
        Ok(self.items.lock().unwrap().contains_key(guid))
    }

    async fn insert(&self, candidate: &Candidate) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        if items.contains_key(&candidate.guid) {
            return Err(PipelineError::DuplicateKey {
                guid: candidate.guid.clone(),
            });
        }
        let mut seq = self.seq.lock().unwrap();
        *seq += 1;
        items.insert(
            candidate.guid.clone(),
            Item {
                guid: candidate.guid.clone(),
                title: candidate.title.clone(),
                link: candidate.link.clone(),
                source: candidate.source.clone(),
                published_at: candidate.published_at,
                score: 0,
                published: false,
                first_seen: Utc.timestamp_opt(1_700_000_000 + *seq, 0).unwrap(),
            },
        );
        Ok(())
    }

    async fn increment_score(&self, guid: &str) -> Result<()> {
        if let Some(item) = self.items.lock().unwrap().get_mut(guid) {
            if !item.published {
                item.score += 1;
            }
        }
        Ok(())
    }

    async fn select_publishable(&self, threshold: i64, limit: i64) -> Result<Vec<Item>> {
        let items = self.items.lock().unwrap();
        let mut hits: Vec<Item> = items
            .values()
            .filter(|item| !item.published && item.score > threshold)
            .cloned()
            .collect();
        hits.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then(a.first_seen.cmp(&b.first_seen))
        });
        hits.truncate(limit as usize);
        Ok(hits)
    }

    async fn mark_published(&self, guid: &str) -> Result<()> {
        match self.items.lock().unwrap().get_mut(guid) {
            Some(item) => {
                item.published = true;
                Ok(())
            }
            None => Err(PipelineError::NotFound {
                guid: guid.to_string(),
            }),
        }
    }
}

/// Store wrapper that always answers "not seen", forcing the insert path so
/// the duplicate-key race fallback in the fetch cycle gets exercised.
pub struct RacyStore(pub MemoryStore);

#[async_trait]
impl ItemStore for RacyStore {
    async fn exists(&self, _guid: &str) -> Result<bool> {
        Ok(false)
    }

    async fn insert(&self, candidate: &Candidate) -> Result<()> {
        self.0.insert(candidate).await
    }

    async fn increment_score(&self, guid: &str) -> Result<()> {
        self.0.increment_score(guid).await
    }

    async fn select_publishable(&self, threshold: i64, limit: i64) -> Result<Vec<Item>> {
        self.0.select_publishable(threshold, limit).await
    }

    async fn mark_published(&self, guid: &str) -> Result<()> {
        self.0.mark_published(guid).await
    }
}

/// Feed source returning a batch set by the test, or a parse failure.
#[derive(Default)]
pub struct StaticFeedSource {
    batch: Mutex<Vec<Candidate>>,
    fail: Mutex<bool>,
}

impl StaticFeedSource {
    pub fn set_batch(&self, candidates: Vec<Candidate>) {
        *self.batch.lock().unwrap() = candidates;
    }

    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }
}

#[async_trait]
impl FeedSource for StaticFeedSource {
    async fn fetch(&self, _url: &str) -> Result<Vec<Candidate>> {
        if *self.fail.lock().unwrap() {
            return Err(PipelineError::Parse("simulated malformed feed".to_string()));
        }
        Ok(self.batch.lock().unwrap().clone())
    }
}

/// Publisher that records every sent message, or refuses them all.
#[derive(Default)]
pub struct RecordingPublisher {
    sent: Mutex<Vec<String>>,
    fail: Mutex<bool>,
}

impl RecordingPublisher {
    pub fn set_failing(&self, fail: bool) {
        *self.fail.lock().unwrap() = fail;
    }

    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Publisher for RecordingPublisher {
    async fn send(&self, text: &str) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(PipelineError::Publish(
                "simulated transport outage".to_string(),
            ));
        }
        self.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}
