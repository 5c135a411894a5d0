use crate::types::{Candidate, Item, Result};
use async_trait::async_trait;

/// Retrieves and parses one feed document into candidate items.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch candidates from `url`, in the feed's own order.
    async fn fetch(&self, url: &str) -> Result<Vec<Candidate>>;
}

/// Delivers a rendered announcement to the broadcast destination.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Persistent ledger of seen items, keyed by guid.
///
/// `increment_score` and `mark_published` must be atomic per record: the
/// fetch and publication cycles may touch the same row concurrently.
#[async_trait]
pub trait ItemStore: Send + Sync {
    /// True iff a record with that guid is present, published or not.
    /// Absence is a normal answer, not an error.
    async fn exists(&self, guid: &str) -> Result<bool>;

    /// Create a new record with score 0 and published false.
    /// Returns `DuplicateKey` if the guid is already present.
    async fn insert(&self, candidate: &Candidate) -> Result<()>;

    /// Atomically add 1 to the score of an existing, unpublished record.
    /// A missing or already-published record is a no-op; never inserts.
    async fn increment_score(&self, guid: &str) -> Result<()>;

    /// Up to `limit` unpublished items with `score > threshold`, ordered by
    /// descending score, ties broken by earliest first sighting.
    async fn select_publishable(&self, threshold: i64, limit: i64) -> Result<Vec<Item>>;

    /// Set published = true. Idempotent for an already-published record;
    /// `NotFound` if the guid is absent.
    async fn mark_published(&self, guid: &str) -> Result<()>;
}
