use crate::traits::{FeedSource, ItemStore};
use crate::types::{Candidate, PipelineError, Result};
use std::sync::Arc;
use tracing::{info, warn};

/// Counters for one fetch tick against one feed.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestOutcome {
    pub inserted: usize,
    pub bumped: usize,
    pub failed: usize,
}

enum Absorbed {
    Inserted,
    Bumped,
}

/// One fetch tick: pull a feed and fold every candidate into the ledger.
/// First sighting inserts at score 0; every later sighting adds 1. This is
/// the "still alive" signal that accrues interest across polls.
pub struct FetchCycle {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn ItemStore>,
}

impl FetchCycle {
    pub fn new(source: Arc<dyn FeedSource>, store: Arc<dyn ItemStore>) -> Self {
        Self { source, store }
    }

    /// A fetch or parse failure skips the whole tick; a store failure on one
    /// item skips that item only. Neither is allowed to escape.
    pub async fn run(&self, feed_url: &str) -> IngestOutcome {
        let candidates = match self.source.fetch(feed_url).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!("Skipping poll of {}: {}", feed_url, e);
                return IngestOutcome::default();
            }
        };

        let mut outcome = IngestOutcome::default();
        for candidate in &candidates {
            match self.absorb(candidate).await {
                Ok(Absorbed::Inserted) => outcome.inserted += 1,
                Ok(Absorbed::Bumped) => outcome.bumped += 1,
                Err(e) => {
                    warn!("Store error for item {}: {}", candidate.guid, e);
                    outcome.failed += 1;
                }
            }
        }

        info!(
            "Polled {}: {} candidates, {} new, {} bumped, {} failed",
            feed_url,
            candidates.len(),
            outcome.inserted,
            outcome.bumped,
            outcome.failed
        );
        outcome
    }

    async fn absorb(&self, candidate: &Candidate) -> Result<Absorbed> {
        if self.store.exists(&candidate.guid).await? {
            self.store.increment_score(&candidate.guid).await?;
            return Ok(Absorbed::Bumped);
        }

        match self.store.insert(candidate).await {
            Ok(()) => Ok(Absorbed::Inserted),
            // Lost an insert race with a concurrent poll of the same item;
            // it exists now, so this sighting still counts.
            Err(PipelineError::DuplicateKey { .. }) => {
                self.store.increment_score(&candidate.guid).await?;
                Ok(Absorbed::Bumped)
            }
            Err(e) => Err(e),
        }
    }
}
