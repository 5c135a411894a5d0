use crate::ingest::FetchCycle;
use crate::publish::PublicationCycle;
use crate::traits::{FeedSource, ItemStore, Publisher};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct ScheduleConfig {
    pub feed_urls: Vec<String>,
    pub fetch_interval: Duration,
    pub publish_interval: Duration,
    pub threshold: i64,
    pub limit: i64,
}

/// Dual-timer driver. Owns the store, the publisher, and the feed source, and
/// injects them into the two cycles. The cycles are pure reactions to a tick;
/// all temporal control lives here.
pub struct Scheduler {
    source: Arc<dyn FeedSource>,
    store: Arc<dyn ItemStore>,
    publisher: Arc<dyn Publisher>,
    config: ScheduleConfig,
}

impl Scheduler {
    pub fn new(
        source: Arc<dyn FeedSource>,
        store: Arc<dyn ItemStore>,
        publisher: Arc<dyn Publisher>,
        config: ScheduleConfig,
    ) -> Self {
        Self {
            source,
            store,
            publisher,
            config,
        }
    }

    /// Runs both timer loops for the lifetime of the process. Both fire
    /// immediately on start. A slow fetch tick never delays the publish
    /// timer; within a fetch tick the feeds are polled concurrently so one
    /// broken feed does not hold up the others.
    pub async fn run(self) {
        let fetch_cycle = Arc::new(FetchCycle::new(self.source, self.store.clone()));
        let publish_cycle = PublicationCycle::new(
            self.store,
            self.publisher,
            self.config.threshold,
            self.config.limit,
        );

        info!(
            "Scheduler starting: {} feeds, fetch every {:?}, publish every {:?}",
            self.config.feed_urls.len(),
            self.config.fetch_interval,
            self.config.publish_interval
        );

        let feed_urls = self.config.feed_urls;
        let fetch_interval = self.config.fetch_interval;
        let fetch_task = tokio::spawn(async move {
            let mut ticker = interval(fetch_interval);
            loop {
                ticker.tick().await;
                let mut handles = Vec::with_capacity(feed_urls.len());
                for url in &feed_urls {
                    let cycle = fetch_cycle.clone();
                    let url = url.clone();
                    handles.push(tokio::spawn(async move {
                        cycle.run(&url).await;
                    }));
                }
                for handle in handles {
                    if let Err(e) = handle.await {
                        warn!("Fetch task panicked: {}", e);
                    }
                }
            }
        });

        let publish_interval = self.config.publish_interval;
        let publish_task = tokio::spawn(async move {
            let mut ticker = interval(publish_interval);
            loop {
                ticker.tick().await;
                publish_cycle.run().await;
            }
        });

        // Both loops run until process shutdown.
        let _ = tokio::join!(fetch_task, publish_task);
    }
}
