use crate::traits::{ItemStore, Publisher};
use std::sync::Arc;
use tracing::{info, warn};

/// Plain-text announcement: title, blank line, link.
pub fn render_announcement(title: &str, link: &str) -> String {
    format!("{}\n\n{}", title, link)
}

/// One publication tick: select unpublished items over the threshold,
/// announce each, and mark it published only after the send succeeded.
///
/// Send-before-mark means a transport failure leaves the item unpublished for
/// retry next tick. The flip side is at-least-once delivery: a crash between
/// send and mark re-announces that item on restart.
pub struct PublicationCycle {
    store: Arc<dyn ItemStore>,
    publisher: Arc<dyn Publisher>,
    threshold: i64,
    limit: i64,
}

impl PublicationCycle {
    pub fn new(
        store: Arc<dyn ItemStore>,
        publisher: Arc<dyn Publisher>,
        threshold: i64,
        limit: i64,
    ) -> Self {
        Self {
            store,
            publisher,
            threshold,
            limit,
        }
    }

    /// Returns how many items were announced and marked this tick.
    pub async fn run(&self) -> usize {
        let items = match self.store.select_publishable(self.threshold, self.limit).await {
            Ok(items) => items,
            Err(e) => {
                warn!("Selection failed, retrying next tick: {}", e);
                return 0;
            }
        };

        let mut announced = 0;
        for item in items {
            let text = render_announcement(&item.title, &item.link);

            if let Err(e) = self.publisher.send(&text).await {
                warn!("Announcement failed for {}, left unpublished: {}", item.guid, e);
                continue;
            }

            match self.store.mark_published(&item.guid).await {
                Ok(()) => {
                    info!("Announced {} (score {})", item.guid, item.score);
                    announced += 1;
                }
                Err(e) => {
                    warn!(
                        "Sent but could not mark {} published, may re-announce: {}",
                        item.guid, e
                    );
                }
            }
        }
        announced
    }
}
