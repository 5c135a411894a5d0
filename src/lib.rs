pub mod config;
pub mod fetcher;
pub mod ingest;
pub mod parser;
pub mod publish;
pub mod publisher;
pub mod scheduler;
pub mod store;
pub mod traits;
pub mod types;

pub use config::{Cli, Config};
pub use fetcher::{Fetcher, HttpFeedSource};
pub use ingest::{FetchCycle, IngestOutcome};
pub use publish::{render_announcement, PublicationCycle};
pub use publisher::TelegramPublisher;
pub use scheduler::{ScheduleConfig, Scheduler};
pub use store::PgItemStore;
pub use traits::{FeedSource, ItemStore, Publisher};
pub use types::*;
