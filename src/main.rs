use anyhow::Context;
use clap::Parser;
use newswatch::{
    Cli, Config, FetchConfig, HttpFeedSource, PgItemStore, ScheduleConfig, Scheduler,
    TelegramPublisher,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = Config::load(&cli).context("configuration")?;

    info!(
        "Starting newswatch: {} feeds, threshold {}, limit {}",
        config.feed_urls.len(),
        config.threshold,
        config.limit
    );

    // The store is the one dependency worth dying for: without a ledger the
    // pipeline would silently re-announce everything.
    let store = PgItemStore::connect(&config.database_url, 5)
        .await
        .context("item store unreachable after retries")?;

    let source = HttpFeedSource::new(FetchConfig::default())?;
    let publisher = TelegramPublisher::new(&config.bot_token, config.channel_id.clone());

    let schedule = ScheduleConfig {
        feed_urls: config.feed_urls.clone(),
        fetch_interval: config.fetch_interval,
        publish_interval: config.publish_interval,
        threshold: config.threshold,
        limit: config.limit,
    };

    Scheduler::new(
        Arc::new(source),
        Arc::new(store),
        Arc::new(publisher),
        schedule,
    )
    .run()
    .await;

    Ok(())
}
