use anyhow::{Context, Result};
use dotenv::dotenv;
use homecourt_core::logging::init_logging;
use homecourt_core::redis::store::connect;
use homecourt_core::redis::{RedisGameStore, RedisStreamSource, RedisUpcomingIndex, StreamSettings};
use homecourt_core::{
    IngestConfig, Pipeline, Reconciler, SystemClock, TeamResolver, TeamVocabulary, Topic,
    UpcomingGames,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    init_logging();

    info!("Starting Rust Ingestion Service...");

    let config = IngestConfig::from_env();
    let keys = config.key_builder()?;

    let vocabulary = match &config.team_vocabulary_path {
        Some(path) => TeamVocabulary::load(path).context("Failed to load team vocabulary")?,
        None => TeamVocabulary::nba(),
    };
    info!(
        teams = vocabulary.len(),
        aliases = vocabulary.aliases().count(),
        "Team vocabulary ready"
    );

    // Redis
    let client = redis::Client::open(config.redis_url.clone()).context("Invalid REDIS_URL")?;
    let conn = connect(&client)
        .await
        .context("Failed to connect to Redis")?;

    let store = Arc::new(RedisGameStore::with_prefix(conn.clone(), config.game_key_prefix.clone()));
    let upcoming = UpcomingGames::new(Arc::new(RedisUpcomingIndex::new(conn)), Arc::new(SystemClock));
    let reconciler = Arc::new(Reconciler::new(
        TeamResolver::new(Arc::new(vocabulary)),
        keys,
        store,
        upcoming,
    ));

    let mut pipeline = Pipeline::new(reconciler).with_prune_interval(config.prune_interval);
    for topic in Topic::ALL {
        let settings = StreamSettings {
            stream: config.stream_for(topic).to_string(),
            group: config.consumer_group.clone(),
            consumer: config.consumer_name.clone(),
            block_ms: config.stream_block_ms,
            batch_size: config.stream_batch_size,
        };
        let source = RedisStreamSource::connect(&client, settings, config.reconnect.clone())
            .await
            .with_context(|| format!("Failed to open {} stream", topic))?;
        pipeline = pipeline.with_source(topic, Box::new(source));
    }

    let cancel = CancellationToken::new();
    let pipeline_handle = tokio::spawn(pipeline.run(cancel.clone()));

    info!(consumer = %config.consumer_name, group = %config.consumer_group, "Ingestion service running");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
    cancel.cancel();

    let reports = pipeline_handle.await.context("Pipeline task panicked")?;
    for report in reports {
        info!(
            topic = %report.topic,
            received = report.received,
            applied = report.applied,
            skipped = report.skipped,
            failed = report.failed,
            "Final consumer stats"
        );
    }

    info!("Ingestion service stopped");
    Ok(())
}
