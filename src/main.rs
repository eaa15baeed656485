//! Marketplace indexer service.
//!
//! Spawns one watcher per configured module over a shared connection pool.
//! Each watcher keeps its own cursor, so the streams poll and resume
//! independently.

use market_indexer::{
    IndexerConfig, MarketIndexer, PgCursorStore, Result, Storage, TokioClock,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let base = IndexerConfig::from_env()?;

    // MODULES takes a comma-separated list; MODULE alone watches one stream.
    let modules: Vec<String> = std::env::var("MODULES")
        .map(|list| {
            list.split(',')
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .collect()
        })
        .unwrap_or_else(|_| vec![base.module.clone()]);

    let storage = Storage::new(&base.database_url).await?;
    storage.initialize().await?;
    let cursors = Arc::new(PgCursorStore::new(storage.pool().clone()));
    let storage: Arc<Storage> = Arc::new(storage);

    let mut watchers = Vec::new();
    for module in modules {
        let config = IndexerConfig {
            module,
            ..base.clone()
        };
        let indexer = MarketIndexer::with_parts(
            config,
            storage.clone(),
            cursors.clone(),
            Arc::new(TokioClock),
        );
        watchers.push(tokio::spawn(indexer.run()));
    }

    for watcher in watchers {
        watcher
            .await
            .map_err(|e| market_indexer::IndexerError::InternalError(format!("watcher task: {e}")))??;
    }

    Ok(())
}
