//! Poll loop orchestrating the ingestion pipeline.
//!
//! One [`MarketIndexer`] watches one stream: it fetches pages of events
//! after the saved cursor, classifies and maps each event in emission
//! order, applies the resulting writes, and advances the cursor. The loop
//! is strictly sequential within a stream; that ordering, not any
//! mapper-side logic, is what keeps status transitions monotonic. Multiple
//! watchers run as independent instances over disjoint natural-key spaces.

use crate::chain::types::{EventFilter, EventId};
use crate::chain::ChainClient;
use crate::config::IndexerConfig;
use crate::core::clock::{Clock, TokioClock};
use crate::events::{classify, EventMapper};
use crate::storage::{CursorStore, PgCursorStore, Storage, StorageBackend};
use crate::utils::error::Result;
use crate::utils::logging::{self, LogLevel};
use std::sync::Arc;
use std::time::Duration;

/// Result of processing a single event within a page.
enum Outcome {
    Handled,
    Ignored,
    Skipped,
}

/// Watcher for one `(package, module)` event stream.
///
/// # Example
///
/// ```no_run
/// use market_indexer::{IndexerConfigBuilder, MarketIndexer};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = IndexerConfigBuilder::new()
///     .with_database("postgresql://localhost/marketplace")
///     .package_id("0xabc")
///     .module("task_manager")
///     .build()?;
///
/// let indexer = MarketIndexer::new(config).await?;
/// indexer.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct MarketIndexer {
    config: IndexerConfig,
    client: Arc<ChainClient>,
    mapper: EventMapper,
    storage: Arc<dyn StorageBackend>,
    cursors: Arc<dyn CursorStore>,
    clock: Arc<dyn Clock>,
}

impl MarketIndexer {
    /// Creates a watcher with its own connection pool, initializing the
    /// schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection or schema setup fails.
    pub async fn new(config: IndexerConfig) -> Result<Self> {
        let storage = Storage::new(&config.database_url).await?;
        storage.initialize().await?;
        let cursors = Arc::new(PgCursorStore::new(storage.pool().clone()));

        Ok(Self::with_parts(
            config,
            Arc::new(storage),
            cursors,
            Arc::new(TokioClock),
        ))
    }

    /// Assembles a watcher from injected collaborators.
    ///
    /// Used by the binary to share one pool across watchers and by tests to
    /// substitute in-memory storage and a virtual clock.
    #[must_use]
    pub fn with_parts(
        config: IndexerConfig,
        storage: Arc<dyn StorageBackend>,
        cursors: Arc<dyn CursorStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let client = Arc::new(ChainClient::new(config.rpc_url.clone()));
        let mapper = EventMapper::new(client.clone());

        Self {
            config,
            client,
            mapper,
            storage,
            cursors,
            clock,
        }
    }

    /// Returns the cursor key for this watcher's stream.
    #[must_use]
    pub fn stream_id(&self) -> String {
        self.config.stream_id()
    }

    /// Runs the poll loop. Never returns under normal operation.
    ///
    /// Starts from the persisted cursor for the stream; if none exists, the
    /// event log is replayed from the beginning, which is safe because all
    /// writes are idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error only if the initial cursor load fails; everything
    /// past that point is retried indefinitely.
    pub async fn run(self) -> Result<()> {
        let stream_id = self.stream_id();
        logging::log_startup(&stream_id, self.client.rpc_url(), self.config.poll_interval_ms);

        let mut cursor = self.cursors.load(&stream_id).await?;
        match &cursor {
            Some(position) => logging::log(
                LogLevel::Info,
                &format!("resuming {stream_id} from {position}"),
            ),
            None => logging::log(
                LogLevel::Info,
                &format!("no saved cursor for {stream_id}, replaying from the start"),
            ),
        }

        loop {
            let started = std::time::Instant::now();
            match self.poll_once(&mut cursor).await {
                Ok(0) => {
                    self.clock
                        .sleep(Duration::from_millis(self.config.poll_interval_ms))
                        .await;
                }
                Ok(total) => {
                    let duration_ms =
                        u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
                    logging::log_batch(total, total, duration_ms);
                }
                Err(e) => {
                    logging::log_error("poll failed, backing off", &e.to_string());
                    self.clock
                        .sleep(Duration::from_millis(self.config.error_retry_ms))
                        .await;
                }
            }
        }
    }

    /// Performs one poll iteration: fetch a page after `cursor`, process
    /// its events in order, persist the advanced cursor.
    ///
    /// Returns the number of events consumed (zero means an empty page and
    /// the caller should idle). Per-event failures are contained; only an
    /// RPC failure or a cursor-persistence failure surfaces as `Err`, in
    /// which case `cursor` is left untouched so the same page is re-fetched
    /// next iteration.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::RpcError` if the event query fails, or
    /// `IndexerError::DatabaseError` if the cursor cannot be saved.
    pub async fn poll_once(&self, cursor: &mut Option<EventId>) -> Result<usize> {
        let filter = EventFilter::module(&self.config.package_id, &self.config.module);
        let page = self
            .client
            .query_events(&filter, cursor.as_ref(), self.config.batch_size)
            .await?;

        if page.data.is_empty() {
            return Ok(0);
        }

        let mut handled = 0;
        for event in &page.data {
            if matches!(self.process_event(event).await, Outcome::Handled) {
                handled += 1;
            }
        }
        if handled > 0 {
            logging::log(
                LogLevel::Success,
                &format!("applied {handled}/{} events", page.data.len()),
            );
        }

        // With more pages pending, follow the server's cursor; otherwise
        // the last processed event is the resumption point.
        let next = if page.has_next_page {
            page.next_cursor.clone()
        } else {
            page.data.last().map(|event| event.id.clone())
        };

        if let Some(next) = next {
            // Cursor persistence failure aborts the iteration before the
            // in-memory cursor moves: the page is re-fetched and replayed,
            // which idempotent writes make safe.
            if let Err(e) = self.cursors.save(&self.stream_id(), &next).await {
                logging::log_error(
                    "cursor save failed, page will be re-fetched",
                    &e.to_string(),
                );
                return Err(e);
            }
            *cursor = Some(next);
        }

        Ok(page.data.len())
    }

    /// Classifies, maps and persists one event. Never propagates an error:
    /// a failure here must not stall the rest of the page.
    async fn process_event(&self, event: &crate::chain::types::Event) -> Outcome {
        let Some(kind) = classify(&event.event_type) else {
            logging::log(
                LogLevel::Debug,
                &format!("ignoring {} at {}", event.event_type, event.id),
            );
            return Outcome::Ignored;
        };

        let mutation = match self.mapper.map(kind, event).await {
            Ok(mutation) => mutation,
            Err(e) => {
                logging::log_error(
                    &format!("mapping failed for {}", event.id),
                    &e.to_string(),
                );
                return Outcome::Skipped;
            }
        };

        match self.storage.apply(&mutation).await {
            Ok(()) => Outcome::Handled,
            Err(e) if e.is_unique_violation() => {
                // Expected under at-least-once delivery.
                logging::log(
                    LogLevel::Debug,
                    &format!("duplicate delivery of {}", event.id),
                );
                Outcome::Handled
            }
            Err(e) => {
                logging::log_error(
                    &format!("persistence failed for {}", event.id),
                    &e.to_string(),
                );
                Outcome::Skipped
            }
        }
    }
}
