//! `market-indexer` - mirrors on-chain marketplace events into Postgres.
//!
//! The indexer is a long-running polling service: it queries a fullnode for
//! events emitted by a watched Move module, classifies each event by its
//! type string, maps the payload onto normalized entity records (tasks,
//! listings, bids, offers), upserts them into local tables, and persists a
//! cursor so restarts resume where processing left off.
//!
//! # Quick Start
//!
//! ```no_run
//! use market_indexer::{IndexerConfigBuilder, MarketIndexer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     dotenvy::dotenv().ok();
//!
//!     let config = IndexerConfigBuilder::new()
//!         .with_database(std::env::var("DATABASE_URL")?)
//!         .package_id("0xabc")
//!         .module("task_manager")
//!         .with_poll_interval_ms(2000)
//!         .build()?;
//!
//!     let indexer = MarketIndexer::new(config).await?;
//!     indexer.run().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! The pipeline runs strictly sequentially per stream:
//!
//! 1. **Poll Loop** - fetches a page of events after the saved cursor
//! 2. **Classifier** - matches the event type against a closed suffix table
//! 3. **Mapper** - extracts payload fields through alias chains
//! 4. **Storage** - applies idempotent upserts keyed by chain-assigned ids
//! 5. **Cursor Store** - persists the advanced position per stream
//!
//! Delivery is at-least-once: every write is safe to repeat, and terminal
//! statuses (COMPLETED, CANCELLED, SOLD, DELISTED) are never regressed by
//! re-delivered earlier events.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

// Public API exports
pub use chain::client::ChainClient;
pub use chain::types::{Event, EventFilter, EventId, EventPage, ObjectResponse, TransactionBlock};
pub use config::{IndexerConfig, IndexerConfigBuilder, Network};
pub use core::clock::{Clock, NoopClock, TokioClock};
pub use core::indexer::MarketIndexer;
pub use events::classifier::{classify, EventKind};
pub use events::mapper::EventMapper;
pub use storage::records::{
    BidRecord, BidStatus, BidUpdate, ListingDelist, ListingRecord, ListingSale, ListingStatus,
    Mutation, OfferRecord, OfferUpdate, TaskCancellation, TaskCompletion, TaskRecord, TaskStatus,
};
pub use storage::{CursorStore, InMemoryCursorStore, PgCursorStore, Storage, StorageBackend};
pub use utils::error::{IndexerError, Result};

// Module declarations
pub mod chain;
pub mod config;
pub mod core;
pub mod events;
pub mod storage;
pub mod utils;
