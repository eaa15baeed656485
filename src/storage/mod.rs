//! Persistence layer for mirrored marketplace entities.
//!
//! This module provides connection pool management, schema initialization,
//! and the upsert-by-natural-key write operations the poll loop uses. All
//! creation writes are idempotent upserts; terminal transitions are guarded
//! updates that never regress a terminal status, no matter how often an
//! earlier event is re-delivered.

pub mod cursor;
pub mod records;

pub use cursor::{CursorStore, InMemoryCursorStore, PgCursorStore};
pub use records::{
    BidRecord, BidStatus, BidUpdate, ListingDelist, ListingRecord, ListingSale, ListingStatus,
    Mutation, OfferRecord, OfferUpdate, TaskCancellation, TaskCompletion, TaskRecord, TaskStatus,
};

use crate::utils::error::Result;
use crate::utils::logging::{self, LogLevel};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Abstract interface for entity writes.
///
/// The poll loop only depends on this trait, so tests can substitute an
/// in-memory implementation. Every method must be safe to call repeatedly
/// with the same arguments.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn upsert_task(&self, task: &TaskRecord) -> Result<()>;
    async fn complete_task(&self, completion: &TaskCompletion) -> Result<()>;
    async fn cancel_task(&self, cancellation: &TaskCancellation) -> Result<()>;

    async fn upsert_listing(&self, listing: &ListingRecord) -> Result<()>;
    async fn mark_listing_sold(&self, sale: &ListingSale) -> Result<()>;
    async fn mark_listing_delisted(&self, delist: &ListingDelist) -> Result<()>;

    async fn upsert_bid(&self, bid: &BidRecord) -> Result<()>;
    async fn update_bid_status(&self, update: &BidUpdate) -> Result<()>;

    async fn upsert_offer(&self, offer: &OfferRecord) -> Result<()>;
    async fn update_offer_status(&self, update: &OfferUpdate) -> Result<()>;

    /// Applies one normalized mutation by dispatching to the matching
    /// operation.
    async fn apply(&self, mutation: &Mutation) -> Result<()> {
        match mutation {
            Mutation::CreateTask(task) => self.upsert_task(task).await,
            Mutation::CompleteTask(completion) => self.complete_task(completion).await,
            Mutation::CancelTask(cancellation) => self.cancel_task(cancellation).await,
            Mutation::CreateListing(listing) => self.upsert_listing(listing).await,
            Mutation::SellListing(sale) => self.mark_listing_sold(sale).await,
            Mutation::DelistListing(delist) => self.mark_listing_delisted(delist).await,
            Mutation::CreateBid(bid) => self.upsert_bid(bid).await,
            Mutation::UpdateBid(update) => self.update_bid_status(update).await,
            Mutation::CreateOffer(offer) => self.upsert_offer(offer).await,
            Mutation::UpdateOffer(update) => self.update_offer_status(update).await,
        }
    }
}

/// Postgres storage manager for the indexer.
///
/// # Example
///
/// ```no_run
/// use market_indexer::Storage;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let storage = Storage::new("postgresql://localhost/marketplace").await?;
/// storage.initialize().await?;
/// # Ok(())
/// # }
/// ```
pub struct Storage {
    pool: PgPool,
}

impl Storage {
    /// Creates a new storage instance with a connection pool.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::DatabaseError` if the connection fails.
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Wraps an existing connection pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Initializes the database schema.
    ///
    /// Creates the `cursors`, `tasks`, `listings`, `bids` and `offers`
    /// tables if they don't already exist.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::DatabaseError` if a statement fails.
    pub async fn initialize(&self) -> Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cursors (
                id TEXT PRIMARY KEY,
                tx_digest TEXT NOT NULL,
                event_seq TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS tasks (
                task_id TEXT PRIMARY KEY,
                creator TEXT NOT NULL DEFAULT '',
                reward_amount TEXT NOT NULL DEFAULT '0',
                prefix TEXT NOT NULL DEFAULT '',
                suffix TEXT NOT NULL DEFAULT '',
                contains TEXT NOT NULL DEFAULT '',
                task_type INTEGER NOT NULL DEFAULT 0,
                target_type TEXT NOT NULL DEFAULT '',
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                completer TEXT,
                bytecode TEXT,
                lock_duration_ms TEXT NOT NULL DEFAULT '0',
                tx_digest TEXT NOT NULL DEFAULT '',
                timestamp_ms TEXT NOT NULL DEFAULT '0'
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS listings (
                listing_id TEXT PRIMARY KEY,
                item_id TEXT,
                seller TEXT NOT NULL DEFAULT '',
                kiosk_id TEXT,
                price TEXT NOT NULL DEFAULT '0',
                image_url TEXT,
                listing_type TEXT NOT NULL DEFAULT 'marketplace',
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                buyer TEXT,
                price_sold TEXT,
                tx_digest TEXT NOT NULL DEFAULT '',
                timestamp_ms TEXT NOT NULL DEFAULT '0'
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS bids (
                bid_id TEXT PRIMARY KEY,
                listing_id TEXT,
                bidder TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL DEFAULT '0',
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                tx_digest TEXT NOT NULL DEFAULT '',
                timestamp_ms TEXT NOT NULL DEFAULT '0'
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS offers (
                offer_id TEXT PRIMARY KEY,
                item_id TEXT,
                buyer TEXT NOT NULL DEFAULT '',
                amount TEXT NOT NULL DEFAULT '0',
                status TEXT NOT NULL DEFAULT 'ACTIVE',
                tx_digest TEXT NOT NULL DEFAULT '',
                timestamp_ms TEXT NOT NULL DEFAULT '0'
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Closes the database connection pool.
    pub async fn close(self) {
        self.pool.close().await;
    }

    /// Runs a guarded terminal update and, when the row is missing, inserts
    /// a stub carrying the terminal status.
    ///
    /// A terminal event for an unseen entity means the creation event sits
    /// on the other side of a cursor gap or replay boundary. The stub keeps
    /// the terminal status durable; a later re-delivery of the creation
    /// event fills the remaining fields without touching `status`.
    async fn terminal_update(
        &self,
        update_sql: &str,
        stub_sql: &str,
        bindings: &[&str],
        what: &str,
        key: &str,
    ) -> Result<()> {
        let mut update = sqlx::query(update_sql);
        for value in bindings {
            update = update.bind(*value);
        }
        let affected = update.execute(&self.pool).await?.rows_affected();
        if affected > 0 {
            return Ok(());
        }

        let mut stub = sqlx::query(stub_sql);
        for value in bindings {
            stub = stub.bind(*value);
        }
        let inserted = stub.execute(&self.pool).await?.rows_affected();
        if inserted > 0 {
            logging::log(
                LogLevel::Warning,
                &format!("{what} {key}: terminal event arrived before creation, stored stub row"),
            );
        }
        // affected == 0 and inserted == 0: row already terminal, stale
        // re-delivery, nothing to do.
        Ok(())
    }
}

#[async_trait]
impl StorageBackend for Storage {
    async fn upsert_task(&self, task: &TaskRecord) -> Result<()> {
        // Never touches status or completer, so a re-delivered creation
        // event cannot regress a terminal row.
        sqlx::query(
            r"
            INSERT INTO tasks (
                task_id, creator, reward_amount, prefix, suffix, contains,
                task_type, target_type, status, bytecode, lock_duration_ms,
                tx_digest, timestamp_ms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'ACTIVE', $9, $10, $11, $12)
            ON CONFLICT (task_id) DO UPDATE
            SET creator = EXCLUDED.creator,
                reward_amount = EXCLUDED.reward_amount,
                prefix = EXCLUDED.prefix,
                suffix = EXCLUDED.suffix,
                contains = EXCLUDED.contains,
                task_type = EXCLUDED.task_type,
                target_type = EXCLUDED.target_type,
                bytecode = EXCLUDED.bytecode,
                lock_duration_ms = EXCLUDED.lock_duration_ms
            ",
        )
        .bind(&task.task_id)
        .bind(&task.creator)
        .bind(&task.reward_amount)
        .bind(&task.prefix)
        .bind(&task.suffix)
        .bind(&task.contains)
        .bind(task.task_type)
        .bind(&task.target_type)
        .bind(&task.bytecode)
        .bind(&task.lock_duration_ms)
        .bind(&task.tx_digest)
        .bind(&task.timestamp_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn complete_task(&self, completion: &TaskCompletion) -> Result<()> {
        self.terminal_update(
            r"
            UPDATE tasks
            SET status = 'COMPLETED', completer = $2, tx_digest = $3, timestamp_ms = $4
            WHERE task_id = $1 AND status = 'ACTIVE'
            ",
            r"
            INSERT INTO tasks (task_id, completer, status, tx_digest, timestamp_ms)
            VALUES ($1, $2, 'COMPLETED', $3, $4)
            ON CONFLICT (task_id) DO NOTHING
            ",
            &[
                &completion.task_id,
                &completion.completer,
                &completion.tx_digest,
                &completion.timestamp_ms,
            ],
            "task",
            &completion.task_id,
        )
        .await
    }

    async fn cancel_task(&self, cancellation: &TaskCancellation) -> Result<()> {
        self.terminal_update(
            r"
            UPDATE tasks
            SET status = 'CANCELLED', tx_digest = $2, timestamp_ms = $3
            WHERE task_id = $1 AND status = 'ACTIVE'
            ",
            r"
            INSERT INTO tasks (task_id, status, tx_digest, timestamp_ms)
            VALUES ($1, 'CANCELLED', $2, $3)
            ON CONFLICT (task_id) DO NOTHING
            ",
            &[
                &cancellation.task_id,
                &cancellation.tx_digest,
                &cancellation.timestamp_ms,
            ],
            "task",
            &cancellation.task_id,
        )
        .await
    }

    async fn upsert_listing(&self, listing: &ListingRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO listings (
                listing_id, item_id, seller, kiosk_id, price, image_url,
                listing_type, status, tx_digest, timestamp_ms
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'ACTIVE', $8, $9)
            ON CONFLICT (listing_id) DO UPDATE
            SET item_id = EXCLUDED.item_id,
                seller = EXCLUDED.seller,
                kiosk_id = EXCLUDED.kiosk_id,
                price = EXCLUDED.price,
                image_url = EXCLUDED.image_url,
                listing_type = EXCLUDED.listing_type
            ",
        )
        .bind(&listing.listing_id)
        .bind(&listing.item_id)
        .bind(&listing.seller)
        .bind(&listing.kiosk_id)
        .bind(&listing.price)
        .bind(&listing.image_url)
        .bind(&listing.listing_type)
        .bind(&listing.tx_digest)
        .bind(&listing.timestamp_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn mark_listing_sold(&self, sale: &ListingSale) -> Result<()> {
        self.terminal_update(
            r"
            UPDATE listings
            SET status = 'SOLD', buyer = $2, price_sold = $3, tx_digest = $4, timestamp_ms = $5
            WHERE listing_id = $1 AND status = 'ACTIVE'
            ",
            r"
            INSERT INTO listings (listing_id, buyer, price_sold, status, tx_digest, timestamp_ms)
            VALUES ($1, $2, $3, 'SOLD', $4, $5)
            ON CONFLICT (listing_id) DO NOTHING
            ",
            &[
                &sale.listing_id,
                &sale.buyer,
                &sale.price_sold,
                &sale.tx_digest,
                &sale.timestamp_ms,
            ],
            "listing",
            &sale.listing_id,
        )
        .await
    }

    async fn mark_listing_delisted(&self, delist: &ListingDelist) -> Result<()> {
        self.terminal_update(
            r"
            UPDATE listings
            SET status = 'DELISTED', tx_digest = $2, timestamp_ms = $3
            WHERE listing_id = $1 AND status = 'ACTIVE'
            ",
            r"
            INSERT INTO listings (listing_id, status, tx_digest, timestamp_ms)
            VALUES ($1, 'DELISTED', $2, $3)
            ON CONFLICT (listing_id) DO NOTHING
            ",
            &[&delist.listing_id, &delist.tx_digest, &delist.timestamp_ms],
            "listing",
            &delist.listing_id,
        )
        .await
    }

    async fn upsert_bid(&self, bid: &BidRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO bids (bid_id, listing_id, bidder, amount, status, tx_digest, timestamp_ms)
            VALUES ($1, $2, $3, $4, 'ACTIVE', $5, $6)
            ON CONFLICT (bid_id) DO UPDATE
            SET listing_id = EXCLUDED.listing_id,
                bidder = EXCLUDED.bidder,
                amount = EXCLUDED.amount
            ",
        )
        .bind(&bid.bid_id)
        .bind(&bid.listing_id)
        .bind(&bid.bidder)
        .bind(&bid.amount)
        .bind(&bid.tx_digest)
        .bind(&bid.timestamp_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_bid_status(&self, update: &BidUpdate) -> Result<()> {
        self.terminal_update(
            r"
            UPDATE bids
            SET status = $2, tx_digest = $3, timestamp_ms = $4
            WHERE bid_id = $1 AND status = 'ACTIVE'
            ",
            r"
            INSERT INTO bids (bid_id, status, tx_digest, timestamp_ms)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (bid_id) DO NOTHING
            ",
            &[
                &update.bid_id,
                update.status.as_str(),
                &update.tx_digest,
                &update.timestamp_ms,
            ],
            "bid",
            &update.bid_id,
        )
        .await
    }

    async fn upsert_offer(&self, offer: &OfferRecord) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO offers (offer_id, item_id, buyer, amount, status, tx_digest, timestamp_ms)
            VALUES ($1, $2, $3, $4, 'ACTIVE', $5, $6)
            ON CONFLICT (offer_id) DO UPDATE
            SET item_id = EXCLUDED.item_id,
                buyer = EXCLUDED.buyer,
                amount = EXCLUDED.amount
            ",
        )
        .bind(&offer.offer_id)
        .bind(&offer.item_id)
        .bind(&offer.buyer)
        .bind(&offer.amount)
        .bind(&offer.tx_digest)
        .bind(&offer.timestamp_ms)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_offer_status(&self, update: &OfferUpdate) -> Result<()> {
        self.terminal_update(
            r"
            UPDATE offers
            SET status = $2, tx_digest = $3, timestamp_ms = $4
            WHERE offer_id = $1 AND status = 'ACTIVE'
            ",
            r"
            INSERT INTO offers (offer_id, status, tx_digest, timestamp_ms)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (offer_id) DO NOTHING
            ",
            &[
                &update.offer_id,
                update.status.as_str(),
                &update.tx_digest,
                &update.timestamp_ms,
            ],
            "offer",
            &update.offer_id,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    #[ignore = "Requires database connection"]
    async fn test_storage_initialize() {
        let db_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/test".to_string());

        if let Ok(storage) = Storage::new(&db_url).await {
            let result = storage.initialize().await;
            assert!(result.is_ok());
        }
    }

    #[tokio::test]
    #[ignore = "Requires database connection"]
    async fn test_task_lifecycle_is_idempotent() {
        let db_url = std::env::var("TEST_DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/test".to_string());

        if let Ok(storage) = Storage::new(&db_url).await {
            storage.initialize().await.unwrap();

            let task = TaskRecord {
                task_id: "0xidem".to_string(),
                creator: "0xc1".to_string(),
                reward_amount: "1000000000".to_string(),
                prefix: "cafe".to_string(),
                suffix: String::new(),
                contains: String::new(),
                task_type: 0,
                target_type: "address".to_string(),
                lock_duration_ms: "0".to_string(),
                bytecode: None,
                tx_digest: "DigestA".to_string(),
                timestamp_ms: "1700000000000".to_string(),
            };

            storage.upsert_task(&task).await.unwrap();
            storage.upsert_task(&task).await.unwrap();

            let completion = TaskCompletion {
                task_id: "0xidem".to_string(),
                completer: "0xm1".to_string(),
                tx_digest: "DigestB".to_string(),
                timestamp_ms: "1700000001000".to_string(),
            };
            storage.complete_task(&completion).await.unwrap();
            // Stale creation re-delivery must not regress the status.
            storage.upsert_task(&task).await.unwrap();

            let status: String = sqlx::query_scalar("SELECT status FROM tasks WHERE task_id = $1")
                .bind("0xidem")
                .fetch_one(storage.pool())
                .await
                .unwrap();
            assert_eq!(status, "COMPLETED");
        }
    }
}
