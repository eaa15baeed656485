//! Normalized entity records produced by the event mapper.
//!
//! Every record is keyed by a natural id assigned on-chain, never generated
//! locally. That is what makes upsert-based idempotency correct under
//! at-least-once delivery. Token amounts stay decimal strings end to end;
//! they are never parsed into floating point.

/// Lifecycle status of a task. `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    Active,
    Completed,
    Cancelled,
}

impl TaskStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Active => "ACTIVE",
            TaskStatus::Completed => "COMPLETED",
            TaskStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Lifecycle status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStatus {
    Active,
    Sold,
    Delisted,
}

impl ListingStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Active => "ACTIVE",
            ListingStatus::Sold => "SOLD",
            ListingStatus::Delisted => "DELISTED",
        }
    }
}

/// Lifecycle status of a bid or offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BidStatus {
    Active,
    Accepted,
    Cancelled,
}

impl BidStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BidStatus::Active => "ACTIVE",
            BidStatus::Accepted => "ACCEPTED",
            BidStatus::Cancelled => "CANCELLED",
        }
    }
}

/// A task row as created from a `TaskCreated` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    pub task_id: String,
    pub creator: String,
    /// Reward in base token units, preserved as a decimal string.
    pub reward_amount: String,
    pub prefix: String,
    pub suffix: String,
    pub contains: String,
    pub task_type: i32,
    pub target_type: String,
    pub lock_duration_ms: String,
    /// Base64-encoded bytecode payload, when the event carried one.
    pub bytecode: Option<String>,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// Terminal transition: a task was completed by `completer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCompletion {
    pub task_id: String,
    pub completer: String,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// Terminal transition: a task was cancelled by its creator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskCancellation {
    pub task_id: String,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// A listing row as created from an item-listed event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRecord {
    pub listing_id: String,
    pub item_id: Option<String>,
    pub seller: String,
    pub kiosk_id: Option<String>,
    pub price: String,
    pub image_url: Option<String>,
    /// Source of the listing: `"marketplace"` or `"kiosk"`.
    pub listing_type: String,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// Terminal transition: a listing was purchased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingSale {
    pub listing_id: String,
    pub buyer: String,
    pub price_sold: String,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// Terminal transition: a listing was withdrawn by the seller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDelist {
    pub listing_id: String,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// A bid row as created from a `BidPlaced` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidRecord {
    pub bid_id: String,
    pub listing_id: Option<String>,
    pub bidder: String,
    pub amount: String,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// Terminal transition of a bid to `Accepted` or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BidUpdate {
    pub bid_id: String,
    pub status: BidStatus,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// An offer row as created from an `OfferCreated` event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferRecord {
    pub offer_id: String,
    pub item_id: Option<String>,
    pub buyer: String,
    pub amount: String,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// Terminal transition of an offer to `Accepted` or `Cancelled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferUpdate {
    pub offer_id: String,
    pub status: BidStatus,
    pub tx_digest: String,
    pub timestamp_ms: String,
}

/// One normalized write produced from a classified event.
///
/// The poll loop applies mutations through [`crate::storage::StorageBackend`]
/// strictly in emission order, which is what keeps status transitions
/// monotonic without any mapper-side ordering logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateTask(TaskRecord),
    CompleteTask(TaskCompletion),
    CancelTask(TaskCancellation),
    CreateListing(ListingRecord),
    SellListing(ListingSale),
    DelistListing(ListingDelist),
    CreateBid(BidRecord),
    UpdateBid(BidUpdate),
    CreateOffer(OfferRecord),
    UpdateOffer(OfferUpdate),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_strings() {
        assert_eq!(TaskStatus::Active.as_str(), "ACTIVE");
        assert_eq!(TaskStatus::Completed.as_str(), "COMPLETED");
        assert_eq!(ListingStatus::Sold.as_str(), "SOLD");
        assert_eq!(ListingStatus::Delisted.as_str(), "DELISTED");
        assert_eq!(BidStatus::Accepted.as_str(), "ACCEPTED");
    }
}
