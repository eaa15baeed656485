//! Payload mapping from raw events to normalized records.
//!
//! Each recognized event kind has a mapping function that extracts named
//! fields from the decoded JSON payload. Field names drifted across
//! contract versions, so every logical attribute resolves through an
//! ordered alias chain where the first present key wins. Numeric amounts are
//! decimal strings and never parsed into floating point.

use crate::chain::types::Event;
use crate::chain::ChainClient;
use crate::events::classifier::EventKind;
use crate::storage::records::{
    BidRecord, BidStatus, BidUpdate, ListingDelist, ListingRecord, ListingSale, Mutation,
    OfferRecord, OfferUpdate, TaskCancellation, TaskCompletion, TaskRecord,
};
use crate::utils::error::{IndexerError, Result};
use crate::utils::logging::{self, LogLevel};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde_json::Value;
use std::sync::Arc;

/// Alias chains for attributes whose field name varies by contract version.
/// Order is priority order; the first present key wins.
const TASK_ID_ALIASES: &[&str] = &["task_id", "id", "object_id"];
const COMPLETER_ALIASES: &[&str] = &["completer", "solver", "miner"];
const LISTING_ID_ALIASES: &[&str] = &["listing_id", "id", "object_id"];
const ITEM_ID_ALIASES: &[&str] = &["item_id", "item", "nft_id"];
const PRICE_ALIASES: &[&str] = &["price", "amount"];
const BID_ID_ALIASES: &[&str] = &["bid_id", "id", "object_id"];
const OFFER_ID_ALIASES: &[&str] = &["offer_id", "id", "object_id"];

/// Maps classified events onto [`Mutation`]s.
///
/// Holds a chain client for the one enrichment side-effect: kiosk events
/// are not scoped to this marketplace and carry no display metadata, so the
/// mapper looks the listed object up to resolve an image URL.
pub struct EventMapper {
    client: Arc<ChainClient>,
}

impl EventMapper {
    #[must_use]
    pub fn new(client: Arc<ChainClient>) -> Self {
        Self { client }
    }

    /// Maps one classified event to a normalized mutation.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::MappingError` when a required field is absent
    /// under every known alias. Enrichment lookup failures are not errors;
    /// they degrade to an empty image URL with a warning.
    pub async fn map(&self, kind: EventKind, event: &Event) -> Result<Mutation> {
        match kind {
            EventKind::TaskCreated => self.map_task_created(event),
            EventKind::TaskCompleted => self.map_task_completed(event),
            EventKind::TaskCancelled => self.map_task_cancelled(event),
            EventKind::ItemListed => self.map_item_listed(event),
            EventKind::ItemSold => self.map_item_sold(event),
            EventKind::ItemDelisted => self.map_item_delisted(event),
            EventKind::KioskItemListed => self.map_kiosk_listed(event).await,
            EventKind::KioskItemPurchased => self.map_kiosk_purchased(event),
            EventKind::KioskItemDelisted => self.map_kiosk_delisted(event),
            EventKind::BidPlaced => self.map_bid_placed(event),
            EventKind::BidAccepted => self.map_bid_update(event, BidStatus::Accepted),
            EventKind::BidCancelled => self.map_bid_update(event, BidStatus::Cancelled),
            EventKind::OfferCreated => self.map_offer_created(event),
            EventKind::OfferAccepted => self.map_offer_update(event, BidStatus::Accepted),
            EventKind::OfferCancelled => self.map_offer_update(event, BidStatus::Cancelled),
        }
    }

    fn map_task_created(&self, event: &Event) -> Result<Mutation> {
        let payload = &event.parsed_json;
        Ok(Mutation::CreateTask(TaskRecord {
            task_id: require(payload, TASK_ID_ALIASES, "task id", event)?,
            creator: actor(event, &["creator", "sender"], "creator")?,
            reward_amount: string_field(payload, &["reward_amount", "reward"])
                .unwrap_or_else(|| "0".to_string()),
            prefix: string_field(payload, &["prefix"]).unwrap_or_default(),
            suffix: string_field(payload, &["suffix"]).unwrap_or_default(),
            contains: string_field(payload, &["contains"]).unwrap_or_default(),
            task_type: int_field(payload, &["task_type", "type"]),
            target_type: string_field(payload, &["target_type"]).unwrap_or_default(),
            lock_duration_ms: string_field(payload, &["lock_duration_ms", "lock_duration"])
                .unwrap_or_else(|| "0".to_string()),
            bytecode: bytes_field(payload, &["bytecode"]),
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_task_completed(&self, event: &Event) -> Result<Mutation> {
        let payload = &event.parsed_json;
        Ok(Mutation::CompleteTask(TaskCompletion {
            task_id: require(payload, TASK_ID_ALIASES, "task id", event)?,
            completer: require(payload, COMPLETER_ALIASES, "completer", event)?,
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_task_cancelled(&self, event: &Event) -> Result<Mutation> {
        Ok(Mutation::CancelTask(TaskCancellation {
            task_id: require(&event.parsed_json, TASK_ID_ALIASES, "task id", event)?,
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_item_listed(&self, event: &Event) -> Result<Mutation> {
        let payload = &event.parsed_json;
        Ok(Mutation::CreateListing(ListingRecord {
            listing_id: require(payload, LISTING_ID_ALIASES, "listing id", event)?,
            item_id: string_field(payload, ITEM_ID_ALIASES),
            seller: actor(event, &["seller"], "seller")?,
            kiosk_id: None,
            price: string_field(payload, PRICE_ALIASES).unwrap_or_else(|| "0".to_string()),
            image_url: string_field(payload, &["image_url", "url"]),
            listing_type: "marketplace".to_string(),
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_item_sold(&self, event: &Event) -> Result<Mutation> {
        let payload = &event.parsed_json;
        Ok(Mutation::SellListing(ListingSale {
            listing_id: require(payload, LISTING_ID_ALIASES, "listing id", event)?,
            buyer: actor(event, &["buyer", "purchaser"], "buyer")?,
            price_sold: string_field(payload, &["price_sold", "price", "amount"])
                .unwrap_or_else(|| "0".to_string()),
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_item_delisted(&self, event: &Event) -> Result<Mutation> {
        Ok(Mutation::DelistListing(ListingDelist {
            listing_id: require(&event.parsed_json, LISTING_ID_ALIASES, "listing id", event)?,
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    /// Kiosk listings carry no display metadata of their own, so the listed
    /// object is fetched to resolve an image. The lookup must never abort
    /// ingestion of the event itself.
    async fn map_kiosk_listed(&self, event: &Event) -> Result<Mutation> {
        let payload = &event.parsed_json;
        let item_id = string_field(payload, &["id", "item_id", "object_id"]);

        let image_url = match &item_id {
            Some(id) => match self.client.get_object(id).await {
                Ok(object) => object.display_image_url(),
                Err(e) => {
                    logging::log(
                        LogLevel::Warning,
                        &format!("image lookup failed for {id}: {e}"),
                    );
                    String::new()
                }
            },
            None => String::new(),
        };

        Ok(Mutation::CreateListing(ListingRecord {
            listing_id: require(payload, &["id", "listing_id", "object_id"], "listing id", event)?,
            item_id,
            seller: actor(event, &["seller"], "seller")?,
            kiosk_id: string_field(payload, &["kiosk", "kiosk_id"]),
            price: string_field(payload, PRICE_ALIASES).unwrap_or_else(|| "0".to_string()),
            image_url: Some(image_url),
            listing_type: "kiosk".to_string(),
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_kiosk_purchased(&self, event: &Event) -> Result<Mutation> {
        let payload = &event.parsed_json;
        Ok(Mutation::SellListing(ListingSale {
            listing_id: require(payload, &["id", "listing_id", "object_id"], "listing id", event)?,
            buyer: actor(event, &["buyer"], "buyer")?,
            price_sold: string_field(payload, PRICE_ALIASES).unwrap_or_else(|| "0".to_string()),
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_kiosk_delisted(&self, event: &Event) -> Result<Mutation> {
        Ok(Mutation::DelistListing(ListingDelist {
            listing_id: require(
                &event.parsed_json,
                &["id", "listing_id", "object_id"],
                "listing id",
                event,
            )?,
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_bid_placed(&self, event: &Event) -> Result<Mutation> {
        let payload = &event.parsed_json;
        Ok(Mutation::CreateBid(BidRecord {
            bid_id: require(payload, BID_ID_ALIASES, "bid id", event)?,
            listing_id: string_field(payload, &["listing_id", "listing"]),
            bidder: actor(event, &["bidder", "buyer"], "bidder")?,
            amount: string_field(payload, &["amount", "price"]).unwrap_or_else(|| "0".to_string()),
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_bid_update(&self, event: &Event, status: BidStatus) -> Result<Mutation> {
        Ok(Mutation::UpdateBid(BidUpdate {
            bid_id: require(&event.parsed_json, BID_ID_ALIASES, "bid id", event)?,
            status,
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_offer_created(&self, event: &Event) -> Result<Mutation> {
        let payload = &event.parsed_json;
        Ok(Mutation::CreateOffer(OfferRecord {
            offer_id: require(payload, OFFER_ID_ALIASES, "offer id", event)?,
            item_id: string_field(payload, ITEM_ID_ALIASES),
            buyer: actor(event, &["buyer", "offerer"], "buyer")?,
            amount: string_field(payload, &["amount", "price"]).unwrap_or_else(|| "0".to_string()),
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }

    fn map_offer_update(&self, event: &Event, status: BidStatus) -> Result<Mutation> {
        Ok(Mutation::UpdateOffer(OfferUpdate {
            offer_id: require(&event.parsed_json, OFFER_ID_ALIASES, "offer id", event)?,
            status,
            tx_digest: event.id.tx_digest.clone(),
            timestamp_ms: event.timestamp(),
        }))
    }
}

/// Resolves a field through its alias chain, first present wins.
///
/// JSON numbers are rendered back to their decimal text so large token
/// amounts survive without a float round-trip.
fn string_field(payload: &Value, aliases: &[&str]) -> Option<String> {
    for key in aliases {
        match payload.get(*key) {
            Some(Value::String(s)) => return Some(s.clone()),
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(Value::Bool(b)) => return Some(b.to_string()),
            _ => {}
        }
    }
    None
}

/// Like [`string_field`] but required; a miss is a mapping error naming the
/// attribute and the offending event.
fn require(payload: &Value, aliases: &[&str], what: &str, event: &Event) -> Result<String> {
    string_field(payload, aliases).ok_or_else(|| {
        IndexerError::MappingError(format!(
            "missing {what} in {} at {}",
            event.event_type, event.id
        ))
    })
}

/// Resolves an acting address: payload aliases first, then the transaction
/// sender.
fn actor(event: &Event, aliases: &[&str], what: &str) -> Result<String> {
    if let Some(value) = string_field(&event.parsed_json, aliases) {
        return Ok(value);
    }
    event.sender.clone().ok_or_else(|| {
        IndexerError::MappingError(format!(
            "missing {what} in {} at {}",
            event.event_type, event.id
        ))
    })
}

fn int_field(payload: &Value, aliases: &[&str]) -> i32 {
    for key in aliases {
        if let Some(n) = payload.get(*key).and_then(Value::as_i64) {
            return i32::try_from(n).unwrap_or(0);
        }
        if let Some(s) = payload.get(*key).and_then(Value::as_str) {
            if let Ok(n) = s.parse::<i32>() {
                return n;
            }
        }
    }
    0
}

/// Extracts a byte-array field and base64-encodes it for storage. A string
/// value is assumed to be encoded already and passed through.
fn bytes_field(payload: &Value, aliases: &[&str]) -> Option<String> {
    for key in aliases {
        match payload.get(*key) {
            Some(Value::Array(items)) => {
                let bytes: Vec<u8> = items
                    .iter()
                    .filter_map(Value::as_u64)
                    .filter_map(|n| u8::try_from(n).ok())
                    .collect();
                return Some(BASE64.encode(bytes));
            }
            Some(Value::String(s)) => return Some(s.clone()),
            _ => {}
        }
    }
    None
}
