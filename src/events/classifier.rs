//! Event classification by type-string suffix.
//!
//! The fully-qualified event type embeds the emitting module path, e.g.
//! `0xabc::task_manager::TaskCreated`. Classification is a substring match
//! against a closed, ordered set of recognized patterns; the first match
//! wins, and unmatched types are ignored, which keeps the stream
//! forward-compatible with event types added by future contract versions.

/// Logical kind of a recognized marketplace event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    TaskCreated,
    TaskCompleted,
    TaskCancelled,
    ItemListed,
    ItemSold,
    ItemDelisted,
    KioskItemListed,
    KioskItemPurchased,
    KioskItemDelisted,
    BidPlaced,
    BidAccepted,
    BidCancelled,
    OfferCreated,
    OfferAccepted,
    OfferCancelled,
}

/// Ordered dispatch table. Marketplace-scoped patterns come before the
/// generic kiosk patterns so the more specific module path wins. Adding an
/// event kind is a data change here plus a mapper arm, not new control flow.
const DISPATCH: &[(&str, EventKind)] = &[
    ("::marketplace::ItemListed", EventKind::ItemListed),
    ("::marketplace::ItemSold", EventKind::ItemSold),
    ("::marketplace::ItemDelisted", EventKind::ItemDelisted),
    ("::kiosk::ItemListed", EventKind::KioskItemListed),
    ("::kiosk::ItemPurchased", EventKind::KioskItemPurchased),
    ("::kiosk::ItemDelisted", EventKind::KioskItemDelisted),
    ("::TaskCreated", EventKind::TaskCreated),
    ("::TaskCompleted", EventKind::TaskCompleted),
    ("::TaskCancelled", EventKind::TaskCancelled),
    ("::BidPlaced", EventKind::BidPlaced),
    ("::BidAccepted", EventKind::BidAccepted),
    ("::BidCancelled", EventKind::BidCancelled),
    ("::OfferCreated", EventKind::OfferCreated),
    ("::OfferAccepted", EventKind::OfferAccepted),
    ("::OfferCancelled", EventKind::OfferCancelled),
];

/// Classifies an event type string, or returns `None` for unrecognized
/// types (they are skipped without error and the cursor still advances).
#[must_use]
pub fn classify(event_type: &str) -> Option<EventKind> {
    DISPATCH
        .iter()
        .find(|(pattern, _)| event_type.contains(pattern))
        .map(|(_, kind)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_task_events() {
        assert_eq!(
            classify("0xabc::task_manager::TaskCreated"),
            Some(EventKind::TaskCreated)
        );
        assert_eq!(
            classify("0xabc::task_manager::TaskCompleted"),
            Some(EventKind::TaskCompleted)
        );
        assert_eq!(
            classify("0xabc::task_manager::TaskCancelled"),
            Some(EventKind::TaskCancelled)
        );
    }

    #[test]
    fn test_marketplace_wins_over_kiosk() {
        assert_eq!(
            classify("0xabc::marketplace::ItemListed"),
            Some(EventKind::ItemListed)
        );
        assert_eq!(
            classify("0x2::kiosk::ItemListed"),
            Some(EventKind::KioskItemListed)
        );
    }

    #[test]
    fn test_classify_with_type_parameter() {
        // Generic events carry type arguments after the struct name.
        assert_eq!(
            classify("0x2::kiosk::ItemPurchased<0xabc::nft::Collectible>"),
            Some(EventKind::KioskItemPurchased)
        );
    }

    #[test]
    fn test_unknown_type_is_ignored() {
        assert_eq!(classify("0xpkg::other::Unrelated"), None);
        assert_eq!(classify(""), None);
    }
}
