use market_indexer::{classify, EventKind};

#[test]
fn test_full_task_lifecycle_types() {
    let package = "0x7c3f9a0b";
    assert_eq!(
        classify(&format!("{package}::task_manager::TaskCreated")),
        Some(EventKind::TaskCreated)
    );
    assert_eq!(
        classify(&format!("{package}::task_manager::TaskCompleted")),
        Some(EventKind::TaskCompleted)
    );
    assert_eq!(
        classify(&format!("{package}::task_manager::TaskCancelled")),
        Some(EventKind::TaskCancelled)
    );
}

#[test]
fn test_marketplace_and_kiosk_listings_are_distinct_kinds() {
    assert_eq!(
        classify("0xabc::marketplace::ItemListed"),
        Some(EventKind::ItemListed)
    );
    assert_eq!(
        classify("0x2::kiosk::ItemListed"),
        Some(EventKind::KioskItemListed)
    );
    assert_eq!(
        classify("0x2::kiosk::ItemDelisted<0xabc::nft::Card>"),
        Some(EventKind::KioskItemDelisted)
    );
}

#[test]
fn test_bid_and_offer_types() {
    assert_eq!(classify("0xabc::bids::BidPlaced"), Some(EventKind::BidPlaced));
    assert_eq!(
        classify("0xabc::bids::BidAccepted"),
        Some(EventKind::BidAccepted)
    );
    assert_eq!(
        classify("0xabc::offers::OfferCancelled"),
        Some(EventKind::OfferCancelled)
    );
}

#[test]
fn test_unrecognized_types_fall_through() {
    assert_eq!(classify("0xpkg::other::Unrelated"), None);
    assert_eq!(classify("0xabc::task_manager::TaskUpdated"), None);
    // Similar name in an unrelated position must not match the `::`-anchored
    // patterns.
    assert_eq!(classify("TaskCreated"), None);
}
