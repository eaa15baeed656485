use market_indexer::{ChainClient, Event, EventId, EventKind, EventMapper, Mutation};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn event(event_type: &str, payload: serde_json::Value) -> Event {
    serde_json::from_value(json!({
        "id": { "txDigest": "DigestMap", "eventSeq": "0" },
        "type": event_type,
        "parsedJson": payload,
        "timestampMs": "1700000000000",
        "sender": "0xsender"
    }))
    .unwrap()
}

/// Mapper with a client pointing nowhere; only valid for kinds that never
/// perform the enrichment lookup.
fn offline_mapper() -> EventMapper {
    EventMapper::new(Arc::new(ChainClient::new("http://127.0.0.1:1")))
}

#[tokio::test]
async fn test_task_created_mapping() {
    let mapper = offline_mapper();
    let event = event(
        "0xabc::task_manager::TaskCreated",
        json!({
            "task_id": "0xA",
            "creator": "0xC1",
            "reward_amount": "1000000000",
            "prefix": "cafe",
            "task_type": 1,
            "target_type": "address"
        }),
    );

    let mutation = mapper.map(EventKind::TaskCreated, &event).await.unwrap();
    let Mutation::CreateTask(task) = mutation else {
        panic!("expected CreateTask");
    };
    assert_eq!(task.task_id, "0xA");
    assert_eq!(task.creator, "0xC1");
    assert_eq!(task.reward_amount, "1000000000");
    assert_eq!(task.prefix, "cafe");
    assert_eq!(task.suffix, "");
    assert_eq!(task.task_type, 1);
    assert_eq!(task.tx_digest, "DigestMap");
    assert_eq!(task.timestamp_ms, "1700000000000");
}

#[tokio::test]
async fn test_completer_alias_resolution() {
    let mapper = offline_mapper();

    // `completer` absent, `solver` present: solver wins.
    let solver_event = event(
        "0xabc::task_manager::TaskCompleted",
        json!({ "task_id": "0xA", "solver": "0xM1" }),
    );
    let Mutation::CompleteTask(completion) = mapper
        .map(EventKind::TaskCompleted, &solver_event)
        .await
        .unwrap()
    else {
        panic!("expected CompleteTask");
    };
    assert_eq!(completion.completer, "0xM1");

    // Both present: `completer` has priority.
    let both_event = event(
        "0xabc::task_manager::TaskCompleted",
        json!({ "task_id": "0xA", "completer": "0xC", "solver": "0xS", "miner": "0xM" }),
    );
    let Mutation::CompleteTask(completion) = mapper
        .map(EventKind::TaskCompleted, &both_event)
        .await
        .unwrap()
    else {
        panic!("expected CompleteTask");
    };
    assert_eq!(completion.completer, "0xC");
}

#[tokio::test]
async fn test_missing_required_field_is_mapping_error() {
    let mapper = offline_mapper();
    let bad = event("0xabc::task_manager::TaskCompleted", json!({ "task_id": "0xA" }));
    let result = mapper.map(EventKind::TaskCompleted, &bad).await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_large_amounts_survive_as_decimal_strings() {
    let mapper = offline_mapper();
    let listed = event(
        "0xabc::marketplace::ItemListed",
        json!({ "listing_id": "0xL1", "seller": "0xS1", "price": "123456789012345678" }),
    );
    let Mutation::CreateListing(listing) =
        mapper.map(EventKind::ItemListed, &listed).await.unwrap()
    else {
        panic!("expected CreateListing");
    };
    assert_eq!(listing.price, "123456789012345678");
}

#[tokio::test]
async fn test_bytecode_is_base64_encoded() {
    let mapper = offline_mapper();
    let created = event(
        "0xabc::task_manager::TaskCreated",
        json!({ "task_id": "0xA", "creator": "0xC1", "bytecode": [1, 2, 3, 255] }),
    );
    let Mutation::CreateTask(task) = mapper.map(EventKind::TaskCreated, &created).await.unwrap()
    else {
        panic!("expected CreateTask");
    };
    assert_eq!(task.bytecode.as_deref(), Some("AQID/w=="));
}

#[tokio::test]
async fn test_seller_falls_back_to_event_sender() {
    let mapper = offline_mapper();
    let listed = event(
        "0x2::kiosk::ItemPurchased",
        json!({ "id": "0xL2", "price": "500" }),
    );
    let Mutation::SellListing(sale) = mapper
        .map(EventKind::KioskItemPurchased, &listed)
        .await
        .unwrap()
    else {
        panic!("expected SellListing");
    };
    assert_eq!(sale.buyer, "0xsender");
    assert_eq!(sale.price_sold, "500");
}

#[tokio::test]
async fn test_kiosk_listing_enriched_with_display_image() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("sui_getObject"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "data": {
                    "objectId": "0xitem",
                    "display": { "data": { "image_url": "https://img/nft.png" } }
                }
            }
        })))
        .mount(&mock_server)
        .await;

    let mapper = EventMapper::new(Arc::new(ChainClient::new(mock_server.uri())));
    let listed = event(
        "0x2::kiosk::ItemListed",
        json!({ "id": "0xitem", "kiosk": "0xkiosk", "price": "700", "seller": "0xS2" }),
    );

    let Mutation::CreateListing(listing) = mapper
        .map(EventKind::KioskItemListed, &listed)
        .await
        .unwrap()
    else {
        panic!("expected CreateListing");
    };
    assert_eq!(listing.image_url.as_deref(), Some("https://img/nft.png"));
    assert_eq!(listing.kiosk_id.as_deref(), Some("0xkiosk"));
    assert_eq!(listing.listing_type, "kiosk");
}

#[tokio::test]
async fn test_kiosk_enrichment_failure_degrades_to_empty_image() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(body_string_contains("sui_getObject"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let mapper = EventMapper::new(Arc::new(ChainClient::new(mock_server.uri())));
    let listed = event(
        "0x2::kiosk::ItemListed",
        json!({ "id": "0xitem", "price": "700", "seller": "0xS2" }),
    );

    // The failed lookup must not abort ingestion of the event itself.
    let Mutation::CreateListing(listing) = mapper
        .map(EventKind::KioskItemListed, &listed)
        .await
        .unwrap()
    else {
        panic!("expected CreateListing");
    };
    assert_eq!(listing.image_url.as_deref(), Some(""));
}
