use market_indexer::{ChainClient, EventFilter, EventId};
use serde_json::json;
use wiremock::matchers::{body_string_contains, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_query_events_parses_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("suix_queryEvents"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "data": [
                    {
                        "id": { "txDigest": "DigestA", "eventSeq": "0" },
                        "type": "0xabc::task_manager::TaskCreated",
                        "parsedJson": { "task_id": "0xA" },
                        "timestampMs": "1700000000000",
                        "sender": "0xC1"
                    },
                    {
                        "id": { "txDigest": "DigestA", "eventSeq": "1" },
                        "type": "0xabc::task_manager::TaskCompleted",
                        "parsedJson": { "task_id": "0xA", "solver": "0xM1" }
                    }
                ],
                "hasNextPage": true,
                "nextCursor": { "txDigest": "DigestA", "eventSeq": "1" }
            }
        })))
        .mount(&mock_server)
        .await;

    let client = ChainClient::new(mock_server.uri());
    let filter = EventFilter::module("0xabc", "task_manager");
    let page = client.query_events(&filter, None, 50).await.unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].id.tx_digest, "DigestA");
    assert_eq!(page.data[0].event_type, "0xabc::task_manager::TaskCreated");
    assert_eq!(page.data[1].timestamp_ms, None);
    assert!(page.has_next_page);
    assert_eq!(page.next_cursor, Some(EventId::new("DigestA", "1")));
}

#[tokio::test]
async fn test_query_events_sends_cursor_and_filter() {
    let mock_server = MockServer::start().await;

    // The request body must carry the module filter and the cursor digest.
    Mock::given(method("POST"))
        .and(body_string_contains("suix_queryEvents"))
        .and(body_string_contains("task_manager"))
        .and(body_string_contains("DigestPrev"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "data": [], "hasNextPage": false, "nextCursor": null }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = ChainClient::new(mock_server.uri());
    let filter = EventFilter::module("0xabc", "task_manager");
    let cursor = EventId::new("DigestPrev", "4");
    let page = client.query_events(&filter, Some(&cursor), 10).await.unwrap();

    assert!(page.data.is_empty());
    assert!(!page.has_next_page);
}

#[tokio::test]
async fn test_json_rpc_error_surfaces_as_rpc_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32602, "message": "Invalid params" }
        })))
        .mount(&mock_server)
        .await;

    let client = ChainClient::new(mock_server.uri());
    let filter = EventFilter::module("0xabc", "task_manager");
    let result = client.query_events(&filter, None, 50).await;

    let err = result.unwrap_err();
    assert!(err.to_string().contains("Invalid params"));
}

#[tokio::test]
async fn test_get_transaction_block() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("sui_getTransactionBlock"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {
                "digest": "DigestTx",
                "timestampMs": "1700000000000",
                "events": [
                    {
                        "id": { "txDigest": "DigestTx", "eventSeq": "0" },
                        "type": "0xabc::marketplace::ItemSold",
                        "parsedJson": { "listing_id": "0xL1", "price": "500" }
                    }
                ]
            }
        })))
        .mount(&mock_server)
        .await;

    let client = ChainClient::new(mock_server.uri());
    let block = client.get_transaction_block("DigestTx").await.unwrap();

    assert_eq!(block.digest, "DigestTx");
    assert_eq!(block.timestamp_ms.as_deref(), Some("1700000000000"));
    assert_eq!(block.events.len(), 1);
    assert_eq!(block.events[0].event_type, "0xabc::marketplace::ItemSold");
}

#[tokio::test]
async fn test_get_object_missing_is_not_an_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("sui_getObject"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": { "error": { "code": "notExists", "object_id": "0xgone" } }
        })))
        .mount(&mock_server)
        .await;

    let client = ChainClient::new(mock_server.uri());
    let object = client.get_object("0xgone").await.unwrap();

    assert!(object.data.is_none());
    assert_eq!(object.display_image_url(), "");
}

#[tokio::test]
async fn test_transport_failure_is_rpc_error() {
    // Nothing is listening on this port.
    let client = ChainClient::new("http://127.0.0.1:1");
    let filter = EventFilter::module("0xabc", "task_manager");
    let result = client.query_events(&filter, None, 10).await;
    assert!(result.is_err());
}
