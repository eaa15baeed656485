//! JSON-RPC client for the chain fullnode.
//!
//! This module wraps the three read operations the indexer needs: paginated
//! event queries, transaction lookups, and object reads. Failures surface
//! unchanged as [`IndexerError::RpcError`]; retry policy belongs to the
//! poll loop, not the client.

use crate::chain::types::{EventFilter, EventId, EventPage, ObjectResponse, TransactionBlock};
use crate::utils::error::{IndexerError, Result};
use serde_json::{json, Value};

/// Read-only RPC client for the fullnode.
///
/// # Example
///
/// ```no_run
/// # use market_indexer::{ChainClient, EventFilter};
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = ChainClient::new("https://fullnode.mainnet.example.io:443");
/// let filter = EventFilter::module("0xpkg", "task_manager");
/// let page = client.query_events(&filter, None, 50).await?;
/// println!("fetched {} events", page.data.len());
/// # Ok(())
/// # }
/// ```
pub struct ChainClient {
    http: reqwest::Client,
    rpc_url: String,
}

impl ChainClient {
    /// Creates a new client against the given RPC endpoint.
    #[must_use]
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
        }
    }

    /// Returns the configured RPC endpoint URL.
    #[must_use]
    pub fn rpc_url(&self) -> &str {
        &self.rpc_url
    }

    /// Issues a raw JSON-RPC call and unwraps the `result` member.
    async fn call(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexerError::RpcError(format!("{method} request failed: {e}")))?;

        let payload: Value = response
            .json()
            .await
            .map_err(|e| IndexerError::RpcError(format!("{method} returned invalid JSON: {e}")))?;

        if let Some(error) = payload.get("error") {
            return Err(IndexerError::RpcError(format!(
                "{method} returned error: {error}"
            )));
        }

        payload
            .get("result")
            .cloned()
            .ok_or_else(|| IndexerError::RpcError(format!("{method} returned no result")))
    }

    /// Queries events emitted by the filtered module, in ascending emission
    /// order, starting strictly after `cursor`.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::RpcError` on transport failure, a JSON-RPC
    /// error response, or a malformed result.
    pub async fn query_events(
        &self,
        filter: &EventFilter,
        cursor: Option<&EventId>,
        limit: usize,
    ) -> Result<EventPage> {
        let params = json!([filter.to_query(), cursor, limit, false]);
        let result = self.call("suix_queryEvents", params).await?;

        serde_json::from_value(result)
            .map_err(|e| IndexerError::RpcError(format!("malformed event page: {e}")))
    }

    /// Fetches a transaction block by digest, including its emitted events.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::RpcError` on transport or response failure.
    pub async fn get_transaction_block(&self, digest: &str) -> Result<TransactionBlock> {
        let params = json!([digest, { "showEvents": true }]);
        let result = self.call("sui_getTransactionBlock", params).await?;

        serde_json::from_value(result)
            .map_err(|e| IndexerError::RpcError(format!("malformed transaction block: {e}")))
    }

    /// Fetches an object by id with display metadata and content.
    ///
    /// A missing or deleted object is not an `Err`, since the RPC reports it in
    /// the response envelope's `error` field.
    ///
    /// # Errors
    ///
    /// Returns `IndexerError::RpcError` on transport or response failure.
    pub async fn get_object(&self, object_id: &str) -> Result<ObjectResponse> {
        let params = json!([object_id, { "showDisplay": true, "showContent": true }]);
        let result = self.call("sui_getObject", params).await?;

        serde_json::from_value(result)
            .map_err(|e| IndexerError::RpcError(format!("malformed object response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = ChainClient::new("http://127.0.0.1:9000");
        assert_eq!(client.rpc_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn test_client_creation_from_string() {
        let url = String::from("http://localhost:9000");
        let client = ChainClient::new(url);
        assert_eq!(client.rpc_url(), "http://localhost:9000");
    }
}
