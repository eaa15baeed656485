//! Chain RPC client and wire types.

pub mod client;
pub mod types;

pub use client::ChainClient;
pub use types::{Event, EventFilter, EventId, EventPage, ObjectResponse, TransactionBlock};
