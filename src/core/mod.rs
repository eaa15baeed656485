//! Poll loop and scheduling.

pub mod clock;
pub mod indexer;

pub use clock::{Clock, NoopClock, TokioClock};
pub use indexer::MarketIndexer;
