//! Event classification and payload mapping.

pub mod classifier;
pub mod mapper;

pub use classifier::{classify, EventKind};
pub use mapper::EventMapper;
