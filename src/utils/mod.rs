//! Shared utilities: error types and console logging.

pub mod error;
pub mod logging;
