// Domain types, constants, and error taxonomy
pub mod core;

// Chain access and transaction normalization
pub mod chain;

// Purchase classification heuristics
pub mod classify;

// Runtime configuration
pub mod config;

// Predicate evaluation
pub mod filter;

// Token reference data (static table and live pricing)
pub mod reference;

// Polling loop, backoff, and cancellation
pub mod stream;

// Re-export commonly used types for convenience
pub use crate::core::*;
pub use chain::{ChainReader, RpcChainReader};
pub use config::StreamConfig;
pub use reference::{DexScreenerFeed, ReferenceSource, TokenRegistry};
pub use stream::{stream_transactions, StreamHandle, StreamSession};
