pub mod live;
pub mod registry;

use async_trait::async_trait;

use crate::core::TokenReference;

pub use live::DexScreenerFeed;
pub use registry::TokenRegistry;

/// Source of descriptive token metadata keyed by symbol.
///
/// Absence of data is a normal outcome, never an error. The static registry
/// and the live pricing feed implement the same shape so callers do not change
/// when the backing source does.
#[async_trait]
pub trait ReferenceSource: Send + Sync {
    async fn reference_for(&self, symbol: &str) -> Option<TokenReference>;
}
