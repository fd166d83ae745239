/// Symbol reported when a transaction's mint cannot be resolved against the
/// token registry.
pub const UNKNOWN_TOKEN_SYMBOL: &str = "UNKNOWN";

/// Wrapped SOL mint address.
pub const WRAPPED_SOL_MINT: &str = "So11111111111111111111111111111111111111112";
