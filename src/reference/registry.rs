use async_trait::async_trait;

use crate::core::TokenReference;

use super::ReferenceSource;

/// Static token reference table, keyed by symbol with a secondary mint index.
///
/// Read-only after construction. Each session or consumer builds its own
/// instance; there is no process-wide table.
#[derive(Debug, Clone)]
pub struct TokenRegistry {
    tokens: Vec<TokenReference>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self {
            tokens: vec![
                entry(
                    "7GCihgDB8fe6KNjn2MYtkzZcRjQy3t9GHdC8uHYmW2hr",
                    "POPCAT",
                    "Pop Cat Token",
                    1_220_000.0,
                    0.05,
                ),
                entry(
                    "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263",
                    "BONK",
                    "Bonk Token",
                    450_000_000.0,
                    0.00002,
                ),
                entry(
                    "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZgRv4P2FpF",
                    "SAMO",
                    "Samoyedcoin",
                    120_000_000.0,
                    0.03,
                ),
                entry(
                    "MangoCzJ36AjZyKwVj3VnYU4GTonjfVEnJmvvWaxLac",
                    "MANGO",
                    "Mango Markets",
                    75_000_000.0,
                    0.15,
                ),
                entry(
                    "8HGyAAB1yoM1ttS7pXjHMa3dukTFGQggnFFH3hJZgzQh",
                    "COPE",
                    "Cope Token",
                    25_000_000.0,
                    0.25,
                ),
            ],
        }
    }

    /// Looks up reference data by exact symbol. `None` for unknown symbols.
    pub fn lookup(&self, symbol: &str) -> Option<&TokenReference> {
        self.tokens.iter().find(|token| token.symbol == symbol)
    }

    /// Resolves a mint address to its registered symbol.
    pub fn symbol_for_mint(&self, mint: &str) -> Option<&str> {
        self.tokens
            .iter()
            .find(|token| token.mint == mint)
            .map(|token| token.symbol.as_str())
    }

    /// Snapshot of every registered token, for filter UIs and the like.
    pub fn available_tokens(&self) -> Vec<TokenReference> {
        self.tokens.clone()
    }
}

impl Default for TokenRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReferenceSource for TokenRegistry {
    async fn reference_for(&self, symbol: &str) -> Option<TokenReference> {
        self.lookup(symbol).cloned()
    }
}

fn entry(mint: &str, symbol: &str, name: &str, market_cap: f64, price: f64) -> TokenReference {
    TokenReference {
        mint: mint.to_string(),
        symbol: symbol.to_string(),
        name: name.to_string(),
        market_cap: Some(market_cap),
        price: Some(price),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_sensitive() {
        let registry = TokenRegistry::new();
        assert!(registry.lookup("POPCAT").is_some());
        assert!(registry.lookup("popcat").is_none());
    }

    #[test]
    fn unknown_symbol_is_a_miss_not_an_error() {
        let registry = TokenRegistry::new();
        assert!(registry.lookup("NOPE").is_none());
    }

    #[test]
    fn mint_index_round_trips_to_symbol() {
        let registry = TokenRegistry::new();
        let popcat = registry.lookup("POPCAT").unwrap();
        assert_eq!(registry.symbol_for_mint(&popcat.mint), Some("POPCAT"));
    }

    #[test]
    fn snapshot_contains_every_entry() {
        let registry = TokenRegistry::new();
        let tokens = registry.available_tokens();
        assert_eq!(tokens.len(), 5);
        assert!(tokens.iter().any(|token| token.symbol == "BONK"));
    }
}
