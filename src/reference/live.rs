use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::core::TokenReference;

use super::{ReferenceSource, TokenRegistry};

const DEXSCREENER_API: &str = "https://api.dexscreener.com/latest/dex/tokens";
const CACHE_DURATION_SECS: u64 = 30;
const API_TIMEOUT_SECS: u64 = 15;

#[derive(Debug, Deserialize)]
struct DexScreenerResponse {
    pairs: Option<Vec<TokenPair>>,
}

#[derive(Debug, Deserialize)]
struct TokenPair {
    #[serde(rename = "baseToken")]
    base_token: BaseToken,
    #[serde(rename = "priceUsd")]
    price_usd: Option<String>,
    #[serde(rename = "marketCap")]
    market_cap: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct BaseToken {
    name: String,
    symbol: String,
}

/// Live pricing backend over the DexScreener API.
///
/// Symbols are resolved to mint addresses through the static registry, then
/// priced from the first trading pair DexScreener reports. Results are cached
/// briefly to keep poll cycles off the API's rate limits. Any fetch or parse
/// failure degrades to a lookup miss.
pub struct DexScreenerFeed {
    client: Client,
    registry: TokenRegistry,
    cache: Arc<Mutex<HashMap<String, (TokenReference, Instant)>>>,
}

impl DexScreenerFeed {
    pub fn new(registry: TokenRegistry) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(API_TIMEOUT_SECS))
                .build()
                .expect("Failed to create DexScreener HTTP client"),
            registry,
            cache: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    async fn fetch_reference(&self, mint: &str, symbol: &str) -> Result<TokenReference> {
        let url = format!("{}/{}", DEXSCREENER_API, mint);

        let response = self.client.get(&url).send().await?;
        if !response.status().is_success() {
            anyhow::bail!("DexScreener API error: {}", response.status());
        }

        let data: DexScreenerResponse = response.json().await?;
        let pair = data
            .pairs
            .and_then(|pairs| pairs.into_iter().next())
            .ok_or_else(|| anyhow::anyhow!("no trading pairs for mint {mint}"))?;

        debug!(
            symbol = %pair.base_token.symbol,
            market_cap = ?pair.market_cap,
            price_usd = ?pair.price_usd,
            "DexScreener pair data"
        );

        Ok(TokenReference {
            mint: mint.to_string(),
            symbol: symbol.to_string(),
            name: pair.base_token.name,
            market_cap: pair.market_cap,
            price: pair.price_usd.and_then(|price| price.parse().ok()),
        })
    }

    fn cached(&self, symbol: &str) -> Option<TokenReference> {
        let cache = self.cache.lock().unwrap();
        cache.get(symbol).and_then(|(reference, fetched_at)| {
            (fetched_at.elapsed().as_secs() < CACHE_DURATION_SECS).then(|| reference.clone())
        })
    }

    fn store(&self, symbol: &str, reference: TokenReference) {
        let mut cache = self.cache.lock().unwrap();
        cache.insert(symbol.to_string(), (reference, Instant::now()));
    }
}

#[async_trait]
impl ReferenceSource for DexScreenerFeed {
    async fn reference_for(&self, symbol: &str) -> Option<TokenReference> {
        let mint = self.registry.lookup(symbol)?.mint.clone();

        if let Some(reference) = self.cached(symbol) {
            return Some(reference);
        }

        match self.fetch_reference(&mint, symbol).await {
            Ok(reference) => {
                self.store(symbol, reference.clone());
                Some(reference)
            }
            Err(e) => {
                warn!(symbol = %symbol, mint = %mint, error = %e, "Live reference lookup failed");
                None
            }
        }
    }
}
