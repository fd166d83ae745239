use std::sync::Arc;

use anyhow::Result;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use solfeed::chain::{ChainReader, RpcChainReader};
use solfeed::config::StreamConfig;
use solfeed::core::FilterCriteria;
use solfeed::reference::{DexScreenerFeed, ReferenceSource, TokenRegistry};
use solfeed::stream::stream_transactions;

fn init_tracing() -> Result<()> {
    // Create logs directory if it doesn't exist
    std::fs::create_dir_all("logs")?;

    let file_appender = tracing_appender::rolling::daily("logs", "solfeed.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_level(true)
        .compact();

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .json()
        .with_current_span(false)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Leak the guard to keep the file appender alive for the process lifetime
    std::mem::forget(guard);

    Ok(())
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key).ok().and_then(|value| value.parse().ok())
}

fn criteria_from_env() -> FilterCriteria {
    FilterCriteria {
        min_amount: env_f64("SOLFEED_MIN_AMOUNT"),
        max_amount: env_f64("SOLFEED_MAX_AMOUNT"),
        min_market_cap: env_f64("SOLFEED_MIN_MARKET_CAP"),
        max_market_cap: env_f64("SOLFEED_MAX_MARKET_CAP"),
        token_symbol: std::env::var("SOLFEED_TOKEN_SYMBOL").ok(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;

    let config = StreamConfig::from_env();
    let criteria = criteria_from_env();

    info!("💸 Solfeed - Token Purchase Stream");
    info!(
        rpc_endpoint = %config.rpc_endpoint,
        watch_address = %config.watch_address,
        criteria = ?criteria,
        "Starting streaming session"
    );

    let registry = Arc::new(TokenRegistry::new());
    for token in registry.available_tokens() {
        info!(
            symbol = %token.symbol,
            name = %token.name,
            market_cap = ?token.market_cap,
            "Token available for filtering"
        );
    }

    let reader: Arc<dyn ChainReader> = Arc::new(RpcChainReader::new(&config));
    let reference: Arc<dyn ReferenceSource> = if std::env::var("SOLFEED_LIVE_PRICES").is_ok() {
        info!("Using live DexScreener reference data");
        // The feed shares the registry's token table for symbol -> mint lookups.
        Arc::new(DexScreenerFeed::new((*registry).clone()))
    } else {
        registry.clone()
    };

    let handle = stream_transactions(reader, reference, registry, config, criteria, |event| {
        match serde_json::to_string(&event) {
            Ok(json) => info!(event = %json, "🟢 Token purchase detected"),
            Err(e) => warn!(
                signature = %event.tx_signature,
                error = %e,
                "Failed to serialize event"
            ),
        }
    });

    signal::ctrl_c().await?;
    info!("🛑 Shutdown signal received, stopping stream");
    handle.stop();

    Ok(())
}
