use std::env;
use std::time::Duration;

use tracing::warn;

/// Configuration for a streaming session's polling loop.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Solana RPC endpoint for signature and transaction queries.
    pub rpc_endpoint: String,
    /// Address whose recent signatures are polled. Defaults to the SPL Token
    /// program, which sees every token transfer on chain.
    pub watch_address: String,
    /// Maximum signatures fetched per poll cycle.
    pub signature_limit: usize,
    /// Delay between successful poll cycles (in seconds).
    pub poll_interval_secs: u64,
    /// Delay before retrying after a failed cycle (in seconds). Fixed, not
    /// exponential; the loop never gives up while the session is alive.
    pub error_backoff_secs: u64,
    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            rpc_endpoint: "https://api.mainnet-beta.solana.com".to_string(),
            watch_address: spl_token::id().to_string(),
            signature_limit: 10,
            poll_interval_secs: 5,
            error_backoff_secs: 10,
            rpc_timeout_secs: 10,
        }
    }
}

impl StreamConfig {
    /// Builds a configuration from `SOLFEED_*` environment variables, falling
    /// back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            rpc_endpoint: env::var("SOLFEED_RPC_URL").unwrap_or(defaults.rpc_endpoint),
            watch_address: env::var("SOLFEED_WATCH_ADDRESS").unwrap_or(defaults.watch_address),
            signature_limit: parse_env("SOLFEED_SIGNATURE_LIMIT", defaults.signature_limit),
            poll_interval_secs: parse_env("SOLFEED_POLL_INTERVAL_SECS", defaults.poll_interval_secs),
            error_backoff_secs: parse_env("SOLFEED_ERROR_BACKOFF_SECS", defaults.error_backoff_secs),
            rpc_timeout_secs: parse_env("SOLFEED_RPC_TIMEOUT_SECS", defaults.rpc_timeout_secs),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.error_backoff_secs)
    }

    pub fn rpc_timeout(&self) -> Duration {
        Duration::from_secs(self.rpc_timeout_secs)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key = key, value = %raw, "Unparsable environment override, using default");
                default
            }
        },
        Err(_) => default,
    }
}
