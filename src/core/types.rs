use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A qualifying token-purchase event emitted to subscribers.
///
/// Constructed once a resolved transaction passes purchase classification and
/// the configured filter; immutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEvent {
    /// Unique identifier (the transaction signature).
    pub id: String,
    /// Fee-payer wallet that originated the transaction.
    pub wallet_address: String,
    /// Symbol of the traded token, or `UNKNOWN` when the mint is unregistered.
    pub token_symbol: String,
    /// Estimated transacted value in SOL. Always >= 0.
    ///
    /// Upper-bound heuristic: sum of absolute native balance deltas across all
    /// accounts, so fees and unrelated movements are included. Downstream
    /// filter thresholds are tuned against this exact metric.
    pub amount_sol: f64,
    /// Market capitalization in USD, when reference data is available.
    pub market_cap: Option<f64>,
    /// Chain-reported block time, or the observation time if unavailable.
    pub timestamp: DateTime<Utc>,
    /// Raw chain reference, identical to `id`.
    pub tx_signature: String,
}

/// Subscriber-supplied predicate set. Every configured bound is inclusive;
/// `None` leaves that axis unconstrained.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterCriteria {
    pub min_amount: Option<f64>,
    pub max_amount: Option<f64>,
    pub min_market_cap: Option<f64>,
    pub max_market_cap: Option<f64>,
    /// Case-sensitive exact symbol match.
    pub token_symbol: Option<String>,
}

/// Descriptive metadata for a token symbol.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenReference {
    /// On-chain mint address of the token.
    pub mint: String,
    pub symbol: String,
    pub name: String,
    pub market_cap: Option<f64>,
    pub price: Option<f64>,
}

/// One entry from a recent-signatures listing, most-recent-first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub signature: String,
    pub block_time: Option<i64>,
}

/// Normalized view of a fully-resolved parsed transaction.
///
/// The chain reader flattens the RPC response into this shape so that
/// classification stays pure and test doubles can inject synthetic
/// transactions without constructing RPC wire types.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedTransaction {
    pub signature: String,
    /// First account key in the message, by convention the fee payer.
    pub fee_payer: String,
    pub instructions: Vec<InstructionSummary>,
    /// Native balances (lamports) per account, before execution.
    pub pre_balances: Vec<u64>,
    /// Native balances (lamports) per account, after execution.
    pub post_balances: Vec<u64>,
    /// Mints appearing in the transaction's post token balances.
    pub token_mints: Vec<String>,
    pub block_time: Option<i64>,
}

/// Program target of a single instruction, plus the mint it references when
/// the parsed form carries one (e.g. spl-token `transferChecked`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstructionSummary {
    pub program_id: String,
    pub mint: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn transaction_event_serializes_with_stable_field_names() {
        let event = TransactionEvent {
            id: "sig-1".to_string(),
            wallet_address: "wallet-1".to_string(),
            token_symbol: "POPCAT".to_string(),
            amount_sol: 42.5,
            market_cap: Some(1_220_000.0),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).single().unwrap(),
            tx_signature: "sig-1".to_string(),
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["id"], "sig-1");
        assert_eq!(json["wallet_address"], "wallet-1");
        assert_eq!(json["token_symbol"], "POPCAT");
        assert_eq!(json["amount_sol"], 42.5);
        assert_eq!(json["market_cap"], 1_220_000.0);
        assert_eq!(json["tx_signature"], "sig-1");
    }

    #[test]
    fn absent_market_cap_serializes_as_null() {
        let event = TransactionEvent {
            id: "sig-2".to_string(),
            wallet_address: "wallet-2".to_string(),
            token_symbol: "UNKNOWN".to_string(),
            amount_sol: 1.0,
            market_cap: None,
            timestamp: Utc::now(),
            tx_signature: "sig-2".to_string(),
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert!(json["market_cap"].is_null());
    }
}
