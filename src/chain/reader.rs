use std::str::FromStr;

use async_trait::async_trait;
use solana_client::client_error::{ClientError, ClientErrorKind};
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_client::GetConfirmedSignaturesForAddress2Config;
use solana_client::rpc_config::RpcTransactionConfig;
use solana_client::rpc_request::RpcError;
use solana_sdk::commitment_config::CommitmentConfig;
use solana_sdk::pubkey::Pubkey;
use solana_sdk::signature::Signature;
use solana_transaction_status::option_serializer::OptionSerializer;
use solana_transaction_status::{
    EncodedConfirmedTransactionWithStatusMeta, EncodedTransaction, UiInstruction, UiMessage,
    UiParsedInstruction, UiTransactionEncoding,
};
use tracing::{debug, warn};

use crate::config::StreamConfig;
use crate::core::{InstructionSummary, ResolvedTransaction, SignatureInfo, StreamError};

/// Read access to recent chain activity. The production implementation wraps
/// the Solana RPC client; tests substitute a scripted double.
#[async_trait]
pub trait ChainReader: Send + Sync {
    /// Fetches up to `limit` recent signatures for `address`,
    /// most-recent-first. Transport failures surface as
    /// [`StreamError::RpcUnavailable`] and are retryable.
    async fn fetch_recent_signatures(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, StreamError>;

    /// Resolves a signature to its parsed transaction. `Ok(None)` means the
    /// node has pruned or never indexed it, which is not an error.
    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ResolvedTransaction>, StreamError>;
}

/// `ChainReader` backed by the nonblocking Solana RPC client.
///
/// Stateless beyond the client itself: no caching, every call may hit the
/// network. Callers deduplicate signatures across poll cycles.
pub struct RpcChainReader {
    client: RpcClient,
}

impl RpcChainReader {
    pub fn new(config: &StreamConfig) -> Self {
        let client = RpcClient::new_with_timeout_and_commitment(
            config.rpc_endpoint.clone(),
            config.rpc_timeout(),
            CommitmentConfig::confirmed(),
        );
        Self { client }
    }
}

#[async_trait]
impl ChainReader for RpcChainReader {
    async fn fetch_recent_signatures(
        &self,
        address: &str,
        limit: usize,
    ) -> Result<Vec<SignatureInfo>, StreamError> {
        let pubkey = Pubkey::from_str(address).map_err(|e| StreamError::InvalidAddress {
            address: address.to_string(),
            message: e.to_string(),
        })?;

        let config = GetConfirmedSignaturesForAddress2Config {
            limit: Some(limit),
            ..Default::default()
        };

        let statuses = self
            .client
            .get_signatures_for_address_with_config(&pubkey, config)
            .await
            .map_err(|e| StreamError::rpc_unavailable(e.to_string()))?;

        Ok(statuses
            .into_iter()
            .map(|status| SignatureInfo {
                signature: status.signature,
                block_time: status.block_time,
            })
            .collect())
    }

    async fn fetch_parsed_transaction(
        &self,
        signature: &str,
    ) -> Result<Option<ResolvedTransaction>, StreamError> {
        let parsed_signature =
            Signature::from_str(signature).map_err(|e| StreamError::Classification {
                signature: signature.to_string(),
                message: format!("malformed signature: {e}"),
            })?;

        let config = RpcTransactionConfig {
            encoding: Some(UiTransactionEncoding::JsonParsed),
            commitment: Some(CommitmentConfig::confirmed()),
            max_supported_transaction_version: Some(0),
        };

        match self
            .client
            .get_transaction_with_config(&parsed_signature, config)
            .await
        {
            Ok(tx) => Ok(Some(normalize_transaction(signature, tx)?)),
            Err(err) => classify_fetch_error(signature, err),
        }
    }
}

/// The RPC returns `null` for pruned or never-indexed signatures; the client
/// surfaces that as a failed deserialization of `null` or a
/// history-unavailable RPC response rather than a transport error. Other
/// decode failures also skip the transaction (one signature must never stall
/// a cycle) but are logged loudly, since they indicate a response-shape
/// problem rather than pruning.
fn classify_fetch_error(
    signature: &str,
    err: ClientError,
) -> Result<Option<ResolvedTransaction>, StreamError> {
    match &err.kind {
        ClientErrorKind::SerdeJson(serde_err) => {
            if serde_err.to_string().contains("null") {
                debug!(signature = %signature, "Transaction not available on this node");
            } else {
                warn!(
                    signature = %signature,
                    error = %serde_err,
                    "Undecodable transaction response, skipping"
                );
            }
            Ok(None)
        }
        // -32009: slot skipped / not in long-term storage
        // -32011: transaction history not available
        ClientErrorKind::RpcError(RpcError::RpcResponseError { code, .. })
            if *code == -32009 || *code == -32011 =>
        {
            debug!(signature = %signature, "Transaction not available on this node");
            Ok(None)
        }
        _ => Err(StreamError::rpc_unavailable(err.to_string())),
    }
}

/// Flattens a jsonParsed RPC transaction into the domain view the classifier
/// operates on.
fn normalize_transaction(
    signature: &str,
    tx: EncodedConfirmedTransactionWithStatusMeta,
) -> Result<ResolvedTransaction, StreamError> {
    let classification_error = |message: &str| StreamError::Classification {
        signature: signature.to_string(),
        message: message.to_string(),
    };

    let ui_transaction = match &tx.transaction.transaction {
        EncodedTransaction::Json(ui_transaction) => ui_transaction,
        _ => return Err(classification_error("unexpected transaction encoding")),
    };

    let message = match &ui_transaction.message {
        UiMessage::Parsed(message) => message,
        UiMessage::Raw(_) => return Err(classification_error("message was not parsed")),
    };

    let fee_payer = message
        .account_keys
        .first()
        .map(|account| account.pubkey.clone())
        .ok_or_else(|| classification_error("transaction has no account keys"))?;

    let instructions = message
        .instructions
        .iter()
        .filter_map(|instruction| match instruction {
            UiInstruction::Parsed(UiParsedInstruction::Parsed(parsed)) => {
                Some(InstructionSummary {
                    program_id: parsed.program_id.clone(),
                    mint: parsed
                        .parsed
                        .get("info")
                        .and_then(|info| info.get("mint"))
                        .and_then(|mint| mint.as_str())
                        .map(str::to_string),
                })
            }
            UiInstruction::Parsed(UiParsedInstruction::PartiallyDecoded(decoded)) => {
                Some(InstructionSummary {
                    program_id: decoded.program_id.clone(),
                    mint: None,
                })
            }
            // Compiled instructions only appear under non-parsed encodings.
            UiInstruction::Compiled(_) => None,
        })
        .collect();

    let (pre_balances, post_balances, token_mints) = match &tx.transaction.meta {
        Some(meta) => {
            let token_mints = match &meta.post_token_balances {
                OptionSerializer::Some(balances) => balances
                    .iter()
                    .map(|balance| balance.mint.clone())
                    .collect(),
                _ => Vec::new(),
            };
            (meta.pre_balances.clone(), meta.post_balances.clone(), token_mints)
        }
        None => (Vec::new(), Vec::new(), Vec::new()),
    };

    Ok(ResolvedTransaction {
        signature: signature.to_string(),
        fee_payer,
        instructions,
        pre_balances,
        post_balances,
        token_mints,
        block_time: tx.block_time,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use solana_client::rpc_request::RpcResponseErrorData;

    fn client_error(kind: ClientErrorKind) -> ClientError {
        ClientError {
            request: None,
            kind,
        }
    }

    #[test]
    fn null_response_is_a_missing_transaction() {
        let serde_err = serde_json::from_value::<String>(serde_json::Value::Null).unwrap_err();
        let result = classify_fetch_error("sig", client_error(ClientErrorKind::SerdeJson(serde_err)));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn shape_decode_failure_skips_without_failing_the_cycle() {
        let serde_err = serde_json::from_str::<u64>("\"abc\"").unwrap_err();
        let result = classify_fetch_error("sig", client_error(ClientErrorKind::SerdeJson(serde_err)));
        assert!(matches!(result, Ok(None)));
    }

    #[test]
    fn history_unavailable_codes_are_missing_transactions() {
        for code in [-32009i64, -32011] {
            let rpc_err = RpcError::RpcResponseError {
                code,
                message: "not available".to_string(),
                data: RpcResponseErrorData::Empty,
            };
            let result = classify_fetch_error("sig", client_error(ClientErrorKind::RpcError(rpc_err)));
            assert!(matches!(result, Ok(None)));
        }
    }

    #[test]
    fn other_rpc_errors_are_retryable() {
        let rpc_err = RpcError::RpcResponseError {
            code: -32005,
            message: "node is unhealthy".to_string(),
            data: RpcResponseErrorData::Empty,
        };
        let result = classify_fetch_error("sig", client_error(ClientErrorKind::RpcError(rpc_err)));
        assert!(matches!(result, Err(ref e) if e.is_retryable()));
    }

    #[test]
    fn transport_errors_are_retryable() {
        let result = classify_fetch_error(
            "sig",
            client_error(ClientErrorKind::Custom("connection reset".to_string())),
        );
        assert!(matches!(result, Err(ref e) if e.is_retryable()));
    }
}
