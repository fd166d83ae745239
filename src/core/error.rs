use thiserror::Error;

/// Failure taxonomy for the streaming core.
///
/// `RpcUnavailable` is transient and handled at the stream controller with a
/// backoff cycle; `Classification` is scoped to a single transaction and only
/// ever skips it. Absence of reference data is not an error and is modelled
/// as `Option` throughout. Subscribers never observe any of these variants.
#[derive(Debug, Clone, Error)]
pub enum StreamError {
    #[error("rpc unavailable: {message}")]
    RpcUnavailable { message: String },

    #[error("failed to classify transaction {signature}: {message}")]
    Classification { signature: String, message: String },

    #[error("invalid watch address `{address}`: {message}")]
    InvalidAddress { address: String, message: String },
}

impl StreamError {
    pub fn rpc_unavailable(message: impl Into<String>) -> Self {
        Self::RpcUnavailable {
            message: message.into(),
        }
    }

    /// True when the controller should back off and retry rather than skip.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RpcUnavailable { .. })
    }
}
