use alloy_provider::PendingTransactionError;
use alloy_transport::TransportError;
use thiserror::Error;

/// Failures from talking to the node or the poll contract.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The node could not be reached or answered with something that is not a
    /// JSON-RPC response.
    #[error("node unreachable: {0}")]
    NodeUnreachable(String),

    /// The caller's key could not be parsed or the transaction could not be
    /// signed, or the node rejected the signature.
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// The node rejected the call or the transaction reverted.
    #[error("execution reverted: {0}")]
    ExecutionReverted(String),

    #[error("out of gas: {0}")]
    OutOfGas(String),

    /// The contract answered with data that does not match the loaded ABI.
    #[error("abi mismatch: {0}")]
    Abi(String),
}

impl ChainError {
    /// Whether the same request may succeed if sent again unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ChainError::NodeUnreachable(_))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            ChainError::NodeUnreachable(_) => "node_unreachable",
            ChainError::InvalidSignature(_) => "invalid_signature",
            ChainError::ExecutionReverted(_) => "execution_reverted",
            ChainError::OutOfGas(_) => "out_of_gas",
            ChainError::Abi(_) => "abi_mismatch",
        }
    }

    pub(crate) fn from_transport(err: TransportError) -> Self {
        match &err {
            TransportError::ErrorResp(payload) => classify_node_message(&payload.message),
            _ => ChainError::NodeUnreachable(err.to_string()),
        }
    }

    pub(crate) fn from_pending(err: PendingTransactionError) -> Self {
        match err {
            PendingTransactionError::TransportError(e) => ChainError::from_transport(e),
            other => ChainError::NodeUnreachable(other.to_string()),
        }
    }
}

/// Maps a JSON-RPC error message from the node onto the taxonomy.
/// Anything not recognised as gas or signature related is treated as a
/// rejected execution.
pub(crate) fn classify_node_message(message: &str) -> ChainError {
    let lower = message.to_ascii_lowercase();

    if lower.contains("out of gas")
        || lower.contains("intrinsic gas too low")
        || lower.contains("gas required exceeds")
    {
        ChainError::OutOfGas(message.to_string())
    } else if lower.contains("signature") || lower.contains("invalid sender") {
        ChainError::InvalidSignature(message.to_string())
    } else {
        ChainError::ExecutionReverted(message.to_string())
    }
}
