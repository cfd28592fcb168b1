use svc_types::VoyageId;

use crate::call::WriteOperation;

/// Failures raised by the ledger or by the path to it (wallet, network).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("execution reverted: {0}")]
    Reverted(String),

    #[error("voyage {0} not found")]
    VoyageNotFound(VoyageId),

    #[error("signature rejected: {0}")]
    SignatureRejected(String),

    #[error("wallet not connected")]
    NotConnected,

    #[error("network error: {0}")]
    Network(String),

    #[error("no contract deployed at {0}")]
    UnknownContract(String),

    #[error("ledger state lock poisoned")]
    LockPoisoned,
}

impl LedgerError {
    /// The human-readable reason carried by the failure, without the
    /// category prefix. Empty when the failure carried no detail.
    pub fn reason(&self) -> String {
        match self {
            Self::Reverted(r) | Self::SignatureRejected(r) | Self::Network(r) => r.clone(),
            other => other.to_string(),
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Errors surfaced to callers of [`crate::LedgerClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// A write failed anywhere between signing and confirmation.
    #[error("{message}")]
    Transaction {
        operation: WriteOperation,
        message: String,
    },

    /// A voyage query failed. Independent of the write-path error slot.
    #[error("failed to read voyage {voyage_id}: {message}")]
    Read { voyage_id: VoyageId, message: String },

    #[error("configuration error: {0}")]
    Config(String),
}

impl ClientError {
    /// Build a transaction error from a ledger failure, falling back to the
    /// operation's generic message when the failure carries no reason.
    pub fn transaction(operation: WriteOperation, source: &LedgerError) -> Self {
        let reason = source.reason();
        let message = if reason.trim().is_empty() {
            operation.failure_message().to_string()
        } else {
            reason
        };
        Self::Transaction { operation, message }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Transaction { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
