use thiserror::Error;

use crate::workflow::{WorkflowKind, WorkflowState};

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("invalid {kind} workflow transition: {from:?} -> {to:?}")]
    InvalidTransition {
        kind: WorkflowKind,
        from: WorkflowState,
        to: WorkflowState,
    },

    #[error("ledger client error: {0}")]
    Client(#[from] svc_ledger::ClientError),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
