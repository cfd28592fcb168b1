use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use svc_types::{Address, Voyage, VoyageId};

use crate::call::GET_VOYAGE_INFO_SIGNATURE;
use crate::traits::LedgerTransport;

/// Observable state of a voyage read.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadState {
    #[default]
    Idle,
    Pending,
    Ready(Voyage),
    Failed(String),
}

impl ReadState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn data(&self) -> Option<&Voyage> {
        match self {
            Self::Ready(v) => Some(v),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Poll-style handle over `getVoyageInfo`.
///
/// Each `refresh` re-reads the ledger; the last outcome stays observable via
/// [`VoyageQuery::state`]. Failures stay in this handle and never reach the
/// client's write-path error slot.
pub struct VoyageQuery {
    transport: Arc<dyn LedgerTransport>,
    contract: Address,
    voyage_id: VoyageId,
    state: RwLock<ReadState>,
}

impl VoyageQuery {
    pub fn new(
        transport: Arc<dyn LedgerTransport>,
        contract: Address,
        voyage_id: VoyageId,
    ) -> Self {
        Self {
            transport,
            contract,
            voyage_id,
            state: RwLock::new(ReadState::Idle),
        }
    }

    pub fn voyage_id(&self) -> VoyageId {
        self.voyage_id
    }

    pub fn state(&self) -> ReadState {
        self.state.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub async fn refresh(&self) -> ReadState {
        self.set(ReadState::Pending);
        let next = match self.transport.voyage_info(self.contract, self.voyage_id).await {
            Ok(voyage) => ReadState::Ready(voyage),
            Err(e) => {
                tracing::debug!(
                    function = GET_VOYAGE_INFO_SIGNATURE,
                    voyage = %self.voyage_id,
                    error = %e,
                    "voyage read failed"
                );
                ReadState::Failed(e.reason())
            }
        };
        self.set(next.clone());
        next
    }

    fn set(&self, next: ReadState) {
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next;
    }
}
