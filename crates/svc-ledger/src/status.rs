use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use svc_types::Address;

use crate::call::{TxReceipt, WriteOperation};

/// Identifier of one submitted write (UUID v7, time-ordered).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(uuid::Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RequestId({})", self.short_id())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The `{is_loading, error, address}` triple consumers observe.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientStatus {
    pub is_loading: bool,
    pub error: Option<String>,
    pub address: Option<Address>,
}

/// Shared loading flag and error slot.
///
/// Every write sets `loading` and clears `error` when dispatched, and writes
/// both again when it settles. Overlapping writes share the slot, so the
/// observed value is that of whichever write settled last.
#[derive(Debug, Default)]
pub(crate) struct StatusSlot {
    inner: RwLock<SlotState>,
}

#[derive(Debug, Default, Clone)]
struct SlotState {
    loading: bool,
    error: Option<String>,
}

impl StatusSlot {
    pub(crate) fn begin(&self) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.loading = true;
        state.error = None;
    }

    pub(crate) fn settle(&self, error: Option<String>) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.loading = false;
        state.error = error;
    }

    pub(crate) fn is_loading(&self) -> bool {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).loading
    }

    pub(crate) fn error(&self) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .error
            .clone()
    }
}

/// Settles a dispatched write as cancelled if it is dropped before
/// [`InFlightWrite::finish`] runs.
pub(crate) struct InFlightWrite<'a> {
    slot: &'a StatusSlot,
    requests: &'a RequestTracker,
    id: RequestId,
    operation: WriteOperation,
    armed: bool,
}

impl<'a> InFlightWrite<'a> {
    pub(crate) fn new(
        slot: &'a StatusSlot,
        requests: &'a RequestTracker,
        id: RequestId,
        operation: WriteOperation,
    ) -> Self {
        Self {
            slot,
            requests,
            id,
            operation,
            armed: true,
        }
    }

    pub(crate) fn finish(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlightWrite<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let message = CANCELLED.to_string();
        self.slot.settle(Some(message.clone()));
        self.requests.fail(self.id, message);
        tracing::warn!(
            operation = %self.operation,
            request = %self.id.short_id(),
            "write cancelled before it settled"
        );
    }
}

/// Error recorded for a write whose caller stopped waiting on it.
pub const CANCELLED: &str = "request cancelled";

/// Lifecycle of one tracked write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestState {
    Pending,
    Confirmed(TxReceipt),
    Failed(String),
}

impl RequestState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn receipt(&self) -> Option<&TxReceipt> {
        match self {
            Self::Confirmed(receipt) => Some(receipt),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestRecord {
    pub id: RequestId,
    pub operation: WriteOperation,
    pub state: RequestState,
    pub submitted_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

/// Per-request outcome map. Unlike the shared slot, concurrent writes never
/// overwrite each other here.
#[derive(Debug, Default)]
pub struct RequestTracker {
    inner: RwLock<TrackerState>,
}

#[derive(Debug, Default)]
struct TrackerState {
    order: Vec<RequestId>,
    records: HashMap<RequestId, RequestRecord>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, operation: WriteOperation) -> RequestId {
        let id = RequestId::new();
        let record = RequestRecord {
            id,
            operation,
            state: RequestState::Pending,
            submitted_at: Utc::now(),
            settled_at: None,
        };
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        state.order.push(id);
        state.records.insert(id, record);
        id
    }

    pub fn confirm(&self, id: RequestId, receipt: TxReceipt) {
        self.settle(id, RequestState::Confirmed(receipt));
    }

    pub fn fail(&self, id: RequestId, message: impl Into<String>) {
        self.settle(id, RequestState::Failed(message.into()));
    }

    fn settle(&self, id: RequestId, outcome: RequestState) {
        let mut state = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(record) = state.records.get_mut(&id) {
            record.state = outcome;
            record.settled_at = Some(Utc::now());
        }
    }

    pub fn get(&self, id: &RequestId) -> Option<RequestRecord> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .get(id)
            .cloned()
    }

    /// All records in registration order.
    pub fn records(&self) -> Vec<RequestRecord> {
        let state = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        state
            .order
            .iter()
            .filter_map(|id| state.records.get(id).cloned())
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .records
            .values()
            .filter(|r| r.state.is_pending())
            .count()
    }

    pub fn len(&self) -> usize {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
