use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Serialize};
use svc_ledger::{ClientError, WriteOperation};
use svc_types::TrackingNumber;

use crate::error::{OrchestratorError, OrchestratorResult};

/// The three user-initiated ledger writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkflowKind {
    CreateVoyage,
    AddShipment,
    SubmitClaim,
}

impl WorkflowKind {
    pub fn operation(self) -> WriteOperation {
        match self {
            Self::CreateVoyage => WriteOperation::CreateVoyage,
            Self::AddShipment => WriteOperation::AddShipment,
            Self::SubmitClaim => WriteOperation::SubmitInsuranceClaim,
        }
    }

    pub fn success_message(self) -> &'static str {
        match self {
            Self::CreateVoyage => "Voyage created successfully!",
            Self::AddShipment => "Shipment added successfully!",
            Self::SubmitClaim => "Insurance claim submitted successfully!",
        }
    }
}

impl fmt::Display for WorkflowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateVoyage => write!(f, "create-voyage"),
            Self::AddShipment => write!(f, "add-shipment"),
            Self::SubmitClaim => write!(f, "submit-claim"),
        }
    }
}

/// Position of one workflow in validate → submit → resolve.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkflowState {
    Idle,
    Validating,
    Submitting,
    Succeeded,
    Failed,
}

impl WorkflowState {
    pub fn can_transition_to(self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        matches!(
            (self, next),
            (Idle, Validating)
                | (Validating, Idle)
                | (Validating, Submitting)
                | (Submitting, Succeeded)
                | (Submitting, Failed)
                | (Succeeded, Idle)
                | (Failed, Idle)
        )
    }
}

/// User-facing confirmation of a successful workflow.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Acknowledgment {
    pub kind: WorkflowKind,
    pub message: String,
    /// Identifier the ledger assigned to the new record.
    pub record_id: u64,
    /// Set for shipments when the parent voyage could be read back.
    pub tracking_number: Option<TrackingNumber>,
}

/// How a workflow run ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowOutcome {
    /// Wallet not connected; nothing was submitted.
    Skipped,
    /// The same workflow is already submitting; nothing was submitted.
    Busy,
    Succeeded(Acknowledgment),
    /// The ledger client's error; the form was kept for retry.
    Failed(ClientError),
}

impl WorkflowOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn acknowledgment(&self) -> Option<&Acknowledgment> {
        match self {
            Self::Succeeded(ack) => Some(ack),
            _ => None,
        }
    }
}

/// States kept per workflow; older entries are dropped first.
pub(crate) const HISTORY_LIMIT: usize = 64;

/// One workflow's form buffer and state, with the states it has passed through.
pub(crate) struct WorkflowSlot<F> {
    kind: WorkflowKind,
    inner: Mutex<SlotInner<F>>,
}

pub(crate) struct SlotInner<F> {
    pub(crate) form: F,
    state: WorkflowState,
    history: Vec<WorkflowState>,
}

impl<F: Default> WorkflowSlot<F> {
    pub(crate) fn new(kind: WorkflowKind) -> Self {
        Self {
            kind,
            inner: Mutex::new(SlotInner {
                form: F::default(),
                state: WorkflowState::Idle,
                history: vec![WorkflowState::Idle],
            }),
        }
    }
}

impl<F> WorkflowSlot<F> {
    pub(crate) fn kind(&self) -> WorkflowKind {
        self.kind
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, SlotInner<F>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Held across a workflow's submission. If the run is dropped before
/// [`Submission::finish`], the workflow is failed back to `Idle` so it can be
/// run again; the form is left as it was.
pub(crate) struct Submission<'a, F> {
    slot: &'a WorkflowSlot<F>,
    armed: bool,
}

impl<'a, F> Submission<'a, F> {
    pub(crate) fn new(slot: &'a WorkflowSlot<F>) -> Self {
        Self { slot, armed: true }
    }

    pub(crate) fn finish(mut self) {
        self.armed = false;
    }
}

impl<F> Drop for Submission<'_, F> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let kind = self.slot.kind();
        let mut inner = self.slot.lock();
        if inner.state() == WorkflowState::Submitting {
            let _ = inner.transition(kind, WorkflowState::Failed);
            let _ = inner.transition(kind, WorkflowState::Idle);
        }
        tracing::warn!(%kind, "workflow cancelled while submitting");
    }
}

impl<F> SlotInner<F> {
    pub(crate) fn state(&self) -> WorkflowState {
        self.state
    }

    pub(crate) fn history(&self) -> &[WorkflowState] {
        &self.history
    }

    pub(crate) fn transition(
        &mut self,
        kind: WorkflowKind,
        next: WorkflowState,
    ) -> OrchestratorResult<()> {
        if !self.state.can_transition_to(next) {
            return Err(OrchestratorError::InvalidTransition {
                kind,
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        if self.history.len() == HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history.push(next);
        Ok(())
    }
}
