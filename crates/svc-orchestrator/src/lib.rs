//! Voyage workflows for SecureVoyageChain.
//!
//! The orchestrator owns the three form buffers (voyage, shipment, claim) and
//! runs each user action through validate → submit → reset-on-success on top
//! of [`svc_ledger::LedgerClient`].

pub mod error;
pub mod forms;
pub mod orchestrator;
pub mod workflow;

pub use error::{OrchestratorError, OrchestratorResult};
pub use forms::{ClaimForm, ShipmentForm, VoyageForm};
pub use orchestrator::VoyageOrchestrator;
pub use workflow::{Acknowledgment, WorkflowKind, WorkflowOutcome, WorkflowState};

// Re-export key types
pub use svc_ledger::{ClientError, ClientStatus, LedgerClient};
pub use svc_types::{ClaimId, ShipmentId, TrackingNumber, Voyage, VoyageId};
