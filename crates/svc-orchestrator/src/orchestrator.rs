use std::future::Future;
use std::sync::Arc;

use chrono::Datelike;
use svc_ledger::{ClientError, ClientResult, ClientStatus, LedgerClient};
use svc_types::{ShipmentId, TrackingNumber, Voyage, VoyageId};

use crate::error::OrchestratorResult;
use crate::forms::{ClaimForm, ShipmentForm, VoyageForm};
use crate::workflow::{
    Acknowledgment, Submission, WorkflowKind, WorkflowOutcome, WorkflowSlot, WorkflowState,
};

/// Runs the voyage, shipment, and claim workflows against a [`LedgerClient`].
///
/// Each workflow owns its form buffer. A run validates that a wallet is
/// connected, submits the form through the client, and on success resets the
/// form; on failure the form is left as it was so the user can retry. The
/// three workflows are independent and may submit concurrently.
pub struct VoyageOrchestrator {
    client: Arc<LedgerClient>,
    voyage: WorkflowSlot<VoyageForm>,
    shipment: WorkflowSlot<ShipmentForm>,
    claim: WorkflowSlot<ClaimForm>,
}

impl VoyageOrchestrator {
    pub fn new(client: Arc<LedgerClient>) -> Self {
        Self {
            client,
            voyage: WorkflowSlot::new(WorkflowKind::CreateVoyage),
            shipment: WorkflowSlot::new(WorkflowKind::AddShipment),
            claim: WorkflowSlot::new(WorkflowKind::SubmitClaim),
        }
    }

    pub fn client(&self) -> &LedgerClient {
        &self.client
    }

    pub fn status(&self) -> ClientStatus {
        self.client.status()
    }

    pub fn is_connected(&self) -> bool {
        self.client.address().is_some()
    }

    // ---- Form buffers ----

    pub fn voyage_form(&self) -> VoyageForm {
        self.voyage.lock().form.clone()
    }

    pub fn set_voyage_form(&self, form: VoyageForm) {
        self.voyage.lock().form = form;
    }

    pub fn shipment_form(&self) -> ShipmentForm {
        self.shipment.lock().form.clone()
    }

    pub fn set_shipment_form(&self, form: ShipmentForm) {
        self.shipment.lock().form = form;
    }

    pub fn claim_form(&self) -> ClaimForm {
        self.claim.lock().form.clone()
    }

    pub fn set_claim_form(&self, form: ClaimForm) {
        self.claim.lock().form = form;
    }

    // ---- Workflow state ----

    pub fn state(&self, kind: WorkflowKind) -> WorkflowState {
        match kind {
            WorkflowKind::CreateVoyage => self.voyage.lock().state(),
            WorkflowKind::AddShipment => self.shipment.lock().state(),
            WorkflowKind::SubmitClaim => self.claim.lock().state(),
        }
    }

    /// Recent states the workflow has entered, oldest first.
    pub fn history(&self, kind: WorkflowKind) -> Vec<WorkflowState> {
        match kind {
            WorkflowKind::CreateVoyage => self.voyage.lock().history().to_vec(),
            WorkflowKind::AddShipment => self.shipment.lock().history().to_vec(),
            WorkflowKind::SubmitClaim => self.claim.lock().history().to_vec(),
        }
    }

    // ---- Workflows ----

    pub async fn create_voyage(&self) -> OrchestratorResult<WorkflowOutcome> {
        let client = &self.client;
        self.run(&self.voyage, |form: VoyageForm| async move {
            let id = client
                .create_voyage(&form.origin, &form.destination, form.duration_days)
                .await?;
            Ok::<_, ClientError>((id.get(), None))
        })
        .await
    }

    pub async fn add_shipment(&self) -> OrchestratorResult<WorkflowOutcome> {
        let client = &self.client;
        self.run(&self.shipment, |form: ShipmentForm| async move {
            let id = client.add_shipment(form.voyage_id, &form.cargo_type).await?;
            let tracking = self.tracking_number(form.voyage_id, id).await;
            Ok::<_, ClientError>((id.get(), tracking))
        })
        .await
    }

    pub async fn submit_claim(&self) -> OrchestratorResult<WorkflowOutcome> {
        let client = &self.client;
        self.run(&self.claim, |form: ClaimForm| async move {
            let id = client
                .submit_insurance_claim(form.voyage_id, &form.claim_reason)
                .await?;
            Ok::<_, ClientError>((id.get(), None))
        })
        .await
    }

    pub async fn voyage_info(&self, voyage_id: VoyageId) -> OrchestratorResult<Voyage> {
        Ok(self.client.get_voyage_info(voyage_id).await?)
    }

    async fn tracking_number(
        &self,
        voyage_id: VoyageId,
        shipment: ShipmentId,
    ) -> Option<TrackingNumber> {
        let voyage = self.client.get_voyage_info(voyage_id).await.ok()?;
        let year = voyage
            .departs_at()
            .map(|d| d.year())
            .and_then(|y| u16::try_from(y).ok())?;
        Some(TrackingNumber::new(year, shipment, &voyage.origin, &voyage.destination))
    }

    async fn run<F, Fut>(
        &self,
        slot: &WorkflowSlot<F>,
        submit: impl FnOnce(F) -> Fut,
    ) -> OrchestratorResult<WorkflowOutcome>
    where
        F: Clone + Default,
        Fut: Future<Output = ClientResult<(u64, Option<TrackingNumber>)>>,
    {
        let kind = slot.kind();
        let form = {
            let mut inner = slot.lock();
            if inner.state() != WorkflowState::Idle {
                tracing::debug!(%kind, state = ?inner.state(), "workflow already in progress");
                return Ok(WorkflowOutcome::Busy);
            }
            inner.transition(kind, WorkflowState::Validating)?;
            if self.client.address().is_none() {
                inner.transition(kind, WorkflowState::Idle)?;
                tracing::debug!(%kind, "wallet not connected; nothing submitted");
                return Ok(WorkflowOutcome::Skipped);
            }
            inner.transition(kind, WorkflowState::Submitting)?;
            inner.form.clone()
        };

        let submission = Submission::new(slot);
        let result = submit(form).await;
        submission.finish();

        let mut inner = slot.lock();
        match result {
            Ok((record_id, tracking_number)) => {
                inner.transition(kind, WorkflowState::Succeeded)?;
                inner.form = F::default();
                inner.transition(kind, WorkflowState::Idle)?;
                tracing::info!(%kind, record_id, "workflow succeeded");
                Ok(WorkflowOutcome::Succeeded(Acknowledgment {
                    kind,
                    message: kind.success_message().to_string(),
                    record_id,
                    tracking_number,
                }))
            }
            Err(error) => {
                inner.transition(kind, WorkflowState::Failed)?;
                inner.transition(kind, WorkflowState::Idle)?;
                tracing::error!(%kind, %error, "workflow failed");
                Ok(WorkflowOutcome::Failed(error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use svc_ledger::{
        InMemoryLedger, LedgerError, LedgerResult, LedgerTransport, SeedVoyage, SignedCall,
        TxReceipt, WalletSigner, WriteOperation,
    };
    use svc_types::Address;
    use tokio::sync::oneshot;

    use super::*;
    use crate::workflow::WorkflowState::*;

    const T0: u64 = 1_700_000_000;

    fn alice() -> Address {
        Address::from_label("alice")
    }

    struct Harness {
        ledger: Arc<InMemoryLedger>,
        signer: Arc<WalletSigner>,
        orchestrator: VoyageOrchestrator,
    }

    fn harness() -> Harness {
        let ledger = Arc::new(InMemoryLedger::default().with_fixed_time(T0));
        let signer = Arc::new(WalletSigner::connected(ledger.clone(), alice()));
        let client = Arc::new(LedgerClient::new(
            ledger.contract_address(),
            signer.clone(),
            ledger.clone(),
        ));
        Harness {
            ledger,
            signer,
            orchestrator: VoyageOrchestrator::new(client),
        }
    }

    fn seed(ledger: &InMemoryLedger) -> VoyageId {
        ledger
            .seed_voyage(
                alice(),
                &SeedVoyage {
                    origin: "Shanghai Port".into(),
                    destination: "Los Angeles Port".into(),
                    duration_days: 14,
                    cargo_value: 0,
                    insurance_amount: 0,
                    risk_score: 0,
                    verified: false,
                },
            )
            .unwrap()
    }

    #[tokio::test]
    async fn create_voyage_resets_form_on_success() {
        let h = harness();
        h.orchestrator
            .set_voyage_form(VoyageForm::new("Shanghai", "Los Angeles", 14));

        let outcome = h.orchestrator.create_voyage().await.unwrap();
        let ack = outcome.acknowledgment().unwrap();
        assert_eq!(ack.message, "Voyage created successfully!");
        assert_eq!(ack.record_id, 1);
        assert!(h.orchestrator.voyage_form().is_empty());
        assert_eq!(
            h.orchestrator.history(WorkflowKind::CreateVoyage),
            vec![Idle, Validating, Submitting, Succeeded, Idle]
        );
        let status = h.orchestrator.status();
        assert!(!status.is_loading);
        assert!(status.error.is_none());
        assert_eq!(h.ledger.voyage_count(), 1);
    }

    #[tokio::test]
    async fn disconnected_wallet_is_a_silent_no_op() {
        let h = harness();
        h.orchestrator
            .set_shipment_form(ShipmentForm::new(VoyageId::new(7), "Electronics"));
        // Leave a previous failure in the error slot.
        h.orchestrator.add_shipment().await.unwrap();
        let error_before = h.orchestrator.status().error;
        assert!(error_before.is_some());
        let calls_before = h.ledger.submitted_calls().len();

        h.signer.disconnect();
        h.orchestrator
            .set_claim_form(ClaimForm::new(VoyageId::new(7), "Lost at sea"));
        let outcome = h.orchestrator.submit_claim().await.unwrap();

        assert_eq!(outcome, WorkflowOutcome::Skipped);
        assert_eq!(h.ledger.submitted_calls().len(), calls_before);
        assert_eq!(h.orchestrator.status().error, error_before);
        assert_eq!(h.orchestrator.claim_form(), ClaimForm::new(VoyageId::new(7), "Lost at sea"));
        assert_eq!(
            h.orchestrator.history(WorkflowKind::SubmitClaim),
            vec![Idle, Validating, Idle]
        );
    }

    #[tokio::test]
    async fn failure_keeps_form_for_retry() {
        let h = harness();
        let form = ShipmentForm::new(VoyageId::new(99), "Pharmaceuticals");
        h.orchestrator.set_shipment_form(form.clone());

        let outcome = h.orchestrator.add_shipment().await.unwrap();
        match outcome {
            WorkflowOutcome::Failed(ClientError::Transaction { operation, message }) => {
                assert_eq!(operation, WriteOperation::AddShipment);
                assert_eq!(message, "voyage 99 not found");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(h.orchestrator.shipment_form(), form);
        assert_eq!(h.orchestrator.state(WorkflowKind::AddShipment), Idle);
        assert_eq!(
            h.orchestrator.history(WorkflowKind::AddShipment),
            vec![Idle, Validating, Submitting, Failed, Idle]
        );

        // Retry once the voyage exists.
        seed(&h.ledger);
        h.orchestrator
            .set_shipment_form(ShipmentForm::new(VoyageId::new(1), "Pharmaceuticals"));
        assert!(h.orchestrator.add_shipment().await.unwrap().is_success());
        assert!(h.orchestrator.status().error.is_none());
    }

    #[tokio::test]
    async fn shipment_ack_carries_tracking_number() {
        let h = harness();
        let voyage = seed(&h.ledger);
        h.orchestrator
            .set_shipment_form(ShipmentForm::new(voyage, "Electronics"));

        let outcome = h.orchestrator.add_shipment().await.unwrap();
        let ack = outcome.acknowledgment().unwrap();
        assert_eq!(ack.message, "Shipment added successfully!");
        assert_eq!(
            ack.tracking_number.as_ref().map(ToString::to_string).as_deref(),
            Some("FHE-2023-001-SH-LA")
        );
        assert!(h.orchestrator.shipment_form().is_empty());
    }

    #[tokio::test]
    async fn empty_claim_reason_reaches_the_ledger() {
        let h = harness();
        let voyage = seed(&h.ledger);
        h.orchestrator.set_claim_form(ClaimForm::new(voyage, ""));

        let outcome = h.orchestrator.submit_claim().await.unwrap();
        assert_eq!(
            outcome.acknowledgment().map(|a| a.message.as_str()),
            Some("Insurance claim submitted successfully!")
        );
        assert_eq!(h.ledger.claims(voyage)[0].claim_reason, "");
    }

    #[tokio::test]
    async fn voyage_info_passthrough() {
        let h = harness();
        let voyage = seed(&h.ledger);
        let info = h.orchestrator.voyage_info(voyage).await.unwrap();
        assert_eq!(info.owner, alice());
        assert!(h.orchestrator.voyage_info(VoyageId::new(3)).await.is_err());
    }

    /// Transport that holds submissions until released.
    struct HeldTransport {
        ledger: Arc<InMemoryLedger>,
        gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    }

    #[async_trait]
    impl LedgerTransport for HeldTransport {
        async fn submit(&self, call: SignedCall) -> LedgerResult<TxReceipt> {
            let gate = self.gates.lock().unwrap().pop_front();
            if let Some(gate) = gate {
                gate.await.map_err(|_| LedgerError::Network("gate dropped".into()))?;
            }
            self.ledger.execute(call)
        }

        async fn voyage_info(
            &self,
            contract: Address,
            voyage_id: VoyageId,
        ) -> LedgerResult<Voyage> {
            self.ledger.voyage_info(contract, voyage_id).await
        }
    }

    #[tokio::test]
    async fn same_workflow_cannot_resubmit_while_submitting() {
        let ledger = Arc::new(InMemoryLedger::default().with_fixed_time(T0));
        let voyage = seed(&ledger);
        let (release_voyage, voyage_gate) = oneshot::channel();
        let (release_claim, claim_gate) = oneshot::channel();
        let transport = Arc::new(HeldTransport {
            ledger: ledger.clone(),
            gates: Mutex::new(VecDeque::from([voyage_gate, claim_gate])),
        });
        let signer = Arc::new(WalletSigner::connected(transport.clone(), alice()));
        let client = Arc::new(LedgerClient::new(ledger.contract_address(), signer, transport));
        let orchestrator = VoyageOrchestrator::new(client);
        orchestrator.set_voyage_form(VoyageForm::new("Busan", "Seattle", 12));
        orchestrator.set_claim_form(ClaimForm::new(voyage, "Delay"));

        let driver = async {
            tokio::task::yield_now().await;
            assert_eq!(orchestrator.state(WorkflowKind::CreateVoyage), Submitting);
            assert_eq!(orchestrator.state(WorkflowKind::SubmitClaim), Submitting);
            let again = orchestrator.create_voyage().await.unwrap();
            release_voyage.send(()).unwrap();
            release_claim.send(()).unwrap();
            again
        };

        let (voyage_outcome, claim_outcome, again) = tokio::join!(
            orchestrator.create_voyage(),
            orchestrator.submit_claim(),
            driver
        );

        assert_eq!(again, WorkflowOutcome::Busy);
        assert!(voyage_outcome.unwrap().is_success());
        assert!(claim_outcome.unwrap().is_success());
        assert_eq!(ledger.submitted_calls().len(), 2);
        assert_eq!(orchestrator.client().requests().len(), 2);
    }

    #[tokio::test]
    async fn cancelled_workflow_can_run_again() {
        let ledger = Arc::new(InMemoryLedger::default().with_fixed_time(T0));
        let (_hold, gate) = oneshot::channel();
        let transport = Arc::new(HeldTransport {
            ledger: ledger.clone(),
            gates: Mutex::new(VecDeque::from([gate])),
        });
        let signer = Arc::new(WalletSigner::connected(transport.clone(), alice()));
        let client = Arc::new(LedgerClient::new(ledger.contract_address(), signer, transport));
        let orchestrator = VoyageOrchestrator::new(client);
        let form = VoyageForm::new("Busan", "Seattle", 12);
        orchestrator.set_voyage_form(form.clone());

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            orchestrator.create_voyage(),
        )
        .await;
        assert!(timed_out.is_err());
        assert_eq!(orchestrator.state(WorkflowKind::CreateVoyage), Idle);
        assert_eq!(orchestrator.voyage_form(), form);
        assert!(!orchestrator.status().is_loading);
        assert_eq!(orchestrator.client().requests().pending_count(), 0);

        let again = orchestrator.create_voyage().await.unwrap();
        assert!(again.is_success());
        assert_eq!(
            orchestrator.history(WorkflowKind::CreateVoyage),
            vec![
                Idle, Validating, Submitting, Failed, Idle, Validating, Submitting, Succeeded,
                Idle
            ]
        );
        assert_eq!(ledger.voyage_count(), 1);
    }
}
