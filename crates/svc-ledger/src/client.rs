use std::sync::Arc;

use svc_types::{Address, ClaimId, ShipmentId, Voyage, VoyageId};

use crate::call::{ContractCall, TxReceipt, GET_VOYAGE_INFO_SIGNATURE};
use crate::error::{ClientError, ClientResult};
use crate::query::VoyageQuery;
use crate::status::{ClientStatus, InFlightWrite, RequestTracker, StatusSlot};
use crate::traits::{LedgerTransport, Signer};

/// Uniform call surface over the voyage contract.
///
/// Writes go through the [`Signer`]; reads go straight to the
/// [`LedgerTransport`]. Every write updates two views of its lifecycle: the
/// shared `is_loading`/`error` slot, which overlapping writes overwrite, and a
/// per-request record in [`RequestTracker`], which they do not.
pub struct LedgerClient {
    contract: Address,
    signer: Arc<dyn Signer>,
    transport: Arc<dyn LedgerTransport>,
    slot: StatusSlot,
    requests: RequestTracker,
}

impl LedgerClient {
    pub fn new(
        contract: Address,
        signer: Arc<dyn Signer>,
        transport: Arc<dyn LedgerTransport>,
    ) -> Self {
        Self {
            contract,
            signer,
            transport,
            slot: StatusSlot::default(),
            requests: RequestTracker::new(),
        }
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    /// Connected wallet account, if any.
    pub fn address(&self) -> Option<Address> {
        self.signer.address()
    }

    pub fn is_loading(&self) -> bool {
        self.slot.is_loading()
    }

    /// Message of the most recently settled failed write.
    pub fn error(&self) -> Option<String> {
        self.slot.error()
    }

    pub fn status(&self) -> ClientStatus {
        ClientStatus {
            is_loading: self.slot.is_loading(),
            error: self.slot.error(),
            address: self.signer.address(),
        }
    }

    pub fn requests(&self) -> &RequestTracker {
        &self.requests
    }

    /// `createVoyage`. Returns the id the ledger assigned.
    pub async fn create_voyage(
        &self,
        origin: &str,
        destination: &str,
        duration_days: u64,
    ) -> ClientResult<VoyageId> {
        let receipt = self
            .submit(ContractCall::CreateVoyage {
                origin: origin.to_string(),
                destination: destination.to_string(),
                duration_days,
            })
            .await?;
        Ok(VoyageId::new(receipt.returned_id))
    }

    /// `addShipment`. Whether the voyage exists and is active is left to the ledger.
    pub async fn add_shipment(
        &self,
        voyage_id: VoyageId,
        cargo_type: &str,
    ) -> ClientResult<ShipmentId> {
        let receipt = self
            .submit(ContractCall::AddShipment {
                voyage_id,
                cargo_type: cargo_type.to_string(),
            })
            .await?;
        Ok(ShipmentId::new(receipt.returned_id))
    }

    /// `submitInsuranceClaim`. The reason is forwarded as given, even when empty.
    pub async fn submit_insurance_claim(
        &self,
        voyage_id: VoyageId,
        claim_reason: &str,
    ) -> ClientResult<ClaimId> {
        let receipt = self
            .submit(ContractCall::SubmitInsuranceClaim {
                voyage_id,
                claim_reason: claim_reason.to_string(),
            })
            .await?;
        Ok(ClaimId::new(receipt.returned_id))
    }

    /// Submit any write and track its lifecycle.
    pub async fn submit(&self, call: ContractCall) -> ClientResult<TxReceipt> {
        let operation = call.operation();
        let request_id = self.requests.register(operation);
        self.slot.begin();
        tracing::info!(%operation, request = %request_id.short_id(), "dispatching write");

        let in_flight = InFlightWrite::new(&self.slot, &self.requests, request_id, operation);
        let result = self.signer.sign_and_submit(self.contract, call, request_id).await;
        in_flight.finish();

        match result {
            Ok(receipt) => {
                self.slot.settle(None);
                tracing::info!(
                    %operation,
                    request = %request_id.short_id(),
                    returned_id = receipt.returned_id,
                    tx = %receipt.tx_hash_hex(),
                    "write confirmed"
                );
                self.requests.confirm(request_id, receipt.clone());
                Ok(receipt)
            }
            Err(source) => {
                let err = ClientError::transaction(operation, &source);
                let message = err.message();
                self.slot.settle(Some(message.clone()));
                self.requests.fail(request_id, message.clone());
                tracing::warn!(
                    %operation,
                    request = %request_id.short_id(),
                    error = %message,
                    "write failed"
                );
                Err(err)
            }
        }
    }

    /// `getVoyageInfo`. Read-only; never touches the write-path slot.
    pub async fn get_voyage_info(&self, voyage_id: VoyageId) -> ClientResult<Voyage> {
        tracing::debug!(
            function = GET_VOYAGE_INFO_SIGNATURE,
            voyage = %voyage_id,
            "reading voyage"
        );
        self.transport
            .voyage_info(self.contract, voyage_id)
            .await
            .map_err(|e| ClientError::Read {
                voyage_id,
                message: e.reason(),
            })
    }

    /// Poll-style handle over `getVoyageInfo` with its own pending/error state.
    pub fn voyage_query(&self, voyage_id: VoyageId) -> VoyageQuery {
        VoyageQuery::new(self.transport.clone(), self.contract, voyage_id)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tokio::sync::oneshot;

    use super::*;
    use crate::call::SignedCall;
    use crate::config::SeedVoyage;
    use crate::error::{LedgerError, LedgerResult};
    use crate::memory::InMemoryLedger;
    use crate::signer::WalletSigner;
    use crate::query::ReadState;
    use crate::status::{RequestId, RequestState, CANCELLED};

    /// Transport that holds each submission until the test releases it.
    struct GatedTransport {
        ledger: Arc<InMemoryLedger>,
        gates: Mutex<VecDeque<oneshot::Receiver<LedgerResult<()>>>>,
    }

    impl GatedTransport {
        fn new(
            ledger: Arc<InMemoryLedger>,
            gates: Vec<oneshot::Receiver<LedgerResult<()>>>,
        ) -> Self {
            Self {
                ledger,
                gates: Mutex::new(gates.into()),
            }
        }
    }

    #[async_trait]
    impl LedgerTransport for GatedTransport {
        async fn submit(&self, call: SignedCall) -> LedgerResult<TxReceipt> {
            let gate = self.gates.lock().unwrap().pop_front();
            if let Some(gate) = gate {
                gate.await
                    .map_err(|_| LedgerError::Network("gate dropped".into()))??;
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

    /// Wallet whose user declines every signature request.
    struct DecliningSigner {
        account: Address,
    }

    #[async_trait]
    impl Signer for DecliningSigner {
        fn address(&self) -> Option<Address> {
            Some(self.account)
        }

        async fn sign_and_submit(
            &self,
            _: Address,
            _: ContractCall,
            _: RequestId,
        ) -> LedgerResult<TxReceipt> {
            Err(LedgerError::SignatureRejected("user denied signature".into()))
        }
    }

    fn alice() -> Address {
        Address::from_label("alice")
    }

    fn local_client() -> (Arc<InMemoryLedger>, LedgerClient) {
        let ledger = Arc::new(InMemoryLedger::default().with_fixed_time(1_700_000_000));
        let signer = Arc::new(WalletSigner::connected(ledger.clone(), alice()));
        let client = LedgerClient::new(ledger.contract_address(), signer, ledger.clone());
        (ledger, client)
    }

    fn seed(ledger: &InMemoryLedger) -> VoyageId {
        ledger
            .seed_voyage(
                alice(),
                &SeedVoyage {
                    origin: "Shanghai".into(),
                    destination: "Los Angeles".into(),
                    duration_days: 14,
                    cargo_value: 10,
                    insurance_amount: 20,
                    risk_score: 3,
                    verified: false,
                },
            )
            .unwrap()
    }

    #[tokio::test]
    async fn create_voyage_loading_transitions() {
        let ledger = Arc::new(InMemoryLedger::default());
        let (release, gate) = oneshot::channel();
        let transport = Arc::new(GatedTransport::new(ledger.clone(), vec![gate]));
        let signer = Arc::new(WalletSigner::connected(transport.clone(), alice()));
        let client = LedgerClient::new(ledger.contract_address(), signer, transport);

        assert!(!client.is_loading());
        let observer = async {
            tokio::task::yield_now().await;
            let during = client.status();
            release.send(Ok(())).unwrap();
            during
        };
        let (result, during) = tokio::join!(
            client.create_voyage("Shanghai", "Los Angeles", 14),
            observer
        );

        assert!(during.is_loading);
        assert!(during.error.is_none());
        assert_eq!(result.unwrap(), VoyageId::new(1));
        assert!(!client.is_loading());
        assert!(client.error().is_none());

        let calls = ledger.submitted_calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].call.args(), vec![json!("Shanghai"), json!("Los Angeles"), json!(14)]);
    }

    #[tokio::test]
    async fn rejected_signature_sets_error_slot() {
        let ledger = Arc::new(InMemoryLedger::default());
        let signer = Arc::new(DecliningSigner { account: alice() });
        let client = LedgerClient::new(ledger.contract_address(), signer, ledger.clone());

        let err = client.add_shipment(VoyageId::new(1), "Electronics").await.unwrap_err();
        assert_eq!(
            err,
            ClientError::Transaction {
                operation: crate::call::WriteOperation::AddShipment,
                message: "user denied signature".into(),
            }
        );
        assert_eq!(client.error().as_deref(), Some("user denied signature"));
        assert!(!client.is_loading());
    }

    #[tokio::test]
    async fn success_clears_previous_error() {
        let (ledger, client) = local_client();
        let voyage = seed(&ledger);

        client.add_shipment(VoyageId::new(99), "Grain").await.unwrap_err();
        assert_eq!(client.error().as_deref(), Some("voyage 99 not found"));

        let shipment = client.add_shipment(voyage, "Grain").await.unwrap();
        assert_eq!(shipment, ShipmentId::new(1));
        assert!(client.error().is_none());
        assert!(!client.is_loading());
    }

    #[tokio::test]
    async fn empty_claim_reason_is_forwarded() {
        let (ledger, client) = local_client();
        let voyage = seed(&ledger);

        let claim = client.submit_insurance_claim(voyage, "").await.unwrap();
        assert_eq!(claim, ClaimId::new(1));
        let calls = ledger.submitted_calls();
        assert_eq!(calls[0].call.args(), vec![json!(1), json!("")]);
        assert_eq!(ledger.claims(voyage)[0].claim_reason, "");
    }

    #[tokio::test]
    async fn ledger_revert_surfaces_as_transaction_error() {
        let (_ledger, client) = local_client();
        let err = client.create_voyage("", "Los Angeles", 14).await.unwrap_err();
        assert_eq!(err.message(), "origin required");
        assert_eq!(client.error().as_deref(), Some("origin required"));
    }

    #[tokio::test]
    async fn overlapping_writes_share_slot_last_settled_wins() {
        let ledger = Arc::new(InMemoryLedger::default());
        let voyage = seed(&ledger);
        let (release_first, first_gate) = oneshot::channel();
        let (release_second, second_gate) = oneshot::channel();
        let gates = vec![first_gate, second_gate];
        let transport = Arc::new(GatedTransport::new(ledger.clone(), gates));
        let signer = Arc::new(WalletSigner::connected(transport.clone(), alice()));
        let client = LedgerClient::new(ledger.contract_address(), signer, transport);

        let driver = async {
            tokio::task::yield_now().await;
            assert!(client.is_loading());
            assert_eq!(client.requests().pending_count(), 2);
            // The second call settles first, successfully.
            release_second.send(Ok(())).unwrap();
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }
            assert!(!client.is_loading());
            assert!(client.error().is_none());
            // Then the first call fails.
            release_first
                .send(Err(LedgerError::Network("connection reset".into())))
                .unwrap();
        };

        let (first, second, ()) = tokio::join!(
            client.create_voyage("Busan", "Seattle", 12),
            client.add_shipment(voyage, "Textiles"),
            driver
        );

        assert!(first.is_err());
        assert!(second.is_ok());
        assert!(!client.is_loading());
        assert_eq!(client.error().as_deref(), Some("connection reset"));

        let records = client.requests().records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].state, RequestState::Failed("connection reset".into()));
        assert!(records[1].state.receipt().is_some());
    }

    #[tokio::test]
    async fn failed_read_leaves_write_slot_alone() {
        let (ledger, client) = local_client();
        seed(&ledger);
        client.create_voyage("", "x", 1).await.unwrap_err();
        let before = client.error();

        let err = client.get_voyage_info(VoyageId::new(42)).await.unwrap_err();
        assert!(matches!(err, ClientError::Read { .. }));
        assert_eq!(client.error(), before);
    }

    #[tokio::test]
    async fn voyage_info_is_idempotent() {
        let (ledger, client) = local_client();
        let voyage = seed(&ledger);
        let a = client.get_voyage_info(voyage).await.unwrap();
        let b = client.get_voyage_info(voyage).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.origin, "Shanghai");
        assert!(ledger.submitted_calls().is_empty());
        assert!(client.requests().is_empty());
    }

    #[tokio::test]
    async fn cancelled_write_does_not_stay_loading() {
        let ledger = Arc::new(InMemoryLedger::default());
        let (_hold, gate) = oneshot::channel();
        let transport = Arc::new(GatedTransport::new(ledger.clone(), vec![gate]));
        let signer = Arc::new(WalletSigner::connected(transport.clone(), alice()));
        let client = LedgerClient::new(ledger.contract_address(), signer, transport);

        let timed_out = tokio::time::timeout(
            std::time::Duration::from_millis(20),
            client.create_voyage("Shanghai", "Los Angeles", 14),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(!client.is_loading());
        assert_eq!(client.error().as_deref(), Some(CANCELLED));
        assert_eq!(client.requests().pending_count(), 0);
        assert_eq!(
            client.requests().records()[0].state,
            RequestState::Failed(CANCELLED.into())
        );

        // No gate left, so the retry goes straight through.
        assert_eq!(
            client.create_voyage("Shanghai", "Los Angeles", 14).await.unwrap(),
            VoyageId::new(1)
        );
        assert!(client.error().is_none());
    }

    #[tokio::test]
    async fn voyage_query_reads_through_the_client() {
        let (ledger, client) = local_client();
        let voyage = seed(&ledger);

        let query = client.voyage_query(voyage);
        assert_eq!(query.state(), ReadState::Idle);
        let state = query.refresh().await;
        assert_eq!(state.data().map(|v| v.destination.as_str()), Some("Los Angeles"));

        let missing = client.voyage_query(VoyageId::new(8));
        assert!(missing.refresh().await.error().is_some());
        assert!(client.error().is_none());
    }

    #[tokio::test]
    async fn status_reports_address() {
        let (_ledger, client) = local_client();
        let status = client.status();
        assert_eq!(status.address, Some(alice()));
        assert!(!status.is_loading);
        assert!(status.error.is_none());
    }
}
