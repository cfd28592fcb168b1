use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use svc_types::{
    Address, ClaimId, EncryptedU8, InsuranceClaim, Shipment, ShipmentId, Voyage, VoyageId,
    SECONDS_PER_DAY,
};

use crate::call::{ContractCall, SignedCall, TxReceipt};
use crate::config::SeedVoyage;
use crate::error::{LedgerError, LedgerResult};
use crate::traits::LedgerTransport;

/// Plaintext behind a voyage's encrypted fields. Only the contract holds it;
/// it becomes readable through [`InMemoryLedger::reveal`] once the voyage has
/// passed its delivery checkpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedValues {
    pub cargo_value: u8,
    pub insurance_amount: u8,
    pub risk_score: u8,
}

/// In-memory voyage contract for tests, local demos, and embedding.
///
/// Assigns sequential ids starting at 1 and enforces the contract's
/// preconditions, rejecting violations as reverts.
pub struct InMemoryLedger {
    contract: Address,
    fixed_time: Option<u64>,
    inner: RwLock<ContractState>,
}

#[derive(Default)]
struct ContractState {
    voyages: BTreeMap<VoyageId, VoyageEntry>,
    shipments: Vec<Shipment>,
    claims: Vec<InsuranceClaim>,
    submitted: Vec<SignedCall>,
    nonce: u64,
}

struct VoyageEntry {
    voyage: Voyage,
    sealed: SealedValues,
}

impl InMemoryLedger {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            fixed_time: None,
            inner: RwLock::new(ContractState::default()),
        }
    }

    /// Pin the ledger clock, for deterministic timestamps in tests.
    pub fn with_fixed_time(mut self, unix_secs: u64) -> Self {
        self.fixed_time = Some(unix_secs);
        self
    }

    pub fn contract_address(&self) -> Address {
        self.contract
    }

    /// Insert a voyage directly, bypassing transaction submission.
    pub fn seed_voyage(&self, owner: Address, seed: &SeedVoyage) -> LedgerResult<VoyageId> {
        let mut state = self.write_state()?;
        let sealed = SealedValues {
            cargo_value: seed.cargo_value,
            insurance_amount: seed.insurance_amount,
            risk_score: seed.risk_score,
        };
        let id = self.insert_voyage(
            &mut state,
            owner,
            &seed.origin,
            &seed.destination,
            seed.duration_days,
            sealed,
        )?;
        if seed.verified {
            if let Some(entry) = state.voyages.get_mut(&id) {
                entry.voyage.is_verified = true;
                entry.voyage.is_active = false;
            }
        }
        Ok(id)
    }

    /// Apply a signed call as the contract would, returning its receipt.
    pub fn execute(&self, signed: SignedCall) -> LedgerResult<TxReceipt> {
        let mut state = self.write_state()?;
        state.submitted.push(signed.clone());

        if signed.contract != self.contract {
            return Err(LedgerError::UnknownContract(signed.contract.to_hex()));
        }

        let returned_id = match &signed.call {
            ContractCall::CreateVoyage {
                origin,
                destination,
                duration_days,
            } => self
                .insert_voyage(
                    &mut state,
                    signed.from,
                    origin,
                    destination,
                    *duration_days,
                    SealedValues::default(),
                )?
                .get(),
            ContractCall::AddShipment {
                voyage_id,
                cargo_type,
            } => {
                let entry = state
                    .voyages
                    .get(voyage_id)
                    .ok_or(LedgerError::VoyageNotFound(*voyage_id))?;
                if !entry.voyage.accepts_shipments() {
                    return Err(LedgerError::Reverted(format!("voyage {voyage_id} is not active")));
                }
                let id = ShipmentId::new(state.shipments.len() as u64 + 1);
                state.shipments.push(Shipment {
                    id,
                    voyage_id: *voyage_id,
                    cargo_type: cargo_type.clone(),
                });
                id.get()
            }
            ContractCall::SubmitInsuranceClaim {
                voyage_id,
                claim_reason,
            } => {
                if !state.voyages.contains_key(voyage_id) {
                    return Err(LedgerError::VoyageNotFound(*voyage_id));
                }
                let id = ClaimId::new(state.claims.len() as u64 + 1);
                state.claims.push(InsuranceClaim {
                    id,
                    voyage_id: *voyage_id,
                    claim_reason: claim_reason.clone(),
                    claimant: signed.from,
                });
                id.get()
            }
        };

        state.nonce += 1;
        let receipt = TxReceipt::for_call(&signed, state.nonce, returned_id);
        tracing::debug!(
            function = signed.call.function_name(),
            returned_id,
            tx = %receipt.tx_hash_hex(),
            "ledger accepted call"
        );
        Ok(receipt)
    }

    /// Mark the delivery checkpoint as reached. Only the owner may verify, and
    /// a voyage can be verified once.
    pub fn verify_voyage(&self, voyage_id: VoyageId, caller: Address) -> LedgerResult<()> {
        let mut state = self.write_state()?;
        let entry = state
            .voyages
            .get_mut(&voyage_id)
            .ok_or(LedgerError::VoyageNotFound(voyage_id))?;
        if entry.voyage.owner != caller {
            return Err(LedgerError::Reverted("only the voyage owner can verify".into()));
        }
        if entry.voyage.is_verified {
            return Err(LedgerError::Reverted(format!("voyage {voyage_id} already verified")));
        }
        entry.voyage.is_verified = true;
        entry.voyage.is_active = false;
        Ok(())
    }

    /// Close a voyage to new shipments without verifying delivery.
    pub fn complete_voyage(&self, voyage_id: VoyageId, caller: Address) -> LedgerResult<()> {
        let mut state = self.write_state()?;
        let entry = state
            .voyages
            .get_mut(&voyage_id)
            .ok_or(LedgerError::VoyageNotFound(voyage_id))?;
        if entry.voyage.owner != caller {
            return Err(LedgerError::Reverted("only the voyage owner can complete".into()));
        }
        entry.voyage.is_active = false;
        Ok(())
    }

    /// Plaintext of the encrypted fields, available after verification.
    pub fn reveal(&self, voyage_id: VoyageId) -> LedgerResult<SealedValues> {
        let state = self.read_state()?;
        let entry = state
            .voyages
            .get(&voyage_id)
            .ok_or(LedgerError::VoyageNotFound(voyage_id))?;
        if !entry.voyage.is_verified {
            return Err(LedgerError::Reverted(format!("voyage {voyage_id} not verified")));
        }
        Ok(entry.sealed)
    }

    pub fn shipments(&self, voyage_id: VoyageId) -> Vec<Shipment> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .shipments
            .iter()
            .filter(|s| s.voyage_id == voyage_id)
            .cloned()
            .collect()
    }

    pub fn claims(&self, voyage_id: VoyageId) -> Vec<InsuranceClaim> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .claims
            .iter()
            .filter(|c| c.voyage_id == voyage_id)
            .cloned()
            .collect()
    }

    pub fn voyages(&self) -> Vec<Voyage> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .voyages
            .values()
            .map(|e| e.voyage.clone())
            .collect()
    }

    pub fn voyage_count(&self) -> usize {
        self.inner.read().unwrap_or_else(PoisonError::into_inner).voyages.len()
    }

    /// Every call that reached the ledger, accepted or reverted, in order.
    pub fn submitted_calls(&self) -> Vec<SignedCall> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .submitted
            .clone()
    }

    fn insert_voyage(
        &self,
        state: &mut ContractState,
        owner: Address,
        origin: &str,
        destination: &str,
        duration_days: u64,
        sealed: SealedValues,
    ) -> LedgerResult<VoyageId> {
        if origin.trim().is_empty() {
            return Err(LedgerError::Reverted("origin required".into()));
        }
        if destination.trim().is_empty() {
            return Err(LedgerError::Reverted("destination required".into()));
        }
        if duration_days == 0 {
            return Err(LedgerError::Reverted("duration must be positive".into()));
        }
        let duration_secs = duration_days
            .checked_mul(SECONDS_PER_DAY)
            .ok_or_else(|| LedgerError::Reverted("duration overflow".into()))?;

        let id = VoyageId::new(state.voyages.len() as u64 + 1);
        let start_time = self.now();
        let voyage = Voyage {
            id,
            origin: origin.to_string(),
            destination: destination.to_string(),
            cargo_value: seal(id, "cargo_value", sealed.cargo_value),
            insurance_amount: seal(id, "insurance_amount", sealed.insurance_amount),
            risk_score: seal(id, "risk_score", sealed.risk_score),
            is_active: true,
            is_verified: false,
            owner,
            start_time,
            end_time: start_time.saturating_add(duration_secs),
        };
        state.voyages.insert(id, VoyageEntry { voyage, sealed });
        Ok(id)
    }

    fn now(&self) -> u64 {
        self.fixed_time
            .unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64)
    }

    fn read_state(&self) -> LedgerResult<std::sync::RwLockReadGuard<'_, ContractState>> {
        self.inner.read().map_err(|_| LedgerError::LockPoisoned)
    }

    fn write_state(&self) -> LedgerResult<std::sync::RwLockWriteGuard<'_, ContractState>> {
        self.inner.write().map_err(|_| LedgerError::LockPoisoned)
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new(Address::from_label("SecureVoyageChain"))
    }
}

#[async_trait]
impl LedgerTransport for InMemoryLedger {
    async fn submit(&self, call: SignedCall) -> LedgerResult<TxReceipt> {
        tokio::task::yield_now().await;
        self.execute(call)
    }

    async fn voyage_info(&self, contract: Address, voyage_id: VoyageId) -> LedgerResult<Voyage> {
        if contract != self.contract {
            return Err(LedgerError::UnknownContract(contract.to_hex()));
        }
        let state = self.read_state()?;
        state
            .voyages
            .get(&voyage_id)
            .map(|e| e.voyage.clone())
            .ok_or(LedgerError::VoyageNotFound(voyage_id))
    }
}

/// Opaque ciphertext handle for one encrypted field.
fn seal(voyage_id: VoyageId, field: &str, plaintext: u8) -> EncryptedU8 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(b"svc-fhe-handle-v1:");
    hasher.update(&voyage_id.get().to_be_bytes());
    hasher.update(field.as_bytes());
    hasher.update(&[plaintext]);
    EncryptedU8::from_handle(hasher.finalize().as_bytes()[0])
}
