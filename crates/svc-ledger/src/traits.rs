use async_trait::async_trait;
use svc_types::{Address, Voyage, VoyageId};

use crate::call::{ContractCall, SignedCall, TxReceipt};
use crate::error::LedgerResult;
use crate::status::RequestId;

/// Chain-side boundary: accepts signed calls and answers read queries.
#[async_trait]
pub trait LedgerTransport: Send + Sync {
    /// Submit a signed write and wait until it is confirmed or rejected.
    async fn submit(&self, call: SignedCall) -> LedgerResult<TxReceipt>;

    /// Read-only `getVoyageInfo`. Must not change ledger state.
    async fn voyage_info(&self, contract: Address, voyage_id: VoyageId) -> LedgerResult<Voyage>;
}

/// Wallet-side boundary: a connected account able to sign and submit calls
/// to a named contract.
#[async_trait]
pub trait Signer: Send + Sync {
    /// The connected account, or `None` while the wallet is disconnected.
    fn address(&self) -> Option<Address>;

    async fn sign_and_submit(
        &self,
        contract: Address,
        call: ContractCall,
        request_id: RequestId,
    ) -> LedgerResult<TxReceipt>;
}
