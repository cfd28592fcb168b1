use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use svc_types::Address;

use crate::call::{ContractCall, SignedCall, TxReceipt};
use crate::error::{LedgerError, LedgerResult};
use crate::status::RequestId;
use crate::traits::{LedgerTransport, Signer};

/// Wallet bound to a transport. The connected account signs every call it
/// forwards; while disconnected, submission fails with
/// [`LedgerError::NotConnected`].
pub struct WalletSigner {
    transport: Arc<dyn LedgerTransport>,
    account: RwLock<Option<Address>>,
}

impl WalletSigner {
    pub fn new(transport: Arc<dyn LedgerTransport>, account: Option<Address>) -> Self {
        Self {
            transport,
            account: RwLock::new(account),
        }
    }

    pub fn connected(transport: Arc<dyn LedgerTransport>, account: Address) -> Self {
        Self::new(transport, Some(account))
    }

    pub fn disconnected(transport: Arc<dyn LedgerTransport>) -> Self {
        Self::new(transport, None)
    }

    pub fn connect(&self, account: Address) {
        *self.account.write().unwrap_or_else(PoisonError::into_inner) = Some(account);
        tracing::debug!(account = %account.short_id(), "wallet connected");
    }

    pub fn disconnect(&self) {
        *self.account.write().unwrap_or_else(PoisonError::into_inner) = None;
        tracing::debug!("wallet disconnected");
    }

    pub fn is_connected(&self) -> bool {
        self.address().is_some()
    }
}

#[async_trait]
impl Signer for WalletSigner {
    fn address(&self) -> Option<Address> {
        *self.account.read().unwrap_or_else(PoisonError::into_inner)
    }

    async fn sign_and_submit(
        &self,
        contract: Address,
        call: ContractCall,
        request_id: RequestId,
    ) -> LedgerResult<TxReceipt> {
        let from = self.address().ok_or(LedgerError::NotConnected)?;
        let signed = SignedCall {
            request_id,
            contract,
            from,
            call,
        };
        self.transport.submit(signed).await
    }
}
