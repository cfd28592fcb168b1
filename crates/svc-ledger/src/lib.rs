//! Ledger client for SecureVoyageChain (SVC).
//!
//! This crate wraps the voyage contract behind a uniform async call surface.
//! It provides:
//! - `ContractCall` / `SignedCall` / `TxReceipt` describing the contract ABI
//! - `Signer` / `LedgerTransport` trait boundaries for wallet and chain access
//! - `LedgerClient` tracking loading/error state and per-request outcomes
//! - `VoyageQuery` poll-style read handle with its own pending/error channel
//! - `InMemoryLedger` contract simulation for tests, demos, and embedding
//! - `ClientConfig` TOML configuration

pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod memory;
pub mod query;
pub mod signer;
pub mod status;
pub mod traits;

pub use call::{ContractCall, SignedCall, TxReceipt, WriteOperation};
pub use client::LedgerClient;
pub use config::{ClientConfig, SeedVoyage};
pub use error::{ClientError, ClientResult, LedgerError, LedgerResult};
pub use memory::{InMemoryLedger, SealedValues};
pub use query::{ReadState, VoyageQuery};
pub use signer::WalletSigner;
pub use status::{ClientStatus, RequestId, RequestRecord, RequestState, RequestTracker};
pub use traits::{LedgerTransport, Signer};
