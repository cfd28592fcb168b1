//! Data model for SecureVoyageChain (SVC).
//!
//! These are the records the voyage contract keeps on-chain. The client never
//! owns them; it only reads snapshots and submits intents that the ledger turns
//! into state transitions.
//!
//! # Key Types
//!
//! - [`Address`] — 20-byte account identifier of a wallet or contract
//! - [`VoyageId`], [`ShipmentId`], [`ClaimId`] — ledger-assigned identifiers
//! - [`EncryptedU8`] — opaque handle to an FHE-protected quantity
//! - [`Voyage`], [`Shipment`], [`InsuranceClaim`] — contract records
//! - [`TrackingNumber`] — human-facing shipment reference

pub mod address;
pub mod encrypted;
pub mod error;
pub mod ids;
pub mod records;
pub mod tracking;

pub use address::Address;
pub use encrypted::EncryptedU8;
pub use error::TypeError;
pub use ids::{ClaimId, ShipmentId, VoyageId};
pub use records::{InsuranceClaim, Shipment, Voyage, VoyageStatus, SECONDS_PER_DAY};
pub use tracking::TrackingNumber;
