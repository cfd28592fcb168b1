use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use svc_types::{Address, VoyageId};

use crate::status::RequestId;

/// The three state-mutating entry points of the voyage contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WriteOperation {
    CreateVoyage,
    AddShipment,
    SubmitInsuranceClaim,
}

impl WriteOperation {
    /// Contract function name as it appears in the ABI.
    pub fn function_name(self) -> &'static str {
        match self {
            Self::CreateVoyage => "createVoyage",
            Self::AddShipment => "addShipment",
            Self::SubmitInsuranceClaim => "submitInsuranceClaim",
        }
    }

    /// Canonical Solidity signature. Every write returns the new record's `uint256` id.
    pub fn signature(self) -> &'static str {
        match self {
            Self::CreateVoyage => "createVoyage(string,string,uint256)",
            Self::AddShipment => "addShipment(uint256,string)",
            Self::SubmitInsuranceClaim => "submitInsuranceClaim(uint256,string)",
        }
    }

    /// Generic message used when a failure carries no reason of its own.
    pub fn failure_message(self) -> &'static str {
        match self {
            Self::CreateVoyage => "Failed to create voyage",
            Self::AddShipment => "Failed to add shipment",
            Self::SubmitInsuranceClaim => "Failed to submit insurance claim",
        }
    }
}

impl fmt::Display for WriteOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.function_name())
    }
}

/// ABI signature of the read-only voyage query.
pub const GET_VOYAGE_INFO_SIGNATURE: &str = "getVoyageInfo(uint256)";

/// A write intent against the voyage contract, before signing.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractCall {
    CreateVoyage {
        origin: String,
        destination: String,
        duration_days: u64,
    },
    AddShipment {
        voyage_id: VoyageId,
        cargo_type: String,
    },
    SubmitInsuranceClaim {
        voyage_id: VoyageId,
        claim_reason: String,
    },
}

impl ContractCall {
    pub fn operation(&self) -> WriteOperation {
        match self {
            Self::CreateVoyage { .. } => WriteOperation::CreateVoyage,
            Self::AddShipment { .. } => WriteOperation::AddShipment,
            Self::SubmitInsuranceClaim { .. } => WriteOperation::SubmitInsuranceClaim,
        }
    }

    pub fn function_name(&self) -> &'static str {
        self.operation().function_name()
    }

    /// Positional arguments in ABI order.
    pub fn args(&self) -> Vec<Value> {
        match self {
            Self::CreateVoyage {
                origin,
                destination,
                duration_days,
            } => vec![json!(origin), json!(destination), json!(duration_days)],
            Self::AddShipment {
                voyage_id,
                cargo_type,
            } => vec![json!(voyage_id.get()), json!(cargo_type)],
            Self::SubmitInsuranceClaim {
                voyage_id,
                claim_reason,
            } => vec![json!(voyage_id.get()), json!(claim_reason)],
        }
    }
}

/// A call bound to a contract and a sending account, ready for submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedCall {
    pub request_id: RequestId,
    pub contract: Address,
    pub from: Address,
    pub call: ContractCall,
}

/// Confirmation of an accepted write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub tx_hash: [u8; 32],
    pub request_id: RequestId,
    pub operation: WriteOperation,
    pub from: Address,
    /// Identifier the contract returned (new voyage, shipment, or claim id).
    pub returned_id: u64,
}

impl TxReceipt {
    /// Build a receipt whose hash commits to the signed call and the ledger nonce.
    pub fn for_call(signed: &SignedCall, nonce: u64, returned_id: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(b"svc-tx-v1:");
        hasher.update(signed.contract.as_bytes());
        hasher.update(signed.from.as_bytes());
        hasher.update(&nonce.to_be_bytes());
        hasher.update(signed.call.function_name().as_bytes());
        for arg in signed.call.args() {
            hasher.update(arg.to_string().as_bytes());
        }
        Self {
            tx_hash: *hasher.finalize().as_bytes(),
            request_id: signed.request_id,
            operation: signed.call.operation(),
            from: signed.from,
            returned_id,
        }
    }

    pub fn tx_hash_hex(&self) -> String {
        format!("0x{}", hex::encode(self.tx_hash))
    }
}
