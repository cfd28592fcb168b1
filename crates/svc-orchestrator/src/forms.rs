use serde::{Deserialize, Serialize};
use svc_types::VoyageId;

/// Input buffer for `createVoyage`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoyageForm {
    pub origin: String,
    pub destination: String,
    pub duration_days: u64,
}

impl VoyageForm {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        duration_days: u64,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            duration_days,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Input buffer for `addShipment`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipmentForm {
    pub voyage_id: VoyageId,
    pub cargo_type: String,
}

impl ShipmentForm {
    pub fn new(voyage_id: VoyageId, cargo_type: impl Into<String>) -> Self {
        Self {
            voyage_id,
            cargo_type: cargo_type.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Input buffer for `submitInsuranceClaim`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimForm {
    pub voyage_id: VoyageId,
    pub claim_reason: String,
}

impl ClaimForm {
    pub fn new(voyage_id: VoyageId, claim_reason: impl Into<String>) -> Self {
        Self {
            voyage_id,
            claim_reason: claim_reason.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
