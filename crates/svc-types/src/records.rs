use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::encrypted::EncryptedU8;
use crate::ids::{ClaimId, ShipmentId, VoyageId};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// A shipping journey as recorded by the voyage contract.
///
/// Origin and destination are public. Cargo value, insurance amount and
/// risk score stay encrypted until the delivery checkpoint; the client sees
/// them only as [`EncryptedU8`] handles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voyage {
    pub id: VoyageId,
    pub origin: String,
    pub destination: String,
    pub cargo_value: EncryptedU8,
    pub insurance_amount: EncryptedU8,
    pub risk_score: EncryptedU8,
    pub is_active: bool,
    pub is_verified: bool,
    pub owner: Address,
    /// Unix seconds.
    pub start_time: u64,
    /// Unix seconds.
    pub end_time: u64,
}

impl Voyage {
    pub fn status(&self) -> VoyageStatus {
        match (self.is_active, self.is_verified) {
            (_, true) => VoyageStatus::Delivered,
            (true, false) => VoyageStatus::InTransit,
            (false, false) => VoyageStatus::Closed,
        }
    }

    /// Whether new shipments may still be attached.
    pub fn accepts_shipments(&self) -> bool {
        self.is_active
    }

    pub fn duration_days(&self) -> u64 {
        self.end_time.saturating_sub(self.start_time) / SECONDS_PER_DAY
    }

    pub fn departs_at(&self) -> Option<DateTime<Utc>> {
        unix_to_datetime(self.start_time)
    }

    pub fn arrives_at(&self) -> Option<DateTime<Utc>> {
        unix_to_datetime(self.end_time)
    }

    /// Percentage of the scheduled journey elapsed at `now` (unix seconds).
    pub fn progress_percent(&self, now: u64) -> u8 {
        if self.is_verified || now >= self.end_time {
            return 100;
        }
        if now <= self.start_time || self.end_time <= self.start_time {
            return 0;
        }
        let elapsed = u128::from(now - self.start_time);
        let total = u128::from(self.end_time - self.start_time);
        (elapsed * 100 / total) as u8
    }
}

/// Display status derived from a voyage's flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoyageStatus {
    InTransit,
    Delivered,
    Closed,
}

impl fmt::Display for VoyageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InTransit => write!(f, "In Transit"),
            Self::Delivered => write!(f, "Delivered"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

/// Cargo attached to exactly one voyage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shipment {
    pub id: ShipmentId,
    pub voyage_id: VoyageId,
    pub cargo_type: String,
}

/// Insurance claim filed against a voyage. Several may exist per voyage.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsuranceClaim {
    pub id: ClaimId,
    pub voyage_id: VoyageId,
    pub claim_reason: String,
    pub claimant: Address,
}

fn unix_to_datetime(secs: u64) -> Option<DateTime<Utc>> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
}
