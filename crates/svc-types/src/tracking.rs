use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::ShipmentId;

const PREFIX: &str = "FHE";

/// Human-facing shipment reference, e.g. `FHE-2024-001-SH-LA`.
///
/// Layout: prefix, year, zero-padded shipment id (at least three digits),
/// two-letter origin code, two-letter destination code.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TrackingNumber {
    pub year: u16,
    pub shipment: ShipmentId,
    pub origin_code: String,
    pub destination_code: String,
}

impl TrackingNumber {
    pub fn new(year: u16, shipment: ShipmentId, origin: &str, destination: &str) -> Self {
        Self {
            year,
            shipment,
            origin_code: port_code(origin),
            destination_code: port_code(destination),
        }
    }

    pub fn parse(s: &str) -> Result<Self, TypeError> {
        let invalid = || TypeError::InvalidTrackingNumber(s.to_string());
        let parts: Vec<&str> = s.trim().split('-').collect();
        let [prefix, year, id, origin, destination] = parts.as_slice() else {
            return Err(invalid());
        };
        if !prefix.eq_ignore_ascii_case(PREFIX) {
            return Err(invalid());
        }
        let year = year.parse::<u16>().map_err(|_| invalid())?;
        let id = id.parse::<u64>().map_err(|_| invalid())?;
        let is_code = |c: &str| c.len() == 2 && c.chars().all(|ch| ch.is_ascii_alphabetic());
        if !is_code(origin) || !is_code(destination) {
            return Err(invalid());
        }
        Ok(Self {
            year,
            shipment: ShipmentId::new(id),
            origin_code: origin.to_ascii_uppercase(),
            destination_code: destination.to_ascii_uppercase(),
        })
    }
}

impl fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{PREFIX}-{}-{:03}-{}-{}",
            self.year,
            self.shipment.get(),
            self.origin_code,
            self.destination_code
        )
    }
}

impl FromStr for TrackingNumber {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Two-letter ASCII code for a port name.
///
/// Multi-word names use the initials of the first two words ("Los Angeles"
/// → `LA`), single words use their first two letters ("Shanghai" → `SH`).
/// A leading "Port of" and the word "Port" are ignored, as is anything that
/// is not an ASCII letter. Short codes are padded with `X`.
pub fn port_code(name: &str) -> String {
    let words: Vec<&str> = name.split_whitespace().collect();
    let words = match words.as_slice() {
        [port, of, rest @ ..]
            if port.eq_ignore_ascii_case("port") && of.eq_ignore_ascii_case("of") =>
        {
            rest
        }
        all => all,
    };
    let words: Vec<String> = words
        .iter()
        .filter(|w| !w.eq_ignore_ascii_case("port"))
        .map(|w| w.chars().filter(char::is_ascii_alphabetic).collect::<String>())
        .filter(|w| !w.is_empty())
        .collect();
    let mut code: String = match words.as_slice() {
        [] => String::new(),
        [single] => single.chars().take(2).collect(),
        [first, second, ..] => first.chars().take(1).chain(second.chars().take(1)).collect(),
    };
    code.make_ascii_uppercase();
    while code.len() < 2 {
        code.push('X');
    }
    code
}
