use std::path::Path;

use serde::{Deserialize, Serialize};
use svc_types::Address;

use crate::error::{ClientError, ClientResult};

/// Client configuration, usually loaded from `svc.toml`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the deployed voyage contract. Zero until deployed.
    pub contract_address: Address,
    pub chain_id: u64,
    /// Connected wallet account. `None` means the wallet is disconnected.
    pub account: Option<Address>,
    /// Voyages preloaded into a local ledger.
    pub voyages: Vec<SeedVoyage>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            contract_address: Address::zero(),
            chain_id: 31337,
            account: None,
            voyages: Vec::new(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(s: &str) -> ClientResult<Self> {
        toml::from_str(s).map_err(|e| ClientError::Config(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> ClientResult<String> {
        toml::to_string_pretty(self).map_err(|e| ClientError::Config(e.to_string()))
    }
}

/// A voyage to preload into a local ledger, with the plaintext of its
/// encrypted fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedVoyage {
    pub origin: String,
    pub destination: String,
    pub duration_days: u64,
    #[serde(default)]
    pub cargo_value: u8,
    #[serde(default)]
    pub insurance_amount: u8,
    #[serde(default)]
    pub risk_score: u8,
    #[serde(default)]
    pub verified: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config() {
        let c = ClientConfig::default();
        assert!(c.contract_address.is_zero());
        assert_eq!(c.chain_id, 31337);
        assert!(c.account.is_none());
        assert!(c.voyages.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let text = r#"
            contract_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
            chain_id = 11155111
            account = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8"

            [[voyages]]
            origin = "Shanghai Port"
            destination = "Los Angeles Port"
            duration_days = 14
            cargo_value = 200
            verified = true
        "#;
        let c = ClientConfig::from_toml_str(text).unwrap();
        assert_eq!(c.chain_id, 11155111);
        assert!(c.account.is_some());
        assert_eq!(c.voyages.len(), 1);
        assert_eq!(c.voyages[0].cargo_value, 200);
        assert_eq!(c.voyages[0].risk_score, 0);
        assert!(c.voyages[0].verified);
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let c = ClientConfig::from_toml_str("chain_id = 1").unwrap();
        assert_eq!(c.chain_id, 1);
        assert!(c.contract_address.is_zero());
    }

    #[test]
    fn bad_address_is_a_config_error() {
        let err = ClientConfig::from_toml_str(r#"contract_address = "0x12""#).unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chain_id = 5").unwrap();
        let c = ClientConfig::load(file.path()).unwrap();
        assert_eq!(c.chain_id, 5);
    }

    #[test]
    fn load_missing_file() {
        let err = ClientConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ClientError::Config(_)));
    }

    #[test]
    fn toml_output_parses_back() {
        let mut c = ClientConfig::default();
        c.account = Some(Address::from_label("alice"));
        let text = c.to_toml_string().unwrap();
        assert_eq!(ClientConfig::from_toml_str(&text).unwrap(), c);
    }
}
