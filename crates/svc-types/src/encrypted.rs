use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to an FHE-protected `uint8` quantity.
///
/// The contract interface types these fields as narrow integers, but the value
/// carried is a ciphertext handle, not the plaintext. The client never
/// decrypts it, and `Display`/`Debug` never print the raw handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedU8(u8);

impl EncryptedU8 {
    pub const fn from_handle(handle: u8) -> Self {
        Self(handle)
    }

    /// Raw handle as transported by the contract ABI.
    pub const fn handle(self) -> u8 {
        self.0
    }
}

impl fmt::Debug for EncryptedU8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptedU8(<opaque>)")
    }
}

impl fmt::Display for EncryptedU8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[encrypted]")
    }
}
