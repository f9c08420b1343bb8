//! Submission payload and its wire format.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Addresses anonymized under each hashed key, keyed by the key's identifier.
///
/// On the wire this is a bare JSON object, e.g.
/// `{"key-id": ["addr-1", "addr-2"]}`. Address order within a key is kept;
/// there is no order across keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WalletAddressSet(HashMap<String, Vec<String>>);

impl WalletAddressSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a set from its wire format.
    pub fn from_json(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Encode the set into its wire format.
    pub fn to_json(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Replace the addresses stored under `key_id`.
    pub fn insert(&mut self, key_id: impl Into<String>, addresses: Vec<String>) {
        self.0.insert(key_id.into(), addresses);
    }

    pub fn get(&self, key_id: &str) -> Option<&[String]> {
        self.0.get(key_id).map(Vec::as_slice)
    }

    /// Number of key identifiers.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
