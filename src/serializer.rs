//! Serialization layer: mapping snapshots to/from the on-disk text encoding.
//!
//! The wire format is a single top-level JSON object, so keys are always
//! strings. Implement [`Serializer`] if you need a different text encoding.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;

/// Turns a mapping snapshot into file bytes and back.
pub trait Serializer: Send + Sync {
    /// Encode the mapping as one top-level object.
    fn serialize<V: Serialize>(&self, mapping: &HashMap<String, V>) -> Result<Vec<u8>>;

    /// Decode bytes back into the mapping. Anything that is not a single
    /// object with string keys is a [`Error::Corrupt`].
    fn deserialize<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<HashMap<String, V>>;
}

/// The crate's JSON encoding, compact or indented.
#[derive(Clone, Default)]
pub struct JsonSerializer {
    pretty: bool,
}

impl JsonSerializer {
    /// Compact output: the whole object on one line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Indented output for files people edit or diff by hand.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }
}

impl Serializer for JsonSerializer {
    fn serialize<V: Serialize>(&self, mapping: &HashMap<String, V>) -> Result<Vec<u8>> {
        let bytes = if self.pretty {
            serde_json::to_vec_pretty(mapping)
        } else {
            serde_json::to_vec(mapping)
        };
        bytes.map_err(|e| Error::Serialize(e.to_string()))
    }

    fn deserialize<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<HashMap<String, V>> {
        serde_json::from_slice(bytes).map_err(Error::from)
    }
}
