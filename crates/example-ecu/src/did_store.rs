//! DID data table with optional JSON file persistence

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid DID data file: {0}")]
    Format(String),
}

/// On-disk schema of the DID data file:
/// `{"version": "1.0", "description": "...", "dids": {"F190": [98, ...]}}`
#[derive(Debug, Serialize, Deserialize)]
struct DidFile {
    version: String,
    description: String,
    dids: HashMap<String, Vec<u8>>,
}

/// In-memory DID table, optionally persisted to a JSON file on every
/// write (mirroring how a real parameter store survives restarts).
pub struct DidStore {
    data: RwLock<HashMap<u16, Vec<u8>>>,
    path: Option<PathBuf>,
}

impl Default for DidStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DidStore {
    /// In-memory store seeded with the default data set, no persistence.
    pub fn new() -> Self {
        Self {
            data: RwLock::new(Self::default_data()),
            path: None,
        }
    }

    /// Store backed by a JSON file. Loads existing data if the file is
    /// readable; otherwise seeds the defaults and writes them out.
    pub fn with_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let store = match std::fs::read_to_string(&path) {
            Ok(content) => {
                let file: DidFile = serde_json::from_str(&content)
                    .map_err(|e| StoreError::Format(e.to_string()))?;
                let mut data = HashMap::new();
                for (key, value) in file.dids {
                    let did = u16::from_str_radix(&key, 16)
                        .map_err(|e| StoreError::Format(format!("Bad DID key '{}': {}", key, e)))?;
                    data.insert(did, value);
                }
                tracing::info!(path = %path.display(), dids = data.len(), "Loaded DID data");
                Self {
                    data: RwLock::new(data),
                    path: Some(path),
                }
            }
            Err(_) => {
                tracing::warn!(path = %path.display(), "DID data file not readable, seeding defaults");
                let store = Self {
                    data: RwLock::new(Self::default_data()),
                    path: Some(path),
                };
                store.save()?;
                store
            }
        };
        Ok(store)
    }

    fn default_data() -> HashMap<u16, Vec<u8>> {
        let mut data = HashMap::new();
        // Software version "V1.0.0", zero-padded to 16 bytes
        let mut version = b"V1.0.0".to_vec();
        version.resize(16, 0x00);
        data.insert(0x0001, version);
        // Vehicle speed, 100 km/h
        data.insert(0x0002, vec![0x00, 0x64]);
        // Engine speed, 1000 rpm
        data.insert(0x0003, vec![0x03, 0xE8]);
        // Feature configuration word
        data.insert(0x0004, vec![0x00, 0x00, 0x00, 0x01]);
        // Demo DIDs
        data.insert(0x1234, vec![0x01, 0x02, 0x03, 0x04]);
        data.insert(0x5678, vec![0xAA, 0xBB, 0xCC, 0xDD]);
        data
    }

    pub fn read(&self, did: u16) -> Option<Vec<u8>> {
        self.data.read().get(&did).cloned()
    }

    /// Insert or replace a DID value and persist if a data file is
    /// configured.
    pub fn write(&self, did: u16, value: Vec<u8>) -> Result<(), StoreError> {
        self.data.write().insert(did, value);
        if self.path.is_some() {
            self.save()?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    fn save(&self) -> Result<(), StoreError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let dids = self
            .data
            .read()
            .iter()
            .map(|(did, value)| (format!("{:04X}", did), value.clone()))
            .collect();

        let file = DidFile {
            version: "1.0".to_string(),
            description: "UDS DID Data".to_string(),
            dids,
        };

        let content =
            serde_json::to_string_pretty(&file).map_err(|e| StoreError::Format(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
