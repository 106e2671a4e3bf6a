//! Checksummed binary envelope for pipeline artifacts

use crate::error::{ForgeError, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Wrapper written around every serialized pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    pub format_version: u32,
    /// FNV-1a hash of `payload`
    pub checksum: u64,
    pub payload: Vec<u8>,
}

impl Envelope {
    pub const MAGIC: [u8; 4] = [b'F', b'G', b'M', b'L'];
    pub const VERSION: u32 = 1;

    pub fn new(payload: Vec<u8>) -> Self {
        Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            checksum: fnv1a(&payload),
            payload,
        }
    }

    pub fn verify(&self) -> Result<()> {
        if self.magic != Self::MAGIC {
            return Err(ForgeError::CorruptArtifact(
                "unrecognized file format".to_string(),
            ));
        }
        if self.format_version > Self::VERSION {
            return Err(ForgeError::CorruptArtifact(format!(
                "format version {} is newer than supported {}",
                self.format_version,
                Self::VERSION
            )));
        }
        if fnv1a(&self.payload) != self.checksum {
            return Err(ForgeError::CorruptArtifact(
                "checksum verification failed".to_string(),
            ));
        }
        Ok(())
    }
}

fn fnv1a(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    data.iter().fold(FNV_OFFSET, |hash, &byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Serialize `value` with bincode inside an [`Envelope`]
pub fn seal<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let payload = bincode::serialize(value)?;
    Ok(bincode::serialize(&Envelope::new(payload))?)
}

/// Verify and decode bytes written by [`seal`]
pub fn open<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let envelope: Envelope = bincode::deserialize(bytes)
        .map_err(|e| ForgeError::CorruptArtifact(format!("unreadable envelope: {}", e)))?;
    envelope.verify()?;
    bincode::deserialize(&envelope.payload)
        .map_err(|e| ForgeError::CorruptArtifact(format!("unreadable payload: {}", e)))
}
