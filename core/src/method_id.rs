//! Method identifier: digests naming a guest program across the supported
//! proof-size tiers, used downstream to select the matching verification
//! circuit.
//!
//! This module owns the container only.  Digest derivation happens in the
//! proving pipeline, which must consume the loader's `GuestProgram`
//! unmodified so prover and verifier derive the same identifier.

use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{CODE_DIGEST_COUNT, DIGEST_BYTES, DIGEST_WORDS, MAX_CYCLES_PO2, MIN_CYCLES_PO2};

#[derive(Debug, Error)]
pub enum MethodIdError {
    #[error("Failed accessing method id file {0}: {1}")]
    Io(String, #[source] std::io::Error),
    #[error("Invalid method id length: got {got} bytes, expected {expected}")]
    InvalidLength { got: usize, expected: usize },
}

/// A 256-bit digest stored as eight u32 words, little-endian byte order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Digest([u32; DIGEST_WORDS]);

impl Digest {
    /// The all-zero digest, used by the derivation pipeline as the sentinel
    /// for "program does not fit this tier"
    pub const ZERO: Digest = Digest([0; DIGEST_WORDS]);

    pub const fn new(words: [u32; DIGEST_WORDS]) -> Digest {
        Digest(words)
    }

    pub fn from_bytes(bytes: &[u8; DIGEST_BYTES]) -> Digest {
        let mut words = [0u32; DIGEST_WORDS];
        for (i, word) in words.iter_mut().enumerate() {
            *word = u32::from_le_bytes(bytes[4 * i..4 * i + 4].try_into().unwrap());
        }
        Digest(words)
    }

    pub fn to_bytes(&self) -> [u8; DIGEST_BYTES] {
        let mut bytes = [0u8; DIGEST_BYTES];
        for (i, word) in self.0.iter().enumerate() {
            bytes[4 * i..4 * i + 4].copy_from_slice(&word.to_le_bytes());
        }
        bytes
    }

    pub fn as_words(&self) -> &[u32; DIGEST_WORDS] {
        &self.0
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.to_bytes() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

/// Ordered, fixed-size sequence of digests, one per supported power-of-two
/// cycle tier.  Entry `k` names the guest program at the tier proving up to
/// `2^(MIN_CYCLES_PO2 + k)` cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodId([Digest; CODE_DIGEST_COUNT]);

impl MethodId {
    pub const fn new(digests: [Digest; CODE_DIGEST_COUNT]) -> MethodId {
        MethodId(digests)
    }

    /// Parses the stable wire representation: `CODE_DIGEST_COUNT` digests of
    /// `DIGEST_BYTES` bytes each, nothing more.
    pub fn from_bytes(bytes: &[u8]) -> Result<MethodId, MethodIdError> {
        let expected = CODE_DIGEST_COUNT * DIGEST_BYTES;
        if bytes.len() != expected {
            return Err(MethodIdError::InvalidLength { got: bytes.len(), expected });
        }

        let mut digests = [Digest::ZERO; CODE_DIGEST_COUNT];
        for (i, digest) in digests.iter_mut().enumerate() {
            let chunk: &[u8; DIGEST_BYTES] =
                bytes[i * DIGEST_BYTES..(i + 1) * DIGEST_BYTES].try_into().unwrap();
            *digest = Digest::from_bytes(chunk);
        }
        Ok(MethodId(digests))
    }

    /// The stable wire representation consumed by `from_bytes`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(CODE_DIGEST_COUNT * DIGEST_BYTES);
        for digest in &self.0 {
            bytes.extend_from_slice(&digest.to_bytes());
        }
        bytes
    }

    /// Reads a method identifier stored as raw bytes.
    pub fn read_from_file(path: &Path) -> Result<MethodId, MethodIdError> {
        let bytes =
            fs::read(path).map_err(|e| MethodIdError::Io(path.display().to_string(), e))?;
        MethodId::from_bytes(&bytes)
    }

    /// Writes the raw-byte representation read back by `read_from_file`.
    pub fn write_to_file(&self, path: &Path) -> Result<(), MethodIdError> {
        fs::write(path, self.to_bytes())
            .map_err(|e| MethodIdError::Io(path.display().to_string(), e))
    }

    /// Digest for the tier proving executions of up to `2^po2` cycles, or
    /// `None` if `po2` is outside the supported tiers.
    pub fn tier_digest(&self, po2: usize) -> Option<&Digest> {
        if !(MIN_CYCLES_PO2..=MAX_CYCLES_PO2).contains(&po2) {
            return None;
        }
        Some(&self.0[po2 - MIN_CYCLES_PO2])
    }

    /// Iterates over `(po2, digest)` pairs in ascending tier order.
    pub fn tiers(&self) -> impl Iterator<Item = (usize, &Digest)> {
        self.0.iter().enumerate().map(|(i, digest)| (MIN_CYCLES_PO2 + i, digest))
    }
}
