//! Package fingerprinting.

use crate::error::Kind;
use serde::ser::{Serialize, SerializeStruct, Serializer};
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::{fs, path::Path};

/// Hashes of an analyzed package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FingerPrint {
    md5: String,
    sha1: String,
    sha256: String,
}

impl FingerPrint {
    /// Fingerprints the package at the given path.
    pub fn new<P: AsRef<Path>>(package: P) -> Result<Self, Kind> {
        let buffer = fs::read(package)?;
        Ok(Self::from_bytes(&buffer))
    }

    /// Fingerprints an in-memory buffer.
    pub fn from_bytes(buffer: &[u8]) -> Self {
        Self {
            md5: hex::encode(md5::compute(buffer).0),
            sha1: hex::encode(Sha1::digest(buffer)),
            sha256: hex::encode(Sha256::digest(buffer)),
        }
    }

    /// Gets the hex encoded SHA-256 hash.
    pub fn sha256(&self) -> &str {
        &self.sha256
    }
}

impl Serialize for FingerPrint {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut ser_struct = serializer.serialize_struct("fingerprint", 3)?;
        ser_struct.serialize_field("md5", &self.md5)?;
        ser_struct.serialize_field("sha1", &self.sha1)?;
        ser_struct.serialize_field("sha256", &self.sha256)?;
        ser_struct.end()
    }
}
