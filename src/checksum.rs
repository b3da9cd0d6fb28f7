//! Checksum utilities: per-message CRC_EXTRA and source file digests

use crc::{Crc, CRC_16_MCRF4XX};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::model::Field;

/// CRC-16/MCRF4XX, the X.25 variant MAVLink uses (init 0xFFFF, reflected, no final xor)
pub const MAVLINK_CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_MCRF4XX);

/// The 8-bit CRC_EXTRA seed of a message.
///
/// Receivers mix it into every frame checksum so that two ends built from
/// different message definitions reject each other's frames. The byte stream
/// it is computed over is part of the wire contract:
///
/// ```text
/// "<MESSAGE_NAME> " then, per sorted non-extension field:
///     "<base_type> " "<field_name> " [array_len as one byte, arrays only]
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CrcExtra(u8);

impl CrcExtra {
    /// Compute the tag for a message name and its fields in wire order.
    ///
    /// `fields` must already be reordered and must not contain extension fields.
    pub fn compute<'a>(message_name: &str, fields: impl IntoIterator<Item = &'a Field>) -> Self {
        let mut digest = MAVLINK_CRC.digest();
        digest.update(message_name.as_bytes());
        digest.update(b" ");

        for field in fields {
            digest.update(field.base_type().c_name().as_bytes());
            digest.update(b" ");
            digest.update(field.name().as_bytes());
            digest.update(b" ");
            if field.is_array() {
                digest.update(&[field.array_len()]);
            }
        }

        let crc = digest.finalize();
        Self(((crc & 0xFF) ^ (crc >> 8)) as u8)
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for CrcExtra {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CrcExtra> for u8 {
    fn from(tag: CrcExtra) -> Self {
        tag.0
    }
}

/// SHA256 checksum of dialect source content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from raw bytes
    pub fn from_bytes(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        Self(format!("{:x}", hash))
    }

    /// Fold several checksums into one, in the order given
    pub fn combine<'a>(parts: impl IntoIterator<Item = &'a Checksum>) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.0.as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &[u8]) -> bool {
        Self::from_bytes(content) == *self
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc_check_value() {
        // catalogue check value for CRC-16/MCRF4XX
        assert_eq!(MAVLINK_CRC.checksum(b"123456789"), 0x6F91);
    }

    #[test]
    fn test_crc_extra_name_only() {
        let a = CrcExtra::compute("PING", []);
        let b = CrcExtra::compute("PING", []);
        assert_eq!(a, b);
        assert_ne!(a, CrcExtra::compute("PONG", []));
    }

    #[test]
    fn test_checksum_consistency() {
        let content = b"<mavlink><messages/></mavlink>";
        assert_eq!(Checksum::from_bytes(content), Checksum::from_bytes(content));
        assert!(Checksum::from_bytes(content).verify(content));
        assert!(!Checksum::from_bytes(content).verify(b"<mavlink/>"));
    }

    #[test]
    fn test_combine_is_order_sensitive() {
        let a = Checksum::from_bytes(b"a");
        let b = Checksum::from_bytes(b"b");
        assert_eq!(Checksum::combine([&a, &b]), Checksum::combine([&a, &b]));
        assert_ne!(Checksum::combine([&a, &b]), Checksum::combine([&b, &a]));
    }
}
