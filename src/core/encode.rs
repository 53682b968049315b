use crate::utils::error::{BatchError, Result};
use sha2::{Digest, Sha256};

/// Offsets stay below this so neighbouring base ports do not interleave.
pub const PORT_OFFSET_RANGE: u16 = 1000;

/// Deterministic port offset for a scan name.
///
/// The SHA-256 digest of the name is read as one big-endian integer and
/// reduced modulo [`PORT_OFFSET_RANGE`].
pub fn encode_string(name: &str) -> u16 {
    let digest = Sha256::digest(name.as_bytes());
    let modulus = PORT_OFFSET_RANGE as u32;
    let offset = digest
        .iter()
        .fold(0u32, |acc, byte| (acc * 256 + *byte as u32) % modulus);
    offset as u16
}

/// `base + encode_string(name)`, refusing to wrap past 65535.
pub fn scan_port(base: u16, name: &str) -> Result<u16> {
    let offset = encode_string(name);
    base.checked_add(offset).ok_or_else(|| BatchError::PortOverflow {
        scan: name.to_string(),
        base,
        offset,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_is_deterministic() {
        assert_eq!(encode_string("garden"), encode_string("garden"));
        assert_eq!(encode_string(""), encode_string(""));
    }

    #[test]
    fn test_encode_stays_in_range() {
        for name in ["bicycle", "bonsai", "counter", "scan24", "Truck", "", "場景"] {
            assert!(encode_string(name) < PORT_OFFSET_RANGE);
        }
    }

    #[test]
    fn test_encode_known_values() {
        assert_eq!(encode_string(""), 549);
        assert_eq!(encode_string("garden"), 417);
        assert_eq!(encode_string("bicycle"), 742);
        assert_eq!(encode_string("room"), 130);
        assert_eq!(encode_string("scan24"), 706);
    }

    #[test]
    fn test_scan_port_adds_offset() {
        assert_eq!(scan_port(8080, "garden").unwrap(), 8497);
        assert_eq!(scan_port(8080, "kitchen").unwrap(), 8080 + encode_string("kitchen"));
    }

    #[test]
    fn test_scan_port_overflow() {
        let err = scan_port(u16::MAX, "garden").unwrap_err();
        assert!(matches!(err, BatchError::PortOverflow { .. }));
    }
}
