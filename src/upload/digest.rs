//! Content fingerprinting for batch payloads
//!
//! The digest is computed over the serialized payload exactly as it is
//! handed to the byte-sink, so ingest and finalize always compare the same
//! representation.

use sha2::{Digest, Sha256};

/// Compute the SHA-256 hex fingerprint of a serialized payload.
pub fn compute(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Verify that a serialized payload still matches its stored fingerprint.
pub fn verify(bytes: &[u8], expected: &str) -> bool {
    compute(bytes) == expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_hex_sha256() {
        let digest = compute(b"Hello, World!");
        assert_eq!(digest.len(), 64); // SHA-256 = 32 bytes = 64 hex chars
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_compute_is_deterministic() {
        let payload = serde_json::to_vec(&serde_json::json!([1, 2, 3])).unwrap();
        assert_eq!(compute(&payload), compute(&payload));
    }

    #[test]
    fn test_verify_detects_mutation() {
        let payload = serde_json::to_vec(&serde_json::json!([1, 2, 3])).unwrap();
        let digest = compute(&payload);
        assert!(verify(&payload, &digest));

        let mutated = serde_json::to_vec(&serde_json::json!([1, 2, 4])).unwrap();
        assert!(!verify(&mutated, &digest));
    }
}
