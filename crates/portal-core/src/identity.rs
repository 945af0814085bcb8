//! Caller identity hashing.
//!
//! Digest = hex(HMAC-SHA256(salt, address)). The raw address never leaves the
//! request that carried it; only this digest is logged, used as a rate limit
//! key or persisted.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Salted one-way hasher for client addresses.
#[derive(Clone)]
pub struct IdentityHasher {
    mac: HmacSha256,
}

impl IdentityHasher {
    pub fn new(salt: impl Into<Vec<u8>>) -> Self {
        let salt = salt.into();
        let mac = HmacSha256::new_from_slice(&salt).expect("HMAC accepts any key size");
        Self { mac }
    }

    /// Lowercase hex digest (64 chars) of `address`.
    pub fn digest(&self, address: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(address.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl std::fmt::Debug for IdentityHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityHasher").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_deterministic() {
        let hasher = IdentityHasher::new("a-sufficiently-long-salt");
        assert_eq!(hasher.digest("203.0.113.7"), hasher.digest("203.0.113.7"));
    }

    #[test]
    fn test_salt_changes_digest() {
        let a = IdentityHasher::new("salt-number-one-xxxx");
        let b = IdentityHasher::new("salt-number-two-xxxx");
        assert_ne!(a.digest("203.0.113.7"), b.digest("203.0.113.7"));
    }

    #[test]
    fn test_digest_shape_hides_input() {
        let hasher = IdentityHasher::new("a-sufficiently-long-salt");
        let digest = hasher.digest("203.0.113.7");

        assert_eq!(digest.len(), 64);
        assert!(digest
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
        assert!(!digest.contains("203"));
        assert!(!digest.contains("113"));
    }

    #[test]
    fn test_different_addresses_differ() {
        let hasher = IdentityHasher::new("a-sufficiently-long-salt");
        assert_ne!(hasher.digest("203.0.113.7"), hasher.digest("203.0.113.8"));
    }

    #[test]
    fn test_debug_does_not_leak_salt() {
        let hasher = IdentityHasher::new("super-secret-salt-value");
        assert!(!format!("{:?}", hasher).contains("super-secret"));
    }
}
