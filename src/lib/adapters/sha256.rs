use alloy_primitives::B256;
use sha2::Digest;

use crate::ports::hasher::CommitmentHasher;

/// SHA-256, for verifiers that do not have keccak available.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Sha256;

impl CommitmentHasher for Sha256 {
    const NAME: &'static str = "sha256";

    fn hash(input: &[u8]) -> B256 {
        let mut hasher = sha2::Sha256::new();
        hasher.update(input);
        B256::from_slice(&hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            Sha256::hash(b"abc"),
            b256!("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")
        );
    }

    #[test]
    fn test_differs_from_keccak() {
        use crate::adapters::keccak::Keccak256;
        assert_ne!(Sha256::hash(b"leaf"), Keccak256::hash(b"leaf"));
    }
}
