use alloy_primitives::{keccak256, B256};

use crate::ports::hasher::CommitmentHasher;

/// Keccak-256, the hash the EVM exposes as `keccak256`.
///
/// This is the default hasher throughout the crate; Solidity verifiers such
/// as OpenZeppelin's `MerkleProof` recompute roots with it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Keccak256;

impl CommitmentHasher for Keccak256 {
    const NAME: &'static str = "keccak256";

    fn hash(input: &[u8]) -> B256 {
        keccak256(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::b256;

    #[test]
    fn test_empty_input_digest() {
        assert_eq!(
            Keccak256::hash(&[]),
            b256!("c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470")
        );
    }
}
