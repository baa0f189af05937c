use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use crate::adapters::keccak::Keccak256;
use crate::ports::hasher::CommitmentHasher;

/// Combine two child digests: `H(min(a, b) ‖ max(a, b))`, ordered
/// byte-lexicographically.
///
/// Sorting makes the parent independent of which child was structurally
/// left, so proofs need no direction bits. This is the same rule as
/// OpenZeppelin's `MerkleProof._hashPair`.
pub fn hash_sorted_pair<H: CommitmentHasher>(a: &B256, b: &B256) -> B256 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let mut buf = [0u8; 64];
    buf[..32].copy_from_slice(lo.as_slice());
    buf[32..].copy_from_slice(hi.as_slice());
    H::hash(&buf)
}

/// Fold `proof` into `leaf` bottom-up and compare with `root`.
///
/// Total: a malformed or foreign proof yields `false`, never an error.
/// Levels where the node was carried up unpaired contribute no element.
pub fn verify_with<H: CommitmentHasher>(leaf: B256, proof: &[B256], root: B256) -> bool {
    proof
        .iter()
        .fold(leaf, |acc, sibling| hash_sorted_pair::<H>(&acc, sibling))
        == root
}

/// [`verify_with`] under keccak-256, the reference the on-chain verifier
/// must match byte for byte.
pub fn verify(leaf: B256, proof: &[B256], root: B256) -> bool {
    verify_with::<Keccak256>(leaf, proof, root)
}

/// Inclusion proof for one leaf of a commitment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// The leaf being proven.
    pub leaf: B256,
    /// Position of the leaf in the tree's bottom level.
    pub leaf_index: usize,
    /// Sibling digests from the leaf level up to the root's children.
    pub path: Vec<B256>,
}

impl Proof {
    /// Check this proof against `root` under hasher `H`.
    pub fn verify<H: CommitmentHasher>(&self, root: B256) -> bool {
        verify_with::<H>(self.leaf, &self.path, root)
    }

    /// Number of sibling digests.
    pub fn len(&self) -> usize {
        self.path.len()
    }

    /// True for the single-leaf tree, whose root is the leaf itself.
    pub fn is_empty(&self) -> bool {
        self.path.is_empty()
    }
}
