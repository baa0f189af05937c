//! Commitment tree over allowlist leaves.
//!
//! Nodes combine with the sorted-pair rule. A level with an odd count
//! carries its last node up unchanged: the last leaf is never duplicated and
//! no padding node exists, so every internal node is a genuine combination
//! of two digests. This matches `merkletreejs` with `sortPairs: true`.

use std::collections::HashMap;
use std::marker::PhantomData;

use alloy_primitives::B256;

use super::error::AllowlistError;
use super::proof::{hash_sorted_pair, Proof};
use crate::adapters::keccak::Keccak256;
use crate::ports::hasher::CommitmentHasher;

/// Immutable binary hash tree built once from an ordered leaf list.
#[derive(Debug, Clone)]
pub struct CommitmentTree<H = Keccak256> {
    /// `levels[0]` holds the leaves, the last level holds only the root.
    levels: Vec<Vec<B256>>,
    /// First position of each leaf digest.
    positions: HashMap<B256, usize>,
    _hasher: PhantomData<H>,
}

impl<H: CommitmentHasher> CommitmentTree<H> {
    /// Build the tree bottom-up.
    ///
    /// Time: O(n) hashes. Fails with `EmptyPolicy` for an empty list.
    pub fn from_leaves(leaves: Vec<B256>) -> Result<Self, AllowlistError> {
        if leaves.is_empty() {
            return Err(AllowlistError::EmptyPolicy);
        }

        let mut positions = HashMap::with_capacity(leaves.len());
        for (index, leaf) in leaves.iter().enumerate() {
            positions.entry(*leaf).or_insert(index);
        }

        let mut levels = vec![leaves];
        while let Some(current) = levels.last().filter(|level| level.len() > 1) {
            let pairs = current.chunks_exact(2);
            let carried = pairs.remainder().first().copied();
            let mut next: Vec<B256> = pairs
                .map(|pair| hash_sorted_pair::<H>(&pair[0], &pair[1]))
                .collect();
            next.extend(carried);
            levels.push(next);
        }

        let tree = Self {
            levels,
            positions,
            _hasher: PhantomData,
        };
        tracing::debug!(
            leaves = tree.leaf_count(),
            depth = tree.depth(),
            hasher = H::NAME,
            root = %tree.root(),
            "commitment tree built"
        );
        Ok(tree)
    }

    /// Root digest; for a single-leaf tree, the leaf itself.
    pub fn root(&self) -> B256 {
        self.levels
            .last()
            .and_then(|level| level.first())
            .copied()
            .unwrap_or_default()
    }

    /// Number of hashing levels between the leaves and the root.
    pub fn depth(&self) -> usize {
        self.levels.len() - 1
    }

    pub fn leaf_count(&self) -> usize {
        self.levels[0].len()
    }

    /// Leaves in the order they were supplied.
    pub fn leaves(&self) -> &[B256] {
        &self.levels[0]
    }

    pub fn contains(&self, leaf: &B256) -> bool {
        self.positions.contains_key(leaf)
    }

    /// Proof for the leaf at `index`, or `None` when out of range.
    ///
    /// Time: O(log n). A level where the node was carried up unpaired adds
    /// no element, so the verifier folds nothing in at that level either.
    pub fn proof_at(&self, index: usize) -> Option<Proof> {
        let leaf = *self.leaves().get(index)?;
        let mut path = Vec::with_capacity(self.depth());
        let mut position = index;

        for level in &self.levels[..self.depth()] {
            if let Some(sibling) = level.get(position ^ 1) {
                path.push(*sibling);
            }
            position /= 2;
        }

        Some(Proof {
            leaf,
            leaf_index: index,
            path,
        })
    }

    /// Proof for a leaf digest; `LeafNotFound` if the tree does not hold it.
    pub fn proof_for(&self, leaf: &B256) -> Result<Proof, AllowlistError> {
        self.positions
            .get(leaf)
            .and_then(|&index| self.proof_at(index))
            .ok_or(AllowlistError::LeafNotFound(*leaf))
    }
}

/// Build a keccak-256 tree.
pub fn build_tree(leaves: Vec<B256>) -> Result<CommitmentTree, AllowlistError> {
    CommitmentTree::<Keccak256>::from_leaves(leaves)
}

/// Sibling path for `leaf` in `tree`.
pub fn proof_for<H: CommitmentHasher>(
    tree: &CommitmentTree<H>,
    leaf: &B256,
) -> Result<Proof, AllowlistError> {
    tree.proof_for(leaf)
}

pub fn root<H: CommitmentHasher>(tree: &CommitmentTree<H>) -> B256 {
    tree.root()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sha256::Sha256;
    use crate::domain::proof::{verify, verify_with};

    fn make_leaves(n: usize) -> Vec<B256> {
        (0..n)
            .map(|i| Keccak256::hash(&(i as u64).to_le_bytes()))
            .collect()
    }

    fn combine(a: &B256, b: &B256) -> B256 {
        hash_sorted_pair::<Keccak256>(a, b)
    }

    #[test]
    fn test_empty_rejected() {
        assert_eq!(
            build_tree(vec![]).unwrap_err(),
            AllowlistError::EmptyPolicy
        );
    }

    #[test]
    fn test_single_leaf_tree() {
        let leaves = make_leaves(1);
        let tree = build_tree(leaves.clone()).unwrap();

        assert_eq!(tree.root(), leaves[0]);
        assert_eq!(tree.depth(), 0);

        let proof = tree.proof_for(&leaves[0]).unwrap();
        assert!(proof.is_empty());
        assert!(verify(leaves[0], &proof.path, tree.root()));
    }

    #[test]
    fn test_two_leaf_tree() {
        let leaves = make_leaves(2);
        let tree = build_tree(leaves.clone()).unwrap();

        assert_eq!(tree.root(), combine(&leaves[0], &leaves[1]));
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.proof_at(0).unwrap().path, vec![leaves[1]]);
        assert_eq!(tree.proof_at(1).unwrap().path, vec![leaves[0]]);
    }

    #[test]
    fn test_three_leaf_carry_up() {
        let leaves = make_leaves(3);
        let (a, b, c) = (leaves[0], leaves[1], leaves[2]);
        let tree = build_tree(leaves).unwrap();

        let ab = combine(&a, &b);
        assert_eq!(tree.root(), combine(&ab, &c));
        assert_eq!(tree.depth(), 2);

        assert_eq!(tree.proof_for(&c).unwrap().path, vec![ab]);
        assert_eq!(tree.proof_for(&a).unwrap().path, vec![b, c]);
        assert_eq!(tree.proof_for(&b).unwrap().path, vec![a, c]);
    }

    #[test]
    fn test_carry_is_not_duplication() {
        let leaves = make_leaves(3);
        let tree = build_tree(leaves.clone()).unwrap();

        let duplicated = combine(
            &combine(&leaves[0], &leaves[1]),
            &combine(&leaves[2], &leaves[2]),
        );
        assert_ne!(tree.root(), duplicated);
    }

    #[test]
    fn test_carry_across_multiple_levels() {
        // 5 leaves: the fifth is carried up twice before it is paired.
        let leaves = make_leaves(5);
        let tree = build_tree(leaves.clone()).unwrap();

        let left = combine(
            &combine(&leaves[0], &leaves[1]),
            &combine(&leaves[2], &leaves[3]),
        );
        assert_eq!(tree.root(), combine(&left, &leaves[4]));
        assert_eq!(tree.depth(), 3);
        assert_eq!(tree.proof_at(4).unwrap().path, vec![left]);
    }

    #[test]
    fn test_depth_is_ceil_log2() {
        for (n, depth) in [(1, 0), (2, 1), (3, 2), (4, 2), (5, 3), (6, 3), (8, 3), (9, 4), (1000, 10)] {
            assert_eq!(build_tree(make_leaves(n)).unwrap().depth(), depth, "n = {n}");
        }
    }

    #[test]
    fn test_every_proof_verifies() {
        for n in 1..=17 {
            let leaves = make_leaves(n);
            let tree = build_tree(leaves.clone()).unwrap();
            for leaf in &leaves {
                let proof = tree.proof_for(leaf).unwrap();
                assert!(proof.path.len() <= tree.depth());
                assert!(verify(*leaf, &proof.path, tree.root()), "n = {n}");
            }
        }
    }

    #[test]
    fn test_root_independent_of_pair_order() {
        let leaves = make_leaves(4);
        let swapped = vec![leaves[1], leaves[0], leaves[3], leaves[2]];
        assert_eq!(
            build_tree(leaves).unwrap().root(),
            build_tree(swapped).unwrap().root()
        );
    }

    #[test]
    fn test_leaf_not_found() {
        let tree = build_tree(make_leaves(4)).unwrap();
        let foreign = Keccak256::hash(b"foreign");

        assert!(!tree.contains(&foreign));
        assert_eq!(
            tree.proof_for(&foreign).unwrap_err(),
            AllowlistError::LeafNotFound(foreign)
        );
        assert!(tree.proof_at(4).is_none());
    }

    #[test]
    fn test_repeated_leaf_resolves_to_first_position() {
        let mut leaves = make_leaves(3);
        leaves.push(leaves[0]);
        let tree = build_tree(leaves.clone()).unwrap();

        let proof = tree.proof_for(&leaves[0]).unwrap();
        assert_eq!(proof.leaf_index, 0);
        assert!(verify(leaves[0], &proof.path, tree.root()));
    }

    #[test]
    fn test_sha256_tree() {
        let leaves = make_leaves(6);
        let tree = CommitmentTree::<Sha256>::from_leaves(leaves.clone()).unwrap();
        let keccak_root = build_tree(leaves.clone()).unwrap().root();

        assert_ne!(tree.root(), keccak_root);
        for leaf in &leaves {
            let proof = tree.proof_for(leaf).unwrap();
            assert!(verify_with::<Sha256>(*leaf, &proof.path, tree.root()));
            assert!(!verify(*leaf, &proof.path, tree.root()));
        }
    }

    #[test]
    fn test_free_function_accessors() {
        let leaves = make_leaves(3);
        let tree = build_tree(leaves.clone()).unwrap();
        assert_eq!(root(&tree), tree.root());
        assert_eq!(proof_for(&tree, &leaves[1]).unwrap(), tree.proof_at(1).unwrap());
    }
}
