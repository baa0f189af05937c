use std::collections::HashMap;
use std::marker::PhantomData;

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use super::descriptor::ActionDescriptor;
use super::error::AllowlistError;
use super::leaf::encode_leaf_with;
use super::merkle::CommitmentTree;
use super::proof::Proof;
use crate::adapters::keccak::Keccak256;
use crate::adapters::solidity_packed::SolidityPacked;
use crate::ports::encoder::FieldEncoder;
use crate::ports::hasher::CommitmentHasher;

/// Order in which a policy's leaves are laid out at the bottom of the tree.
///
/// Sorted pairs only make a node independent of its two children's order;
/// moving a leaf to a different pair still changes the root. `Sorted` lays
/// leaves out by digest, so the root depends only on the set of entries.
/// `Declared` keeps authoring order, which reproduces roots published by
/// tooling that did not sort its leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeafOrder {
    #[default]
    Sorted,
    Declared,
}

/// An allowlist version: descriptors in authoring order, their leaves, and
/// the reverse index from leaf back to descriptor.
///
/// Authoring order is kept so proofs map back to the entry a human wrote.
#[derive(Debug, Clone)]
pub struct PolicySet<H = Keccak256, E = SolidityPacked> {
    descriptors: Vec<ActionDescriptor>,
    leaves: Vec<B256>,
    index: HashMap<B256, usize>,
    _scheme: PhantomData<(H, E)>,
}

impl<H: CommitmentHasher, E: FieldEncoder> PolicySet<H, E> {
    /// Encode every descriptor and index the leaves.
    ///
    /// Fails with `EmptyPolicy` on an empty list, `InvalidDescriptor` on the
    /// first entry that cannot be encoded, and `DuplicateLeaf` when two
    /// entries encode to the same digest.
    pub fn from_descriptors(descriptors: Vec<ActionDescriptor>) -> Result<Self, AllowlistError> {
        if descriptors.is_empty() {
            return Err(AllowlistError::EmptyPolicy);
        }

        let mut leaves = Vec::with_capacity(descriptors.len());
        let mut index = HashMap::with_capacity(descriptors.len());

        for (position, descriptor) in descriptors.iter().enumerate() {
            let leaf = encode_leaf_with::<H, E>(descriptor)?;
            if let Some(&first) = index.get(&leaf) {
                return Err(AllowlistError::DuplicateLeaf {
                    leaf,
                    first,
                    second: position,
                });
            }
            tracing::trace!(
                position,
                entry = %descriptor.display_name(),
                %leaf,
                "encoded allowlist entry"
            );
            index.insert(leaf, position);
            leaves.push(leaf);
        }

        tracing::debug!(entries = leaves.len(), hasher = H::NAME, "policy set built");

        Ok(Self {
            descriptors,
            leaves,
            index,
            _scheme: PhantomData,
        })
    }

    pub fn descriptors(&self) -> &[ActionDescriptor] {
        &self.descriptors
    }

    /// Leaves in declaration order.
    pub fn leaves(&self) -> &[B256] {
        &self.leaves
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The descriptor a leaf digest was derived from.
    pub fn descriptor_for(&self, leaf: &B256) -> Option<&ActionDescriptor> {
        self.index.get(leaf).map(|&position| &self.descriptors[position])
    }

    /// Position of the first entry carrying `label`.
    pub fn position_of_label(&self, label: &str) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|descriptor| descriptor.label.as_deref() == Some(label))
    }

    /// Build the commitment tree over this policy's leaves.
    pub fn commit(&self, order: LeafOrder) -> Result<CommitmentTree<H>, AllowlistError> {
        let mut leaves = self.leaves.clone();
        if order == LeafOrder::Sorted {
            leaves.sort_unstable();
        }
        CommitmentTree::from_leaves(leaves)
    }

    /// Encode `descriptor` and look up its proof in `tree`.
    ///
    /// This is the authorization question asked per call attempt: an
    /// unlisted shape fails with `LeafNotFound`.
    pub fn proof_for_descriptor(
        &self,
        tree: &CommitmentTree<H>,
        descriptor: &ActionDescriptor,
    ) -> Result<Proof, AllowlistError> {
        let leaf = encode_leaf_with::<H, E>(descriptor)?;
        tree.proof_for(&leaf)
    }

    /// Proof for the first entry carrying `label`.
    pub fn proof_for_label(
        &self,
        tree: &CommitmentTree<H>,
        label: &str,
    ) -> Result<Proof, AllowlistError> {
        let position = self
            .position_of_label(label)
            .ok_or_else(|| AllowlistError::UnknownLabel(label.to_string()))?;
        tree.proof_for(&self.leaves[position])
    }
}

/// Build a keccak-256 / packed-encoding policy set.
pub fn build_policy(descriptors: Vec<ActionDescriptor>) -> Result<PolicySet, AllowlistError> {
    PolicySet::<Keccak256, SolidityPacked>::from_descriptors(descriptors)
}
