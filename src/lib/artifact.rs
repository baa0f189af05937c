//! Published output of an allowlist build.
//!
//! The root goes to the on-chain verifier; each entry's proof goes to
//! whoever submits calls of that shape.

use std::io::Write;

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};

use crate::adapters::keccak::Keccak256;
use crate::adapters::sha256::Sha256;
use crate::adapters::solidity_packed::SolidityPacked;
use crate::config::{ConfigError, HasherKind, PolicyConfig};
use crate::domain::descriptor::{ActionDescriptor, BoundArg, Selector};
use crate::domain::error::AllowlistError;
use crate::domain::policy::{LeafOrder, PolicySet};
use crate::domain::proof::Proof;
use crate::ports::hasher::CommitmentHasher;

/// Errors from building, checking or writing an artifact.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Allowlist(#[from] AllowlistError),

    #[error("unsupported hasher `{0}`")]
    UnsupportedHasher(&'static str),

    #[error("proof for entry `{label}` does not verify against root {root}")]
    SelfCheck { label: String, root: B256 },

    #[error("entry `{label}` does not encode to its recorded leaf {leaf}")]
    LeafMismatch { label: String, leaf: B256 },

    #[error("failed to serialize artifact: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
}

/// One allowlist entry with its leaf and proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    pub label: String,
    pub decoder_sanitizer: Address,
    pub target: Address,
    pub value_nonzero: bool,
    pub selector: Selector,
    #[serde(default)]
    pub bound_args: Vec<BoundArg>,
    pub leaf: B256,
    pub proof: Vec<B256>,
}

impl ArtifactEntry {
    /// The call shape this entry commits to.
    pub fn descriptor(&self) -> ActionDescriptor {
        ActionDescriptor {
            label: Some(self.label.clone()),
            decoder_sanitizer: self.decoder_sanitizer,
            target: self.target,
            value_nonzero: self.value_nonzero,
            selector: self.selector,
            bound_args: self.bound_args.clone(),
        }
    }
}

/// Proof for a single labelled entry, as printed by `allowlist prove`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelProof {
    pub label: String,
    pub hasher: HasherKind,
    pub leaf_order: LeafOrder,
    pub root: B256,
    pub proof: Proof,
}

/// Resolve a policy file and prove the entry labelled `label`.
///
/// Fails with `UnknownLabel` when no action carries that label.
pub fn prove_label(config: &PolicyConfig, label: &str) -> Result<LabelProof, ArtifactError> {
    match config.policy.hasher {
        HasherKind::Keccak256 => prove_label_with::<Keccak256>(config, label),
        HasherKind::Sha256 => prove_label_with::<Sha256>(config, label),
    }
}

fn prove_label_with<H: CommitmentHasher>(
    config: &PolicyConfig,
    label: &str,
) -> Result<LabelProof, ArtifactError> {
    let policy = PolicySet::<H, SolidityPacked>::from_descriptors(config.descriptors()?)?;
    let order = config.policy.leaf_order;
    let tree = policy.commit(order)?;
    let proof = policy.proof_for_label(&tree, label)?;
    Ok(LabelProof {
        label: label.to_string(),
        hasher: config.policy.hasher,
        leaf_order: order,
        root: tree.root(),
        proof,
    })
}

/// Root plus every entry's proof for one allowlist version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyArtifact {
    pub name: String,
    pub version: u32,
    pub hasher: HasherKind,
    pub leaf_order: LeafOrder,
    pub root: B256,
    pub depth: usize,
    pub entries: Vec<ArtifactEntry>,
}

impl PolicyArtifact {
    /// Resolve, commit and self-check a policy file.
    pub fn from_config(config: &PolicyConfig) -> Result<Self, ArtifactError> {
        let descriptors = config.descriptors()?;
        let header = &config.policy;
        let (name, version, order) = (&header.name, header.version, header.leaf_order);
        match header.hasher {
            HasherKind::Keccak256 => {
                Self::from_descriptors::<Keccak256>(name, version, order, descriptors)
            }
            HasherKind::Sha256 => Self::from_descriptors::<Sha256>(name, version, order, descriptors),
        }
    }

    /// Commit `descriptors` under hasher `H` and self-check the result.
    pub fn from_descriptors<H: CommitmentHasher>(
        name: &str,
        version: u32,
        order: LeafOrder,
        descriptors: Vec<ActionDescriptor>,
    ) -> Result<Self, ArtifactError> {
        let policy = PolicySet::<H, SolidityPacked>::from_descriptors(descriptors)?;
        Self::from_policy(name, version, order, &policy)
    }

    /// Commit `policy` with `order` and collect every entry's proof.
    pub fn from_policy<H: CommitmentHasher>(
        name: &str,
        version: u32,
        order: LeafOrder,
        policy: &PolicySet<H, SolidityPacked>,
    ) -> Result<Self, ArtifactError> {
        let tree = policy.commit(order)?;
        let hasher: HasherKind = H::NAME
            .parse()
            .map_err(|_| ArtifactError::UnsupportedHasher(H::NAME))?;

        let entries = policy
            .descriptors()
            .iter()
            .zip(policy.leaves())
            .map(|(descriptor, leaf)| {
                let proof = tree.proof_for(leaf)?;
                Ok(ArtifactEntry {
                    label: descriptor.display_name(),
                    decoder_sanitizer: descriptor.decoder_sanitizer,
                    target: descriptor.target,
                    value_nonzero: descriptor.value_nonzero,
                    selector: descriptor.selector,
                    bound_args: descriptor.bound_args.clone(),
                    leaf: *leaf,
                    proof: proof.path,
                })
            })
            .collect::<Result<Vec<_>, AllowlistError>>()?;

        let artifact = Self {
            name: name.to_string(),
            version,
            hasher,
            leaf_order: order,
            root: tree.root(),
            depth: tree.depth(),
            entries,
        };
        artifact.self_check()?;

        tracing::debug!(
            name = %artifact.name,
            version = artifact.version,
            root = %artifact.root,
            entries = artifact.entries.len(),
            "artifact assembled"
        );
        Ok(artifact)
    }

    /// Re-derive every entry's leaf from its call shape and re-verify its
    /// proof against the root.
    pub fn self_check(&self) -> Result<(), ArtifactError> {
        for entry in &self.entries {
            if self.hasher.encode_leaf(&entry.descriptor())? != entry.leaf {
                return Err(ArtifactError::LeafMismatch {
                    label: entry.label.clone(),
                    leaf: entry.leaf,
                });
            }
            if !self.hasher.verify(entry.leaf, &entry.proof, self.root) {
                return Err(ArtifactError::SelfCheck {
                    label: entry.label.clone(),
                    root: self.root,
                });
            }
        }
        Ok(())
    }

    pub fn entry(&self, label: &str) -> Option<&ArtifactEntry> {
        self.entries.iter().find(|entry| entry.label == label)
    }

    /// Pretty JSON, newline-terminated.
    pub fn write_json<W: Write>(&self, mut writer: W) -> Result<(), ArtifactError> {
        serde_json::to_writer_pretty(&mut writer, self)?;
        writeln!(writer)?;
        Ok(())
    }
}
