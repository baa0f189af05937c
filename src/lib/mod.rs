//! Merkle commitments over vault call allowlists.
//!
//! A vault manager may only forward calls whose shape (decoder, target,
//! value flag, selector, pinned argument prefix) is committed to by a single
//! Merkle root. This crate builds that root from a policy description and
//! produces the sibling-path proofs submitted alongside each call.
//!
//! ```text
//! PolicySet ──encode_leaf──▶ leaves ──CommitmentTree──▶ root
//!                                          │
//!                                          └──proof_for──▶ Proof ──verify──▶ bool
//! ```

pub mod adapters;
pub mod artifact;
pub mod config;
pub mod domain;
pub mod ports;

pub use adapters::keccak::Keccak256;
pub use adapters::sha256::Sha256;
pub use adapters::solidity_packed::SolidityPacked;
pub use domain::descriptor::{
    ActionDescriptor, BoundArg, RawActionDescriptor, RawBoundArg, Selector,
};
pub use domain::error::AllowlistError;
pub use domain::leaf::encode_leaf;
pub use domain::merkle::{build_tree, proof_for, root, CommitmentTree};
pub use domain::policy::{build_policy, LeafOrder, PolicySet};
pub use domain::proof::{verify, Proof};
