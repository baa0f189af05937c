use alloy_primitives::B256;

use super::descriptor::{ActionDescriptor, BoundArg, ADDRESS_LEN, SELECTOR_LEN};
use super::error::AllowlistError;
use crate::adapters::keccak::Keccak256;
use crate::adapters::solidity_packed::SolidityPacked;
use crate::ports::encoder::FieldEncoder;
use crate::ports::hasher::CommitmentHasher;

/// Fixed-width header: decoder ‖ target ‖ value flag ‖ selector.
const HEADER_LEN: usize = ADDRESS_LEN * 2 + 1 + SELECTOR_LEN;

/// Canonical bytes committed to by a descriptor's leaf:
/// `decoder_sanitizer ‖ target ‖ value_nonzero ‖ selector ‖ bound_args`.
///
/// Bound arguments are appended in declared order with no length prefix.
pub fn leaf_preimage<E: FieldEncoder>(
    descriptor: &ActionDescriptor,
) -> Result<Vec<u8>, AllowlistError> {
    let args_len: usize = descriptor.bound_args.iter().map(BoundArg::encoded_len).sum();
    let mut out = Vec::with_capacity(HEADER_LEN + args_len);

    E::put_address(&mut out, &descriptor.decoder_sanitizer);
    E::put_address(&mut out, &descriptor.target);
    E::put_bool(&mut out, descriptor.value_nonzero);
    E::put_selector(&mut out, &descriptor.selector);

    for arg in &descriptor.bound_args {
        arg.validate()?;
        match arg {
            BoundArg::Address(address) => E::put_address(&mut out, address),
            BoundArg::Uint { bits, value } => E::put_uint(&mut out, *bits, value),
        }
    }

    Ok(out)
}

/// Leaf digest under an explicit hasher and field encoder.
pub fn encode_leaf_with<H: CommitmentHasher, E: FieldEncoder>(
    descriptor: &ActionDescriptor,
) -> Result<B256, AllowlistError> {
    leaf_preimage::<E>(descriptor).map(|preimage| H::hash(&preimage))
}

/// Leaf digest as the EVM verifier computes it:
/// `keccak256(abi.encodePacked(decoder, target, valueNonZero, selector, packedArgs))`.
pub fn encode_leaf(descriptor: &ActionDescriptor) -> Result<B256, AllowlistError> {
    encode_leaf_with::<Keccak256, SolidityPacked>(descriptor)
}
