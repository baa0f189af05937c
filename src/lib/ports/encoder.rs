use alloy_primitives::{Address, U256};

use crate::domain::descriptor::Selector;

/// Canonical fixed-width encoding of the field types that make up a leaf
/// preimage.
///
/// Each call appends exactly one field to `out`. The encoding carries no
/// length prefixes or separators: both sides of the scheme rely on knowing
/// the field count and widths for a given descriptor.
pub trait FieldEncoder {
    fn put_address(out: &mut Vec<u8>, value: &Address);

    fn put_bool(out: &mut Vec<u8>, value: bool);

    fn put_selector(out: &mut Vec<u8>, value: &Selector);

    /// Append `value` as a `bits`-wide unsigned integer.
    ///
    /// Callers guarantee `bits` is a multiple of 8 in `8..=256` and that
    /// `value` fits; see [`BoundArg::validate`](crate::domain::descriptor::BoundArg::validate).
    fn put_uint(out: &mut Vec<u8>, bits: u16, value: &U256);
}
