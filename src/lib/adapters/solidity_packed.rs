use alloy_primitives::{Address, U256};

use crate::domain::descriptor::Selector;
use crate::ports::encoder::FieldEncoder;

/// Solidity's non-standard packed mode (`abi.encodePacked`, ethers'
/// `solidityPack`): every field at its natural width, no padding.
///
/// | type      | bytes |
/// |-----------|-------|
/// | `address` | 20    |
/// | `bool`    | 1     |
/// | `bytes4`  | 4     |
/// | `uintN`   | N / 8 |
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SolidityPacked;

impl FieldEncoder for SolidityPacked {
    fn put_address(out: &mut Vec<u8>, value: &Address) {
        out.extend_from_slice(value.as_slice());
    }

    fn put_bool(out: &mut Vec<u8>, value: bool) {
        out.push(u8::from(value));
    }

    fn put_selector(out: &mut Vec<u8>, value: &Selector) {
        out.extend_from_slice(value.as_slice());
    }

    fn put_uint(out: &mut Vec<u8>, bits: u16, value: &U256) {
        let width = usize::from(bits / 8);
        let word: [u8; 32] = value.to_be_bytes();
        out.extend_from_slice(&word[32 - width..]);
    }
}
