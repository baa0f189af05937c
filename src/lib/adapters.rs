pub mod keccak;
pub mod sha256;
pub mod solidity_packed;
