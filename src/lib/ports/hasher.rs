use alloy_primitives::B256;

/// Fixed-width cryptographic hash used for leaves and internal nodes.
///
/// Implementations must be deterministic and side-effect free. Whatever is
/// plugged in here has to be the exact function the on-chain verifier
/// recomputes, or every proof produced by this crate is rejected.
pub trait CommitmentHasher {
    /// Short identifier recorded in artifacts (e.g. `"keccak256"`).
    const NAME: &'static str;

    /// Hash an arbitrary byte string into a 32-byte digest.
    fn hash(input: &[u8]) -> B256;
}
