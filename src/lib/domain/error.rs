use alloy_primitives::B256;

/// Authoring-time failures of the allowlist pipeline.
///
/// All variants are local and deterministic: nothing here is worth
/// retrying. They surface as configuration errors before any root is
/// published.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllowlistError {
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("duplicate leaf {leaf}: entries {first} and {second} encode identically")]
    DuplicateLeaf {
        leaf: B256,
        first: usize,
        second: usize,
    },

    #[error("policy has no entries to commit")]
    EmptyPolicy,

    #[error("leaf {0} is not present in the tree")]
    LeafNotFound(B256),

    #[error("no entry labelled `{0}`")]
    UnknownLabel(String),
}

impl AllowlistError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidDescriptor(reason.into())
    }
}
