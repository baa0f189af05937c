//! TOML policy files.
//!
//! A policy file names the deployment, declares an address book and lists
//! the permitted actions. Addresses anywhere in the file may be literal
//! `0x…` hex or an alias from `[addresses]`.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use alloy_primitives::{hex, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

use crate::adapters::keccak::Keccak256;
use crate::adapters::sha256::Sha256;
use crate::domain::descriptor::{
    selector_from_signature, ActionDescriptor, RawActionDescriptor, RawBoundArg,
};
use crate::adapters::solidity_packed::SolidityPacked;
use crate::domain::error::AllowlistError;
use crate::domain::leaf::encode_leaf_with;
use crate::domain::policy::LeafOrder;
use crate::domain::proof::verify_with;

/// Top-level policy configuration loaded from TOML.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyConfig {
    pub policy: PolicyHeader,
    /// Alias → address.
    #[serde(default)]
    pub addresses: BTreeMap<String, String>,
    #[serde(default)]
    pub actions: Vec<ActionConfig>,
}

/// Deployment-wide settings.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyHeader {
    pub name: String,
    /// Allowlist version; bump whenever the root is republished.
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub hasher: HasherKind,
    /// `declared` reproduces roots built without sorting the leaves.
    #[serde(default)]
    pub leaf_order: LeafOrder,
    /// Decoder applied to every action unless the action overrides it.
    pub decoder_sanitizer: String,
}

fn default_version() -> u32 {
    1
}

/// One permitted call shape, before address resolution.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ActionConfig {
    pub label: String,
    pub target: String,
    /// Raw 4-byte selector (`0x095ea7b3`). Exclusive with `signature`.
    pub selector: Option<String>,
    /// Canonical signature (`approve(address,uint256)`). Exclusive with `selector`.
    pub signature: Option<String>,
    #[serde(default)]
    pub value_nonzero: bool,
    pub decoder_sanitizer: Option<String>,
    #[serde(default)]
    pub bound_args: Vec<BoundArgConfig>,
}

/// A bound argument: an address (literal or alias), or a sized integer
/// written as `{ uint = 24, value = 3000 }`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BoundArgConfig {
    Address(String),
    Uint(UintArgConfig),
}

/// The `{ uint = N, value = … }` form of a bound argument.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UintArgConfig {
    pub uint: u16,
    pub value: UintLiteral,
}

/// Integer literal: TOML integer, or a decimal / `0x` string for values
/// beyond `i64`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum UintLiteral {
    Int(u64),
    Text(String),
}

/// Hash function used for leaves and nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HasherKind {
    #[default]
    Keccak256,
    Sha256,
}

impl HasherKind {
    pub fn name(self) -> &'static str {
        match self {
            HasherKind::Keccak256 => "keccak256",
            HasherKind::Sha256 => "sha256",
        }
    }

    /// Packed leaf of `descriptor` under this hasher.
    pub fn encode_leaf(self, descriptor: &ActionDescriptor) -> Result<B256, AllowlistError> {
        match self {
            HasherKind::Keccak256 => encode_leaf_with::<Keccak256, SolidityPacked>(descriptor),
            HasherKind::Sha256 => encode_leaf_with::<Sha256, SolidityPacked>(descriptor),
        }
    }

    /// [`verify_with`] dispatched on the runtime hasher choice.
    pub fn verify(self, leaf: B256, proof: &[B256], root: B256) -> bool {
        match self {
            HasherKind::Keccak256 => verify_with::<Keccak256>(leaf, proof, root),
            HasherKind::Sha256 => verify_with::<Sha256>(leaf, proof, root),
        }
    }
}

impl fmt::Display for HasherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for HasherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "keccak256" => Ok(HasherKind::Keccak256),
            "sha256" => Ok(HasherKind::Sha256),
            other => Err(format!("unknown hasher `{other}` (expected keccak256 or sha256)")),
        }
    }
}

/// Errors from config loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("action `{label}`: {source}")]
    Descriptor {
        label: String,
        #[source]
        source: AllowlistError,
    },
}

impl PolicyConfig {
    /// Load and validate a config from a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Validate configuration invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.actions.is_empty() {
            return Err(ConfigError::Validation(
                "at least one [[actions]] entry is required".into(),
            ));
        }

        for alias in self.addresses.keys() {
            if alias.starts_with("0x") {
                return Err(ConfigError::Validation(format!(
                    "address alias `{alias}` must not start with 0x"
                )));
            }
        }

        self.check_address("policy.decoder_sanitizer", &self.policy.decoder_sanitizer)?;

        let mut labels = HashSet::new();
        for action in &self.actions {
            if !labels.insert(action.label.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "duplicate action label `{}`",
                    action.label
                )));
            }

            match (&action.selector, &action.signature) {
                (Some(_), None) | (None, Some(_)) => {}
                _ => {
                    return Err(ConfigError::Validation(format!(
                        "action `{}`: exactly one of selector or signature is required",
                        action.label
                    )))
                }
            }

            self.check_address(&format!("{}.target", action.label), &action.target)?;
            if let Some(decoder) = &action.decoder_sanitizer {
                self.check_address(&format!("{}.decoder_sanitizer", action.label), decoder)?;
            }
            for arg in &action.bound_args {
                if let BoundArgConfig::Address(value) = arg {
                    self.check_address(&format!("{}.bound_args", action.label), value)?;
                }
            }
        }

        Ok(())
    }

    /// Resolve every action into a validated descriptor, in file order.
    pub fn descriptors(&self) -> Result<Vec<ActionDescriptor>, ConfigError> {
        self.actions
            .iter()
            .map(|action| {
                let raw = self.raw_descriptor(action)?;
                ActionDescriptor::try_from(raw).map_err(|source| ConfigError::Descriptor {
                    label: action.label.clone(),
                    source,
                })
            })
            .collect()
    }

    fn raw_descriptor(&self, action: &ActionConfig) -> Result<RawActionDescriptor, ConfigError> {
        let descriptor_error = |source: AllowlistError| ConfigError::Descriptor {
            label: action.label.clone(),
            source,
        };

        let decoder = action
            .decoder_sanitizer
            .as_deref()
            .unwrap_or(&self.policy.decoder_sanitizer);

        let selector = match (&action.selector, &action.signature) {
            (Some(selector), _) => decode_hex(selector).map_err(descriptor_error)?,
            (None, Some(signature)) => {
                let selector = selector_from_signature(signature).map_err(descriptor_error)?;
                Bytes::copy_from_slice(selector.as_slice())
            }
            (None, None) => {
                return Err(ConfigError::Validation(format!(
                    "action `{}`: exactly one of selector or signature is required",
                    action.label
                )))
            }
        };

        let bound_args = action
            .bound_args
            .iter()
            .map(|arg| match arg {
                BoundArgConfig::Address(value) => self
                    .resolve_address(&action.label, value)
                    .map(RawBoundArg::Address),
                BoundArgConfig::Uint(arg) => Ok(RawBoundArg::Uint {
                    bits: arg.uint,
                    value: arg.value.to_u256().map_err(descriptor_error)?,
                }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(RawActionDescriptor {
            label: Some(action.label.clone()),
            decoder_sanitizer: self.resolve_address(&action.label, decoder)?,
            target: self.resolve_address(&action.label, &action.target)?,
            value_nonzero: action.value_nonzero,
            selector,
            bound_args,
        })
    }

    /// Literal hex or alias → address bytes. Width is checked later, when the
    /// raw descriptor is converted.
    fn resolve_address(&self, label: &str, value: &str) -> Result<Bytes, ConfigError> {
        let literal = if value.starts_with("0x") {
            value
        } else {
            self.addresses.get(value).ok_or_else(|| {
                ConfigError::Validation(format!("{label}: unknown address alias `{value}`"))
            })?
        };
        decode_hex(literal).map_err(|source| ConfigError::Descriptor {
            label: label.to_string(),
            source,
        })
    }

    fn check_address(&self, field: &str, value: &str) -> Result<(), ConfigError> {
        if !value.starts_with("0x") && !self.addresses.contains_key(value) {
            return Err(ConfigError::Validation(format!(
                "{field}: unknown address alias `{value}`"
            )));
        }
        Ok(())
    }
}

impl FromStr for PolicyConfig {
    type Err = ConfigError;

    /// Parse and validate TOML text.
    fn from_str(content: &str) -> Result<Self, Self::Err> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }
}

impl UintLiteral {
    fn to_u256(&self) -> Result<U256, AllowlistError> {
        match self {
            UintLiteral::Int(value) => Ok(U256::from(*value)),
            UintLiteral::Text(text) => U256::from_str(text).map_err(|err| {
                AllowlistError::InvalidDescriptor(format!("`{text}` is not an unsigned integer: {err}"))
            }),
        }
    }
}

fn decode_hex(value: &str) -> Result<Bytes, AllowlistError> {
    hex::decode(value)
        .map(Bytes::from)
        .map_err(|err| AllowlistError::InvalidDescriptor(format!("`{value}` is not valid hex: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::descriptor::BoundArg;
    use alloy_primitives::{address, fixed_bytes};

    const MINIMAL: &str = r#"
[policy]
name = "pendle-router"
decoder_sanitizer = "0xf83c975C7bd28B693bb6e091E12C83e04afd4771"

[addresses]
router = "0x888888888889758F76e7103c6CbF23ABbF58F946"
usdc = "0xA0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"

[[actions]]
label = "approve router"
target = "usdc"
signature = "approve(address,uint256)"
bound_args = ["router"]
"#;

    #[test]
    fn test_parse_minimal_config() {
        let config: PolicyConfig = MINIMAL.parse().unwrap();
        assert_eq!(config.policy.name, "pendle-router");
        assert_eq!(config.policy.version, 1);
        assert_eq!(config.policy.hasher, HasherKind::Keccak256);
        assert_eq!(config.policy.leaf_order, LeafOrder::Sorted);

        let descriptors = config.descriptors().unwrap();
        assert_eq!(descriptors.len(), 1);
        let approve = &descriptors[0];
        assert_eq!(approve.label.as_deref(), Some("approve router"));
        assert_eq!(approve.selector, fixed_bytes!("095ea7b3"));
        assert_eq!(approve.target, address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"));
        assert_eq!(
            approve.decoder_sanitizer,
            address!("f83c975C7bd28B693bb6e091E12C83e04afd4771")
        );
        assert_eq!(
            approve.bound_args,
            vec![BoundArg::Address(address!("888888888889758F76e7103c6CbF23ABbF58F946"))]
        );
        assert!(!approve.value_nonzero);
    }

    #[test]
    fn test_uint_args_and_overrides() {
        let toml = r#"
[policy]
name = "uniswap"
version = 3
hasher = "sha256"
leaf_order = "declared"
decoder_sanitizer = "0x2d2f6D3bB89650B7CeB5E77Ad3dDb6Dc8BfCFCBF"

[[actions]]
label = "mint"
target = "0xC36442b4a4522E871399CD717aBDD847Ab11FE88"
selector = "0x88316456"
value_nonzero = true
decoder_sanitizer = "0x1111111111111111111111111111111111111111"
bound_args = [{ uint = 24, value = 3000 }, { uint = 256, value = "0xffffffffffffffffffff" }]
"#;
        let config: PolicyConfig = toml.parse().unwrap();
        assert_eq!(config.policy.version, 3);
        assert_eq!(config.policy.hasher, HasherKind::Sha256);
        assert_eq!(config.policy.leaf_order, LeafOrder::Declared);

        let mint = &config.descriptors().unwrap()[0];
        assert!(mint.value_nonzero);
        assert_eq!(mint.decoder_sanitizer, alloy_primitives::Address::repeat_byte(0x11));
        assert_eq!(mint.bound_args[0], BoundArg::uint(24, 3000u64));
        assert_eq!(
            mint.bound_args[1],
            BoundArg::uint(256, U256::from_str("0xffffffffffffffffffff").unwrap())
        );
    }

    #[test]
    fn test_unknown_alias_rejected() {
        let toml = MINIMAL.replace(r#"bound_args = ["router"]"#, r#"bound_args = ["vault"]"#);
        let err = toml.parse::<PolicyConfig>().unwrap_err();
        assert!(err.to_string().contains("unknown address alias `vault`"));
    }

    #[test]
    fn test_selector_and_signature_exclusive() {
        let both = MINIMAL.replace(
            r#"signature = "approve(address,uint256)""#,
            "signature = \"approve(address,uint256)\"\nselector = \"0x095ea7b3\"",
        );
        assert!(matches!(
            both.parse::<PolicyConfig>(),
            Err(ConfigError::Validation(_))
        ));

        let neither = MINIMAL.replace(r#"signature = "approve(address,uint256)""#, "");
        let err = neither.parse::<PolicyConfig>().unwrap_err();
        assert!(err.to_string().contains("exactly one of selector or signature"));
    }

    #[test]
    fn test_duplicate_label_rejected() {
        let toml = format!(
            "{MINIMAL}\n[[actions]]\nlabel = \"approve router\"\ntarget = \"router\"\nselector = \"0x42966c68\"\n"
        );
        let err = toml.parse::<PolicyConfig>().unwrap_err();
        assert!(err.to_string().contains("duplicate action label"));
    }

    #[test]
    fn test_no_actions_rejected() {
        let toml = r#"
[policy]
name = "empty"
decoder_sanitizer = "0x2d2f6D3bB89650B7CeB5E77Ad3dDb6Dc8BfCFCBF"
"#;
        let err = toml.parse::<PolicyConfig>().unwrap_err();
        assert!(err.to_string().contains("at least one [[actions]]"));
    }

    #[test]
    fn test_short_selector_is_descriptor_error() {
        let toml = MINIMAL.replace(
            r#"signature = "approve(address,uint256)""#,
            r#"selector = "0x095ea7""#,
        );
        let config: PolicyConfig = toml.parse().unwrap();
        let err = config.descriptors().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Descriptor {
                source: AllowlistError::InvalidDescriptor(_),
                ..
            }
        ));
        assert!(err.to_string().starts_with("action `approve router`"));
    }

    #[test]
    fn test_truncated_address_is_descriptor_error() {
        let toml = MINIMAL.replace(
            "0x888888888889758F76e7103c6CbF23ABbF58F946",
            "0x888888888889758F76e7103c6CbF23ABbF58",
        );
        let config: PolicyConfig = toml.parse().unwrap();
        assert!(matches!(
            config.descriptors(),
            Err(ConfigError::Descriptor { .. })
        ));
    }

    #[test]
    fn test_unknown_field_rejected() {
        let toml = MINIMAL.replace("[[actions]]", "[[actions]]\nvalue = true");
        assert!(matches!(
            toml.parse::<PolicyConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_unknown_uint_key_rejected() {
        let toml = MINIMAL.replace(
            r#"bound_args = ["router"]"#,
            r#"bound_args = ["router", { uint = 24, value = 3000, bits = 8 }]"#,
        );
        assert!(matches!(
            toml.parse::<PolicyConfig>(),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_hasher_kind_from_str() {
        assert_eq!("keccak256".parse::<HasherKind>(), Ok(HasherKind::Keccak256));
        assert_eq!("sha256".parse::<HasherKind>(), Ok(HasherKind::Sha256));
        assert!("blake2b".parse::<HasherKind>().is_err());
        assert_eq!(HasherKind::Sha256.to_string(), "sha256");
    }
}
