use alloy_primitives::ruint::UintTryFrom;
use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, U256};
use serde::{Deserialize, Serialize};

use super::error::AllowlistError;

/// 4-byte EVM function selector.
pub type Selector = FixedBytes<4>;

pub const SELECTOR_LEN: usize = 4;
pub const ADDRESS_LEN: usize = 20;

/// Derive a selector from a canonical function signature:
/// `keccak256("approve(address,uint256)")[0..4]`.
///
/// Only the canonical form is accepted (no whitespace, no parameter names);
/// anything else would hash to a selector no contract exposes.
pub fn selector_from_signature(signature: &str) -> Result<Selector, AllowlistError> {
    let well_formed = !signature.is_empty()
        && !signature.starts_with('(')
        && signature.ends_with(')')
        && signature.contains('(')
        && !signature.chars().any(char::is_whitespace);
    if !well_formed {
        return Err(AllowlistError::invalid(format!(
            "`{signature}` is not a canonical function signature"
        )));
    }
    Ok(Selector::from_slice(&keccak256(signature.as_bytes())[..4]))
}

/// A pinned call argument.
///
/// Only a prefix of the call's arguments is ever bound; trailing amounts,
/// deadlines and ticks stay free.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundArg {
    Address(Address),
    /// Unsigned integer of declared bit width (`uint8` .. `uint256`).
    Uint { bits: u16, value: U256 },
}

impl BoundArg {
    /// Sized integer argument from any unsigned primitive or `U256`.
    ///
    /// Panics on a negative signed input, like `U256::from`.
    pub fn uint<T>(bits: u16, value: T) -> Self
    where
        U256: UintTryFrom<T>,
    {
        Self::Uint {
            bits,
            value: U256::from(value),
        }
    }

    /// Check the argument has a well-formed fixed-width encoding.
    pub fn validate(&self) -> Result<(), AllowlistError> {
        match self {
            Self::Address(_) => Ok(()),
            Self::Uint { bits, value } => {
                if *bits == 0 || *bits > 256 || bits % 8 != 0 {
                    return Err(AllowlistError::invalid(format!(
                        "uint{bits} is not a fixed-width integer type"
                    )));
                }
                if value.bit_len() > usize::from(*bits) {
                    return Err(AllowlistError::invalid(format!(
                        "value {value} does not fit in uint{bits}"
                    )));
                }
                Ok(())
            }
        }
    }

    /// Packed width in bytes.
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Address(_) => ADDRESS_LEN,
            Self::Uint { bits, .. } => usize::from(bits / 8),
        }
    }
}

impl From<Address> for BoundArg {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

/// One permitted call shape.
///
/// The leaf commits to `decoder_sanitizer ‖ target ‖ value_nonzero ‖
/// selector ‖ bound_args`. `label` is for humans only and is never encoded,
/// so two descriptors that differ only by label collide.
///
/// The number and types of `bound_args` must match what the verifier's
/// decoder for this `(decoder_sanitizer, selector)` pair returns. That is a
/// contract with the decoder contract and cannot be checked here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescriptor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub decoder_sanitizer: Address,
    pub target: Address,
    #[serde(default)]
    pub value_nonzero: bool,
    pub selector: Selector,
    #[serde(default)]
    pub bound_args: Vec<BoundArg>,
}

impl ActionDescriptor {
    /// A descriptor with no value and no bound arguments.
    pub fn new(decoder_sanitizer: Address, target: Address, selector: Selector) -> Self {
        Self {
            label: None,
            decoder_sanitizer,
            target,
            value_nonzero: false,
            selector,
            bound_args: Vec::new(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_value(mut self, value_nonzero: bool) -> Self {
        self.value_nonzero = value_nonzero;
        self
    }

    /// Append one bound argument.
    pub fn bind(mut self, arg: impl Into<BoundArg>) -> Self {
        self.bound_args.push(arg.into());
        self
    }

    /// Append a run of address arguments, in order.
    pub fn bind_addresses(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.bound_args
            .extend(addresses.into_iter().map(BoundArg::Address));
        self
    }

    /// Label if present, otherwise the selector in hex.
    pub fn display_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => self.selector.to_string(),
        }
    }
}

/// Argument in unvalidated byte form, as read from an authoring tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawBoundArg {
    Address(Bytes),
    Uint { bits: u16, value: U256 },
}

/// Byte-level descriptor before width checks.
///
/// Converting into [`ActionDescriptor`] is where a selector that is not
/// exactly 4 bytes or an address that is not exactly 20 bytes is rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawActionDescriptor {
    pub label: Option<String>,
    pub decoder_sanitizer: Bytes,
    pub target: Bytes,
    pub value_nonzero: bool,
    pub selector: Bytes,
    pub bound_args: Vec<RawBoundArg>,
}

fn fixed_address(field: &str, bytes: &[u8]) -> Result<Address, AllowlistError> {
    if bytes.len() != ADDRESS_LEN {
        return Err(AllowlistError::invalid(format!(
            "{field} must be {} bytes, got {}",
            ADDRESS_LEN,
            bytes.len()
        )));
    }
    Ok(Address::from_slice(bytes))
}

impl TryFrom<RawActionDescriptor> for ActionDescriptor {
    type Error = AllowlistError;

    fn try_from(raw: RawActionDescriptor) -> Result<Self, Self::Error> {
        if raw.selector.len() != SELECTOR_LEN {
            return Err(AllowlistError::invalid(format!(
                "selector must be {} bytes, got {}",
                SELECTOR_LEN,
                raw.selector.len()
            )));
        }

        let bound_args = raw
            .bound_args
            .into_iter()
            .enumerate()
            .map(|(i, arg)| {
                let arg = match arg {
                    RawBoundArg::Address(bytes) => {
                        BoundArg::Address(fixed_address(&format!("bound_args[{i}]"), &bytes)?)
                    }
                    RawBoundArg::Uint { bits, value } => BoundArg::Uint { bits, value },
                };
                arg.validate()?;
                Ok(arg)
            })
            .collect::<Result<Vec<_>, AllowlistError>>()?;

        Ok(Self {
            label: raw.label,
            decoder_sanitizer: fixed_address("decoder_sanitizer", &raw.decoder_sanitizer)?,
            target: fixed_address("target", &raw.target)?,
            value_nonzero: raw.value_nonzero,
            selector: Selector::from_slice(&raw.selector),
            bound_args,
        })
    }
}
