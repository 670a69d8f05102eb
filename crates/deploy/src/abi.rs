//! Minimal ABI encoding for constructor arguments and argument-less calls.
//!
//! Only static types are supported. Every value occupies a single 32-byte word,
//! which is all the FundMe contract and its price feed mock need.

use std::fmt;

use alloy_core::primitives::{Address, I256, U256, keccak256};
use serde::{Deserialize, Serialize};

/// A statically-sized ABI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum AbiValue {
    Address(Address),
    Uint(U256),
    Int(I256),
    Bool(bool),
}

impl AbiValue {
    /// Encode the value as a single 32-byte big-endian word.
    pub fn to_word(&self) -> [u8; 32] {
        match self {
            Self::Address(address) => address.into_word().0,
            Self::Uint(value) => value.to_be_bytes::<32>(),
            Self::Int(value) => value.into_raw().to_be_bytes::<32>(),
            Self::Bool(value) => U256::from(*value as u8).to_be_bytes::<32>(),
        }
    }
}

impl From<Address> for AbiValue {
    fn from(address: Address) -> Self {
        Self::Address(address)
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Address(address) => write!(f, "{address}"),
            Self::Uint(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
        }
    }
}

/// ABI-encode a sequence of static values (the constructor argument tail of a deployment).
pub fn encode_args(args: &[AbiValue]) -> Vec<u8> {
    args.iter().flat_map(|arg| arg.to_word()).collect()
}

/// Hex-encode constructor arguments without the `0x` prefix, as block explorers expect them.
pub fn encode_args_hex(args: &[AbiValue]) -> String {
    hex::encode(encode_args(args))
}

/// Compute the 4-byte function selector for a canonical signature such as `fund()`.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Build `0x`-prefixed calldata for a call to `signature` with `args`.
pub fn encode_call(signature: &str, args: &[AbiValue]) -> String {
    let mut data = selector(signature).to_vec();
    data.extend(encode_args(args));
    format!("0x{}", hex::encode(data))
}

/// Build `0x`-prefixed creation data: the contract bytecode followed by its encoded arguments.
pub fn encode_deployment(bytecode: &[u8], args: &[AbiValue]) -> String {
    let mut data = bytecode.to_vec();
    data.extend(encode_args(args));
    format!("0x{}", hex::encode(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_is_left_padded() {
        let address: Address = "0x694AA1769357215DE4FAC081bf1f309aDC325306"
            .parse()
            .unwrap();
        let encoded = encode_args_hex(&[AbiValue::Address(address)]);

        assert_eq!(
            encoded,
            "000000000000000000000000694aa1769357215de4fac081bf1f309adc325306"
        );
    }

    #[test]
    fn test_mock_aggregator_args() {
        let encoded = encode_args_hex(&[
            AbiValue::Uint(U256::from(8u8)),
            AbiValue::Int(I256::try_from(200_000_000_000i64).unwrap()),
        ]);

        assert_eq!(encoded.len(), 128);
        assert!(encoded[..64].ends_with("08"));
        // 200000000000 = 0x2e90edd000
        assert!(encoded[64..].ends_with("2e90edd000"));
    }

    #[test]
    fn test_negative_int_is_twos_complement() {
        let word = AbiValue::Int(I256::MINUS_ONE).to_word();
        assert!(word.iter().all(|b| *b == 0xff));
    }

    #[test]
    fn test_bool_word() {
        assert_eq!(AbiValue::Bool(true).to_word()[31], 1);
        assert_eq!(AbiValue::Bool(false).to_word(), [0u8; 32]);
    }

    #[test]
    fn test_known_selectors() {
        assert_eq!(hex::encode(selector("fund()")), "b60d4288");
        assert_eq!(hex::encode(selector("withdraw()")), "3ccfd60b");
    }

    #[test]
    fn test_encode_call_without_args() {
        assert_eq!(encode_call("withdraw()", &[]), "0x3ccfd60b");
    }

    #[test]
    fn test_encode_deployment_appends_args() {
        let address = Address::repeat_byte(0x11);
        let data = encode_deployment(&[0x60, 0x80], &[address.into()]);

        assert!(data.starts_with("0x6080"));
        assert_eq!(data.len(), 2 + 4 + 64);
        assert!(data.ends_with(&"11".repeat(20)));
    }

    #[test]
    fn test_serde_roundtrip_shape() {
        let value = AbiValue::Uint(U256::from(8u8));
        let json = serde_json::to_value(value).unwrap();
        assert_eq!(json["type"], "uint");
    }
}
