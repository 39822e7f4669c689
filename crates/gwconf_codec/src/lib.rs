//! # gwconf codec
//!
//! Value model and codecs for gateway configuration payloads.
//!
//! Two encodings are provided for the same [`Value`] tree:
//!
//! - **Canonical CBOR** for frame bodies on the wire. Maps are emitted in
//!   canonical key order, integers in shortest form; floats, byte strings
//!   and indefinite-length items are rejected on decode.
//! - **Strict YAML** for operator-facing documents, driven by a static
//!   [`MessageSchema`]. Unknown fields are rejected at any depth and absent
//!   fields decode to their defaults.
//!
//! ## Usage
//!
//! ```
//! use gwconf_codec::{from_cbor, to_canonical_cbor, Value};
//!
//! let value = Value::map(vec![(Value::from("generation"), Value::from(42u64))]);
//! let bytes = to_canonical_cbor(&value).unwrap();
//! assert_eq!(from_cbor(&bytes).unwrap(), value);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod decoder;
mod encoder;
mod error;
pub mod schema;
mod value;
mod yaml;

pub use decoder::{from_cbor, CanonicalDecoder};
pub use encoder::{to_canonical_cbor, CanonicalEncoder};
pub use error::{CodecError, CodecResult};
pub use schema::{Cardinality, EnumSchema, FieldKind, FieldSchema, MessageSchema};
pub use value::Value;
pub use yaml::{decode_yaml, decode_yaml_value, encode_yaml, encode_yaml_value};

/// Trait for types that can be encoded to canonical CBOR.
pub trait Encode {
    /// Encode this value to canonical CBOR bytes.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types that can be decoded from CBOR.
pub trait Decode: Sized {
    /// Decode this value from CBOR bytes.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

impl Encode for Value {
    fn encode(&self) -> CodecResult<Vec<u8>> {
        to_canonical_cbor(self)
    }
}

impl Decode for Value {
    fn decode(bytes: &[u8]) -> CodecResult<Self> {
        from_cbor(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn value_strategy() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            any::<i64>().prop_map(Value::Integer),
            any::<u64>().prop_map(Value::from),
            "[a-z0-9 ]{0,12}".prop_map(Value::Text),
        ];
        leaf.prop_recursive(4, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::btree_map("[a-z][a-z0-9]{0,8}", inner, 0..6).prop_map(
                    |entries| Value::map(
                        entries
                            .into_iter()
                            .map(|(k, v)| (Value::Text(k), v))
                            .collect()
                    )
                ),
            ]
        })
    }

    #[test]
    fn nested_payload_roundtrip() {
        let value = Value::map(vec![
            (
                Value::from("vrf"),
                Value::Array(vec![Value::map(vec![
                    (Value::from("name"), Value::from("default")),
                    (Value::from("vni"), Value::Integer(30)),
                ])]),
            ),
            (Value::from("generation"), Value::Unsigned(u64::MAX)),
        ]);
        let bytes = value.encode().unwrap();
        assert_eq!(Value::decode(&bytes).unwrap(), value);
    }

    proptest! {
        #[test]
        fn cbor_roundtrip_preserves_value(value in value_strategy()) {
            let bytes = to_canonical_cbor(&value).unwrap();
            prop_assert_eq!(from_cbor(&bytes).unwrap(), value);
        }

        #[test]
        fn cbor_encoding_is_deterministic(value in value_strategy()) {
            let first = to_canonical_cbor(&value).unwrap();
            let second = to_canonical_cbor(&value.clone().canonicalize()).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
