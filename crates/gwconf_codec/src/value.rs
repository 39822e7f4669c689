//! Dynamic value tree.

use std::cmp::Ordering;

/// A dynamic configuration value.
///
/// This is the opaque payload tree carried by the protocol. It maps onto
/// CBOR on the wire and onto YAML in documents. Floats and byte strings are
/// intentionally not supported.
///
/// Maps built through [`Value::map`] keep their keys in canonical order, so
/// two maps with the same entries compare equal regardless of the order the
/// entries were supplied in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Null value (absent message or optional field).
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed integer (supports full i64 range).
    Integer(i64),
    /// Unsigned integer above `i64::MAX`.
    ///
    /// Smaller unsigned values are always represented as [`Value::Integer`];
    /// use `Value::from(u64)` to get the normalized form.
    Unsigned(u64),
    /// Text string (UTF-8).
    Text(String),
    /// Array of values.
    Array(Vec<Value>),
    /// Map of key-value pairs (keys are sorted for canonical encoding).
    Map(Vec<(Value, Value)>),
}

impl Value {
    /// Create a map value with sorted keys.
    ///
    /// Keys are sorted by their canonical CBOR encoding (bytewise comparison).
    pub fn map(mut pairs: Vec<(Value, Value)>) -> Self {
        pairs.sort_by(|a, b| a.0.cmp_canonical(&b.0));
        Value::Map(pairs)
    }

    /// Create an empty map.
    pub fn empty_map() -> Self {
        Value::Map(Vec::new())
    }

    /// Returns this value with every nested map sorted into canonical order.
    pub fn canonicalize(self) -> Self {
        match self {
            Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::canonicalize).collect())
            }
            Value::Map(pairs) => Value::map(
                pairs
                    .into_iter()
                    .map(|(k, v)| (k.canonicalize(), v.canonicalize()))
                    .collect(),
            ),
            Value::Unsigned(n) => Value::from(n),
            other => other,
        }
    }

    /// Compare two values for canonical ordering.
    ///
    /// This implements the bytewise comparison of canonical CBOR encodings,
    /// which is required for map key sorting.
    #[allow(clippy::match_same_arms)]
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        let self_type = self.major_type();
        let other_type = other.major_type();

        if self_type != other_type {
            return self_type.cmp(&other_type);
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Integer(a), Value::Integer(b)) if *a < 0 && *b < 0 => {
                // CBOR encodes a negative n as the argument -1 - n.
                #[allow(clippy::cast_sign_loss)]
                let (arg_a, arg_b) = ((-1 - *a) as u64, (-1 - *b) as u64);
                Self::cmp_unsigned_canonical(arg_a, arg_b)
            }
            (Value::Integer(_) | Value::Unsigned(_), Value::Integer(_) | Value::Unsigned(_)) => {
                // Same major type and not both negative, so both are major type 0.
                match (self.as_u64(), other.as_u64()) {
                    (Some(a), Some(b)) => Self::cmp_unsigned_canonical(a, b),
                    _ => Ordering::Equal,
                }
            }
            (Value::Text(a), Value::Text(b)) => {
                // Length-first (by UTF-8 bytes), then lexicographic
                match a.len().cmp(&b.len()) {
                    Ordering::Equal => a.cmp(b),
                    ord => ord,
                }
            }
            (Value::Array(a), Value::Array(b)) => match a.len().cmp(&b.len()) {
                Ordering::Equal => {
                    for (av, bv) in a.iter().zip(b.iter()) {
                        let ord = av.cmp_canonical(bv);
                        if ord != Ordering::Equal {
                            return ord;
                        }
                    }
                    Ordering::Equal
                }
                ord => ord,
            },
            (Value::Map(a), Value::Map(b)) => match a.len().cmp(&b.len()) {
                Ordering::Equal => {
                    for ((ak, av), (bk, bv)) in a.iter().zip(b.iter()) {
                        let key_ord = ak.cmp_canonical(bk);
                        if key_ord != Ordering::Equal {
                            return key_ord;
                        }
                        let val_ord = av.cmp_canonical(bv);
                        if val_ord != Ordering::Equal {
                            return val_ord;
                        }
                    }
                    Ordering::Equal
                }
                ord => ord,
            },
            _ => Ordering::Equal,
        }
    }

    /// Compare two unsigned integers by their canonical CBOR encoding.
    ///
    /// Comparison is length-first, then numeric (which equals lexicographic
    /// for big-endian arguments of the same length).
    fn cmp_unsigned_canonical(a: u64, b: u64) -> Ordering {
        let len_a = Self::cbor_uint_encoded_len(a);
        let len_b = Self::cbor_uint_encoded_len(b);

        match len_a.cmp(&len_b) {
            Ordering::Equal => a.cmp(&b),
            ord => ord,
        }
    }

    /// Returns the encoded length (in bytes) of an unsigned integer in CBOR.
    fn cbor_uint_encoded_len(n: u64) -> usize {
        if n <= 23 {
            1
        } else if n <= 0xFF {
            2
        } else if n <= 0xFFFF {
            3
        } else if n <= 0xFFFF_FFFF {
            5
        } else {
            9
        }
    }

    /// Get the CBOR major type for this value.
    fn major_type(&self) -> u8 {
        match self {
            Value::Integer(n) if *n >= 0 => 0,
            Value::Unsigned(_) => 0,
            Value::Integer(_) => 1,
            Value::Text(_) => 3,
            Value::Array(_) => 4,
            Value::Map(_) => 5,
            Value::Bool(_) | Value::Null => 7,
        }
    }

    /// Check if this value is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get this value as a boolean, if it is one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get this value as a signed integer, if it fits.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as an unsigned integer, if it is a non-negative integer.
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Value::Integer(n) => u64::try_from(*n).ok(),
            Value::Unsigned(n) => Some(*n),
            _ => None,
        }
    }

    /// Get this value as a string, if it is a text string.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get this value as an array, if it is one.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Get this value as a map, if it is one.
    pub fn as_map(&self) -> Option<&[(Value, Value)]> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Look up a key in this map value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(pairs) => pairs
                .iter()
                .find(|(k, _)| k.as_text() == Some(key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// Short name of the value kind, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Integer(_) | Value::Unsigned(_) => "integer",
            Value::Text(_) => "text",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        match i64::try_from(n) {
            Ok(signed) => Value::Integer(signed),
            Err(_) => Value::Unsigned(n),
        }
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl From<()> for Value {
    fn from((): ()) -> Self {
        Value::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_keys_are_sorted() {
        let map = Value::map(vec![
            (Value::from("z"), Value::Integer(1)),
            (Value::from("a"), Value::Integer(2)),
            (Value::from("m"), Value::Integer(3)),
        ]);

        let pairs = map.as_map().unwrap();
        assert_eq!(pairs[0].0, Value::from("a"));
        assert_eq!(pairs[1].0, Value::from("m"));
        assert_eq!(pairs[2].0, Value::from("z"));
    }

    #[test]
    fn map_key_length_ordering() {
        // Shorter keys come first in canonical order
        let map = Value::map(vec![
            (Value::from("vrf"), Value::Integer(1)),
            (Value::from("id"), Value::Integer(2)),
            (Value::from("interfaces"), Value::Integer(3)),
        ]);

        let keys: Vec<_> = map
            .as_map()
            .unwrap()
            .iter()
            .map(|(k, _)| k.as_text().unwrap())
            .collect();
        assert_eq!(keys, vec!["id", "vrf", "interfaces"]);
    }

    #[test]
    fn integer_ordering() {
        let mut sorted = vec![
            Value::Integer(-1),
            Value::Unsigned(u64::MAX),
            Value::Integer(0),
            Value::Integer(1),
            Value::Integer(-2),
            Value::Integer(300),
        ];
        sorted.sort_by(Value::cmp_canonical);

        assert_eq!(
            sorted,
            vec![
                Value::Integer(0),
                Value::Integer(1),
                Value::Integer(300),
                Value::Unsigned(u64::MAX),
                Value::Integer(-1),
                Value::Integer(-2),
            ]
        );
    }

    #[test]
    fn canonicalize_sorts_nested_maps() {
        let unsorted = Value::Map(vec![
            (
                Value::from("underlay"),
                Value::Map(vec![
                    (Value::from("vrf"), Value::Array(vec![])),
                    (Value::from("a"), Value::Null),
                ]),
            ),
            (Value::from("b"), Value::Bool(true)),
        ]);
        let sorted = Value::map(vec![
            (Value::from("b"), Value::Bool(true)),
            (
                Value::from("underlay"),
                Value::map(vec![
                    (Value::from("a"), Value::Null),
                    (Value::from("vrf"), Value::Array(vec![])),
                ]),
            ),
        ]);

        assert_ne!(unsorted, sorted);
        assert_eq!(unsorted.canonicalize(), sorted);
    }

    #[test]
    fn unsigned_normalization() {
        assert_eq!(Value::from(42u64), Value::Integer(42));
        assert_eq!(Value::from(u64::MAX), Value::Unsigned(u64::MAX));
        assert_eq!(Value::Unsigned(7).canonicalize(), Value::Integer(7));
        assert_eq!(Value::Integer(42).as_u64(), Some(42));
        assert_eq!(Value::Integer(-1).as_u64(), None);
        assert_eq!(Value::Unsigned(u64::MAX).as_u64(), Some(u64::MAX));
    }

    #[test]
    fn value_accessors() {
        assert!(Value::Null.is_null());
        assert!(!Value::Bool(true).is_null());

        assert_eq!(Value::Bool(true).as_bool(), Some(true));
        assert_eq!(Value::Integer(42).as_bool(), None);

        assert_eq!(Value::Integer(42).as_integer(), Some(42));
        assert_eq!(Value::from("42").as_integer(), None);

        assert_eq!(Value::from("hello").as_text(), Some("hello"));
        assert_eq!(Value::Array(vec![]).kind_name(), "array");
    }

    #[test]
    fn map_get() {
        let map = Value::map(vec![
            (Value::from("name"), Value::from("vrf1")),
            (Value::from("vni"), Value::Integer(30)),
        ]);

        assert_eq!(map.get("name"), Some(&Value::from("vrf1")));
        assert_eq!(map.get("vni"), Some(&Value::Integer(30)));
        assert_eq!(map.get("missing"), None);
    }
}
