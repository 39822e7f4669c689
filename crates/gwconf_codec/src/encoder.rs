//! Canonical CBOR encoder used for frame bodies.

use crate::error::CodecResult;
use crate::value::Value;

/// Encode a value to canonical CBOR bytes.
///
/// Output is deterministic: map keys are emitted in length-first bytewise
/// order of their encodings, integers use their shortest form and no
/// indefinite-length items are produced. Two payloads that compare equal
/// therefore always encode to the same bytes.
///
/// # Errors
///
/// Returns an error if a nested value cannot be encoded.
pub fn to_canonical_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut encoder = CanonicalEncoder::new();
    encoder.encode(value)?;
    Ok(encoder.into_bytes())
}

/// A canonical CBOR encoder writing into an owned buffer.
pub struct CanonicalEncoder {
    buffer: Vec<u8>,
}

impl CanonicalEncoder {
    /// Create a new encoder.
    pub fn new() -> Self {
        Self { buffer: Vec::new() }
    }

    /// Create a new encoder with the specified capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
        }
    }

    /// Encode a value, appending to the buffer.
    #[allow(clippy::cast_sign_loss)]
    pub fn encode(&mut self, value: &Value) -> CodecResult<()> {
        match value {
            Value::Null => self.buffer.push(0xf6),
            Value::Bool(b) => self.buffer.push(if *b { 0xf5 } else { 0xf4 }),
            Value::Integer(n) if *n >= 0 => self.write_head(0, *n as u64),
            // Negative n is carried as the argument -1 - n, which always fits.
            Value::Integer(n) => self.write_head(1, (-1 - *n) as u64),
            Value::Unsigned(n) => self.write_head(0, *n),
            Value::Text(s) => {
                self.write_head(3, s.len() as u64);
                self.buffer.extend_from_slice(s.as_bytes());
            }
            Value::Array(items) => {
                self.write_head(4, items.len() as u64);
                for item in items {
                    self.encode(item)?;
                }
            }
            Value::Map(pairs) => self.encode_map(pairs)?,
        }
        Ok(())
    }

    /// Consume this encoder and return the encoded bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    /// Get a reference to the encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    #[allow(clippy::cast_possible_truncation)]
    fn write_head(&mut self, major_type: u8, arg: u64) {
        let mt = major_type << 5;

        if arg < 24 {
            self.buffer.push(mt | arg as u8);
        } else if let Ok(small) = u8::try_from(arg) {
            self.buffer.push(mt | 24);
            self.buffer.push(small);
        } else if let Ok(short) = u16::try_from(arg) {
            self.buffer.push(mt | 25);
            self.buffer.extend_from_slice(&short.to_be_bytes());
        } else if let Ok(word) = u32::try_from(arg) {
            self.buffer.push(mt | 26);
            self.buffer.extend_from_slice(&word.to_be_bytes());
        } else {
            self.buffer.push(mt | 27);
            self.buffer.extend_from_slice(&arg.to_be_bytes());
        }
    }

    fn encode_map(&mut self, pairs: &[(Value, Value)]) -> CodecResult<()> {
        // Keys are encoded up front so ordering never depends on how the map
        // was built.
        let mut entries = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let mut key_encoder = CanonicalEncoder::new();
            key_encoder.encode(key)?;
            entries.push((key_encoder.into_bytes(), value));
        }
        entries.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(&b.0)));

        self.write_head(5, entries.len() as u64);
        for (key_bytes, value) in entries {
            self.buffer.extend_from_slice(&key_bytes);
            self.encode(value)?;
        }
        Ok(())
    }
}

impl Default for CanonicalEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enc(value: Value) -> Vec<u8> {
        to_canonical_cbor(&value).unwrap()
    }

    #[test]
    fn encode_simple_values() {
        assert_eq!(enc(Value::Null), vec![0xf6]);
        assert_eq!(enc(Value::Bool(false)), vec![0xf4]);
        assert_eq!(enc(Value::Bool(true)), vec![0xf5]);
    }

    #[test]
    fn encode_shortest_integers() {
        assert_eq!(enc(Value::Integer(0)), vec![0x00]);
        assert_eq!(enc(Value::Integer(23)), vec![0x17]);
        assert_eq!(enc(Value::Integer(24)), vec![0x18, 24]);
        assert_eq!(enc(Value::Integer(256)), vec![0x19, 0x01, 0x00]);
        assert_eq!(enc(Value::Integer(65536)), vec![0x1a, 0x00, 0x01, 0x00, 0x00]);
    }

    #[test]
    fn encode_negative_integers() {
        assert_eq!(enc(Value::Integer(-1)), vec![0x20]);
        assert_eq!(enc(Value::Integer(-25)), vec![0x38, 24]);
        assert_eq!(
            enc(Value::Integer(i64::MIN)),
            vec![0x3b, 0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn encode_full_width_unsigned() {
        assert_eq!(
            enc(Value::Unsigned(u64::MAX)),
            vec![0x1b, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff]
        );
    }

    #[test]
    fn encode_text_and_array() {
        assert_eq!(enc(Value::from("")), vec![0x60]);
        assert_eq!(enc(Value::from("vrf")), vec![0x63, b'v', b'r', b'f']);
        assert_eq!(
            enc(Value::Array(vec![Value::Integer(1), Value::Integer(2)])),
            vec![0x82, 0x01, 0x02]
        );
    }

    #[test]
    fn encode_map_sorted_regardless_of_input_order() {
        let forward = Value::Map(vec![
            (Value::from("a"), Value::Integer(1)),
            (Value::from("bb"), Value::Integer(2)),
        ]);
        let backward = Value::Map(vec![
            (Value::from("bb"), Value::Integer(2)),
            (Value::from("a"), Value::Integer(1)),
        ]);

        let expected = vec![0xa2, 0x61, b'a', 0x01, 0x62, b'b', b'b', 0x02];
        assert_eq!(enc(forward), expected);
        assert_eq!(enc(backward), expected);
    }
}
