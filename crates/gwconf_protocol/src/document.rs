//! The versioned configuration document and its text codec.

use gwconf_codec::{decode_yaml, encode_yaml, CodecError, CodecResult, MessageSchema, Value};

use crate::schema::GATEWAY_CONFIG;

/// Name of the root field carrying the generation counter.
const GENERATION_FIELD: &str = "generation";

/// A versioned configuration document.
///
/// The payload is opaque to the protocol; only the generation is
/// interpreted. Documents are replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigDocument {
    /// Generation counter chosen by the writer.
    pub generation: u64,
    /// Configuration tree, excluding the generation.
    pub payload: Value,
}

impl ConfigDocument {
    /// Creates a document. Nested maps in the payload are put into
    /// canonical order.
    pub fn new(generation: u64, payload: Value) -> Self {
        Self {
            generation,
            payload: payload.canonicalize(),
        }
    }

    /// Converts to the wire representation.
    pub fn to_value(&self) -> Value {
        Value::map(vec![
            (Value::from("generation"), Value::from(self.generation)),
            (Value::from("payload"), self.payload.clone()),
        ])
    }

    /// Parses the wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::InvalidStructure`] if the value is not a
    /// document map.
    pub fn from_value(value: &Value) -> CodecResult<Self> {
        if value.as_map().is_none() {
            return Err(CodecError::invalid_structure("document must be a map"));
        }
        let generation = value
            .get("generation")
            .and_then(Value::as_u64)
            .ok_or_else(|| CodecError::invalid_structure("missing generation"))?;
        let payload = value
            .get("payload")
            .cloned()
            .ok_or_else(|| CodecError::invalid_structure("missing payload"))?;
        Ok(Self::new(generation, payload))
    }
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self {
            generation: 0,
            payload: Value::empty_map(),
        }
    }
}

/// Converts documents to and from their canonical YAML text.
///
/// The generation lives at the root of the text alongside the other
/// top-level fields and is split out of the payload on decode.
#[derive(Debug, Clone, Copy)]
pub struct DocumentCodec {
    schema: &'static MessageSchema,
}

impl DocumentCodec {
    /// Creates a codec for an arbitrary root schema.
    ///
    /// The schema should declare a `generation` field of an unsigned kind.
    pub fn new(schema: &'static MessageSchema) -> Self {
        Self { schema }
    }

    /// Codec for the gateway configuration.
    pub fn gateway() -> Self {
        Self::new(&GATEWAY_CONFIG)
    }

    /// Root schema used by this codec.
    pub fn schema(&self) -> &'static MessageSchema {
        self.schema
    }

    /// Encodes a document as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::EncodingFailed`] if the payload does not fit the
    /// schema.
    pub fn encode(&self, doc: &ConfigDocument) -> CodecResult<String> {
        let mut pairs = match &doc.payload {
            Value::Map(pairs) => pairs
                .iter()
                .filter(|(k, _)| k.as_text() != Some(GENERATION_FIELD))
                .cloned()
                .collect::<Vec<_>>(),
            Value::Null => Vec::new(),
            other => {
                return Err(CodecError::encoding_failed(format!(
                    "payload must be a map, found {}",
                    other.kind_name()
                )))
            }
        };
        pairs.push((Value::from(GENERATION_FIELD), Value::from(doc.generation)));
        encode_yaml(&Value::map(pairs), self.schema)
    }

    /// Decodes a YAML document.
    ///
    /// # Errors
    ///
    /// Returns the strict decode errors of [`decode_yaml`].
    pub fn decode(&self, text: &str) -> CodecResult<ConfigDocument> {
        let root = decode_yaml(text, self.schema)?;
        let Value::Map(pairs) = root else {
            return Err(CodecError::type_mismatch("$", self.schema.name));
        };

        let mut generation = 0;
        let mut payload = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            if key.as_text() == Some(GENERATION_FIELD) {
                generation = value
                    .as_u64()
                    .ok_or_else(|| CodecError::type_mismatch(GENERATION_FIELD, "uint64"))?;
            } else {
                payload.push((key, value));
            }
        }

        Ok(ConfigDocument {
            generation,
            payload: Value::Map(payload),
        })
    }
}

impl Default for DocumentCodec {
    fn default() -> Self {
        Self::gateway()
    }
}
