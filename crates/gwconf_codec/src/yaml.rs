//! Strict YAML document codec.
//!
//! Documents are decoded against a [`MessageSchema`] into a [`Value`] tree
//! keyed by snake_case field names, and encoded back using the
//! lowerCamelCase names in schema declaration order.
//!
//! Decoding fills in every field: absent singular scalars take their default
//! (`false`, `0`, `""`, or the zero enum variant), absent lists become empty
//! arrays and absent messages or optional fields become null. Encoding omits
//! exactly those defaults again, so a decoded tree survives an
//! encode/decode cycle unchanged.

use serde_yaml::{Mapping, Number, Value as YamlValue};

use crate::error::{CodecError, CodecResult};
use crate::schema::{Cardinality, FieldKind, FieldSchema, MessageSchema};
use crate::value::Value;

/// Decode a YAML document into a value tree shaped by `schema`.
///
/// An empty document decodes as an empty message.
///
/// # Errors
///
/// - [`CodecError::MalformedSyntax`] if the text is not a single well-formed
///   YAML document or repeats a key.
/// - [`CodecError::UnknownField`] if a key at any depth is not in the schema.
/// - [`CodecError::TypeMismatch`] if a value has the wrong kind, is out of
///   range, or names an unknown enum variant.
pub fn decode_yaml(text: &str, schema: &MessageSchema) -> CodecResult<Value> {
    if is_blank_document(text) {
        return decode_yaml_value(&YamlValue::Null, schema);
    }
    let node: YamlValue =
        serde_yaml::from_str(text).map_err(|e| CodecError::malformed(e.to_string()))?;
    decode_yaml_value(&node, schema)
}

/// Decode an already parsed YAML node.
///
/// # Errors
///
/// See [`decode_yaml`].
pub fn decode_yaml_value(node: &YamlValue, schema: &MessageSchema) -> CodecResult<Value> {
    match node {
        YamlValue::Null => decode_message(&Mapping::new(), schema, ""),
        YamlValue::Mapping(map) => decode_message(map, schema, ""),
        _ => Err(CodecError::type_mismatch("$", schema.name)),
    }
}

/// Encode a value tree as a YAML document.
///
/// # Errors
///
/// Returns [`CodecError::EncodingFailed`] if the tree does not fit the
/// schema.
pub fn encode_yaml(value: &Value, schema: &MessageSchema) -> CodecResult<String> {
    let node = encode_yaml_value(value, schema)?;
    serde_yaml::to_string(&node).map_err(|e| CodecError::encoding_failed(e.to_string()))
}

/// Encode a value tree as a YAML node.
///
/// # Errors
///
/// See [`encode_yaml`].
pub fn encode_yaml_value(value: &Value, schema: &MessageSchema) -> CodecResult<YamlValue> {
    encode_message(value, schema, "").map(YamlValue::Mapping)
}

fn is_blank_document(text: &str) -> bool {
    text.lines().all(|line| {
        let line = line.trim();
        line.is_empty() || line.starts_with('#') || line == "---" || line == "..."
    })
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn decode_message(map: &Mapping, schema: &MessageSchema, path: &str) -> CodecResult<Value> {
    // Resolve every key first so unknown names are reported before anything
    // else in this message.
    let mut present: Vec<Option<&YamlValue>> = vec![None; schema.fields.len()];
    for (key, node) in map {
        let key = match key {
            YamlValue::String(s) => s.as_str(),
            other => {
                return Err(CodecError::malformed(format!(
                    "non-string key {other:?} in `{}`",
                    if path.is_empty() { "$" } else { path }
                )))
            }
        };
        let index = schema
            .fields
            .iter()
            .position(|f| f.matches(key))
            .ok_or_else(|| CodecError::unknown_field(child_path(path, key)))?;
        if present[index].is_some() {
            return Err(CodecError::malformed(format!(
                "field `{}` given twice",
                child_path(path, schema.fields[index].json_name)
            )));
        }
        present[index] = Some(node);
    }

    let mut oneofs_seen: Vec<(&str, &str)> = Vec::new();
    let mut pairs = Vec::with_capacity(schema.fields.len());
    for (field, node) in schema.fields.iter().zip(present) {
        let field_path = child_path(path, field.json_name);
        let node = node.filter(|n| !n.is_null());

        if let (Some(group), Some(_)) = (field.oneof, node) {
            if let Some((_, other)) = oneofs_seen.iter().find(|(g, _)| *g == group) {
                return Err(CodecError::type_mismatch(
                    child_path(path, group),
                    format!("only one of `{other}` and `{}`", field.json_name),
                ));
            }
            oneofs_seen.push((group, field.json_name));
        }

        let value = match node {
            Some(node) => decode_field(node, field, &field_path)?,
            None => default_for(field),
        };
        pairs.push((Value::from(field.name), value));
    }

    Ok(Value::map(pairs))
}

fn decode_field(node: &YamlValue, field: &FieldSchema, path: &str) -> CodecResult<Value> {
    if field.cardinality != Cardinality::Repeated {
        return decode_single(node, &field.kind, path);
    }
    let items = node
        .as_sequence()
        .ok_or_else(|| CodecError::type_mismatch(path, format!("list of {}", field.kind.describe())))?;
    items
        .iter()
        .enumerate()
        .map(|(i, item)| decode_single(item, &field.kind, &format!("{path}[{i}]")))
        .collect::<CodecResult<Vec<_>>>()
        .map(Value::Array)
}

fn decode_single(node: &YamlValue, kind: &FieldKind, path: &str) -> CodecResult<Value> {
    let mismatch = || CodecError::type_mismatch(path, kind.describe());

    match kind {
        FieldKind::Bool => node.as_bool().map(Value::Bool).ok_or_else(mismatch),
        FieldKind::String => node.as_str().map(Value::from).ok_or_else(mismatch),
        FieldKind::Int32 | FieldKind::Int64 | FieldKind::Uint32 | FieldKind::Uint64 => {
            let raw = match node {
                YamlValue::Number(n) => number_to_i128(n),
                YamlValue::String(s) => s.parse::<i128>().ok(),
                _ => None,
            }
            .ok_or_else(mismatch)?;
            integer_value(raw, kind).ok_or_else(mismatch)
        }
        FieldKind::Enum(schema) => match node {
            YamlValue::String(name) => schema
                .number_of(name)
                .map(|_| Value::from(name.as_str()))
                .ok_or_else(mismatch),
            YamlValue::Number(n) => {
                let number = n
                    .as_i64()
                    .filter(|v| i32::try_from(*v).is_ok())
                    .ok_or_else(mismatch)?;
                Ok(schema
                    .name_of(number)
                    .map_or(Value::Integer(number), Value::from))
            }
            _ => Err(mismatch()),
        },
        FieldKind::Message(schema) => match node {
            YamlValue::Mapping(map) => decode_message(map, schema, path),
            _ => Err(mismatch()),
        },
    }
}

fn number_to_i128(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn integer_value(raw: i128, kind: &FieldKind) -> Option<Value> {
    let in_range = match kind {
        FieldKind::Int32 => i32::try_from(raw).is_ok(),
        FieldKind::Uint32 => u32::try_from(raw).is_ok(),
        FieldKind::Int64 => i64::try_from(raw).is_ok(),
        FieldKind::Uint64 => u64::try_from(raw).is_ok(),
        _ => false,
    };
    if !in_range {
        return None;
    }
    match i64::try_from(raw) {
        Ok(n) => Some(Value::Integer(n)),
        Err(_) => u64::try_from(raw).ok().map(Value::Unsigned),
    }
}

fn default_for(field: &FieldSchema) -> Value {
    match field.cardinality {
        Cardinality::Repeated => Value::Array(Vec::new()),
        Cardinality::Optional => Value::Null,
        Cardinality::Singular => match field.kind {
            FieldKind::Bool => Value::Bool(false),
            FieldKind::Int32 | FieldKind::Int64 | FieldKind::Uint32 | FieldKind::Uint64 => {
                Value::Integer(0)
            }
            FieldKind::String => Value::Text(String::new()),
            FieldKind::Enum(schema) => Value::from(schema.default_name()),
            FieldKind::Message(_) => Value::Null,
        },
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode_message(value: &Value, schema: &MessageSchema, path: &str) -> CodecResult<Mapping> {
    let pairs = value.as_map().ok_or_else(|| {
        CodecError::encoding_failed(format!(
            "`{}` must be a map for {}, found {}",
            if path.is_empty() { "$" } else { path },
            schema.name,
            value.kind_name()
        ))
    })?;

    for (key, _) in pairs {
        let known = key.as_text().and_then(|k| schema.field(k)).is_some();
        if !known {
            return Err(CodecError::encoding_failed(format!(
                "{} has no field {key:?}",
                schema.name
            )));
        }
    }

    let mut out = Mapping::new();
    for field in schema.fields {
        let field_path = child_path(path, field.json_name);
        let Some(value) = value.get(field.name) else {
            continue;
        };
        if let Some(node) = encode_field(value, field, &field_path)? {
            out.insert(YamlValue::from(field.json_name), node);
        }
    }
    Ok(out)
}

fn encode_field(value: &Value, field: &FieldSchema, path: &str) -> CodecResult<Option<YamlValue>> {
    if value.is_null() {
        return Ok(None);
    }
    match field.cardinality {
        Cardinality::Repeated => {
            let items = value.as_array().ok_or_else(|| {
                CodecError::encoding_failed(format!("`{path}` must be an array"))
            })?;
            if items.is_empty() {
                return Ok(None);
            }
            items
                .iter()
                .enumerate()
                .map(|(i, item)| encode_single(item, &field.kind, &format!("{path}[{i}]")))
                .collect::<CodecResult<Vec<_>>>()
                .map(|nodes| Some(YamlValue::Sequence(nodes)))
        }
        Cardinality::Optional => encode_single(value, &field.kind, path).map(Some),
        Cardinality::Singular => {
            if is_default_scalar(value, &field.kind) {
                return Ok(None);
            }
            encode_single(value, &field.kind, path).map(Some)
        }
    }
}

fn is_default_scalar(value: &Value, kind: &FieldKind) -> bool {
    match kind {
        FieldKind::Bool => value.as_bool() == Some(false),
        FieldKind::Int32 | FieldKind::Int64 | FieldKind::Uint32 | FieldKind::Uint64 => {
            value.as_integer() == Some(0)
        }
        FieldKind::String => value.as_text() == Some(""),
        FieldKind::Enum(schema) => {
            value.as_integer() == Some(0) || value.as_text() == Some(schema.default_name())
        }
        FieldKind::Message(_) => false,
    }
}

fn encode_single(value: &Value, kind: &FieldKind, path: &str) -> CodecResult<YamlValue> {
    let mismatch = || {
        CodecError::encoding_failed(format!(
            "`{path}` expects {}, found {}",
            kind.describe(),
            value.kind_name()
        ))
    };

    match kind {
        FieldKind::Bool => value.as_bool().map(YamlValue::Bool).ok_or_else(mismatch),
        FieldKind::String => value.as_text().map(YamlValue::from).ok_or_else(mismatch),
        FieldKind::Int32 | FieldKind::Int64 | FieldKind::Uint32 | FieldKind::Uint64 => {
            let raw = match value {
                Value::Integer(n) => i128::from(*n),
                Value::Unsigned(n) => i128::from(*n),
                _ => return Err(mismatch()),
            };
            integer_value(raw, kind).ok_or_else(mismatch)?;
            if kind.is_wide_integer() {
                Ok(YamlValue::String(raw.to_string()))
            } else {
                i64::try_from(raw)
                    .map(|n| YamlValue::Number(Number::from(n)))
                    .map_err(|_| mismatch())
            }
        }
        FieldKind::Enum(schema) => match value {
            Value::Text(name) if schema.number_of(name).is_some() => Ok(YamlValue::from(name.as_str())),
            Value::Integer(n) => Ok(schema
                .name_of(*n)
                .map_or_else(|| YamlValue::Number(Number::from(*n)), YamlValue::from)),
            _ => Err(mismatch()),
        },
        FieldKind::Message(schema) => encode_message(value, schema, path).map(YamlValue::Mapping),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EnumSchema;

    static SHAPE: EnumSchema = EnumSchema {
        name: "Shape",
        variants: &[("SHAPE_UNSPECIFIED", 0), ("SHAPE_ROUND", 1), ("SHAPE_SQUARE", 2)],
    };

    static LEAF: MessageSchema = MessageSchema {
        name: "Leaf",
        fields: &[
            FieldSchema::singular("name", "name", FieldKind::String),
            FieldSchema::singular("shape", "shape", FieldKind::Enum(&SHAPE)),
            FieldSchema::optional("weight", "weight", FieldKind::Uint32),
            FieldSchema::one_of("target", "to_cidr", "toCidr", FieldKind::String),
            FieldSchema::one_of("target", "to_name", "toName", FieldKind::String),
        ],
    };

    static TREE: MessageSchema = MessageSchema {
        name: "Tree",
        fields: &[
            FieldSchema::singular("serial", "serial", FieldKind::Uint64),
            FieldSchema::singular("offset", "offset", FieldKind::Int32),
            FieldSchema::singular("enabled", "enabled", FieldKind::Bool),
            FieldSchema::repeated("leaf_list", "leafList", FieldKind::Message(&LEAF)),
            FieldSchema::singular("root", "root", FieldKind::Message(&LEAF)),
        ],
    };

    #[test]
    fn absent_fields_take_defaults() {
        let value = decode_yaml("serial: 3\n", &TREE).unwrap();

        assert_eq!(value.get("serial"), Some(&Value::Integer(3)));
        assert_eq!(value.get("offset"), Some(&Value::Integer(0)));
        assert_eq!(value.get("enabled"), Some(&Value::Bool(false)));
        assert_eq!(value.get("leaf_list"), Some(&Value::Array(vec![])));
        assert_eq!(value.get("root"), Some(&Value::Null));
    }

    #[test]
    fn enum_zero_variant_implicit_and_explicit_are_equal() {
        let implicit = decode_yaml("root:\n  name: a\n", &TREE).unwrap();
        let explicit = decode_yaml("root:\n  name: a\n  shape: SHAPE_UNSPECIFIED\n", &TREE).unwrap();
        assert_eq!(implicit, explicit);
        assert_eq!(
            implicit.get("root").unwrap().get("shape"),
            Some(&Value::from("SHAPE_UNSPECIFIED"))
        );

        let numeric = decode_yaml("root:\n  shape: 2\n", &TREE).unwrap();
        assert_eq!(
            numeric.get("root").unwrap().get("shape"),
            Some(&Value::from("SHAPE_SQUARE"))
        );
    }

    #[test]
    fn wide_integers_accept_quoted_and_bare() {
        let quoted = decode_yaml("serial: \"42\"\n", &TREE).unwrap();
        let bare = decode_yaml("serial: 42\n", &TREE).unwrap();
        assert_eq!(quoted, bare);

        let max = decode_yaml("serial: \"18446744073709551615\"\n", &TREE).unwrap();
        assert_eq!(max.get("serial"), Some(&Value::Unsigned(u64::MAX)));
    }

    #[test]
    fn snake_case_names_accepted() {
        let camel = decode_yaml("leafList:\n  - name: a\n", &TREE).unwrap();
        let snake = decode_yaml("leaf_list:\n  - name: a\n", &TREE).unwrap();
        assert_eq!(camel, snake);

        let both = decode_yaml("leafList: []\nleaf_list: []\n", &TREE);
        assert!(matches!(both, Err(CodecError::MalformedSyntax { .. })));
    }

    #[test]
    fn unknown_field_reports_nested_path() {
        let err = decode_yaml("leafList:\n  - name: a\n  - bogus: 1\n", &TREE).unwrap_err();
        assert_eq!(err, CodecError::unknown_field("leafList[1].bogus"));
    }

    #[test]
    fn type_errors() {
        assert!(matches!(
            decode_yaml("offset: 3000000000\n", &TREE),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert!(matches!(
            decode_yaml("serial: -1\n", &TREE),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert!(matches!(
            decode_yaml("enabled: \"yes\"\n", &TREE),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert!(matches!(
            decode_yaml("root:\n  shape: SHAPE_OVAL\n", &TREE),
            Err(CodecError::TypeMismatch { .. })
        ));
        assert!(matches!(
            decode_yaml("- 1\n- 2\n", &TREE),
            Err(CodecError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn oneof_rejects_two_members() {
        let err = decode_yaml("root:\n  toCidr: 10.0.0.0/8\n  toName: a\n", &TREE).unwrap_err();
        assert!(matches!(err, CodecError::TypeMismatch { ref path, .. } if path == "root.target"));
    }

    #[test]
    fn malformed_yaml_rejected() {
        assert!(matches!(
            decode_yaml("serial: [1, 2\n", &TREE),
            Err(CodecError::MalformedSyntax { .. })
        ));
        assert!(matches!(
            decode_yaml("serial: 1\nserial: 2\n", &TREE),
            Err(CodecError::MalformedSyntax { .. })
        ));
    }

    #[test]
    fn empty_document_is_empty_message() {
        let empty = decode_yaml("", &TREE).unwrap();
        let comment = decode_yaml("# nothing here\n---\n", &TREE).unwrap();
        assert_eq!(empty, comment);
        assert_eq!(empty.get("serial"), Some(&Value::Integer(0)));
    }

    #[test]
    fn encode_omits_defaults_and_quotes_wide_integers() {
        let value = decode_yaml(
            "serial: 7\noffset: -2\nroot:\n  name: a\n  weight: 0\n",
            &TREE,
        )
        .unwrap();
        let text = encode_yaml(&value, &TREE).unwrap();

        assert_eq!(
            text,
            "serial: '7'\noffset: -2\nroot:\n  name: a\n  weight: 0\n"
        );
        assert_eq!(decode_yaml(&text, &TREE).unwrap(), value);
    }

    #[test]
    fn encode_rejects_unknown_payload_key() {
        let value = Value::map(vec![(Value::from("bogus"), Value::Integer(1))]);
        assert!(matches!(
            encode_yaml(&value, &TREE),
            Err(CodecError::EncodingFailed { .. })
        ));
    }
}
