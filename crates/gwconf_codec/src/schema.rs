//! Static message schemas driving the YAML document codec.
//!
//! Schemas are plain `'static` data so a concrete binding (see the protocol
//! crate) can be written as a set of constants and shared without
//! allocation.

/// How many values a field may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Exactly one value; absent means the kind's default.
    Singular,
    /// Zero or one value; absent is distinct from the default.
    Optional,
    /// Zero or more values.
    Repeated,
}

/// The value kind of a field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// Boolean.
    Bool,
    /// Signed 32-bit integer.
    Int32,
    /// Signed 64-bit integer (quoted in documents).
    Int64,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Unsigned 64-bit integer (quoted in documents).
    Uint64,
    /// UTF-8 string.
    String,
    /// Closed enumeration.
    Enum(&'static EnumSchema),
    /// Nested message.
    Message(&'static MessageSchema),
}

impl FieldKind {
    /// Human-readable name used in type mismatch errors.
    pub fn describe(&self) -> &'static str {
        match self {
            FieldKind::Bool => "bool",
            FieldKind::Int32 => "int32",
            FieldKind::Int64 => "int64",
            FieldKind::Uint32 => "uint32",
            FieldKind::Uint64 => "uint64",
            FieldKind::String => "string",
            FieldKind::Enum(e) => e.name,
            FieldKind::Message(m) => m.name,
        }
    }

    /// Returns true for the 64-bit integer kinds.
    pub fn is_wide_integer(&self) -> bool {
        matches!(self, FieldKind::Int64 | FieldKind::Uint64)
    }
}

/// A single field of a message.
#[derive(Debug, Clone, Copy)]
pub struct FieldSchema {
    /// Original snake_case name.
    pub name: &'static str,
    /// lowerCamelCase name emitted in documents.
    pub json_name: &'static str,
    /// Value kind.
    pub kind: FieldKind,
    /// Cardinality.
    pub cardinality: Cardinality,
    /// Name of the oneof group this field belongs to, if any.
    pub oneof: Option<&'static str>,
}

impl FieldSchema {
    /// A singular field.
    pub const fn singular(name: &'static str, json_name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            json_name,
            kind,
            cardinality: Cardinality::Singular,
            oneof: None,
        }
    }

    /// An optional field.
    pub const fn optional(name: &'static str, json_name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            json_name,
            kind,
            cardinality: Cardinality::Optional,
            oneof: None,
        }
    }

    /// A repeated field.
    pub const fn repeated(name: &'static str, json_name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            json_name,
            kind,
            cardinality: Cardinality::Repeated,
            oneof: None,
        }
    }

    /// A member of a oneof group. Members behave like optional fields.
    pub const fn one_of(
        group: &'static str,
        name: &'static str,
        json_name: &'static str,
        kind: FieldKind,
    ) -> Self {
        Self {
            name,
            json_name,
            kind,
            cardinality: Cardinality::Optional,
            oneof: Some(group),
        }
    }

    /// Returns true if `key` names this field in either spelling.
    pub fn matches(&self, key: &str) -> bool {
        key == self.json_name || key == self.name
    }
}

/// A message: an ordered list of fields.
#[derive(Debug)]
pub struct MessageSchema {
    /// Message name.
    pub name: &'static str,
    /// Fields in declaration order.
    pub fields: &'static [FieldSchema],
}

impl MessageSchema {
    /// Look up a field by its snake_case name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Look up a field by either of its names.
    pub fn field_by_key(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.matches(key))
    }
}

/// A closed enumeration. The first variant is the zero (default) variant.
#[derive(Debug)]
pub struct EnumSchema {
    /// Enum name.
    pub name: &'static str,
    /// `(name, number)` pairs; the zero variant comes first.
    pub variants: &'static [(&'static str, i32)],
}

impl EnumSchema {
    /// Name of the zero variant.
    pub fn default_name(&self) -> &'static str {
        self.variants.first().map_or("", |(name, _)| name)
    }

    /// Number of a variant given its name.
    pub fn number_of(&self, name: &str) -> Option<i32> {
        self.variants
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, num)| *num)
    }

    /// Name of a variant given its number.
    pub fn name_of(&self, number: i64) -> Option<&'static str> {
        self.variants
            .iter()
            .find(|(_, num)| i64::from(*num) == number)
            .map(|(name, _)| *name)
    }
}
