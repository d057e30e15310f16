//! Block schemas: the externally supplied field layouts that drive the codec.
//!
//! A schema is JSON of the form
//!
//! ```json
//! {
//!   "block_type": 2,
//!   "description": "Rescue code protected identity unlock key",
//!   "color": "#f6d7a7",
//!   "items": [
//!     { "name": "length", "description": "Block length", "type": "UINT_16", "bytes": 2 },
//!     { "name": "type", "description": "Block type", "type": "UINT_16", "bytes": 2 }
//!   ]
//! }
//! ```
//!
//! `bytes` is the declared width of a field. A negative value means "consume the
//! rest of the block", measured from the block length held in the first field.
//! `repeat_index` points at an earlier decoded field whose integer value is the
//! number of times the field repeats.

pub mod resolver;
pub mod source;

pub use resolver::{Resolution, SchemaResolver};
pub use source::{
    BuiltinSchemaSource, DirectorySchemaSource, LayeredSchemaSource, MemorySchemaSource,
    SchemaSource,
};

use serde::Deserialize;
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Malformed block schema: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Unknown-block schema unavailable: {0}")]
    FallbackUnavailable(String),

    #[error("Invalid byte count {declared} for datatype {field_type} in field '{field}'")]
    WidthMismatch {
        field: String,
        field_type: FieldType,
        declared: FieldWidth,
    },

    #[error("Invalid byte count for datatype BYTE_ARRAY in field '{field}'")]
    InvalidByteSequenceWidth { field: String },

    #[error("Field '{field}' repeats by field #{index}, which is not an integer")]
    RepeatSourceNotInteger { field: String, index: usize },

    #[error("Field '{field}' cannot repeat {count} times with a zero or open-ended width")]
    UnboundedRepeat { field: String, count: u32 },

    #[error("Field '{field}' consumes the remaining bytes but the block has no leading length field")]
    RemainingWithoutLength { field: String },
}

/// Semantic type of a field, as named by the schema's `type` key.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum FieldType {
    U8,
    U16,
    U32,
    ByteSequence,
    /// A tag this codec does not understand. Values of this type are carried opaquely.
    Unknown(String),
}

impl FieldType {
    /// Width in bytes every value of this type occupies, for the integer types.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            FieldType::U8 => Some(1),
            FieldType::U16 => Some(2),
            FieldType::U32 => Some(4),
            FieldType::ByteSequence | FieldType::Unknown(_) => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        self.fixed_width().is_some()
    }

    /// The schema tag for this type
    pub fn tag(&self) -> &str {
        match self {
            FieldType::U8 => "UINT_8",
            FieldType::U16 => "UINT_16",
            FieldType::U32 => "UINT_32",
            FieldType::ByteSequence => "BYTE_ARRAY",
            FieldType::Unknown(tag) => tag,
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "UINT_8" => FieldType::U8,
            "UINT_16" => FieldType::U16,
            "UINT_32" => FieldType::U32,
            "BYTE_ARRAY" => FieldType::ByteSequence,
            _ => FieldType::Unknown(tag),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Declared width of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum FieldWidth {
    Fixed(usize),
    /// Everything up to the block length stored in the block's first field.
    Remaining,
}

impl From<i64> for FieldWidth {
    fn from(bytes: i64) -> Self {
        if bytes < 0 {
            FieldWidth::Remaining
        } else {
            FieldWidth::Fixed(bytes as usize)
        }
    }
}

impl fmt::Display for FieldWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldWidth::Fixed(bytes) => write!(f, "{bytes}"),
            FieldWidth::Remaining => f.write_str("remaining"),
        }
    }
}

/// One entry of a schema's `items` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(rename = "bytes")]
    pub width: FieldWidth,
    #[serde(default)]
    pub repeat_index: Option<usize>,
}

impl FieldDescriptor {
    /// Check the declared width against the semantic type.
    ///
    /// Integer types must declare exactly their natural width, byte sequences
    /// must declare at least one byte (or the remaining-bytes sentinel).
    pub fn checked_width(&self) -> Result<FieldWidth, SchemaError> {
        match (&self.field_type, self.width) {
            (FieldType::ByteSequence, FieldWidth::Fixed(0)) => {
                Err(SchemaError::InvalidByteSequenceWidth {
                    field: self.name.clone(),
                })
            }
            (FieldType::ByteSequence | FieldType::Unknown(_), width) => Ok(width),
            (integer, FieldWidth::Fixed(declared)) if integer.fixed_width() == Some(declared) => {
                Ok(self.width)
            }
            (integer, declared) => Err(SchemaError::WidthMismatch {
                field: self.name.clone(),
                field_type: integer.clone(),
                declared,
            }),
        }
    }
}

/// Layout of one block type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BlockSchema {
    pub block_type: u16,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub color: String,
    #[serde(rename = "items", default)]
    pub fields: Vec<FieldDescriptor>,
}

impl BlockSchema {
    /// Parse a schema from its JSON description
    pub fn from_json(bytes: &[u8]) -> Result<Self, SchemaError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
