use thiserror::Error;

use crate::models::ItemId;
use crate::schema::{FieldDescriptor, FieldType, FieldWidth};

/// Values longer than this are shortened by [`FieldValue::display_value`]
const DISPLAY_LIMIT: usize = 50;
/// Characters kept when a value is shortened for display
const DISPLAY_KEEP: usize = 40;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    #[error("'{value}' is not a valid {field_type} value")]
    InvalidInteger { value: String, field_type: FieldType },

    #[error("'{value}' is not a valid hex byte sequence")]
    InvalidHex { value: String },

    #[error("Expected {expected} bytes but got {actual}")]
    WrongLength { expected: usize, actual: usize },

    #[error("Values of type {0} cannot be edited")]
    ReadOnly(FieldType),
}

/// Decoded payload of a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldData {
    U8(u8),
    U16(u16),
    U32(u32),
    Bytes(Vec<u8>),
    /// Raw bytes of a field whose type tag is not understood. Shown as an empty
    /// value but written back unchanged.
    Opaque(Vec<u8>),
}

impl FieldData {
    /// All-zero data of the given type and width
    pub fn zeroed(field_type: &FieldType, width: usize) -> Self {
        match field_type {
            FieldType::U8 => FieldData::U8(0),
            FieldType::U16 => FieldData::U16(0),
            FieldType::U32 => FieldData::U32(0),
            FieldType::ByteSequence => FieldData::Bytes(vec![0; width]),
            FieldType::Unknown(_) => FieldData::Opaque(vec![0; width]),
        }
    }

    pub fn as_integer(&self) -> Option<u32> {
        match self {
            FieldData::U8(v) => Some(u32::from(*v)),
            FieldData::U16(v) => Some(u32::from(*v)),
            FieldData::U32(v) => Some(*v),
            FieldData::Bytes(_) | FieldData::Opaque(_) => None,
        }
    }

    /// Number of bytes this data occupies on the wire
    pub fn byte_len(&self) -> usize {
        match self {
            FieldData::U8(_) => 1,
            FieldData::U16(_) => 2,
            FieldData::U32(_) => 4,
            FieldData::Bytes(bytes) | FieldData::Opaque(bytes) => bytes.len(),
        }
    }

    /// Canonical text: unsigned decimal for integers, lowercase hex for byte sequences
    pub fn to_text(&self) -> String {
        match self {
            FieldData::U8(v) => v.to_string(),
            FieldData::U16(v) => v.to_string(),
            FieldData::U32(v) => v.to_string(),
            FieldData::Bytes(bytes) => hex::encode(bytes),
            FieldData::Opaque(_) => String::new(),
        }
    }
}

/// One decoded field of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldValue {
    id: ItemId,
    name: String,
    description: String,
    field_type: FieldType,
    width: FieldWidth,
    data: FieldData,
}

impl FieldValue {
    pub fn new(descriptor: &FieldDescriptor, data: FieldData) -> Self {
        Self {
            id: ItemId::new(),
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            field_type: descriptor.field_type.clone(),
            width: descriptor.width,
            data,
        }
    }

    pub fn id(&self) -> ItemId {
        self.id
    }

    /// Give this value a new id, for copies that must not alias the original
    pub(crate) fn renew_id(&mut self) {
        self.id = ItemId::new();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Width declared by the schema (not necessarily the current byte length)
    pub fn width(&self) -> FieldWidth {
        self.width
    }

    pub fn data(&self) -> &FieldData {
        &self.data
    }

    pub fn as_integer(&self) -> Option<u32> {
        self.data.as_integer()
    }

    /// The value in its canonical text form
    pub fn value(&self) -> String {
        self.data.to_text()
    }

    /// The value shortened for display next to other fields
    pub fn display_value(&self) -> String {
        let value = self.value();
        if value.chars().count() > DISPLAY_LIMIT {
            let mut short: String = value.chars().take(DISPLAY_KEEP).collect();
            short.push_str("...");
            short
        } else {
            value
        }
    }

    /// Replace the value from its canonical text form.
    ///
    /// Integers must fit the field's width. Byte sequences must be hex and, unless
    /// the field takes the remaining bytes of its block, exactly as long as declared.
    pub fn set_value(&mut self, text: &str) -> Result<(), ValueError> {
        let text = text.trim();
        let invalid_integer = || ValueError::InvalidInteger {
            value: text.to_string(),
            field_type: self.field_type.clone(),
        };

        let data = match &self.field_type {
            FieldType::U8 => FieldData::U8(text.parse().map_err(|_| invalid_integer())?),
            FieldType::U16 => FieldData::U16(text.parse().map_err(|_| invalid_integer())?),
            FieldType::U32 => FieldData::U32(text.parse().map_err(|_| invalid_integer())?),
            FieldType::ByteSequence => {
                let bytes = hex::decode(text).map_err(|_| ValueError::InvalidHex {
                    value: text.to_string(),
                })?;
                if let FieldWidth::Fixed(expected) = self.width
                    && bytes.len() != expected
                {
                    return Err(ValueError::WrongLength {
                        expected,
                        actual: bytes.len(),
                    });
                }
                FieldData::Bytes(bytes)
            }
            FieldType::Unknown(_) => return Err(ValueError::ReadOnly(self.field_type.clone())),
        };

        self.data = data;
        Ok(())
    }

    /// Whether `value` fits this field's integer type
    pub(crate) fn fits_integer(&self, value: u32) -> bool {
        match self.field_type {
            FieldType::U8 => u8::try_from(value).is_ok(),
            FieldType::U16 => u16::try_from(value).is_ok(),
            FieldType::U32 => true,
            FieldType::ByteSequence | FieldType::Unknown(_) => false,
        }
    }

    /// Store an integer value; callers check [`Self::fits_integer`] first
    pub(crate) fn set_integer(&mut self, value: u32) {
        self.data = match self.field_type {
            FieldType::U8 => FieldData::U8(value as u8),
            FieldType::U16 => FieldData::U16(value as u16),
            FieldType::U32 => FieldData::U32(value),
            FieldType::ByteSequence | FieldType::Unknown(_) => return,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn field(tag: &str, bytes: i64) -> FieldValue {
        let descriptor = FieldDescriptor {
            name: "field".to_string(),
            description: "A field".to_string(),
            field_type: FieldType::from(tag.to_string()),
            width: FieldWidth::from(bytes),
            repeat_index: None,
        };
        let data = FieldData::zeroed(&descriptor.field_type, bytes.max(0) as usize);
        FieldValue::new(&descriptor, data)
    }

    #[rstest]
    #[case("UINT_8", 1, "255")]
    #[case("UINT_16", 2, "65535")]
    #[case("UINT_32", 4, "4294967295")]
    #[case("BYTE_ARRAY", 2, "beef")]
    #[case("BYTE_ARRAY", -1, "00112233")]
    fn test_set_value_accepts_canonical_text(
        #[case] tag: &str,
        #[case] bytes: i64,
        #[case] text: &str,
    ) {
        let mut value = field(tag, bytes);
        value.set_value(text).unwrap();
        assert_eq!(value.value(), text);
    }

    #[rstest]
    #[case("UINT_8", 1, "256")]
    #[case("UINT_16", 2, "65536")]
    #[case("UINT_32", 4, "-1")]
    #[case("UINT_8", 1, "ten")]
    fn test_set_value_rejects_out_of_range_integers(
        #[case] tag: &str,
        #[case] bytes: i64,
        #[case] text: &str,
    ) {
        let mut value = field(tag, bytes);
        let result = value.set_value(text);
        assert!(matches!(result, Err(ValueError::InvalidInteger { .. })));
        assert_eq!(value.value(), "0");
    }

    #[test]
    fn test_set_value_hex_is_normalised_to_lowercase() {
        let mut value = field("BYTE_ARRAY", 2);
        value.set_value(" BEEF\n").unwrap();
        assert_eq!(value.value(), "beef");
        assert_eq!(value.data(), &FieldData::Bytes(vec![0xbe, 0xef]));
    }

    #[test]
    fn test_set_value_checks_byte_sequence_width() {
        let mut value = field("BYTE_ARRAY", 2);
        assert_eq!(
            value.set_value("beefca"),
            Err(ValueError::WrongLength {
                expected: 2,
                actual: 3
            })
        );
        assert!(matches!(
            value.set_value("xyz"),
            Err(ValueError::InvalidHex { .. })
        ));
    }

    #[test]
    fn test_unknown_type_is_read_only() {
        let mut value = field("FLOAT_64", 8);
        assert_eq!(value.value(), "");
        assert!(matches!(value.set_value("1.5"), Err(ValueError::ReadOnly(_))));
        assert_eq!(value.data().byte_len(), 8);
    }

    #[test]
    fn test_display_value_truncates_long_values() {
        let mut value = field("BYTE_ARRAY", 32);
        value.set_value(&"ab".repeat(32)).unwrap();

        let shown = value.display_value();
        assert_eq!(shown, format!("{}...", "ab".repeat(20)));

        let mut short = field("BYTE_ARRAY", 25);
        short.set_value(&"cd".repeat(25)).unwrap();
        assert_eq!(short.display_value(), "cd".repeat(25));
    }

    #[test]
    fn test_fits_integer() {
        let value = field("UINT_8", 1);
        assert!(value.fits_integer(255));
        assert!(!value.fits_integer(256));
        assert!(!field("BYTE_ARRAY", 4).fits_integer(0));
    }
}
