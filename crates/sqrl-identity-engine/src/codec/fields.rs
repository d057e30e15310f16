//! Per-field decoding and encoding of a single block.
//!
//! Offsets are measured from the start of the block, so the block's length and
//! type framing are the first two fields of every schema.

use crate::codec::{CodecError, FormatError};
use crate::models::{Block, FieldData, FieldValue};
use crate::schema::{BlockSchema, FieldDescriptor, FieldType, FieldWidth, SchemaError};

/// Decode one block's bytes (framing included) against its schema
pub(crate) fn decode_block(
    block_type: u16,
    data: &[u8],
    schema: &BlockSchema,
) -> Result<Block, CodecError> {
    let items = walk_schema::<CodecError, _>(schema, |descriptor, width, offset, items| {
        let len = match width {
            FieldWidth::Fixed(len) => len,
            FieldWidth::Remaining => remaining_width(descriptor, offset, items)?,
        };
        let raw = offset
            .checked_add(len)
            .and_then(|end| data.get(offset..end))
            .ok_or_else(|| FormatError::FieldOverrun {
                field: descriptor.name.clone(),
                offset,
                width: len,
                block_len: data.len(),
            })?;
        Ok(decode_value(&descriptor.field_type, raw))
    })?;

    Ok(Block::new(
        block_type,
        schema.description.clone(),
        schema.color.clone(),
        items,
    ))
}

/// A zero-valued block built from the schema alone.
///
/// Repeat counts read zero from their source fields, and remaining-bytes
/// fields start out empty.
pub(crate) fn empty_block(block_type: u16, schema: &BlockSchema) -> Result<Block, SchemaError> {
    let items = walk_schema::<SchemaError, _>(schema, |descriptor, width, _, _| {
        let len = match width {
            FieldWidth::Fixed(len) => len,
            FieldWidth::Remaining => 0,
        };
        Ok(FieldData::zeroed(&descriptor.field_type, len))
    })?;

    Ok(Block::new(
        block_type,
        schema.description.clone(),
        schema.color.clone(),
        items,
    ))
}

/// Append the wire form of a field to `out`
pub(crate) fn encode_value(data: &FieldData, out: &mut Vec<u8>) {
    match data {
        FieldData::U8(v) => out.push(*v),
        FieldData::U16(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldData::U32(v) => out.extend_from_slice(&v.to_le_bytes()),
        FieldData::Bytes(bytes) | FieldData::Opaque(bytes) => out.extend_from_slice(bytes),
    }
}

/// Walk a schema in order, expanding repeats, and collect the produced values.
///
/// `produce` receives the descriptor, its checked width, the running offset and
/// the values produced so far. The offset advances by the byte length of each
/// produced value.
fn walk_schema<E, F>(schema: &BlockSchema, mut produce: F) -> Result<Vec<FieldValue>, E>
where
    E: From<SchemaError>,
    F: FnMut(&FieldDescriptor, FieldWidth, usize, &[FieldValue]) -> Result<FieldData, E>,
{
    let mut items: Vec<FieldValue> = Vec::with_capacity(schema.fields.len());
    let mut offset = 0usize;

    for descriptor in &schema.fields {
        let count = repeat_count(descriptor, &items)?;
        if count > 1 && matches!(descriptor.width, FieldWidth::Remaining | FieldWidth::Fixed(0)) {
            return Err(SchemaError::UnboundedRepeat {
                field: descriptor.name.clone(),
                count,
            }
            .into());
        }

        for _ in 0..count {
            let width = descriptor.checked_width()?;
            let data = produce(descriptor, width, offset, &items)?;
            offset += data.byte_len();
            items.push(FieldValue::new(descriptor, data));
        }
    }

    Ok(items)
}

/// How many times a field repeats.
///
/// A `repeat_index` beyond the values decoded so far counts as no repeat.
fn repeat_count(descriptor: &FieldDescriptor, items: &[FieldValue]) -> Result<u32, SchemaError> {
    let Some(index) = descriptor.repeat_index else {
        return Ok(1);
    };
    let Some(source) = items.get(index) else {
        return Ok(1);
    };
    source
        .as_integer()
        .ok_or_else(|| SchemaError::RepeatSourceNotInteger {
            field: descriptor.name.clone(),
            index,
        })
}

/// Width of a remaining-bytes field: the block length held in the first field
/// minus the bytes already consumed.
fn remaining_width(
    descriptor: &FieldDescriptor,
    offset: usize,
    items: &[FieldValue],
) -> Result<usize, CodecError> {
    let length = items
        .first()
        .and_then(FieldValue::as_integer)
        .ok_or_else(|| SchemaError::RemainingWithoutLength {
            field: descriptor.name.clone(),
        })? as usize;

    length.checked_sub(offset).ok_or_else(|| {
        FormatError::RemainingUnderflow {
            field: descriptor.name.clone(),
            offset,
            length,
        }
        .into()
    })
}

/// Interpret raw bytes whose length already matches the type's width
fn decode_value(field_type: &FieldType, raw: &[u8]) -> FieldData {
    match field_type {
        FieldType::U8 => FieldData::U8(raw[0]),
        FieldType::U16 => FieldData::U16(u16::from_le_bytes([raw[0], raw[1]])),
        FieldType::U32 => FieldData::U32(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])),
        FieldType::ByteSequence => FieldData::Bytes(raw.to_vec()),
        FieldType::Unknown(_) => FieldData::Opaque(raw.to_vec()),
    }
}
