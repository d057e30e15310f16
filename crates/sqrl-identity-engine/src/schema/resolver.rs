use std::borrow::Cow;

use super::{BlockSchema, FieldWidth, SchemaError, SchemaSource};
use crate::codec::fields;
use crate::models::Block;

/// The schema chosen for a block type
#[derive(Debug, Clone)]
pub struct Resolution<'a> {
    pub schema: Cow<'a, BlockSchema>,
    /// True when no schema was registered and the unknown-block schema was used
    pub is_fallback: bool,
}

/// Maps block types to schemas, falling back to the unknown-block schema.
///
/// The fallback is loaded once, when the resolver is built. Registered schemas
/// are fetched from the source on every lookup so that edits to a schema
/// directory are picked up without restarting.
#[derive(Debug)]
pub struct SchemaResolver<S> {
    source: S,
    fallback: BlockSchema,
}

impl<S: SchemaSource> SchemaResolver<S> {
    pub fn new(source: S) -> Result<Self, SchemaError> {
        let json = source.fetch_unknown_fallback()?;
        let fallback = BlockSchema::from_json(&json)
            .map_err(|e| SchemaError::FallbackUnavailable(e.to_string()))?;
        check_fallback(&fallback)?;
        Ok(Self { source, fallback })
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn fallback(&self) -> &BlockSchema {
        &self.fallback
    }

    /// The registered schema for a block type.
    ///
    /// A schema that fails to parse counts as not registered.
    pub fn registered(&self, block_type: u16) -> Option<BlockSchema> {
        let json = self.source.fetch(block_type)?;
        match BlockSchema::from_json(&json) {
            Ok(schema) => Some(schema),
            Err(e) => {
                log::warn!("Ignoring malformed schema for block type {block_type}: {e}");
                None
            }
        }
    }

    pub fn resolve(&self, block_type: u16) -> Resolution<'_> {
        match self.registered(block_type) {
            Some(schema) => Resolution {
                schema: Cow::Owned(schema),
                is_fallback: false,
            },
            None => {
                log::debug!("No schema for block type {block_type}, using unknown-block schema");
                Resolution {
                    schema: Cow::Borrowed(&self.fallback),
                    is_fallback: true,
                }
            }
        }
    }

    /// A zero-valued block of a registered type, or `None` if the type has no
    /// registered schema
    pub fn create_empty(&self, block_type: u16) -> Result<Option<Block>, SchemaError> {
        self.registered(block_type)
            .map(|schema| fields::empty_block(block_type, &schema))
            .transpose()
    }

    /// Block types with a registered schema
    pub fn known_types(&self) -> Vec<u16> {
        self.source.known_types()
    }
}

/// The unknown-block schema must capture every byte of any block: valid field
/// widths, a leading integer length and a trailing remaining-width field.
fn check_fallback(schema: &BlockSchema) -> Result<(), SchemaError> {
    for field in &schema.fields {
        field.checked_width().map_err(|e| {
            SchemaError::FallbackUnavailable(format!("unknown-block schema: {e}"))
        })?;
    }

    let (Some(first), Some(last)) = (schema.fields.first(), schema.fields.last()) else {
        return Err(SchemaError::FallbackUnavailable(
            "unknown-block schema has no fields".to_string(),
        ));
    };
    if !first.field_type.is_integer() || first.repeat_index.is_some() {
        return Err(SchemaError::FallbackUnavailable(format!(
            "unknown-block schema must start with an integer length field, not '{}'",
            first.name
        )));
    }
    if schema.fields.len() < 2 || last.width != FieldWidth::Remaining || last.repeat_index.is_some()
    {
        return Err(SchemaError::FallbackUnavailable(format!(
            "unknown-block schema must end with a remaining-bytes field, not '{}'",
            last.name
        )));
    }
    Ok(())
}
