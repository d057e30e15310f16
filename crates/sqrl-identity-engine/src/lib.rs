pub mod codec;
pub mod io;
pub mod models;
pub mod schema;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use codec::{CodecError, Decoded, FormatError, IdentityCodec, Transport, encode, encode_with};
pub use io::*;
pub use models::{
    Block, BlockId, Direction, Document, FieldData, FieldValue, ItemId, ModelError, ValueError,
    format_document,
};
pub use schema::{
    BlockSchema, BuiltinSchemaSource, DirectorySchemaSource, FieldDescriptor, FieldType,
    FieldWidth, LayeredSchemaSource, MemorySchemaSource, SchemaError, SchemaResolver, SchemaSource,
};
