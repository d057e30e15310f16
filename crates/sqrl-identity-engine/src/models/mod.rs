pub mod block;
pub mod document;
pub mod field;
pub mod format;
pub mod ids;

pub use block::Block;
pub use document::{Direction, Document, ModelError};
pub use field::{FieldData, FieldValue, ValueError};
pub use format::format_document;
pub use ids::{BlockId, ItemId};
