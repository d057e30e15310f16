use std::collections::HashSet;

use crate::codec;
use crate::models::{BlockId, FieldValue, ItemId, ModelError};

/// One decoded block of an identity.
///
/// The block owns its field values. Its length and type framing are ordinary
/// fields like any other; see [`Block::sync_framing`].
///
/// `clone` keeps every id, so a clone stands for the same block. Use
/// [`Block::duplicate`] for an independent copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    id: BlockId,
    block_type: u16,
    description: String,
    color: String,
    items: Vec<FieldValue>,
}

impl Block {
    /// Build a block from its items. An item whose id repeats an earlier one
    /// is given a fresh id.
    pub fn new(
        block_type: u16,
        description: impl Into<String>,
        color: impl Into<String>,
        mut items: Vec<FieldValue>,
    ) -> Self {
        let mut seen = HashSet::with_capacity(items.len());
        for item in &mut items {
            if !seen.insert(item.id()) {
                item.renew_id();
                seen.insert(item.id());
            }
        }

        Self {
            id: BlockId::new(),
            block_type,
            description: description.into(),
            color: color.into(),
            items,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    /// A copy with the same contents and new block and item ids
    pub fn duplicate(&self) -> Self {
        let mut copy = self.clone();
        copy.id = BlockId::new();
        copy.items.iter_mut().for_each(FieldValue::renew_id);
        copy
    }

    pub fn block_type(&self) -> u16 {
        self.block_type
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Display colour from the block's schema
    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn items(&self) -> &[FieldValue] {
        &self.items
    }

    pub fn item(&self, id: ItemId) -> Option<&FieldValue> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Current position of an item, looked up by identity
    pub fn item_position(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| item.id() == id)
    }

    /// Remove an item, returning it if it was present
    pub fn delete_item(&mut self, id: ItemId) -> Option<FieldValue> {
        let index = self.item_position(id)?;
        Some(self.items.remove(index))
    }

    pub fn set_item_value(&mut self, id: ItemId, text: &str) -> Result<(), ModelError> {
        let item = self
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or(ModelError::ItemNotFound(id))?;
        item.set_value(text)?;
        Ok(())
    }

    /// Serialize the block's fields in order
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode_block(self)
    }

    /// Number of bytes [`Self::to_bytes`] produces
    pub fn encoded_len(&self) -> usize {
        self.items.iter().map(|item| item.data().byte_len()).sum()
    }

    /// Rewrite the leading length and type fields from the current field data.
    ///
    /// The encoder never touches framing on its own, so an editor that changes
    /// the size of a block calls this before saving. Returns false, changing
    /// nothing, when the block does not start with two integer fields or the
    /// values do not fit them.
    pub fn sync_framing(&mut self) -> bool {
        let length = self.encoded_len();
        let block_type = u32::from(self.block_type);

        let [length_field, type_field, ..] = self.items.as_mut_slice() else {
            return false;
        };
        let Ok(length) = u32::try_from(length) else {
            return false;
        };
        if !length_field.fits_integer(length) || !type_field.fits_integer(block_type) {
            return false;
        }

        length_field.set_integer(length);
        type_field.set_integer(block_type);
        true
    }
}
