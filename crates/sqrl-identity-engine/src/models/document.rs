use thiserror::Error;

use crate::codec;
use crate::models::{Block, BlockId, FieldValue, ItemId, ValueError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("Block {0} not found")]
    BlockNotFound(BlockId),

    #[error("Item {0} not found")]
    ItemNotFound(ItemId),

    #[error("Block {0} is already in the document")]
    DuplicateBlock(BlockId),

    #[error(transparent)]
    Value(#[from] ValueError),
}

/// Direction for [`Document::move_block`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// An identity: the ordered blocks of one file.
///
/// Blocks and items are addressed by [`BlockId`] and [`ItemId`]. Every
/// operation looks its target up at call time, so ids held by an editor stay
/// valid while other blocks move around them.
///
/// The document carries no locking. Hosts that share one between threads wrap
/// it in their own `Mutex`.
#[derive(Debug, Clone, Default)]
pub struct Document {
    blocks: Vec<Block>,
    dirty: bool,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clean document holding freshly decoded blocks
    pub(crate) fn from_blocks(blocks: Vec<Block>) -> Self {
        Self {
            blocks,
            dirty: false,
        }
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn block(&self, id: BlockId) -> Option<&Block> {
        self.blocks.iter().find(|block| block.id() == id)
    }

    /// Current position of a block, looked up by identity
    pub fn position(&self, id: BlockId) -> Option<usize> {
        self.blocks.iter().position(|block| block.id() == id)
    }

    pub fn item(&self, block_id: BlockId, item_id: ItemId) -> Option<&FieldValue> {
        self.block(block_id)?.item(item_id)
    }

    /// Whether the document changed since it was decoded or last saved
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Append a block.
    ///
    /// A block whose id is already present is refused; use
    /// [`Block::duplicate`] to add a copy.
    pub fn push_block(&mut self, block: Block) -> Result<BlockId, ModelError> {
        let id = self.check_new(&block)?;
        self.blocks.push(block);
        self.dirty = true;
        Ok(id)
    }

    /// Insert a block after `after`, or at the front when `after` is `None`
    pub fn insert_block(
        &mut self,
        after: Option<BlockId>,
        block: Block,
    ) -> Result<BlockId, ModelError> {
        self.check_new(&block)?;
        let index = match after {
            Some(after) => self.position(after).ok_or(ModelError::BlockNotFound(after))? + 1,
            None => 0,
        };

        let id = block.id();
        self.blocks.insert(index, block);
        self.dirty = true;
        Ok(id)
    }

    /// Remove a block, returning it if it was present
    pub fn delete_block(&mut self, id: BlockId) -> Option<Block> {
        let index = self.position(id)?;
        self.dirty = true;
        Some(self.blocks.remove(index))
    }

    /// Swap a block with its neighbour.
    ///
    /// Returns false, leaving the order untouched, when the block is already at
    /// that edge, is not in the document, or there is nothing to swap with.
    pub fn move_block(&mut self, id: BlockId, direction: Direction) -> bool {
        if self.blocks.len() < 2 {
            return false;
        }
        let Some(index) = self.position(id) else {
            return false;
        };

        let swap_with = match direction {
            Direction::Up if index == 0 => return false,
            Direction::Up => index - 1,
            Direction::Down if index + 1 == self.blocks.len() => return false,
            Direction::Down => index + 1,
        };

        self.blocks.swap(index, swap_with);
        self.dirty = true;
        true
    }

    /// Remove an item from a block, returning it if both were present
    pub fn delete_item(&mut self, block_id: BlockId, item_id: ItemId) -> Option<FieldValue> {
        let removed = self.block_mut(block_id)?.delete_item(item_id)?;
        self.dirty = true;
        Some(removed)
    }

    /// Replace an item's value from its canonical text form
    pub fn set_item_value(
        &mut self,
        block_id: BlockId,
        item_id: ItemId,
        text: &str,
    ) -> Result<(), ModelError> {
        self.block_mut(block_id)
            .ok_or(ModelError::BlockNotFound(block_id))?
            .set_item_value(item_id, text)?;
        self.dirty = true;
        Ok(())
    }

    /// Recompute a block's length and type fields, see [`Block::sync_framing`]
    pub fn sync_framing(&mut self, block_id: BlockId) -> Result<bool, ModelError> {
        let synced = self
            .block_mut(block_id)
            .ok_or(ModelError::BlockNotFound(block_id))?
            .sync_framing();
        if synced {
            self.dirty = true;
        }
        Ok(synced)
    }

    /// Serialize with the binary header
    pub fn to_bytes(&self) -> Vec<u8> {
        codec::encode(self)
    }

    fn check_new(&self, block: &Block) -> Result<BlockId, ModelError> {
        let id = block.id();
        match self.position(id) {
            Some(_) => Err(ModelError::DuplicateBlock(id)),
            None => Ok(id),
        }
    }

    fn block_mut(&mut self, id: BlockId) -> Option<&mut Block> {
        self.blocks.iter_mut().find(|block| block.id() == id)
    }
}
