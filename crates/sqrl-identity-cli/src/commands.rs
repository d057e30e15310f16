//! The work behind each subcommand.
//!
//! Positions given on the command line are turned into block and item ids once,
//! then every change goes through the document's id-based operations.

use anyhow::{Context, Result, bail};
use sqrl_identity_engine::{
    BlockId, Direction, Document, IdentityCodec, ItemId, SchemaResolver, SchemaSource, Transport,
    format_document, io,
};
use std::io::Write;
use std::path::Path;

pub fn dump<S: SchemaSource>(
    codec: &IdentityCodec<S>,
    file: &Path,
    out: &mut impl Write,
) -> Result<()> {
    let decoded = io::load_from_path(codec, file)?;
    if decoded.document.is_empty() {
        writeln!(out, "No blocks")?;
    } else {
        write!(out, "{}", format_document(&decoded.document))?;
    }
    Ok(())
}

pub fn convert<S: SchemaSource>(
    codec: &IdentityCodec<S>,
    input: &Path,
    output: &Path,
    transport: Transport,
) -> Result<()> {
    let mut document = io::load_from_path(codec, input)?.document;
    io::save_to_path(&mut document, output, transport)?;
    Ok(())
}

/// Load `file`, apply `change`, and write the result in the file's own transport
pub fn edit<S, F>(
    codec: &IdentityCodec<S>,
    file: &Path,
    output: Option<&Path>,
    change: F,
) -> Result<()>
where
    S: SchemaSource,
    F: FnOnce(&mut Document) -> Result<()>,
{
    let decoded = io::load_from_path(codec, file)?;
    let mut document = decoded.document;

    change(&mut document)?;

    if !document.is_dirty() {
        log::info!("Nothing changed, {} left as it was", file.display());
        return Ok(());
    }
    io::save_to_path(&mut document, output.unwrap_or(file), decoded.transport)?;
    Ok(())
}

pub fn delete_block(document: &mut Document, block: usize) -> Result<()> {
    let id = block_id(document, block)?;
    document.delete_block(id);
    Ok(())
}

pub fn move_block(document: &mut Document, block: usize, direction: Direction) -> Result<()> {
    let id = block_id(document, block)?;
    if !document.move_block(id, direction) {
        bail!("Block {block} cannot move {direction:?}");
    }
    Ok(())
}

/// Remove an item and rewrite the block's length to match
pub fn delete_item(document: &mut Document, block: usize, item: usize) -> Result<()> {
    let (block_id, item_id) = item_id(document, block, item)?;
    if document.delete_item(block_id, item_id).is_some() {
        document.sync_framing(block_id)?;
    }
    Ok(())
}

/// Change an item's value, rewriting the block's length if the value's width changed
pub fn set_value(document: &mut Document, block: usize, item: usize, value: &str) -> Result<()> {
    let (block_id, item_id) = item_id(document, block, item)?;
    let before = document.blocks()[block].encoded_len();
    document
        .set_item_value(block_id, item_id, value)
        .with_context(|| format!("Cannot set item {item} of block {block}"))?;
    if document.blocks()[block].encoded_len() != before {
        document.sync_framing(block_id)?;
    }
    Ok(())
}

/// Insert a zero-valued block with its length and type filled in
pub fn add_block<S: SchemaSource>(
    resolver: &SchemaResolver<S>,
    document: &mut Document,
    block_type: u16,
    after: Option<usize>,
) -> Result<()> {
    let after = after.map(|index| block_id(document, index)).transpose()?;
    let block = resolver
        .create_empty(block_type)?
        .with_context(|| format!("No schema registered for block type {block_type}"))?;

    let id = match after {
        Some(after) => document.insert_block(Some(after), block)?,
        None => document.push_block(block)?,
    };
    document.sync_framing(id)?;
    Ok(())
}

pub fn types<S: SchemaSource>(resolver: &SchemaResolver<S>, out: &mut impl Write) -> Result<()> {
    for block_type in resolver.known_types() {
        match resolver.registered(block_type) {
            Some(schema) => writeln!(out, "{block_type}: {}", schema.description)?,
            None => writeln!(out, "{block_type}: (unreadable schema)")?,
        }
    }
    Ok(())
}

fn block_id(document: &Document, index: usize) -> Result<BlockId> {
    document
        .blocks()
        .get(index)
        .map(|block| block.id())
        .with_context(|| {
            format!(
                "No block at position {index}, the identity has {} blocks",
                document.len()
            )
        })
}

fn item_id(document: &Document, block: usize, item: usize) -> Result<(BlockId, ItemId)> {
    let block_id = block_id(document, block)?;
    let items = document.blocks()[block].items();
    let item_id = items.get(item).map(|item| item.id()).with_context(|| {
        format!(
            "No item at position {item} in block {block}, which has {} items",
            items.len()
        )
    })?;
    Ok((block_id, item_id))
}
