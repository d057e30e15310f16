use crate::models::Document;

/// Render a document as indented text, one line per block and per item.
///
/// Positions are the ones the CLI accepts as block and item arguments.
pub fn format_document(document: &Document) -> String {
    let mut out = String::new();
    for (index, block) in document.blocks().iter().enumerate() {
        out.push_str(&format!(
            "[{index}] {} (type {})\n",
            block.description(),
            block.block_type()
        ));
        for (item_index, item) in block.items().iter().enumerate() {
            let line = format!(
                "  [{item_index}] {} ({}): {}",
                item.name(),
                item.field_type(),
                item.display_value()
            );
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }
    out
}
