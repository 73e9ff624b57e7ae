use sourcemap::{SourceMap, SourceMapBuilder};

/// Where a block (template, script, style) sits inside its multi-block
/// component file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockOffset {
    /// 0-indexed line of the block's first content line in the file.
    pub line: u32,
    /// Column offset applied to positions on the block's first line only;
    /// later lines start at column 0 of the file.
    pub column: u32,
}

/// Re-map a source map produced against a single block's content so its
/// source positions point back into the full multi-block component file.
///
/// Generated positions are untouched; every original position is shifted
/// by the block offset. Source names and contents carry over.
pub fn remap_block(map: &SourceMap, file: &str, file_content: &str, offset: BlockOffset) -> SourceMap {
    let mut builder = SourceMapBuilder::new(None);
    let source_id = builder.add_source(file);
    builder.set_source_contents(source_id, Some(file_content));

    for token in map.tokens() {
        let src_line = token.get_src_line() + offset.line;
        let src_col = if token.get_src_line() == 0 {
            token.get_src_col() + offset.column
        } else {
            token.get_src_col()
        };
        let name_id = token.get_name().map(|n| builder.add_name(n));
        builder.add_raw(
            token.get_dst_line(),
            token.get_dst_col(),
            src_line,
            src_col,
            Some(source_id),
            name_id,
            false,
        );
    }

    builder.into_sourcemap()
}
