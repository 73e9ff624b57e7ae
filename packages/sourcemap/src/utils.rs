/// Convert byte offset to line and column number
///
/// Both returned values are 0-indexed. Offsets past the end of the source
/// clamp to the last position.
pub fn byte_offset_to_line_col(source: &str, offset: usize) -> (u32, u32) {
    let mut line = 0;
    let mut col = 0;
    let mut byte_pos = 0;

    for ch in source.chars() {
        if byte_pos >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        byte_pos += ch.len_utf8();
    }

    (line, col)
}

/// Convert line and column (0-indexed) to byte offset
///
/// Returns `source.len()` when the position is out of bounds.
pub fn line_col_to_byte_offset(source: &str, target_line: u32, target_col: u32) -> usize {
    let mut line = 0;
    let mut col = 0;
    let mut byte_pos = 0;

    for ch in source.chars() {
        if line == target_line && col == target_col {
            return byte_pos;
        }

        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        byte_pos += ch.len_utf8();
    }

    source.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_byte_offset_to_line_col() {
        let source = "<template>\n<div/>\n</template>";

        assert_eq!(byte_offset_to_line_col(source, 0), (0, 0));
        assert_eq!(byte_offset_to_line_col(source, 11), (1, 0));
        assert_eq!(byte_offset_to_line_col(source, 14), (1, 3));
    }

    #[test]
    fn test_roundtrip() {
        let source = "<template>\n  <div>{{ count }}</div>\n</template>";
        let offset = 20;

        let (line, col) = byte_offset_to_line_col(source, offset);
        assert_eq!(line_col_to_byte_offset(source, line, col), offset);
    }

    #[test]
    fn test_unicode_handling() {
        let source = "日本語\ntext";
        assert_eq!(byte_offset_to_line_col(source, 10), (1, 0));
    }

    #[test]
    fn test_out_of_bounds() {
        let source = "short";
        assert_eq!(byte_offset_to_line_col(source, 1000), (0, 5));
        assert_eq!(line_col_to_byte_offset(source, 10, 0), source.len());
    }
}
