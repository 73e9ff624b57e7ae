use sourcemap::{SourceMap as ExternalSourceMap, SourceMapBuilder as ExternalBuilder};

/// Builder for generating source maps during template compilation
pub struct SourceMapBuilder {
    builder: ExternalBuilder,
    #[allow(dead_code)]
    source_file: String,
    current_line: u32,
    current_col: u32,
}

impl SourceMapBuilder {
    /// Create a new source map builder
    ///
    /// # Arguments
    /// * `source_file` - The original component file path
    /// * `source_content` - The original component file content
    pub fn new(source_file: &str, source_content: &str) -> Self {
        let mut builder = ExternalBuilder::new(None);

        let source_id = builder.add_source(source_file);
        builder.set_source_contents(source_id, Some(source_content));

        Self {
            builder,
            source_file: source_file.to_string(),
            current_line: 0,
            current_col: 0,
        }
    }

    /// Add a mapping from generated position to source position
    ///
    /// All positions are 0-indexed. `name` is an optional symbol name
    /// (e.g. a component or hoist identifier).
    pub fn add_mapping(
        &mut self,
        gen_line: u32,
        gen_col: u32,
        src_line: u32,
        src_col: u32,
        name: Option<&str>,
    ) {
        let name_id = name.map(|n| self.builder.add_name(n));

        self.builder.add_raw(
            gen_line,
            gen_col,
            src_line,
            src_col,
            Some(0), // source index (always 0 since we have one source file)
            name_id,
            false, // is_range
        );
    }

    /// Add a mapping at the current generated position.
    pub fn map_here(&mut self, src_line: u32, src_col: u32, name: Option<&str>) {
        let (line, col) = self.current_position();
        self.add_mapping(line, col, src_line, src_col, name);
    }

    /// Track position advancement as we emit generated code
    ///
    /// Call this after appending text to the output buffer to keep
    /// track of the current position in the generated file.
    pub fn advance(&mut self, text: &str) {
        for ch in text.chars() {
            if ch == '\n' {
                self.current_line += 1;
                self.current_col = 0;
            } else {
                self.current_col += 1;
            }
        }
    }

    /// Get the current position in the generated output
    pub fn current_position(&self) -> (u32, u32) {
        (self.current_line, self.current_col)
    }

    /// Build the final source map
    pub fn build(self) -> ExternalSourceMap {
        self.builder.into_sourcemap()
    }

    /// Convert to JSON string
    pub fn to_json(self) -> Result<String, sourcemap::Error> {
        let map = self.build();
        let mut buf = Vec::new();
        map.to_writer(&mut buf)?;
        Ok(String::from_utf8(buf).expect("source map JSON is valid UTF-8"))
    }
}
