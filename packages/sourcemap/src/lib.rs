//! Source map utilities for the Willow compiler
//!
//! Provides the builder used while emitting render code and the block
//! remapper that shifts template-relative positions back into the
//! original multi-block component file.

pub mod builder;
pub mod remap;
pub mod utils;

pub use builder::SourceMapBuilder;
pub use remap::{remap_block, BlockOffset};
pub use utils::{byte_offset_to_line_col, line_col_to_byte_offset};
