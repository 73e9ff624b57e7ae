//! Template compiler: turns parsed component templates into render
//! modules.
//!
//! The pipeline runs asset URL rewriting, binding-informed constant
//! reclassification, static hoisting, string flattening of large static
//! runs, and code generation with optional source maps. Parse errors are
//! collected into the result instead of aborting, so editor tooling gets
//! partial output from broken input.

pub mod asset_url;
pub mod bindings;
pub mod codegen;
pub mod error;
pub mod stringify;
pub mod transform;
pub mod usage;

pub use asset_url::{rewrite_asset_urls, AssetImport, AssetUrlOptions};
pub use bindings::{BindingKind, Bindings};
pub use codegen::{generate, CodegenOptions, CodegenOutput};
pub use error::{CompileError, CompileResult};
pub use stringify::{
    stringify_hoists, STRINGIFY_BINDING_THRESHOLD, STRINGIFY_NODE_THRESHOLD,
};
pub use transform::{hoist_static, HoistExpr, TransformContext};
pub use usage::{UsageCache, UsageIndex};

use willow_parser::ast::RootNode;

#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    pub filename: String,
    /// Scoped-style attribute token, e.g. `data-w-7ba5bd90`.
    pub scope_id: Option<String>,
    pub bindings: Bindings,
    pub source_map: bool,
    pub asset_urls: Option<AssetUrlOptions>,
}

#[derive(Debug)]
pub struct CompileOutput {
    pub code: String,
    pub map: Option<String>,
    /// The transformed tree, for tooling that inspects hoist marks.
    pub ast: Option<RootNode>,
    pub hoists: Vec<HoistExpr>,
    pub imports: Vec<AssetImport>,
    pub errors: Vec<CompileError>,
}

/// Compile one template to a render module.
pub fn compile_template(source: &str, options: CompileOptions) -> CompileOutput {
    let mut errors = Vec::new();

    let mut root = match willow_parser::parse_with_path(source, &options.filename) {
        Ok(root) => root,
        Err(err) => {
            errors.push(CompileError::from(err));
            return CompileOutput {
                code: String::new(),
                map: None,
                ast: None,
                hoists: Vec::new(),
                imports: Vec::new(),
                errors,
            };
        }
    };

    let mut ctx = TransformContext::new(options.bindings.clone(), options.scope_id.clone());

    let asset_options = options.asset_urls.clone().unwrap_or_default();
    ctx.imports = rewrite_asset_urls(&mut root, &asset_options);

    transform::reclassify_constants(&mut root, &ctx.bindings);
    hoist_static(&mut root, &mut ctx);
    stringify_hoists(&mut root, &mut ctx);

    tracing::debug!(
        file = %options.filename,
        hoists = ctx.hoists.len(),
        imports = ctx.imports.len(),
        "template transformed"
    );

    let generated = generate(
        &root,
        &ctx,
        source,
        &CodegenOptions {
            filename: options.filename.clone(),
            source_map: options.source_map,
        },
    );
    let (code, map) = match generated {
        Ok(output) => (output.code, output.map),
        Err(err) => {
            errors.push(err);
            (String::new(), None)
        }
    };

    CompileOutput {
        code,
        map,
        ast: Some(root),
        hoists: ctx.hoists,
        imports: ctx.imports,
        errors,
    }
}
