//! Render module emission.
//!
//! Emits the hoist declarations the transform produced, then a render
//! function returning the tree. Stringified slots become static-node
//! calls carrying their serialized markup and hydration count; merged
//! slots emit `null` so hoist indices line up with what the transform
//! recorded.

use willow_parser::ast::{
    CompoundChild, ElementKind, ElementNode, Expression, Node, Prop, RootNode, SimpleExpression,
};
use willow_sourcemap::{byte_offset_to_line_col, SourceMapBuilder};

use crate::error::{CompileError, CompileResult};
use crate::transform::{HoistExpr, TransformContext};

#[derive(Debug, Clone, Default)]
pub struct CodegenOptions {
    pub filename: String,
    pub source_map: bool,
}

#[derive(Debug)]
pub struct CodegenOutput {
    pub code: String,
    /// Source map JSON, when requested.
    pub map: Option<String>,
}

pub fn generate(
    root: &RootNode,
    ctx: &TransformContext,
    source: &str,
    options: &CodegenOptions,
) -> CompileResult<CodegenOutput> {
    let mut gen = Generator {
        out: String::new(),
        map: options
            .source_map
            .then(|| SourceMapBuilder::new(&options.filename, source)),
        source,
        ctx,
    };
    gen.emit_module(root)?;

    let map = match gen.map {
        Some(builder) => Some(
            builder
                .to_json()
                .map_err(|e| CompileError::SourceMap(e.to_string()))?,
        ),
        None => None,
    };
    Ok(CodegenOutput { code: gen.out, map })
}

struct Generator<'a> {
    out: String,
    map: Option<SourceMapBuilder>,
    source: &'a str,
    ctx: &'a TransformContext,
}

impl<'a> Generator<'a> {
    fn push(&mut self, text: &str) {
        self.out.push_str(text);
        if let Some(map) = &mut self.map {
            map.advance(text);
        }
    }

    fn map_span(&mut self, offset: usize, name: Option<&str>) {
        if let Some(map) = &mut self.map {
            let (line, col) = byte_offset_to_line_col(self.source, offset);
            map.map_here(line, col, name);
        }
    }

    fn emit_module(&mut self, root: &RootNode) -> CompileResult<()> {
        // Pull the shared reference out so iterating hoists and imports
        // does not hold a borrow of `self` across emit calls.
        let ctx = self.ctx;
        for import in &ctx.imports {
            self.push(&format!(
                "import {} from {}\n",
                import.identifier,
                json_string(&import.path)
            ));
        }
        if !ctx.imports.is_empty() {
            self.push("\n");
        }

        for (i, hoist) in ctx.hoists.iter().enumerate() {
            self.push(&format!("const _hoisted_{} = ", i + 1));
            match hoist {
                HoistExpr::VNodeCall(el) => {
                    self.map_span(el.span.start, Some(&el.tag));
                    self.emit_element(el, true);
                }
                HoistExpr::StaticHtml { html, count } => {
                    self.push(&format!(
                        "_createStaticVNode({}, {})",
                        json_string(html),
                        count
                    ));
                }
                HoistExpr::Placeholder => self.push("null"),
            }
            self.push("\n");
        }
        if !ctx.hoists.is_empty() {
            self.push("\n");
        }

        self.push("export function render(_ctx) {\n  return ");
        match root.children.len() {
            0 => self.push("null"),
            1 => self.emit_node(&root.children[0]),
            _ => {
                self.push("[");
                for (i, child) in root.children.iter().enumerate() {
                    if i > 0 {
                        self.push(", ");
                    }
                    self.emit_node(child);
                }
                self.push("]");
            }
        }
        self.push("\n}\n");
        Ok(())
    }

    fn emit_node(&mut self, node: &Node) {
        match node {
            Node::Element(el) => {
                if let Some(hoist) = el.codegen {
                    self.push(&format!("_hoisted_{}", hoist.index + 1));
                } else {
                    self.map_span(el.span.start, Some(&el.tag));
                    self.emit_element(el, false);
                }
            }
            Node::Text(text) => self.push(&json_string(&text.content)),
            Node::Comment(comment) => {
                self.push(&format!("_createCommentVNode({})", json_string(&comment.content)))
            }
            Node::Interpolation(interp) => {
                self.map_span(interp.span.start, None);
                self.push("_toDisplayString(");
                self.emit_expression(&interp.content);
                self.push(")");
            }
            Node::Compound(compound) => {
                for (i, child) in compound.children.iter().enumerate() {
                    if i > 0 {
                        self.push(" + ");
                    }
                    match child {
                        CompoundChild::Text(t) => self.push(&json_string(t)),
                        CompoundChild::Interpolation(interp) => {
                            self.push("_toDisplayString(");
                            self.emit_expression(&interp.content);
                            self.push(")");
                        }
                        CompoundChild::Expression(e) => self.emit_expression(e),
                    }
                }
            }
            Node::TextCall(call) => self.emit_node(&call.content),
        }
    }

    /// `hoisted` subtrees are inlined recursively; nothing below a hoist
    /// slot references another slot.
    fn emit_element(&mut self, el: &ElementNode, hoisted: bool) {
        match el.kind {
            ElementKind::Component => {
                self.push(&format!(
                    "_createVNode(_resolveComponent({})",
                    json_string(&el.tag)
                ));
            }
            ElementKind::Slot => {
                self.push("_renderSlot(_ctx.$slots, \"default\"");
            }
            _ => {
                self.push(&format!("_createElementVNode({}", json_string(&el.tag)));
            }
        }

        self.push(", ");
        self.emit_props(el);

        if el.children.is_empty() {
            self.push(")");
            return;
        }
        self.push(", [");
        for (i, child) in el.children.iter().enumerate() {
            if i > 0 {
                self.push(", ");
            }
            if hoisted {
                // Children of a hoisted tree carry no slot refs of their
                // own; emit them structurally.
                match child {
                    Node::Element(inner) => self.emit_element(inner, true),
                    other => self.emit_node(other),
                }
            } else {
                self.emit_node(child);
            }
        }
        self.push("])");
    }

    fn emit_props(&mut self, el: &ElementNode) {
        if el.props.is_empty() {
            self.push("null");
            return;
        }
        self.push("{ ");
        let mut first = true;
        for prop in &el.props {
            let entry_emitted = match prop {
                Prop::Attribute(attr) => {
                    if !first {
                        self.push(", ");
                    }
                    self.push(&json_string(&attr.name));
                    self.push(": ");
                    match &attr.value {
                        Some(value) => self.push(&json_string(value)),
                        None => self.push("\"\""),
                    }
                    true
                }
                Prop::Directive(directive) => match directive.static_arg() {
                    Some(arg) => {
                        if !first {
                            self.push(", ");
                        }
                        let key = if directive.name == "on" {
                            format!("on{}", capitalize_ascii(arg))
                        } else {
                            arg.to_string()
                        };
                        self.push(&json_string(&key));
                        self.push(": ");
                        match &directive.exp {
                            Some(Expression::Simple(exp)) => self.emit_expression(exp),
                            Some(Expression::Compound(_)) | None => self.push("undefined"),
                        }
                        true
                    }
                    None => false,
                },
            };
            if entry_emitted {
                first = false;
            }
        }
        self.push(" }");
    }

    /// Bare identifiers naming a reactive box read through `.value`;
    /// everything else passes through as written.
    fn emit_expression(&mut self, exp: &SimpleExpression) {
        let content = exp.content.trim();
        if is_bare_identifier(content) && self.ctx.bindings.needs_value_unwrap(content) {
            self.push(&format!("{}.value", content));
        } else {
            self.push(content);
        }
    }
}

fn is_bare_identifier(content: &str) -> bool {
    let mut chars = content.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' || first == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

fn capitalize_ascii(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

fn json_string(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::{BindingKind, Bindings};
    use crate::stringify::stringify_hoists;
    use crate::transform::{hoist_static, TransformContext};
    use willow_parser::parse;

    fn generate_code(source: &str, bindings: Bindings) -> String {
        let mut root = parse(source).unwrap();
        let mut ctx = TransformContext::new(bindings, None);
        crate::transform::reclassify_constants(&mut root, &ctx.bindings.clone());
        hoist_static(&mut root, &mut ctx);
        stringify_hoists(&mut root, &mut ctx);
        generate(&root, &ctx, source, &CodegenOptions::default())
            .unwrap()
            .code
    }

    #[test]
    fn test_hoist_declarations_emitted_in_order() {
        let code = generate_code(
            "<div><span>a</span><span>b</span><p>{{ x }}</p></div>",
            Bindings::new(),
        );
        assert!(code.contains("const _hoisted_1 = _createElementVNode(\"span\""));
        assert!(code.contains("const _hoisted_2 = _createElementVNode(\"span\""));
        assert!(code.contains("_hoisted_1, _hoisted_2"));
    }

    #[test]
    fn test_static_html_slot_and_placeholders() {
        let spans: String = (0..5)
            .map(|i| format!(r#"<span :class="'c{}'">x</span>"#, i))
            .collect();
        let code = generate_code(&format!("<div>{}</div>", spans), Bindings::new());

        assert!(code.contains("const _hoisted_1 = _createStaticVNode(\"<span class="));
        assert!(code.contains(", 5)"));
        for i in 2..=5 {
            assert!(code.contains(&format!("const _hoisted_{} = null", i)));
        }
        // Only the carrier slot appears in the render body.
        assert!(code.contains("return _createElementVNode(\"div\", null, [_hoisted_1])"));
    }

    #[test]
    fn test_ref_binding_unwrapped() {
        let mut bindings = Bindings::new();
        bindings.insert("count", BindingKind::Ref);
        let code = generate_code("<div>{{ count }}</div>", bindings);
        assert!(code.contains("_toDisplayString(count.value)"));
    }

    #[test]
    fn test_member_expression_not_unwrapped() {
        let mut bindings = Bindings::new();
        bindings.insert("user", BindingKind::Ref);
        let code = generate_code("<div>{{ user.name }}</div>", bindings);
        assert!(code.contains("_toDisplayString(user.name)"));
    }

    #[test]
    fn test_event_prop_key() {
        let code = generate_code(r#"<button @click="submit">go</button>"#, Bindings::new());
        assert!(code.contains(r#""onClick": submit"#));
    }

    #[test]
    fn test_source_map_requested() {
        let source = "<div><span>a</span></div>";
        let mut root = parse(source).unwrap();
        let mut ctx = TransformContext::default();
        hoist_static(&mut root, &mut ctx);
        let output = generate(
            &root,
            &ctx,
            source,
            &CodegenOptions {
                filename: "app.component".to_string(),
                source_map: true,
            },
        )
        .unwrap();
        let map = output.map.expect("map");
        assert!(map.contains("\"version\":3"));
        assert!(map.contains("app.component"));
    }
}
