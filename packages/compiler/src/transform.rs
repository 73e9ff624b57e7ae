use willow_common::visitor::VisitorMut;
use willow_parser::ast::{
    ConstantKind, DirectiveNode, ElementKind, ElementNode, Expression, HoistRef, Node, RootNode,
    SimpleExpression,
};
use willow_parser::expr::extract_identifiers;

use crate::asset_url::AssetImport;
use crate::bindings::Bindings;

/// One slot in the hoist list. Slots are emitted before the render
/// function in order; indices are stable once assigned because merge
/// commits overwrite slots in place instead of removing them.
#[derive(Debug, Clone, PartialEq)]
pub enum HoistExpr {
    /// A static subtree emitted as a VNode constructor call.
    VNodeCall(Box<ElementNode>),
    /// A flattened sibling run: pre-serialized markup plus the number of
    /// top-level nodes the runtime should claim when hydrating.
    StaticHtml { html: String, count: String },
    /// A slot whose content was folded into a preceding `StaticHtml`.
    /// Emitted as `null` so sibling hoist indices stay valid.
    Placeholder,
}

/// Shared state threaded through the transform passes for one template.
#[derive(Debug, Default)]
pub struct TransformContext {
    pub hoists: Vec<HoistExpr>,
    pub bindings: Bindings,
    /// Scoped-style attribute token added to every serialized element,
    /// e.g. `data-w-7ba5bd90`.
    pub scope_id: Option<String>,
    pub imports: Vec<AssetImport>,
}

impl TransformContext {
    pub fn new(bindings: Bindings, scope_id: Option<String>) -> Self {
        Self {
            hoists: Vec::new(),
            bindings,
            scope_id,
            imports: Vec::new(),
        }
    }

    /// Reserve the next hoist slot, returning its index.
    pub fn hoist(&mut self, expr: HoistExpr) -> usize {
        self.hoists.push(expr);
        self.hoists.len() - 1
    }
}

/// Directive names handled by the runtime itself. Anything else is a
/// user-registered directive and contributes a usage marker.
pub fn is_builtin_directive(name: &str) -> bool {
    matches!(
        name,
        "bind"
            | "on"
            | "if"
            | "else"
            | "else-if"
            | "for"
            | "model"
            | "show"
            | "slot"
            | "html"
            | "text"
            | "once"
            | "cloak"
            | "pre"
    )
}

/// Upgrade constant classification using binding metadata: a bind
/// expression whose every referenced identifier is a lifetime-constant
/// binding is constant per render, though its value is unknowable until
/// runtime.
pub fn reclassify_constants(root: &mut RootNode, bindings: &Bindings) {
    ConstantReclassifier { bindings }.visit_root_mut(root);
}

struct ConstantReclassifier<'a> {
    bindings: &'a Bindings,
}

impl VisitorMut for ConstantReclassifier<'_> {
    fn visit_directive_mut(&mut self, directive: &mut DirectiveNode) {
        if !directive.is_bind() {
            return;
        }
        if let Some(Expression::Simple(exp)) = &mut directive.exp {
            if exp.constant == ConstantKind::NotConstant && is_runtime_constant(exp, self.bindings)
            {
                exp.constant = ConstantKind::RuntimeConstant;
            }
        }
    }
}

fn is_runtime_constant(exp: &SimpleExpression, bindings: &Bindings) -> bool {
    let names = extract_identifiers(&exp.content);
    !names.is_empty() && names.iter().all(|name| bindings.is_constant(name))
}

/// Mark static subtrees for hoisting.
///
/// Walks the tree top-down and assigns each outermost fully-static
/// element a hoist slot holding a VNode call; the subtree below a hoisted
/// element is sealed and never revisited. A lone root element is the
/// render block itself and is never hoisted, but its children are
/// candidates.
pub fn hoist_static(root: &mut RootNode, ctx: &mut TransformContext) {
    let single_element_root =
        root.children.len() == 1 && matches!(root.children[0], Node::Element(_));
    walk_children(&mut root.children, ctx, single_element_root);
}

fn walk_children(children: &mut [Node], ctx: &mut TransformContext, skip_direct: bool) {
    for child in children.iter_mut() {
        let Node::Element(el) = child else { continue };
        if !skip_direct && is_static_tree(el) {
            let index = ctx.hoist(HoistExpr::VNodeCall(Box::new(el.clone())));
            el.codegen = Some(HoistRef { index });
            tracing::trace!(tag = %el.tag, index, "hoisted static subtree");
        } else {
            walk_children(&mut el.children, ctx, false);
        }
    }
}

/// Whether an element and everything below it renders identically on
/// every pass. Components, slots, and templates never qualify; neither
/// does any directive other than `:attr` with a static argument and a
/// constant expression.
pub fn is_static_tree(el: &ElementNode) -> bool {
    if el.kind != ElementKind::Element {
        return false;
    }
    for directive in el.directives() {
        if !directive.is_bind() {
            return false;
        }
        if directive.static_arg().is_none() {
            return false;
        }
        match &directive.exp {
            Some(Expression::Simple(exp)) if exp.constant != ConstantKind::NotConstant => {}
            _ => return false,
        }
    }
    el.children.iter().all(is_static_node)
}

fn is_static_node(node: &Node) -> bool {
    match node {
        Node::Element(el) => is_static_tree(el),
        Node::Text(_) | Node::Comment(_) => true,
        Node::Interpolation(interp) => {
            interp.content.constant == ConstantKind::Stringifiable
        }
        Node::Compound(compound) => compound.children.iter().all(|child| match child {
            willow_parser::ast::CompoundChild::Text(_) => true,
            willow_parser::ast::CompoundChild::Interpolation(i) => {
                i.content.constant == ConstantKind::Stringifiable
            }
            willow_parser::ast::CompoundChild::Expression(e) => {
                e.constant == ConstantKind::Stringifiable
            }
        }),
        Node::TextCall(call) => is_static_node(&call.content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bindings::BindingKind;
    use willow_parser::parse;

    fn hoisted_indices(root: &RootNode) -> Vec<Option<usize>> {
        root.children[0]
            .as_element()
            .unwrap()
            .children
            .iter()
            .map(|c| c.as_element().and_then(|e| e.codegen).map(|h| h.index))
            .collect()
    }

    #[test]
    fn test_static_children_hoisted_individually() {
        let mut root = parse("<div><span>a</span><span>b</span><p>{{ x }}</p></div>").unwrap();
        let mut ctx = TransformContext::default();
        hoist_static(&mut root, &mut ctx);

        assert_eq!(ctx.hoists.len(), 2);
        assert_eq!(
            hoisted_indices(&root),
            vec![Some(0), Some(1), None],
        );
    }

    #[test]
    fn test_single_root_element_not_hoisted() {
        let mut root = parse("<div><span>a</span></div>").unwrap();
        let mut ctx = TransformContext::default();
        hoist_static(&mut root, &mut ctx);

        assert!(root.children[0].as_element().unwrap().codegen.is_none());
        assert_eq!(ctx.hoists.len(), 1);
    }

    #[test]
    fn test_whole_static_subtree_takes_one_slot() {
        let mut root =
            parse("<div><section><span>a</span><span>b</span></section>{{ x }}</div>").unwrap();
        let mut ctx = TransformContext::default();
        hoist_static(&mut root, &mut ctx);

        // The section is the outermost static node; its spans stay sealed
        // inside it.
        assert_eq!(ctx.hoists.len(), 1);
        let section = root.children[0].as_element().unwrap().children[0]
            .as_element()
            .unwrap();
        assert_eq!(section.codegen, Some(HoistRef { index: 0 }));
        assert!(section.children[0].as_element().unwrap().codegen.is_none());
    }

    #[test]
    fn test_dynamic_binding_blocks_hoist() {
        let mut root = parse(r#"<div><span :class="cls">a</span></div>"#).unwrap();
        let mut ctx = TransformContext::default();
        hoist_static(&mut root, &mut ctx);
        assert!(ctx.hoists.is_empty());
    }

    #[test]
    fn test_constant_binding_allows_hoist() {
        let mut root = parse(r#"<div><span :class="'boxed'">a</span></div>"#).unwrap();
        let mut ctx = TransformContext::default();
        hoist_static(&mut root, &mut ctx);
        assert_eq!(ctx.hoists.len(), 1);
    }

    #[test]
    fn test_component_never_static() {
        let mut root = parse("<div><MyWidget/></div>").unwrap();
        let mut ctx = TransformContext::default();
        hoist_static(&mut root, &mut ctx);
        assert!(ctx.hoists.is_empty());
    }

    #[test]
    fn test_reclassify_upgrades_literal_const_references() {
        let mut root = parse(r#"<div><img :src="logoUrl"/></div>"#).unwrap();
        let mut bindings = Bindings::new();
        bindings.insert("logoUrl", BindingKind::LiteralConst);
        reclassify_constants(&mut root, &bindings);

        let img = root.children[0].as_element().unwrap().children[0]
            .as_element()
            .unwrap();
        let directive = img.directives().next().unwrap();
        let Some(Expression::Simple(exp)) = &directive.exp else {
            panic!("expected simple expression");
        };
        assert_eq!(exp.constant, ConstantKind::RuntimeConstant);
    }

    #[test]
    fn test_reclassify_leaves_mutable_references() {
        let mut root = parse(r#"<div><img :src="logoUrl"/></div>"#).unwrap();
        let mut bindings = Bindings::new();
        bindings.insert("logoUrl", BindingKind::Ref);
        reclassify_constants(&mut root, &bindings);

        let img = root.children[0].as_element().unwrap().children[0]
            .as_element()
            .unwrap();
        let directive = img.directives().next().unwrap();
        let Some(Expression::Simple(exp)) = &directive.exp else {
            panic!("expected simple expression");
        };
        assert_eq!(exp.constant, ConstantKind::NotConstant);
    }
}
