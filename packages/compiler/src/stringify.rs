//! Static string flattening.
//!
//! Runs of adjacent hoisted subtrees that are large enough get collapsed
//! into one pre-serialized HTML string the runtime inserts via
//! `innerHTML`, replacing per-node VNode construction. Only markup that
//! round-trips through the browser parser byte-for-byte is eligible; any
//! doubt bails the subtree back to VNode hoisting.

use willow_parser::ast::{
    CompoundChild, CompoundExpression, ConstantKind, ElementKind, ElementNode, Expression, Node,
    Prop, RootNode, SimpleExpression,
};
use willow_parser::expr::{eval_constant, ConstValue};
use willow_parser::html::{is_known_attribute, is_void_tag};

use crate::transform::{HoistExpr, TransformContext};

/// A run is flattened when it reaches this many elements in total...
pub const STRINGIFY_NODE_THRESHOLD: usize = 20;
/// ...or this many elements carrying at least one bound attribute.
pub const STRINGIFY_BINDING_THRESHOLD: usize = 5;

/// Collapse qualifying hoisted sibling runs across the whole tree.
pub fn stringify_hoists(root: &mut RootNode, ctx: &mut TransformContext) {
    scan_children(&mut root.children, ctx, false);
}

#[derive(Debug, Clone, Copy, Default)]
struct Counts {
    nodes: usize,
    bound_elements: usize,
}

impl Counts {
    fn over_threshold(&self) -> bool {
        self.nodes >= STRINGIFY_NODE_THRESHOLD
            || self.bound_elements >= STRINGIFY_BINDING_THRESHOLD
    }

    fn add(&mut self, other: Counts) {
        self.nodes += other.nodes;
        self.bound_elements += other.bound_elements;
    }
}

#[derive(Debug, Clone, Copy)]
struct Run {
    start: usize,
    len: usize,
    counts: Counts,
}

/// Scan one sibling list, accumulating runs of stringifiable hoisted
/// nodes and committing or discarding each run when it breaks.
///
/// `at_slot_root` excludes hoisted nodes sitting directly under a slot
/// outlet: slot fallback content is cloned into foreign render scopes
/// where an `innerHTML` shortcut would bypass scoped-style patching. The
/// exclusion is one level deep only; runs inside a wrapping element
/// within the slot are still eligible.
fn scan_children(children: &mut Vec<Node>, ctx: &mut TransformContext, at_slot_root: bool) {
    let mut run: Option<Run> = None;
    let mut i = 0;
    while i < children.len() {
        let candidate = if at_slot_root {
            None
        } else {
            match &children[i] {
                Node::Element(el) if el.codegen.is_some() => classify_tree(el),
                _ => None,
            }
        };

        if let Some(counts) = candidate {
            let entry = run.get_or_insert(Run {
                start: i,
                len: 0,
                counts: Counts::default(),
            });
            entry.len += 1;
            entry.counts.add(counts);
            i += 1;
            continue;
        }

        let removed = flush_run(children, ctx, run.take());
        i -= removed;

        if let Node::Element(el) = &mut children[i] {
            if el.codegen.is_none() {
                let slot = el.kind == ElementKind::Slot;
                scan_children(&mut el.children, ctx, slot);
            }
        }
        i += 1;
    }
    flush_run(children, ctx, run.take());
}

/// Commit or discard a finished run. Returns how many sibling nodes were
/// spliced out so the caller can adjust its cursor.
fn flush_run(children: &mut Vec<Node>, ctx: &mut TransformContext, run: Option<Run>) -> usize {
    let Some(run) = run else { return 0 };
    if !run.counts.over_threshold() {
        return 0;
    }

    let mut html = String::new();
    let mut slots = Vec::with_capacity(run.len);
    for node in &children[run.start..run.start + run.len] {
        let Node::Element(el) = node else { return 0 };
        let Some(hoist) = el.codegen else { return 0 };
        let Some(serialized) = stringify_element(el, ctx) else {
            return 0;
        };
        html.push_str(&serialized);
        slots.push(hoist.index);
    }

    tracing::debug!(
        nodes = run.counts.nodes,
        bound = run.counts.bound_elements,
        siblings = run.len,
        "flattening static run"
    );

    // First slot in the run holds the markup; the rest become inert
    // placeholders and their sibling nodes are spliced out.
    ctx.hoists[slots[0]] = HoistExpr::StaticHtml {
        html,
        count: run.len.to_string(),
    };
    for &slot in &slots[1..] {
        ctx.hoists[slot] = HoistExpr::Placeholder;
    }
    children.drain(run.start + 1..run.start + run.len);
    run.len - 1
}

/// Count a hoisted subtree's elements and bound elements, or bail with
/// `None` when any part of it cannot be serialized faithfully. Counting
/// short-circuits once a threshold is crossed; exact totals past that
/// point change nothing.
fn classify_tree(el: &ElementNode) -> Option<Counts> {
    let mut counts = Counts::default();
    if classify_element(el, &mut counts) {
        Some(counts)
    } else {
        None
    }
}

fn classify_element(el: &ElementNode, counts: &mut Counts) -> bool {
    counts.nodes += 1;
    let mut has_binding = false;

    for prop in &el.props {
        match prop {
            Prop::Attribute(attr) => {
                if !is_known_attribute(&attr.name) {
                    return false;
                }
            }
            Prop::Directive(directive) => {
                if !directive.is_bind() {
                    return false;
                }
                match directive.static_arg() {
                    Some(name) if is_known_attribute(name) => {}
                    _ => return false,
                }
                match &directive.exp {
                    Some(Expression::Simple(exp))
                        if exp.constant == ConstantKind::Stringifiable => {}
                    _ => return false,
                }
                has_binding = true;
            }
        }
    }
    if has_binding {
        counts.bound_elements += 1;
    }
    if counts.over_threshold() {
        return true;
    }

    for child in &el.children {
        if !classify_node(child, counts) {
            return false;
        }
        if counts.over_threshold() {
            return true;
        }
    }
    true
}

fn classify_node(node: &Node, counts: &mut Counts) -> bool {
    match node {
        Node::Element(el) => classify_element(el, counts),
        Node::Text(_) | Node::Comment(_) => true,
        Node::Interpolation(interp) => interp.content.constant == ConstantKind::Stringifiable,
        Node::Compound(compound) => compound_is_stringifiable(compound),
        Node::TextCall(call) => classify_node(&call.content, counts),
    }
}

fn compound_is_stringifiable(compound: &CompoundExpression) -> bool {
    compound.children.iter().all(|child| match child {
        CompoundChild::Text(_) => true,
        CompoundChild::Interpolation(i) => i.content.constant == ConstantKind::Stringifiable,
        CompoundChild::Expression(e) => e.constant == ConstantKind::Stringifiable,
    })
}

/// Serialize one static element to markup. `None` means a constant failed
/// to fold, which classification should have ruled out.
pub fn stringify_element(el: &ElementNode, ctx: &TransformContext) -> Option<String> {
    let mut out = String::new();
    out.push('<');
    out.push_str(&el.tag);

    for prop in &el.props {
        match prop {
            Prop::Attribute(attr) => {
                out.push(' ');
                out.push_str(&attr.name);
                if let Some(value) = &attr.value {
                    out.push_str("=\"");
                    out.push_str(&escape_html(value));
                    out.push('"');
                }
            }
            Prop::Directive(directive) => {
                let name = directive.static_arg()?;
                let Some(Expression::Simple(exp)) = &directive.exp else {
                    return None;
                };
                let value = eval_constant(&exp.content)?;
                let text = match name {
                    "class" => normalize_class(&value),
                    "style" => normalize_style(&value),
                    _ => value.to_display_string(),
                };
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                out.push_str(&escape_html(&text));
                out.push('"');
            }
        }
    }
    if let Some(scope) = &ctx.scope_id {
        out.push(' ');
        out.push_str(scope);
    }
    out.push('>');

    if is_void_tag(&el.tag) {
        return Some(out);
    }
    for child in &el.children {
        out.push_str(&stringify_node(child, ctx)?);
    }
    out.push_str("</");
    out.push_str(&el.tag);
    out.push('>');
    Some(out)
}

fn stringify_node(node: &Node, ctx: &TransformContext) -> Option<String> {
    match node {
        Node::Element(el) => stringify_element(el, ctx),
        Node::Text(text) => Some(escape_html(&text.content)),
        Node::Comment(comment) => Some(format!("<!--{}-->", comment.content)),
        Node::Interpolation(interp) => stringify_expression(&interp.content),
        Node::Compound(compound) => {
            let mut out = String::new();
            for child in &compound.children {
                match child {
                    CompoundChild::Text(t) => out.push_str(&escape_html(t)),
                    CompoundChild::Interpolation(i) => {
                        out.push_str(&stringify_expression(&i.content)?)
                    }
                    CompoundChild::Expression(e) => out.push_str(&stringify_expression(e)?),
                }
            }
            Some(out)
        }
        Node::TextCall(call) => stringify_node(&call.content, ctx),
    }
}

fn stringify_expression(exp: &SimpleExpression) -> Option<String> {
    let value = eval_constant(&exp.content)?;
    Some(escape_html(&value.to_display_string()))
}

/// Class values serialize the way the runtime normalizes them: lists
/// join with spaces, maps keep truthy keys.
fn normalize_class(value: &ConstValue) -> String {
    match value {
        ConstValue::List(items) => items
            .iter()
            .map(normalize_class)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
        ConstValue::Map(entries) => entries
            .iter()
            .filter(|(_, v)| is_truthy(v))
            .map(|(k, _)| k.clone())
            .collect::<Vec<_>>()
            .join(" "),
        other => other.to_display_string(),
    }
}

/// Style maps serialize to `prop: value;` pairs with camelCase keys
/// hyphenated.
fn normalize_style(value: &ConstValue) -> String {
    match value {
        ConstValue::Map(entries) => entries
            .iter()
            .map(|(k, v)| format!("{}:{};", hyphenate(k), v.to_display_string()))
            .collect::<String>(),
        other => other.to_display_string(),
    }
}

fn is_truthy(value: &ConstValue) -> bool {
    match value {
        ConstValue::Null => false,
        ConstValue::Bool(b) => *b,
        ConstValue::Number(n) => *n != 0.0,
        ConstValue::Str(s) => !s.is_empty(),
        ConstValue::List(_) | ConstValue::Map(_) => true,
    }
}

fn hyphenate(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            other => out.push(other),
        }
    }
    out
}
