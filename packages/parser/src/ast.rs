use serde::{Deserialize, Serialize};

/// Span information for source location tracking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub id: String,
}

impl Span {
    pub fn new(start: usize, end: usize, id: String) -> Self {
        Self { start, end, id }
    }
}

/// Root of a parsed template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootNode {
    pub children: Vec<Node>,
    pub span: Span,
}

/// Template tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    Element(ElementNode),
    Text(TextNode),
    Comment(CommentNode),
    Interpolation(InterpolationNode),
    Compound(CompoundExpression),
    /// A pre-merged text call wrapping adjacent text/interpolation content.
    TextCall(TextCallNode),
}

impl Node {
    pub fn span(&self) -> &Span {
        match self {
            Node::Element(n) => &n.span,
            Node::Text(n) => &n.span,
            Node::Comment(n) => &n.span,
            Node::Interpolation(n) => &n.span,
            Node::Compound(n) => &n.span,
            Node::TextCall(n) => &n.span,
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(e) => Some(e),
            _ => None,
        }
    }
}

/// What kind of element a tag resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    /// Native HTML element
    Element,
    /// User component instance
    Component,
    /// `<slot>` outlet
    Slot,
    /// `<template>` wrapper
    Template,
}

/// Reference from an element into the transform context's hoists list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HoistRef {
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementNode {
    pub tag: String,
    pub kind: ElementKind,
    pub props: Vec<Prop>,
    pub children: Vec<Node>,
    /// Set by the hoist pass when this element's generated code lives in a
    /// hoist slot instead of inline render output.
    pub codegen: Option<HoistRef>,
    pub span: Span,
}

impl ElementNode {
    pub fn directives(&self) -> impl Iterator<Item = &DirectiveNode> {
        self.props.iter().filter_map(|p| match p {
            Prop::Directive(d) => Some(d),
            _ => None,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = &AttributeNode> {
        self.props.iter().filter_map(|p| match p {
            Prop::Attribute(a) => Some(a),
            _ => None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Prop {
    Attribute(AttributeNode),
    Directive(DirectiveNode),
}

/// Plain static attribute: `name` or `name="value"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeNode {
    pub name: String,
    pub value: Option<String>,
    pub span: Span,
}

/// Directive prop: `:arg="exp"`, `@arg="exp"`, `v-name:arg="exp"`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectiveNode {
    /// Directive name without the `v-` prefix: "bind", "on", or a custom name
    pub name: String,
    pub arg: Option<Expression>,
    pub exp: Option<Expression>,
    pub span: Span,
}

impl DirectiveNode {
    pub fn is_bind(&self) -> bool {
        self.name == "bind"
    }

    /// The static argument name, when the argument is static.
    pub fn static_arg(&self) -> Option<&str> {
        match &self.arg {
            Some(Expression::Simple(s)) if s.is_static => Some(&s.content),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    Simple(SimpleExpression),
    Compound(CompoundExpression),
}

impl Expression {
    pub fn span(&self) -> &Span {
        match self {
            Expression::Simple(s) => &s.span,
            Expression::Compound(c) => &c.span,
        }
    }
}

/// How far an expression's value is knowable ahead of render
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConstantKind {
    NotConstant,
    /// Constant per render but only knowable at runtime (e.g. a resolved
    /// asset import): hoistable as a constructor call, never flattened
    /// into a static string.
    RuntimeConstant,
    /// Fully evaluable at compile time.
    Stringifiable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimpleExpression {
    pub content: String,
    pub is_static: bool,
    pub constant: ConstantKind,
    pub span: Span,
}

impl SimpleExpression {
    pub fn static_str(content: impl Into<String>, span: Span) -> Self {
        Self {
            content: content.into(),
            is_static: true,
            constant: ConstantKind::Stringifiable,
            span,
        }
    }

    pub fn dynamic(content: impl Into<String>, constant: ConstantKind, span: Span) -> Self {
        Self {
            content: content.into(),
            is_static: false,
            constant,
            span,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompoundExpression {
    pub children: Vec<CompoundChild>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CompoundChild {
    Text(String),
    Interpolation(InterpolationNode),
    Expression(SimpleExpression),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpolationNode {
    pub content: SimpleExpression,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextNode {
    pub content: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommentNode {
    pub content: String,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCallNode {
    pub content: Box<Node>,
    pub span: Span,
}
