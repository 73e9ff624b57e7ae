//! Cross-reference resolution between a component's script and template.
//!
//! Script tooling needs to know whether an exposed name is actually used
//! by the template, without compiling the template to code. The answer
//! comes from a flat usage string built once per template and matched
//! with identifier-boundary checks, so `foo` never matches inside
//! `foobar`.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use willow_common::visitor::{walk_element, Visitor};
use willow_parser::ast::{
    DirectiveNode, ElementKind, ElementNode, InterpolationNode, RootNode, SimpleExpression,
};
use willow_parser::expr::{extract_identifiers, strip_strings};
use willow_parser::html::is_native_tag;
use willow_parser::parse;

use crate::error::CompileError;
use crate::transform::is_builtin_directive;

/// The usage index for one template: every way its markup can reference
/// a script-exposed name, concatenated.
#[derive(Debug, Clone)]
pub struct UsageIndex {
    usage: String,
}

impl UsageIndex {
    pub fn build(root: &RootNode) -> Self {
        let mut collector = UsageCollector {
            usage: String::new(),
        };
        collector.visit_root(root);
        Self {
            usage: collector.usage,
        }
    }

    /// Whether `name` appears in the template as a whole identifier.
    pub fn is_used(&self, name: &str) -> bool {
        if name.is_empty() {
            return false;
        }
        let hay = self.usage.as_bytes();
        let mut from = 0;
        while let Some(pos) = self.usage[from..].find(name) {
            let start = from + pos;
            let end = start + name.len();
            let before_ok = start == 0 || !is_ident_byte(hay[start - 1]);
            let after_ok = end == hay.len() || !is_ident_byte(hay[end]);
            if before_ok && after_ok {
                return true;
            }
            from = start + 1;
        }
        false
    }

    pub fn as_str(&self) -> &str {
        &self.usage
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

struct UsageCollector {
    usage: String,
}

impl UsageCollector {
    fn push(&mut self, fragment: &str) {
        self.usage.push_str(fragment);
        self.usage.push(',');
    }

    fn push_expression(&mut self, exp: &SimpleExpression) {
        if exp.is_static {
            return;
        }
        // Destructuring, casts, and generics confuse plain textual
        // matching; fall back to the lexer for those shapes.
        let content = &exp.content;
        if content.contains('{') || content.contains('[') || content.contains('<') {
            for name in extract_identifiers(content) {
                self.push(&name);
            }
        } else {
            self.push(&strip_strings(content));
        }
    }
}

impl Visitor for UsageCollector {
    fn visit_element(&mut self, element: &ElementNode) {
        // A component tag can be written kebab-case in markup but
        // camelCase or PascalCase in script; record both spellings.
        if element.kind == ElementKind::Component && !is_native_tag(&element.tag) {
            let camel = camelize(&element.tag);
            self.push(&capitalize(&camel));
            self.push(&camel);
        }
        walk_element(self, element);
    }

    fn visit_directive(&mut self, directive: &DirectiveNode) {
        if !is_builtin_directive(&directive.name) {
            // `v-focus` resolves to a script binding named `vFocus`.
            self.push(&format!("v{}", capitalize(&camelize(&directive.name))));
        }
        if let Some(arg) = &directive.arg {
            if let willow_parser::ast::Expression::Simple(s) = arg {
                if !s.is_static {
                    self.push_expression(s);
                }
            }
        }
        if let Some(exp) = &directive.exp {
            match exp {
                willow_parser::ast::Expression::Simple(s) => self.push_expression(s),
                willow_parser::ast::Expression::Compound(c) => {
                    for child in &c.children {
                        match child {
                            willow_parser::ast::CompoundChild::Text(_) => {}
                            willow_parser::ast::CompoundChild::Interpolation(i) => {
                                self.push_expression(&i.content)
                            }
                            willow_parser::ast::CompoundChild::Expression(e) => {
                                self.push_expression(e)
                            }
                        }
                    }
                }
            }
        }
    }

    fn visit_interpolation(&mut self, interpolation: &InterpolationNode) {
        self.push_expression(&interpolation.content);
    }
}

fn camelize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper_next = false;
    for ch in name.chars() {
        if ch == '-' {
            upper_next = true;
        } else if upper_next {
            out.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            out.push(ch);
        }
    }
    out
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// Parse-and-index cache keyed by template content. Repeated queries
/// against an unchanged template, the common case while a script is
/// edited, reuse the index.
#[derive(Debug, Default)]
pub struct UsageCache {
    entries: RefCell<HashMap<String, Rc<UsageIndex>>>,
}

impl UsageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index_for(&self, template: &str) -> Result<Rc<UsageIndex>, CompileError> {
        if let Some(index) = self.entries.borrow().get(template) {
            return Ok(Rc::clone(index));
        }
        let root = parse(template)?;
        let index = Rc::new(UsageIndex::build(&root));
        self.entries
            .borrow_mut()
            .insert(template.to_string(), Rc::clone(&index));
        Ok(index)
    }

    pub fn is_used(&self, name: &str, template: &str) -> Result<bool, CompileError> {
        Ok(self.index_for(template)?.is_used(name))
    }
}
