use willow_parser::ast::*;

/// Visitor pattern for traversing template AST nodes immutably
///
/// This trait provides default implementations that walk the entire tree.
/// Override specific visit_* methods to perform custom actions on nodes.
pub trait Visitor: Sized {
    fn visit_root(&mut self, root: &RootNode) {
        walk_root(self, root);
    }

    fn visit_node(&mut self, node: &Node) {
        walk_node(self, node);
    }

    fn visit_element(&mut self, element: &ElementNode) {
        walk_element(self, element);
    }

    fn visit_attribute(&mut self, _attribute: &AttributeNode) {
        // Leaf node, no children to walk
    }

    fn visit_directive(&mut self, directive: &DirectiveNode) {
        walk_directive(self, directive);
    }

    fn visit_expression(&mut self, expr: &Expression) {
        walk_expression(self, expr);
    }

    fn visit_simple_expression(&mut self, _expr: &SimpleExpression) {
        // Leaf node, no children to walk
    }

    fn visit_interpolation(&mut self, interpolation: &InterpolationNode) {
        self.visit_simple_expression(&interpolation.content);
    }

    fn visit_text(&mut self, _text: &TextNode) {
        // Leaf node, no children to walk
    }

    fn visit_comment(&mut self, _comment: &CommentNode) {
        // Leaf node, no children to walk
    }
}

/// Mutable visitor pattern for transforming template AST nodes
///
/// Similar to Visitor, but provides mutable access to nodes.
/// Use this when you need to modify the AST during traversal.
pub trait VisitorMut: Sized {
    fn visit_root_mut(&mut self, root: &mut RootNode) {
        walk_root_mut(self, root);
    }

    fn visit_node_mut(&mut self, node: &mut Node) {
        walk_node_mut(self, node);
    }

    fn visit_element_mut(&mut self, element: &mut ElementNode) {
        walk_element_mut(self, element);
    }

    fn visit_attribute_mut(&mut self, _attribute: &mut AttributeNode) {
        // Leaf node, no children to walk
    }

    fn visit_directive_mut(&mut self, directive: &mut DirectiveNode) {
        walk_directive_mut(self, directive);
    }

    fn visit_expression_mut(&mut self, expr: &mut Expression) {
        walk_expression_mut(self, expr);
    }

    fn visit_simple_expression_mut(&mut self, _expr: &mut SimpleExpression) {
        // Leaf node, no children to walk
    }

    fn visit_interpolation_mut(&mut self, interpolation: &mut InterpolationNode) {
        self.visit_simple_expression_mut(&mut interpolation.content);
    }

    fn visit_text_mut(&mut self, _text: &mut TextNode) {
        // Leaf node, no children to walk
    }

    fn visit_comment_mut(&mut self, _comment: &mut CommentNode) {
        // Leaf node, no children to walk
    }
}

// Default walk implementations for immutable visitor

pub fn walk_root<V: Visitor>(visitor: &mut V, root: &RootNode) {
    for child in &root.children {
        visitor.visit_node(child);
    }
}

pub fn walk_node<V: Visitor>(visitor: &mut V, node: &Node) {
    match node {
        Node::Element(element) => visitor.visit_element(element),
        Node::Text(text) => visitor.visit_text(text),
        Node::Comment(comment) => visitor.visit_comment(comment),
        Node::Interpolation(interpolation) => visitor.visit_interpolation(interpolation),
        Node::Compound(compound) => {
            for child in &compound.children {
                match child {
                    CompoundChild::Text(_) => {}
                    CompoundChild::Interpolation(i) => visitor.visit_interpolation(i),
                    CompoundChild::Expression(e) => visitor.visit_simple_expression(e),
                }
            }
        }
        Node::TextCall(call) => visitor.visit_node(&call.content),
    }
}

pub fn walk_element<V: Visitor>(visitor: &mut V, element: &ElementNode) {
    for prop in &element.props {
        match prop {
            Prop::Attribute(attribute) => visitor.visit_attribute(attribute),
            Prop::Directive(directive) => visitor.visit_directive(directive),
        }
    }
    for child in &element.children {
        visitor.visit_node(child);
    }
}

pub fn walk_directive<V: Visitor>(visitor: &mut V, directive: &DirectiveNode) {
    if let Some(arg) = &directive.arg {
        visitor.visit_expression(arg);
    }
    if let Some(exp) = &directive.exp {
        visitor.visit_expression(exp);
    }
}

pub fn walk_expression<V: Visitor>(visitor: &mut V, expr: &Expression) {
    match expr {
        Expression::Simple(simple) => visitor.visit_simple_expression(simple),
        Expression::Compound(compound) => {
            for child in &compound.children {
                match child {
                    CompoundChild::Text(_) => {}
                    CompoundChild::Interpolation(i) => visitor.visit_interpolation(i),
                    CompoundChild::Expression(e) => visitor.visit_simple_expression(e),
                }
            }
        }
    }
}

// Default walk implementations for mutable visitor

pub fn walk_root_mut<V: VisitorMut>(visitor: &mut V, root: &mut RootNode) {
    for child in &mut root.children {
        visitor.visit_node_mut(child);
    }
}

pub fn walk_node_mut<V: VisitorMut>(visitor: &mut V, node: &mut Node) {
    match node {
        Node::Element(element) => visitor.visit_element_mut(element),
        Node::Text(text) => visitor.visit_text_mut(text),
        Node::Comment(comment) => visitor.visit_comment_mut(comment),
        Node::Interpolation(interpolation) => visitor.visit_interpolation_mut(interpolation),
        Node::Compound(compound) => {
            for child in &mut compound.children {
                match child {
                    CompoundChild::Text(_) => {}
                    CompoundChild::Interpolation(i) => visitor.visit_interpolation_mut(i),
                    CompoundChild::Expression(e) => visitor.visit_simple_expression_mut(e),
                }
            }
        }
        Node::TextCall(call) => visitor.visit_node_mut(&mut call.content),
    }
}

pub fn walk_element_mut<V: VisitorMut>(visitor: &mut V, element: &mut ElementNode) {
    for prop in &mut element.props {
        match prop {
            Prop::Attribute(attribute) => visitor.visit_attribute_mut(attribute),
            Prop::Directive(directive) => visitor.visit_directive_mut(directive),
        }
    }
    for child in &mut element.children {
        visitor.visit_node_mut(child);
    }
}

pub fn walk_directive_mut<V: VisitorMut>(visitor: &mut V, directive: &mut DirectiveNode) {
    if let Some(arg) = &mut directive.arg {
        visitor.visit_expression_mut(arg);
    }
    if let Some(exp) = &mut directive.exp {
        visitor.visit_expression_mut(exp);
    }
}

pub fn walk_expression_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expression) {
    match expr {
        Expression::Simple(simple) => visitor.visit_simple_expression_mut(simple),
        Expression::Compound(compound) => {
            for child in &mut compound.children {
                match child {
                    CompoundChild::Text(_) => {}
                    CompoundChild::Interpolation(i) => visitor.visit_interpolation_mut(i),
                    CompoundChild::Expression(e) => visitor.visit_simple_expression_mut(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use willow_parser::parse;

    struct TagCollector {
        tags: Vec<String>,
    }

    impl Visitor for TagCollector {
        fn visit_element(&mut self, element: &ElementNode) {
            self.tags.push(element.tag.clone());
            walk_element(self, element);
        }
    }

    #[test]
    fn test_visitor_walks_nested_elements() {
        let root = parse("<div><span><b>x</b></span><i>y</i></div>").unwrap();
        let mut collector = TagCollector { tags: Vec::new() };
        collector.visit_root(&root);
        assert_eq!(collector.tags, vec!["div", "span", "b", "i"]);
    }

    struct ConstantMarker;

    impl VisitorMut for ConstantMarker {
        fn visit_simple_expression_mut(&mut self, expr: &mut SimpleExpression) {
            expr.constant = ConstantKind::RuntimeConstant;
        }
    }

    #[test]
    fn test_visitor_mut_reaches_nested_expressions() {
        let mut root =
            parse(r#"<div :class="cls"><span>{{ label }}</span></div>"#).unwrap();
        ConstantMarker.visit_root_mut(&mut root);

        let div = root.children[0].as_element().unwrap();
        let directive = div.directives().next().unwrap();
        let Some(Expression::Simple(exp)) = &directive.exp else {
            panic!("expected simple expression");
        };
        assert_eq!(exp.constant, ConstantKind::RuntimeConstant);

        let span = div.children[0].as_element().unwrap();
        let Node::Interpolation(interp) = &span.children[0] else {
            panic!("expected interpolation");
        };
        assert_eq!(interp.content.constant, ConstantKind::RuntimeConstant);
    }
}
