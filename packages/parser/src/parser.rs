use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::expr::constant_kind;
use crate::html::{is_native_tag, is_void_tag};
use crate::id_generator::IDGenerator;

/// Recursive-descent parser for template markup.
///
/// Covers the subset of the template grammar the compiler pipeline
/// consumes: elements with plain attributes, bound attributes (`:name`),
/// event/custom directives (`@name`, `v-name:arg`), interpolations
/// (`{{ expr }}`), comments, and text. Whitespace-only text between
/// elements is dropped.
pub struct Parser<'src> {
    source: &'src str,
    pos: usize,
    id_generator: IDGenerator,
}

pub fn parse(source: &str) -> ParseResult<RootNode> {
    Parser::new(source, IDGenerator::new("/template")).parse_root()
}

pub fn parse_with_path(source: &str, path: &str) -> ParseResult<RootNode> {
    Parser::new(source, IDGenerator::new(path)).parse_root()
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str, id_generator: IDGenerator) -> Self {
        Self {
            source,
            pos: 0,
            id_generator,
        }
    }

    pub fn parse_root(&mut self) -> ParseResult<RootNode> {
        let start = self.pos;
        let children = self.parse_children()?;
        if !self.is_at_end() {
            // The only way parse_children stops early is a closing tag
            // with no matching open element.
            return Err(ParseError::invalid_syntax(
                self.pos,
                "unexpected closing tag at template root",
            ));
        }
        let span = self.span_from(start);
        Ok(RootNode { children, span })
    }

    fn parse_children(&mut self) -> ParseResult<Vec<Node>> {
        let mut children = Vec::new();
        while !self.is_at_end() {
            if self.starts_with("</") {
                break;
            } else if self.starts_with("<!--") {
                children.push(self.parse_comment()?);
            } else if self.starts_with("<") && self.peek_at(1).is_some_and(|c| c.is_ascii_alphabetic()) {
                children.push(self.parse_element()?);
            } else if self.starts_with("{{") {
                children.push(self.parse_interpolation()?);
            } else {
                if let Some(text) = self.parse_text()? {
                    children.push(text);
                }
            }
        }
        Ok(children)
    }

    fn parse_comment(&mut self) -> ParseResult<Node> {
        let start = self.pos;
        self.pos += 4; // <!--
        match self.source[self.pos..].find("-->") {
            Some(offset) => {
                let content = self.source[self.pos..self.pos + offset].to_string();
                self.pos += offset + 3;
                let span = self.span_from(start);
                Ok(Node::Comment(CommentNode { content, span }))
            }
            None => Err(ParseError::UnterminatedComment { pos: start }),
        }
    }

    fn parse_interpolation(&mut self) -> ParseResult<Node> {
        let start = self.pos;
        self.pos += 2; // {{
        match self.source[self.pos..].find("}}") {
            Some(offset) => {
                let content_start = self.pos;
                let raw = &self.source[self.pos..self.pos + offset];
                self.pos += offset + 2;
                let trimmed = raw.trim();
                let exp_span = Span::new(
                    content_start,
                    content_start + raw.len(),
                    self.id_generator.new_id(),
                );
                let content =
                    SimpleExpression::dynamic(trimmed, constant_kind(trimmed), exp_span);
                let span = self.span_from(start);
                Ok(Node::Interpolation(InterpolationNode { content, span }))
            }
            None => Err(ParseError::UnterminatedInterpolation { pos: start }),
        }
    }

    fn parse_text(&mut self) -> ParseResult<Option<Node>> {
        let start = self.pos;
        while !self.is_at_end() && !self.starts_with("<") && !self.starts_with("{{") {
            self.pos += self.peek().map(char::len_utf8).unwrap_or(1);
        }
        let raw = &self.source[start..self.pos];
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let span = self.span_from(start);
        Ok(Some(Node::Text(TextNode {
            content: raw.to_string(),
            span,
        })))
    }

    fn parse_element(&mut self) -> ParseResult<Node> {
        let start = self.pos;
        self.pos += 1; // <
        let tag = self.parse_tag_name()?;

        let mut props = Vec::new();
        let mut self_closing = false;
        loop {
            self.skip_whitespace();
            if self.is_at_end() {
                return Err(ParseError::UnterminatedTag {
                    pos: start,
                    tag,
                });
            }
            if self.starts_with("/>") {
                self.pos += 2;
                self_closing = true;
                break;
            }
            if self.starts_with(">") {
                self.pos += 1;
                break;
            }
            props.push(self.parse_prop()?);
        }

        let kind = element_kind(&tag);
        let mut children = Vec::new();
        if !self_closing && !is_void_tag(&tag) {
            children = self.parse_children()?;
            self.expect_closing_tag(start, &tag)?;
        }

        let span = self.span_from(start);
        Ok(Node::Element(ElementNode {
            tag,
            kind,
            props,
            children,
            codegen: None,
            span,
        }))
    }

    fn expect_closing_tag(&mut self, open_pos: usize, tag: &str) -> ParseResult<()> {
        if !self.starts_with("</") {
            return Err(ParseError::UnterminatedTag {
                pos: open_pos,
                tag: tag.to_string(),
            });
        }
        let close_pos = self.pos;
        self.pos += 2;
        let found = self.parse_tag_name()?;
        self.skip_whitespace();
        if !self.starts_with(">") {
            return Err(ParseError::unexpected_char(
                self.pos,
                ">",
                self.peek().map(String::from).unwrap_or_default(),
            ));
        }
        self.pos += 1;
        if found != tag {
            return Err(ParseError::MismatchedClosingTag {
                pos: close_pos,
                expected: tag.to_string(),
                found,
            });
        }
        Ok(())
    }

    fn parse_tag_name(&mut self) -> ParseResult<String> {
        let start = self.pos;
        while self
            .peek()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-')
        {
            self.pos += 1;
        }
        if start == self.pos {
            return Err(ParseError::unexpected_char(
                self.pos,
                "tag name",
                self.peek().map(String::from).unwrap_or_default(),
            ));
        }
        Ok(self.source[start..self.pos].to_string())
    }

    fn parse_prop(&mut self) -> ParseResult<Prop> {
        let start = self.pos;
        let name = self.parse_prop_name()?;
        let value = self.parse_prop_value()?;
        let span = self.span_from(start);

        // `:x` is bind shorthand, `@x` is event shorthand, `v-name:arg`
        // a full directive; anything else is a plain static attribute.
        if let Some(arg) = name.strip_prefix(':') {
            Ok(Prop::Directive(self.make_directive("bind", arg, value, span)))
        } else if let Some(arg) = name.strip_prefix('@') {
            Ok(Prop::Directive(self.make_directive("on", arg, value, span)))
        } else if let Some(rest) = name.strip_prefix("v-") {
            let (dir_name, arg) = match rest.split_once(':') {
                Some((n, a)) => (n.to_string(), Some(a.to_string())),
                None => (rest.to_string(), None),
            };
            let arg_str = arg.as_deref().unwrap_or("");
            let directive = if arg.is_some() {
                self.make_directive(&dir_name, arg_str, value, span)
            } else {
                DirectiveNode {
                    name: dir_name,
                    arg: None,
                    exp: value.map(|v| self.make_value_expression(v, &span)),
                    span,
                }
            };
            Ok(Prop::Directive(directive))
        } else {
            Ok(Prop::Attribute(AttributeNode { name, value, span }))
        }
    }

    fn make_directive(
        &mut self,
        name: &str,
        arg: &str,
        value: Option<String>,
        span: Span,
    ) -> DirectiveNode {
        // `:[expr]` is a dynamic argument; a plain name is static.
        let arg_expr = if let Some(inner) = arg.strip_prefix('[').and_then(|a| a.strip_suffix(']'))
        {
            Expression::Simple(SimpleExpression::dynamic(
                inner,
                ConstantKind::NotConstant,
                Span::new(span.start, span.end, self.id_generator.new_id()),
            ))
        } else {
            Expression::Simple(SimpleExpression::static_str(
                arg,
                Span::new(span.start, span.end, self.id_generator.new_id()),
            ))
        };
        DirectiveNode {
            name: name.to_string(),
            arg: Some(arg_expr),
            exp: value.map(|v| self.make_value_expression(v, &span)),
            span: span.clone(),
        }
    }

    fn make_value_expression(&mut self, value: String, span: &Span) -> Expression {
        let constant = constant_kind(&value);
        Expression::Simple(SimpleExpression::dynamic(
            value,
            constant,
            Span::new(span.start, span.end, self.id_generator.new_id()),
        ))
    }

    fn parse_prop_name(&mut self) -> ParseResult<String> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_whitespace() || c == '=' || c == '>' || c == '/' || c == '<' {
                break;
            }
            self.pos += c.len_utf8();
        }
        if start == self.pos {
            return Err(ParseError::unexpected_char(
                self.pos,
                "attribute name",
                self.peek().map(String::from).unwrap_or_default(),
            ));
        }
        Ok(self.source[start..self.pos].to_string())
    }

    fn parse_prop_value(&mut self) -> ParseResult<Option<String>> {
        let checkpoint = self.pos;
        self.skip_whitespace();
        if !self.starts_with("=") {
            self.pos = checkpoint;
            return Ok(None);
        }
        self.pos += 1;
        self.skip_whitespace();
        match self.peek() {
            Some(quote @ ('"' | '\'')) => {
                self.pos += 1;
                let start = self.pos;
                while self.peek().is_some_and(|c| c != quote) {
                    self.pos += self.peek().map(char::len_utf8).unwrap_or(1);
                }
                if self.is_at_end() {
                    return Err(ParseError::unexpected_eof(start));
                }
                let value = self.source[start..self.pos].to_string();
                self.pos += 1;
                Ok(Some(value))
            }
            Some(_) => {
                let start = self.pos;
                while let Some(c) = self.peek() {
                    if c.is_whitespace() || c == '>' || c == '/' {
                        break;
                    }
                    self.pos += c.len_utf8();
                }
                Ok(Some(self.source[start..self.pos].to_string()))
            }
            None => Err(ParseError::unexpected_eof(self.pos)),
        }
    }

    // Cursor helpers

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn starts_with(&self, prefix: &str) -> bool {
        self.source[self.pos..].starts_with(prefix)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn span_from(&mut self, start: usize) -> Span {
        Span::new(start, self.pos, self.id_generator.new_id())
    }
}

fn element_kind(tag: &str) -> ElementKind {
    match tag {
        "slot" => ElementKind::Slot,
        "template" => ElementKind::Template,
        _ if is_native_tag(tag) => ElementKind::Element,
        _ => ElementKind::Component,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_element(root: &RootNode) -> &ElementNode {
        root.children[0].as_element().expect("element")
    }

    #[test]
    fn test_parse_plain_element() {
        let root = parse("<div class=\"box\">hello</div>").unwrap();
        let el = first_element(&root);
        assert_eq!(el.tag, "div");
        assert_eq!(el.kind, ElementKind::Element);
        assert_eq!(el.props.len(), 1);
        match &el.props[0] {
            Prop::Attribute(a) => {
                assert_eq!(a.name, "class");
                assert_eq!(a.value.as_deref(), Some("box"));
            }
            other => panic!("expected attribute, got {:?}", other),
        }
        assert!(matches!(el.children[0], Node::Text(_)));
    }

    #[test]
    fn test_parse_bound_attribute() {
        let root = parse("<span :class=\"'foo'\"/>").unwrap();
        let el = first_element(&root);
        match &el.props[0] {
            Prop::Directive(d) => {
                assert_eq!(d.name, "bind");
                assert_eq!(d.static_arg(), Some("class"));
                match &d.exp {
                    Some(Expression::Simple(s)) => {
                        assert_eq!(s.content, "'foo'");
                        assert_eq!(s.constant, ConstantKind::Stringifiable);
                    }
                    other => panic!("expected simple expression, got {:?}", other),
                }
            }
            other => panic!("expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_dynamic_argument() {
        let root = parse("<span :[key]=\"value\"/>").unwrap();
        let el = first_element(&root);
        match &el.props[0] {
            Prop::Directive(d) => {
                assert_eq!(d.static_arg(), None);
                match &d.arg {
                    Some(Expression::Simple(s)) => {
                        assert_eq!(s.content, "key");
                        assert!(!s.is_static);
                    }
                    other => panic!("expected dynamic arg, got {:?}", other),
                }
            }
            other => panic!("expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_custom_directive() {
        let root = parse("<div v-focus=\"isActive\"></div>").unwrap();
        let el = first_element(&root);
        match &el.props[0] {
            Prop::Directive(d) => {
                assert_eq!(d.name, "focus");
                assert!(d.arg.is_none());
            }
            other => panic!("expected directive, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_interpolation_and_component() {
        let root = parse("<MyWidget>{{ count + 1 }}</MyWidget>").unwrap();
        let el = first_element(&root);
        assert_eq!(el.kind, ElementKind::Component);
        match &el.children[0] {
            Node::Interpolation(i) => {
                assert_eq!(i.content.content, "count + 1");
                assert_eq!(i.content.constant, ConstantKind::NotConstant);
            }
            other => panic!("expected interpolation, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_comment_and_void_element() {
        let root = parse("<div><!-- note --><img src=\"x.png\"></div>").unwrap();
        let el = first_element(&root);
        assert!(matches!(el.children[0], Node::Comment(_)));
        match &el.children[1] {
            Node::Element(img) => {
                assert_eq!(img.tag, "img");
                assert!(img.children.is_empty());
            }
            other => panic!("expected img element, got {:?}", other),
        }
    }

    #[test]
    fn test_whitespace_only_text_dropped() {
        let root = parse("<div>\n  <span/>\n  <span/>\n</div>").unwrap();
        let el = first_element(&root);
        assert_eq!(el.children.len(), 2);
    }

    #[test]
    fn test_multibyte_whitespace_between_attributes() {
        // U+00A0 is whitespace but two bytes wide; the cursor must land
        // on the next char boundary, not mid-codepoint.
        let root = parse("<div class=\"a\"\u{a0}id=\"b\">x</div>").unwrap();
        let el = first_element(&root);
        assert_eq!(el.props.len(), 2);
        match &el.props[1] {
            Prop::Attribute(a) => {
                assert_eq!(a.name, "id");
                assert_eq!(a.value.as_deref(), Some("b"));
            }
            other => panic!("expected attribute, got {:?}", other),
        }

        let root = parse("<div>\u{3000}<span/>\u{2003}</div>").unwrap();
        assert_eq!(first_element(&root).children.len(), 1);
    }

    #[test]
    fn test_unterminated_tag_error() {
        let err = parse("<div><span></div>").unwrap_err();
        assert!(matches!(err, ParseError::MismatchedClosingTag { .. }));

        let err = parse("<div>").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedTag { .. }));
    }

    #[test]
    fn test_unterminated_interpolation_error() {
        let err = parse("<div>{{ count </div>").unwrap_err();
        assert!(matches!(err, ParseError::UnterminatedInterpolation { .. }));
    }

    #[test]
    fn test_same_source_same_ids() {
        let a = parse_with_path("<div><span/></div>", "/app.component").unwrap();
        let b = parse_with_path("<div><span/></div>", "/app.component").unwrap();
        assert_eq!(a, b);
    }
}
