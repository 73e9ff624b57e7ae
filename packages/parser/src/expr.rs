use crate::ast::ConstantKind;
use crate::tokenizer::{is_keyword, tokenize, Token};

/// Collect every identifier referenced by an expression fragment, best
/// effort: string and template-literal contents never count, member-access
/// property names after `.` never count, keywords never count. Unparsable
/// fragments yield whatever identifiers lex out — tolerance here keeps a
/// mid-edit expression from aborting compilation.
pub fn extract_identifiers(source: &str) -> Vec<String> {
    let tokens = tokenize(source);
    let mut out: Vec<String> = Vec::new();
    let mut prev_was_dot = false;
    for (token, _) in &tokens {
        match token {
            Token::Ident(name) => {
                if !prev_was_dot && !is_keyword(name) && !out.iter().any(|n| n == name) {
                    out.push((*name).to_string());
                }
                prev_was_dot = false;
            }
            Token::Dot => prev_was_dot = true,
            _ => prev_was_dot = false,
        }
    }
    out
}

/// Blank the contents of string and template literals, keeping the quotes,
/// so textual matching never sees identifiers inside literals. Works on a
/// raw char scan and is tolerant of unterminated literals.
pub fn strip_strings(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' | '\'' | '`' => {
                out.push(ch);
                let quote = ch;
                while let Some(inner) = chars.next() {
                    if inner == '\\' {
                        chars.next();
                    } else if inner == quote {
                        out.push(quote);
                        break;
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// A compile-time constant value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    List(Vec<ConstValue>),
    Map(Vec<(String, ConstValue)>),
}

impl ConstValue {
    /// The same string coercion the runtime applies when interpolating:
    /// strings pass through, numbers drop a trailing `.0`, null renders
    /// empty, structured values render as JSON.
    pub fn to_display_string(&self) -> String {
        match self {
            ConstValue::Null => String::new(),
            ConstValue::Bool(b) => b.to_string(),
            ConstValue::Number(n) => format_number(*n),
            ConstValue::Str(s) => s.clone(),
            ConstValue::List(_) | ConstValue::Map(_) => self.to_json().to_string(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            ConstValue::Null => serde_json::Value::Null,
            ConstValue::Bool(b) => serde_json::Value::Bool(*b),
            ConstValue::Number(n) => serde_json::Number::from_f64(*n)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ConstValue::Str(s) => serde_json::Value::String(s.clone()),
            ConstValue::List(items) => {
                serde_json::Value::Array(items.iter().map(|v| v.to_json()).collect())
            }
            ConstValue::Map(entries) => serde_json::Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Evaluate a constant expression: literals, array/object literals of
/// constants, arithmetic on numbers, `+` concatenation with strings.
///
/// Returns `None` for anything else — in particular parenthesized or
/// call-bearing content and free identifiers. The upstream expression
/// transform guarantees stringify candidates contain none of those; this
/// evaluator enforces the gate rather than re-deriving the analysis.
pub fn eval_constant(source: &str) -> Option<ConstValue> {
    let tokens = tokenize(source);
    if tokens.is_empty() {
        return None;
    }
    let mut parser = ConstParser {
        tokens: tokens.iter().map(|(t, _)| t.clone()).collect(),
        pos: 0,
    };
    let value = parser.parse_additive()?;
    if parser.pos == parser.tokens.len() {
        Some(value)
    } else {
        None
    }
}

/// Classify an expression's constant level from its source alone.
pub fn constant_kind(source: &str) -> ConstantKind {
    if eval_constant(source).is_some() {
        ConstantKind::Stringifiable
    } else {
        ConstantKind::NotConstant
    }
}

struct ConstParser<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
}

impl<'src> ConstParser<'src> {
    fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) -> Option<Token<'src>> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, expected: &Token<'src>) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn parse_additive(&mut self) -> Option<ConstValue> {
        let mut left = self.parse_multiplicative()?;
        while let Some(Token::Operator(op)) = self.peek() {
            let op = *op;
            if op != "+" && op != "-" {
                return None;
            }
            self.pos += 1;
            let right = self.parse_multiplicative()?;
            left = match (op, left, right) {
                ("+", ConstValue::Number(a), ConstValue::Number(b)) => ConstValue::Number(a + b),
                ("-", ConstValue::Number(a), ConstValue::Number(b)) => ConstValue::Number(a - b),
                ("+", a, b) => {
                    ConstValue::Str(format!("{}{}", a.to_display_string(), b.to_display_string()))
                }
                _ => return None,
            };
        }
        Some(left)
    }

    fn parse_multiplicative(&mut self) -> Option<ConstValue> {
        let mut left = self.parse_unary()?;
        while let Some(Token::Operator(op)) = self.peek() {
            let op = *op;
            if op != "*" && op != "/" && op != "%" {
                break;
            }
            self.pos += 1;
            let right = self.parse_unary()?;
            let (ConstValue::Number(a), ConstValue::Number(b)) = (left, right) else {
                return None;
            };
            left = ConstValue::Number(match op {
                "*" => a * b,
                "/" => a / b,
                _ => a % b,
            });
        }
        Some(left)
    }

    fn parse_unary(&mut self) -> Option<ConstValue> {
        if let Some(Token::Operator("-")) = self.peek() {
            self.pos += 1;
            let ConstValue::Number(n) = self.parse_unary()? else {
                return None;
            };
            return Some(ConstValue::Number(-n));
        }
        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<ConstValue> {
        match self.advance()? {
            Token::Number(n) => n.parse().ok().map(ConstValue::Number),
            Token::DoubleString(s) | Token::SingleString(s) => {
                Some(ConstValue::Str(unquote(s)))
            }
            Token::TemplateString(s) => {
                let inner = unquote(s);
                // Interpolation inside a template literal is not constant.
                if inner.contains("${") {
                    None
                } else {
                    Some(ConstValue::Str(inner))
                }
            }
            Token::Ident("true") => Some(ConstValue::Bool(true)),
            Token::Ident("false") => Some(ConstValue::Bool(false)),
            Token::Ident("null") | Token::Ident("undefined") => Some(ConstValue::Null),
            Token::LBracket => {
                let mut items = Vec::new();
                if self.eat(&Token::RBracket) {
                    return Some(ConstValue::List(items));
                }
                loop {
                    items.push(self.parse_additive()?);
                    if self.eat(&Token::RBracket) {
                        return Some(ConstValue::List(items));
                    }
                    if !self.eat(&Token::Comma) {
                        return None;
                    }
                }
            }
            Token::LBrace => {
                let mut entries = Vec::new();
                if self.eat(&Token::RBrace) {
                    return Some(ConstValue::Map(entries));
                }
                loop {
                    let key = match self.advance()? {
                        Token::Ident(name) => name.to_string(),
                        Token::DoubleString(s) | Token::SingleString(s) => unquote(s),
                        _ => return None,
                    };
                    if !self.eat(&Token::Colon) {
                        return None;
                    }
                    entries.push((key, self.parse_additive()?));
                    if self.eat(&Token::RBrace) {
                        return Some(ConstValue::Map(entries));
                    }
                    if !self.eat(&Token::Comma) {
                        return None;
                    }
                }
            }
            // Parens, calls, free identifiers: not constant.
            _ => None,
        }
    }
}

fn unquote(quoted: &str) -> String {
    let inner = &quoted[1..quoted.len().saturating_sub(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some(other) => out.push(other),
                None => {}
            }
        } else {
            out.push(ch);
        }
    }
    out
}
