use logos::Logos;

/// Token types for template expression source (the JS-like fragments found
/// in bound attributes and interpolations).
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r]+")]
pub enum Token<'src> {
    // Identifiers (also covers keywords; the expression layer filters)
    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    // Number literals
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    // String literals (contents must never count as identifier usages)
    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    DoubleString(&'src str),

    #[regex(r"'([^'\\]|\\.)*'", |lex| lex.slice())]
    SingleString(&'src str),

    #[regex(r"`([^`\\]|\\.)*`", |lex| lex.slice())]
    TemplateString(&'src str),

    // Symbols
    #[token(".")]
    Dot,

    #[token(",")]
    Comma,

    #[token(":")]
    Colon,

    #[token(";")]
    Semicolon,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    // Operators, longest-match
    #[regex(r"[+\-*/%!<>=&|^~?]+", |lex| lex.slice())]
    Operator(&'src str),
}

/// Tokenize expression source, dropping unrecognized characters instead of
/// failing: incomplete expressions mid-edit must not abort compilation.
pub fn tokenize(source: &str) -> Vec<(Token<'_>, std::ops::Range<usize>)> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        if let Ok(token) = result {
            tokens.push((token, lexer.span()));
        }
    }
    tokens
}

/// Reserved words that can appear in expression position but are never
/// user bindings.
pub fn is_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "true" | "false" | "null" | "undefined" | "in" | "of" | "typeof" | "instanceof" | "new"
            | "this" | "void" | "as"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_member_expression() {
        let tokens = tokenize("user.name");
        assert_eq!(tokens.len(), 3);
        assert_eq!(tokens[0].0, Token::Ident("user"));
        assert_eq!(tokens[1].0, Token::Dot);
        assert_eq!(tokens[2].0, Token::Ident("name"));
    }

    #[test]
    fn test_tokenize_strings() {
        let tokens = tokenize(r#"greet + "hello foo""#);
        assert_eq!(tokens[0].0, Token::Ident("greet"));
        assert_eq!(tokens[1].0, Token::Operator("+"));
        assert_eq!(tokens[2].0, Token::DoubleString(r#""hello foo""#));
    }

    #[test]
    fn test_tokenize_tolerates_garbage() {
        // Mid-edit fragment: unknown characters are dropped, not fatal.
        let tokens = tokenize("count #");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].0, Token::Ident("count"));
    }

    #[test]
    fn test_dollar_identifiers() {
        let tokens = tokenize("$props.x");
        assert_eq!(tokens[0].0, Token::Ident("$props"));
    }
}
