pub mod ast;
pub mod error;
pub mod expr;
pub mod html;
pub mod id_generator;
pub mod parser;
pub mod tokenizer;

pub use error::{ParseError, ParseResult};
pub use id_generator::IDGenerator;
pub use parser::{parse, parse_with_path, Parser};
pub use tokenizer::{tokenize, Token};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_template() {
        let root = parse("<div><span>hi</span></div>").unwrap();
        assert_eq!(root.children.len(), 1);
    }
}
