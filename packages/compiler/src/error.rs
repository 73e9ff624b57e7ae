use thiserror::Error;
use willow_parser::ParseError;

pub type CompileResult<T> = Result<T, CompileError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CompileError {
    #[error("Template parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Source map error: {0}")]
    SourceMap(String),
}
