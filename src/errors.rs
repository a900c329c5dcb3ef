use thiserror::Error;

/// Result type for parser operations
pub type ParserResult<T> = Result<T, ParserError>;

/// Errors that can occur while decoding tool payloads
#[derive(Debug, Error)]
pub enum ParserError {
    #[error("Parsing failed: {0}")]
    ParsingFailed(String),

    #[error("Parse depth exceeded: max {0}")]
    DepthExceeded(usize),
}
