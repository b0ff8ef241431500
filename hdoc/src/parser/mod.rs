pub mod error;
mod expression;
mod lexer;
mod structural;

pub use error::{ParseError, summarize_all};

use crate::Document;

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Parse the source text into a complete Document.
    /// All errors found in the file are returned together.
    pub fn parse(&self) -> Result<Document, Vec<ParseError>> {
        let (tokens, mut errors) = lexer::tokenize(&self.source, 0, self.file_id);
        match structural::parse_body(&tokens, self.source.len(), self.file_id) {
            Ok(body) if errors.is_empty() => {
                return Ok(Document {
                    body,
                    source_id: self.file_id,
                });
            }
            Ok(_) => {}
            Err(structural_errors) => errors.extend(structural_errors),
        }
        errors.sort_by_key(|e| e.span.start);
        Err(errors)
    }
}
