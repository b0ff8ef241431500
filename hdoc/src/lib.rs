pub mod body;
pub mod expression;
pub mod parser;

use crate::body::Body;

/// A parsed hdoc document.
#[derive(Debug, Clone)]
pub struct Document {
    /// The top-level body: every block and attribute outside any braces.
    pub body: Body,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}
