use std::ops::Range;

use crate::expression::Expression;

/// The contents between a pair of braces (or the whole file, for the root).
/// Attributes and blocks are each kept in document order.
#[derive(Debug, Clone, Default)]
pub struct Body {
    pub attributes: Vec<Attribute>,
    pub blocks: Vec<Block>,
    /// Byte span in source for error reporting.
    pub span: Range<usize>,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.blocks.is_empty()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name == name)
    }
}

/// A block: `type "label" ... { body }`.
#[derive(Debug, Clone)]
pub struct Block {
    /// The block type, e.g. `div` or `dynamic`.
    pub kind: String,
    /// Quoted or bare labels following the type.
    pub labels: Vec<String>,
    pub body: Body,
    /// Span of the type identifier.
    pub kind_span: Range<usize>,
    /// Span from the type identifier through the closing brace.
    pub span: Range<usize>,
}

/// An attribute definition: `name = expression`.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub name: String,
    pub expr: Expression,
    pub span: Range<usize>,
}
