use hdoc::body::{Attribute, Block, Body};
use tracing::{debug, warn};

use crate::error::{Diagnostic, DiagnosticKind};

/// Tags that materialize as elements.
pub const ELEMENT_TAGS: &[&str] = &[
    "div", "h1", "h2", "h3", "b", "center", "p", "marquee", "span", "content", "ul", "ol", "li",
    "br",
];

/// The repetition block: `dynamic "<tag>" { for_each = ... }`.
pub const DYNAMIC_TAG: &str = "dynamic";

/// The attribute a `dynamic` body iterates over, and the variable each
/// iteration binds.
pub const FOR_EACH: &str = "for_each";

/// Which block types a body may contain.
#[derive(Debug, Clone)]
pub struct Schema {
    pub element_tags: Vec<String>,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            element_tags: ELEMENT_TAGS.iter().map(|tag| tag.to_string()).collect(),
        }
    }
}

impl Schema {
    pub fn is_element(&self, kind: &str) -> bool {
        self.element_tags.iter().any(|tag| tag == kind)
    }
}

/// A block that passed the schema.
#[derive(Debug, Clone, Copy)]
pub enum Extracted<'a> {
    Element(&'a Block),
    /// A `dynamic` block and the tag its single label names.
    Dynamic { tag: &'a str, block: &'a Block },
}

/// The schema-conforming parts of a body, in document order.
#[derive(Debug, Default)]
pub struct Extraction<'a> {
    pub blocks: Vec<Extracted<'a>>,
    pub attributes: Vec<&'a Attribute>,
}

/// Select the blocks and attributes of `body` that `schema` recognizes.
///
/// Unknown block types are dropped. Recognized blocks with the wrong number
/// of labels are dropped and reported. Never fails.
pub fn extract<'a>(
    body: &'a Body,
    schema: &Schema,
    diagnostics: &mut Vec<Diagnostic>,
    source_id: usize,
) -> Extraction<'a> {
    let mut blocks = Vec::with_capacity(body.blocks.len());

    for block in &body.blocks {
        if block.kind == DYNAMIC_TAG {
            match block.labels.as_slice() {
                [tag] => blocks.push(Extracted::Dynamic { tag, block }),
                labels => {
                    warn!(labels = labels.len(), "skipping `dynamic` block with wrong label count");
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::SchemaViolation,
                            format!(
                                "`{}` block takes exactly one label, found {}",
                                DYNAMIC_TAG,
                                labels.len()
                            ),
                        )
                        .at(block.kind_span.clone(), source_id),
                    );
                }
            }
        } else if schema.is_element(&block.kind) {
            if block.labels.is_empty() {
                blocks.push(Extracted::Element(block));
            } else {
                warn!(kind = %block.kind, "skipping labelled element block");
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::SchemaViolation,
                        format!(
                            "`{}` block takes no labels, found {}",
                            block.kind,
                            block.labels.len()
                        ),
                    )
                    .at(block.kind_span.clone(), source_id),
                );
            }
        } else {
            debug!(kind = %block.kind, "ignoring unrecognized block");
        }
    }

    Extraction {
        blocks,
        attributes: body.attributes.iter().collect(),
    }
}
