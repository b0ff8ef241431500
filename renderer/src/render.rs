use std::collections::HashMap;

use hdoc::body::{Attribute, Block, Body};
use tracing::{debug, warn};

use crate::error::{Diagnostic, DiagnosticKind};
use crate::evaluator::evaluate;
use crate::extract::{Extracted, Extraction, FOR_EACH, Schema, extract};
use crate::scope::Scope;
use crate::tree::{Property, TargetTree, TreeError};
use crate::value::Value;

/// Renders bodies into a target tree.
///
/// Evaluation failures never abort a render: they are recorded as
/// diagnostics and the affected output is omitted. The same goes for a tree
/// that rejects one element or property. Only a failing append stops the
/// walk, since the tree may then be half-built.
pub struct Renderer<'t, T: TargetTree> {
    tree: &'t mut T,
    schema: Schema,
    source_id: usize,
    diagnostics: Vec<Diagnostic>,
}

impl<'t, T: TargetTree> Renderer<'t, T> {
    pub fn new(tree: &'t mut T, source_id: usize) -> Self {
        Renderer {
            tree,
            schema: Schema::default(),
            source_id,
            diagnostics: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consume the renderer, returning every diagnostic recorded so far.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Render every recognized block of `body` into `container`, in order.
    pub fn render_body(
        &mut self,
        body: &Body,
        scope: &Scope<'_>,
        container: &T::Node,
    ) -> Result<(), TreeError> {
        let extraction = extract(body, &self.schema, &mut self.diagnostics, self.source_id);
        self.render_blocks(&extraction.blocks, scope, container)
    }

    /// Create one `tag` element from `body`, append it to `container`, then
    /// render the body's own blocks into it.
    pub fn render_element(
        &mut self,
        tag: &str,
        scope: &Scope<'_>,
        body: &Body,
        container: &T::Node,
    ) -> Result<(), TreeError> {
        let template = extract(body, &self.schema, &mut self.diagnostics, self.source_id);
        self.instantiate(tag, scope, body, &template, container)
    }

    /// Build one element from an already extracted body.
    fn instantiate(
        &mut self,
        tag: &str,
        scope: &Scope<'_>,
        body: &Body,
        template: &Extraction<'_>,
        container: &T::Node,
    ) -> Result<(), TreeError> {
        let node = match self.tree.create_element(tag) {
            Ok(node) => node,
            Err(e) => {
                self.tree_rejected(
                    format!("cannot create `{}` element: {}", tag, e),
                    body.span.clone(),
                );
                return Ok(());
            }
        };
        for attribute in template.attributes.iter().filter(|a| a.name != FOR_EACH) {
            self.set_attribute(&node, attribute, scope);
        }
        self.tree.append_child(container, &node)?;
        debug!(tag, "appended element");

        self.render_blocks(&template.blocks, scope, &node)
    }

    fn render_blocks(
        &mut self,
        blocks: &[Extracted<'_>],
        scope: &Scope<'_>,
        container: &T::Node,
    ) -> Result<(), TreeError> {
        for extracted in blocks {
            match *extracted {
                Extracted::Element(block) => {
                    self.render_element(&block.kind, scope, &block.body, container)?
                }
                Extracted::Dynamic { tag, block } => {
                    self.expand_dynamic(tag, block, scope, container)?
                }
            }
        }
        Ok(())
    }

    /// Render `block`'s body once per element of its `for_each` list, each
    /// time in a child scope binding `for_each` to that element.
    fn expand_dynamic(
        &mut self,
        tag: &str,
        block: &Block,
        scope: &Scope<'_>,
        container: &T::Node,
    ) -> Result<(), TreeError> {
        let Some(for_each) = block.body.attribute(FOR_EACH) else {
            self.iteration_error(
                format!("`dynamic \"{}\"` has no `{}` attribute", tag, FOR_EACH),
                block.kind_span.clone(),
            );
            return Ok(());
        };

        let collection = match evaluate(&for_each.expr, scope) {
            Ok(value) => value,
            Err(e) => {
                self.iteration_error(format!("`{}`: {}", FOR_EACH, e), for_each.span.clone());
                return Ok(());
            }
        };

        let Some(elements) = collection.elements() else {
            self.iteration_error(
                format!(
                    "`{}` must be a list, got {}",
                    FOR_EACH,
                    collection.type_name()
                ),
                for_each.span.clone(),
            );
            return Ok(());
        };

        // Extracted once, so schema diagnostics are not repeated per instance
        let template = extract(&block.body, &self.schema, &mut self.diagnostics, self.source_id);
        for (index, value) in elements {
            debug!(tag, index, "rendering dynamic instance");
            let locals = HashMap::from([(FOR_EACH.to_string(), value.clone())]);
            let instance = scope.child(locals);
            self.instantiate(tag, &instance, &block.body, &template, container)?;
        }
        Ok(())
    }

    fn set_attribute(&mut self, node: &T::Node, attribute: &Attribute, scope: &Scope<'_>) {
        let value = match evaluate(&attribute.expr, scope) {
            Ok(value) => value,
            Err(e) => {
                warn!(attribute = %attribute.name, error = %e, "attribute evaluation failed");
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::AttributeEvalError,
                        format!("`{}`: {}", attribute.name, e),
                    )
                    .at(attribute.span.clone(), self.source_id),
                );
                return;
            }
        };

        match coerce(value) {
            Ok(property) => {
                debug!(attribute = %attribute.name, value = %property, "set property");
                if let Err(e) = self.tree.set_property(node, &attribute.name, property) {
                    self.tree_rejected(
                        format!("cannot set `{}`: {}", attribute.name, e),
                        attribute.span.clone(),
                    );
                }
            }
            Err(value) => {
                warn!(
                    attribute = %attribute.name,
                    kind = value.type_name(),
                    "value cannot be set as a property"
                );
                self.diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::UnsupportedValueShape,
                        format!(
                            "`{}` evaluated to a {}, only strings and numbers can be set",
                            attribute.name,
                            value.type_name()
                        ),
                    )
                    .at(attribute.span.clone(), self.source_id),
                );
            }
        }
    }

    fn tree_rejected(&mut self, message: String, span: std::ops::Range<usize>) {
        warn!(%message, "target tree rejected an operation");
        self.diagnostics.push(
            Diagnostic::new(DiagnosticKind::TreeRejected, message).at(span, self.source_id),
        );
    }

    fn iteration_error(&mut self, message: String, span: std::ops::Range<usize>) {
        warn!(%message, "skipping dynamic block");
        self.diagnostics.push(
            Diagnostic::new(DiagnosticKind::IterationError, message).at(span, self.source_id),
        );
    }
}

/// Convert an evaluated value into a property. Anything but a string or a
/// number is handed back unchanged.
pub fn coerce(value: Value) -> Result<Property, Value> {
    match value {
        Value::String(s) => Ok(Property::String(s)),
        Value::Number(n) => Ok(Property::Number(n)),
        other => Err(other),
    }
}
