//! Host entry point: decode host variables, parse a document, and render it
//! into a mount point of a target tree.

use std::collections::HashMap;

use hdoc::Document;
use hdoc::parser::{Parser, summarize_all};
use serde_json::Value as JsonValue;
use tracing::{info, warn};

use crate::error::{Diagnostic, DiagnosticKind, RenderError};
use crate::render::Renderer;
use crate::scope::Scope;
use crate::tree::{TargetTree, TreeError, clear_children};
use crate::value::{Value, format_number};

/// The file name parse errors are reported against.
pub const SOURCE_NAME: &str = "inline.hcl";

/// A host variable, decoded into one of the shapes a document can use.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    String(String),
    Number(f64),
    /// Every element read as a string.
    Array(Vec<String>),
    /// Anything else; carries the host type name for the diagnostic.
    Unsupported(&'static str),
}

impl HostValue {
    pub fn from_json(value: &JsonValue) -> HostValue {
        match value {
            JsonValue::String(s) => HostValue::String(s.clone()),
            JsonValue::Number(n) => match n.as_f64() {
                Some(n) => HostValue::Number(n),
                None => HostValue::Unsupported("number"),
            },
            JsonValue::Array(items) => HostValue::Array(items.iter().map(element_string).collect()),
            JsonValue::Bool(_) => HostValue::Unsupported("boolean"),
            JsonValue::Null => HostValue::Unsupported("null"),
            JsonValue::Object(_) => HostValue::Unsupported("object"),
        }
    }

    /// The bindable value, or the host type name when there is none.
    pub fn into_value(self) -> Result<Value, &'static str> {
        match self {
            HostValue::String(s) => Ok(Value::String(s)),
            HostValue::Number(n) => Ok(Value::Number(n)),
            HostValue::Array(items) => Ok(Value::strings(items)),
            HostValue::Unsupported(kind) => Err(kind),
        }
    }
}

/// The string form of one array element.
fn element_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Number(n) => n.as_f64().map(format_number).unwrap_or_else(|| n.to_string()),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Null => "null".to_string(),
        nested => nested.to_string(),
    }
}

/// Outcome of one render call.
#[derive(Debug, Default)]
pub struct RenderResult {
    /// Set when the call failed as a whole: bad arguments, unparsable
    /// source, or a failing tree primitive.
    pub error: Option<String>,
    /// Failures that were recovered from.
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderResult {
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

/// Split a host variables object into named members.
///
/// `null` means no variables. Anything other than an object is rejected.
pub fn decode_variables(variables: &JsonValue) -> Result<Vec<(String, HostValue)>, RenderError> {
    match variables {
        JsonValue::Null => Ok(Vec::new()),
        JsonValue::Object(members) => Ok(members
            .iter()
            .map(|(name, value)| (name.clone(), HostValue::from_json(value)))
            .collect()),
        other => Err(RenderError::Argument(format!(
            "variables must be an object, got {}",
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// Replace the children of `mount` with the rendering of `source`.
pub fn render<T: TargetTree>(
    source: &str,
    variables: &JsonValue,
    tree: &mut T,
    mount: &T::Node,
) -> RenderResult {
    match decode_variables(variables) {
        Ok(variables) => render_host_values(source, variables, tree, mount),
        Err(e) => {
            warn!(error = %e, "rejected render call");
            RenderResult {
                error: Some(e.to_string()),
                diagnostics: Vec::new(),
            }
        }
    }
}

/// Like [`render`], for hosts that decode their own values.
pub fn render_host_values<T: TargetTree>(
    source: &str,
    variables: impl IntoIterator<Item = (String, HostValue)>,
    tree: &mut T,
    mount: &T::Node,
) -> RenderResult {
    let mut diagnostics = Vec::new();
    match render_document(source, variables, tree, mount, &mut diagnostics) {
        Ok(()) => {
            info!(diagnostics = diagnostics.len(), "render finished");
            RenderResult {
                error: None,
                diagnostics,
            }
        }
        Err(e) => {
            warn!(error = %e, "render failed");
            RenderResult {
                error: Some(e.to_string()),
                diagnostics,
            }
        }
    }
}

fn render_document<T: TargetTree>(
    source: &str,
    variables: impl IntoIterator<Item = (String, HostValue)>,
    tree: &mut T,
    mount: &T::Node,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), RenderError> {
    let bindings = bind_variables(variables, diagnostics);

    // The previous rendering is removed even if this source fails to parse
    let removed = clear_children(tree, mount)?;
    info!(
        bytes = source.len(),
        variables = bindings.len(),
        removed,
        "rendering document"
    );

    let document = Parser::new(source.to_string(), 0)
        .parse()
        .map_err(|errors| RenderError::Parse {
            summary: summarize_all(&errors, SOURCE_NAME, source),
            errors,
        })?;

    render_parsed(&document, bindings, tree, mount, diagnostics)?;
    Ok(())
}

/// Turn host values into root bindings. Unsupported values are left unbound
/// and reported.
pub fn bind_variables(
    variables: impl IntoIterator<Item = (String, HostValue)>,
    diagnostics: &mut Vec<Diagnostic>,
) -> HashMap<String, Value> {
    let mut bindings = HashMap::new();
    for (name, host) in variables {
        match host.into_value() {
            Ok(value) => {
                bindings.insert(name, value);
            }
            Err(kind) => {
                warn!(variable = %name, kind, "skipping unsupported host variable");
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnsupportedValueShape,
                    format!("variable `{}` is a {}, which documents cannot use", name, kind),
                ));
            }
        }
    }
    bindings
}

/// Render an already-parsed document into `mount`. The mount is not cleared.
pub fn render_parsed<T: TargetTree>(
    document: &Document,
    bindings: HashMap<String, Value>,
    tree: &mut T,
    mount: &T::Node,
    diagnostics: &mut Vec<Diagnostic>,
) -> Result<(), TreeError> {
    let scope = Scope::root(bindings);
    let mut renderer = Renderer::new(tree, document.source_id);
    let result = renderer.render_body(&document.body, &scope, mount);
    diagnostics.extend(renderer.finish());
    result
}
