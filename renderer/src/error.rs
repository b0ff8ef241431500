use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic as CodespanDiagnostic, Label, Severity};
use hdoc::parser::ParseError;

use crate::tree::TreeError;

/// Failure to evaluate a single expression.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EvalError {
    #[error("undefined variable: {0}")]
    UndefinedVariable(String),
    #[error("undefined function: {0}")]
    UndefinedFunction(String),
    #[error("type error: expected {expected}, got {got}")]
    TypeError { expected: String, got: String },
    #[error("index {index} out of range for list of length {len}")]
    IndexOutOfRange { index: String, len: usize },
    #[error("division by zero")]
    DivisionByZero,
    #[error("{function}() takes {expected} argument(s), got {got}")]
    Arity {
        function: String,
        expected: usize,
        got: usize,
    },
    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    pub fn type_error(expected: impl Into<String>, got: &str) -> Self {
        EvalError::TypeError {
            expected: expected.into(),
            got: got.to_string(),
        }
    }
}

/// Errors that abort a render call and are reported to the host.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The call itself was malformed; nothing was parsed or mutated.
    #[error("{0}")]
    Argument(String),
    /// The source failed to parse. `summary` joins every error on one line.
    #[error("{summary}")]
    Parse {
        summary: String,
        errors: Vec<ParseError>,
    },
    #[error("target tree operation failed: {0}")]
    Tree(#[from] TreeError),
}

/// The kind of a recovered (non-fatal) failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// A host variable or evaluated property has a type that cannot be bound.
    UnsupportedValueShape,
    /// A `dynamic` block's `for_each` is missing, fails, or is not a list.
    IterationError,
    /// An attribute expression failed to evaluate.
    AttributeEvalError,
    /// A recognized block has the wrong number of labels.
    SchemaViolation,
    /// The target tree refused to create an element or set a property.
    TreeRejected,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DiagnosticKind::UnsupportedValueShape => "unsupported value shape",
            DiagnosticKind::IterationError => "iteration error",
            DiagnosticKind::AttributeEvalError => "attribute error",
            DiagnosticKind::SchemaViolation => "schema violation",
            DiagnosticKind::TreeRejected => "rejected by target",
        };
        write!(f, "{}", name)
    }
}

/// A recovered failure: rendering continued with the affected output omitted.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
    /// Source span, when the failure can be traced to the document.
    pub span: Option<Range<usize>>,
    pub source_id: usize,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Diagnostic {
            kind,
            message: message.into(),
            span: None,
            source_id: 0,
        }
    }

    pub fn at(mut self, span: Range<usize>, source_id: usize) -> Self {
        self.span = Some(span);
        self.source_id = source_id;
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> CodespanDiagnostic<usize> {
        let diagnostic = CodespanDiagnostic::new(Severity::Warning)
            .with_message(self.to_string());
        match &self.span {
            Some(span) => {
                diagnostic.with_labels(vec![Label::primary(self.source_id, span.clone())])
            }
            None => diagnostic,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}
