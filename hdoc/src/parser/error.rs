use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label, Severity};
use codespan_reporting::files::{Files, SimpleFile};

/// Parse errors with source location information.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub span: Range<usize>,
    pub file_id: usize,
    pub severity: Severity,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn error(message: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            message: message.into(),
            span,
            file_id,
            severity: Severity::Error,
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::new(self.severity)
            .with_message(&self.message)
            .with_labels(vec![Label::primary(self.file_id, self.span.clone())])
            .with_notes(self.notes.clone())
    }

    /// One-line form: `name:line,column: message`.
    pub fn summarize(&self, file: &SimpleFile<&str, &str>) -> String {
        match file.location((), self.span.start) {
            Ok(location) => format!(
                "{}:{},{}: {}",
                file.name(),
                location.line_number,
                location.column_number,
                self.message
            ),
            Err(_) => format!("{}: {}", file.name(), self.message),
        }
    }
}

/// Join every error into a single line, in source order.
pub fn summarize_all(errors: &[ParseError], name: &str, source: &str) -> String {
    let file = SimpleFile::new(name, source);
    errors
        .iter()
        .map(|e| e.summarize(&file))
        .collect::<Vec<_>>()
        .join("; ")
}
