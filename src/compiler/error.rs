use serde::Serialize;
use thiserror::Error;

use super::ast::Span;

/// A compilation error with source location.
#[derive(Debug, Clone, PartialEq, Error, Serialize)]
#[error("{message}")]
pub struct CompileError {
    pub message: String,
    pub span: Span,
    pub kind: ErrorKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    /// Malformed source text.
    Parse,
    /// Undeclared, redeclared or out-of-context names.
    Scope,
    /// Operator, argument, assignment and declaration mismatches.
    Type,
    /// The variable slot interner ran out of slots.
    Capacity,
}

impl ErrorKind {
    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Parse => "parse",
            ErrorKind::Scope => "scope",
            ErrorKind::Type => "type",
            ErrorKind::Capacity => "capacity",
        }
    }
}

impl CompileError {
    pub fn parse(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: ErrorKind::Parse,
        }
    }

    pub fn scope(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: ErrorKind::Scope,
        }
    }

    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: ErrorKind::Type,
        }
    }

    pub fn capacity(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            kind: ErrorKind::Capacity,
        }
    }

    /// 1-based line and column of the error start.
    pub fn line_col(&self, source: &str) -> (usize, usize) {
        offset_to_line_col(source, self.span.start)
    }

    /// Format the error with source context.
    pub fn format_with_source(&self, source: &str) -> String {
        let (line, col) = self.line_col(source);
        format!("[{}] line {}:{}: {}", self.kind.label(), line, col, self.message)
    }
}

fn offset_to_line_col(source: &str, offset: usize) -> (usize, usize) {
    let mut line = 1;
    let mut col = 1;
    for (i, ch) in source.char_indices() {
        if i >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 1;
        } else {
            col += 1;
        }
    }
    (line, col)
}
