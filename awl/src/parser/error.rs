use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// What went wrong. All kinds are fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Encoding,
    UnterminatedQuote,
    UnterminatedParenthesis,
    UnknownStatement,
    MalformedDeclaration,
    InvalidIdentifier,
    DuplicateBlock,
    DuplicateDescriptor,
    /// End of input inside a block (only with `require_block_end`).
    UnterminatedBlock,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Encoding => "encoding error",
            ErrorKind::UnterminatedQuote => "unterminated quote",
            ErrorKind::UnterminatedParenthesis => "unterminated parenthesis",
            ErrorKind::UnknownStatement => "unknown statement",
            ErrorKind::MalformedDeclaration => "malformed declaration",
            ErrorKind::InvalidIdentifier => "invalid identifier",
            ErrorKind::DuplicateBlock => "duplicate block",
            ErrorKind::DuplicateDescriptor => "duplicate descriptor",
            ErrorKind::UnterminatedBlock => "unterminated block",
        })
    }
}

/// Parse errors with source location information.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{source_name}:{line}: {kind}: {message}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub message: String,
    /// 1-based line number; 0 until the error has been located.
    pub line: usize,
    /// Byte span of the offending statement in the decoded source.
    pub span: Option<Range<usize>>,
    pub source_id: usize,
    pub source_name: String,
    pub notes: Vec<String>,
}

impl ParseError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ParseError {
            kind,
            message: message.into(),
            line: 0,
            span: None,
            source_id: 0,
            source_name: String::new(),
            notes: Vec::new(),
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    /// Fill in line and span unless already known.
    pub fn or_location(mut self, line: usize, span: Range<usize>) -> Self {
        if self.line == 0 {
            self.line = line;
        }
        if self.span.is_none() {
            self.span = Some(span);
        }
        self
    }

    /// Fill in the source id and name unless already known.
    pub fn or_source(mut self, source_id: usize, source_name: &str) -> Self {
        if self.source_name.is_empty() {
            self.source_id = source_id;
            self.source_name = source_name.to_string();
        }
        self
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        let message = format!("{}: {}", self.kind, self.message);
        let mut diagnostic = Diagnostic::error().with_message(message);
        match &self.span {
            Some(span) => {
                diagnostic = diagnostic.with_labels(vec![Label::primary(self.source_id, span.clone())]);
            }
            None => {
                diagnostic = diagnostic.with_notes(vec![format!("at line {}", self.line)]);
            }
        }
        diagnostic.with_notes(self.notes.clone())
    }
}
