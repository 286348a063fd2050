//! Error types and reporting for the shell.
//!
//! Fallible paths return `ShellError`, which pairs a failure class with a
//! human-readable message and an optional hint. Errors only ever abort the
//! current read-execute cycle; the loop itself keeps running.

use std::fmt;

/// Categorized error types for better diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Syntax error during tokenization
    Parse,
    /// Redirect file could not be opened
    Open,
    /// Pipe or process creation failed
    Resource,
    /// Process image replacement failed
    Exec,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Parse => write!(f, "Parse error"),
            ErrorKind::Open => write!(f, "Open error"),
            ErrorKind::Resource => write!(f, "Resource error"),
            ErrorKind::Exec => write!(f, "Exec error"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShellError {
    pub kind: ErrorKind,
    pub message: String,
    /// Additional context explaining what was expected
    pub context: Option<String>,
}

impl ShellError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ShellError {
            kind,
            message: message.into(),
            context: None,
        }
    }

    /// Add a hint string (e.g., "expected a path after < or >")
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(context) = &self.context {
            write!(f, "\n  hint: {}", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShellError {}

/// Convenience type alias for Results with ShellError
pub type ShellResult<T> = Result<T, ShellError>;
