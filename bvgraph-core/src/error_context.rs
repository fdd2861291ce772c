//! Errors annotated with what the caller was doing
//!
//! The library returns plain [`Error`]s; the command-line front end wraps
//! them on the way up so a failure reads like
//!
//! ```text
//! error: parse error at line 4: undeclared graph 9
//!   while reading problem.gnf
//! help: see the GNF line formats
//! ```

use crate::error::Error;
use std::fmt;

/// An [`Error`] with the steps that led to it.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// The underlying error
    pub error: Error,
    /// What was being done, innermost step first.
    pub steps: Vec<String>,
    /// Hints for the user
    pub hints: Vec<String>,
}

impl ErrorContext {
    /// Wrap an error without annotations
    pub fn new(error: Error) -> Self {
        Self {
            error,
            steps: Vec::new(),
            hints: Vec::new(),
        }
    }

    /// Record an enclosing step
    #[must_use]
    pub fn with_context(mut self, step: impl Into<String>) -> Self {
        self.steps.push(step.into());
        self
    }

    /// Attach a hint
    #[must_use]
    pub fn with_suggestion(mut self, hint: impl Into<String>) -> Self {
        self.hints.push(hint.into());
        self
    }

    /// Multi-line rendering: the error, then each step outermost first, then hints.
    pub fn format_full(&self) -> String {
        let mut out = format!("error: {}\n", self.error);
        for step in self.steps.iter().rev() {
            out.push_str(&format!("  while {step}\n"));
        }
        for hint in &self.hints {
            out.push_str(&format!("help: {hint}\n"));
        }
        out
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_full())
    }
}

impl std::error::Error for ErrorContext {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<Error> for ErrorContext {
    fn from(error: Error) -> Self {
        Self::new(error)
    }
}

/// Annotate failed results with the step being performed.
pub trait ResultExt<T> {
    /// Annotate with a fixed description
    fn context(self, step: impl Into<String>) -> Result<T, ErrorContext>;

    /// Annotate with a description built only on failure.
    fn with_context<F>(self, f: F) -> Result<T, ErrorContext>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<ErrorContext>> ResultExt<T> for Result<T, E> {
    fn context(self, step: impl Into<String>) -> Result<T, ErrorContext> {
        self.map_err(|e| e.into().with_context(step))
    }

    fn with_context<F>(self, f: F) -> Result<T, ErrorContext>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
