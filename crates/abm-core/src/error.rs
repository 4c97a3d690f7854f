//! Core error taxonomy.
//!
//! Structural errors (argument, index, not-ready, validation) are raised
//! synchronously by the operation that detects them and are never retried.
//! Sub-crates wrap `CoreError` as one variant of their own enums.

use std::fmt;

use thiserror::Error;

/// The structural error type shared by every `abm-*` crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Invalid input to a core operation (bad RNG bound, zero scale, …).
    #[error("invalid argument: {0}")]
    Argument(String),

    /// Out-of-range access to indexed data such as coordinates.
    #[error("index {index} out of bounds for length {len}")]
    Index { index: usize, len: usize },

    /// Operation invoked before the required initialization step.
    #[error("{0} is not ready")]
    NotReady(String),

    /// Static, load-time structural problems.  Always carries every
    /// violation that was found.
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn argument(msg: impl Into<String>) -> Self {
        CoreError::Argument(msg.into())
    }

    pub fn not_ready(what: impl Into<String>) -> Self {
        CoreError::NotReady(what.into())
    }
}

/// Shorthand result type for `abm-core`.
pub type CoreResult<T> = Result<T, CoreError>;

// ── Validation ────────────────────────────────────────────────────────────────

/// A single structural defect, attributed to the element it concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The offending element (a state name, a ring index, …).
    pub subject: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

/// A complete list of structural violations found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{context}: {} violation(s): {}", .violations.len(), join(.violations))]
pub struct ValidationError {
    pub context:    String,
    pub violations: Vec<Violation>,
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(Violation::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationError {
    /// `true` if some violation's message contains `needle`.
    pub fn mentions(&self, needle: &str) -> bool {
        self.violations.iter().any(|v| v.message.contains(needle))
    }
}

/// Accumulates violations so a validator can report all of them at once.
#[derive(Debug, Default)]
pub struct Violations {
    context: String,
    found:   Vec<Violation>,
}

impl Violations {
    pub fn new(context: impl Into<String>) -> Self {
        Self { context: context.into(), found: Vec::new() }
    }

    pub fn push(&mut self, subject: impl Into<String>, message: impl Into<String>) {
        self.found.push(Violation { subject: subject.into(), message: message.into() });
    }

    pub fn is_empty(&self) -> bool {
        self.found.is_empty()
    }

    pub fn len(&self) -> usize {
        self.found.len()
    }

    /// `Ok(())` when nothing was recorded, otherwise the full list.
    pub fn finish(self) -> Result<(), ValidationError> {
        if self.found.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { context: self.context, violations: self.found })
        }
    }
}
