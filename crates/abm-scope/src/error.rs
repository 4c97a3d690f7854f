use std::fmt;

use abm_core::AgentId;
use thiserror::Error;

/// What kind of failure a [`ScopedError`] records.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum ErrorKind {
    /// Ordinary failure inside a behavior.  `abort` marks it as abort-class.
    Runtime { abort: bool },
    /// A failed model-author check; `fatal` selects the abort path.
    Assertion { fatal: bool },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Runtime { abort: false } => f.write_str("runtime error"),
            ErrorKind::Runtime { abort: true } => f.write_str("fatal runtime error"),
            ErrorKind::Assertion { fatal: false } => f.write_str("assertion warning"),
            ErrorKind::Assertion { fatal: true } => f.write_str("fatal assertion"),
        }
    }
}

/// A failure raised while a scope was active, attributed to the agent and
/// frame trail it happened in.  This is the only error type behaviors hand
/// back to the step coordinator.
#[derive(Debug, Clone, PartialEq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("{kind} in {} at {location}: {message}", agent_label(.agent))]
pub struct ScopedError {
    pub kind:     ErrorKind,
    pub agent:    Option<AgentId>,
    /// Frame labels from the root to the failing frame, `/`-separated.
    pub location: String,
    pub message:  String,
}

fn agent_label(agent: &Option<AgentId>) -> String {
    agent.map_or_else(|| "simulation".to_owned(), |a| a.to_string())
}

impl ScopedError {
    /// Abort-class failures stop the whole step.
    pub fn is_abort_class(&self) -> bool {
        matches!(self.kind, ErrorKind::Runtime { abort: true } | ErrorKind::Assertion { fatal: true })
    }

    /// Non-fatal assertion failures.
    pub fn is_warning(&self) -> bool {
        matches!(self.kind, ErrorKind::Assertion { fatal: false })
    }
}

pub type ScopeResult<T> = Result<T, ScopedError>;
