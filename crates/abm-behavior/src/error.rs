use abm_core::ValidationError;
use abm_scope::ScopedError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BehaviorError {
    /// Model-load problems; lists every violation found.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("no architecture registered for species '{0}'")]
    UnknownSpecies(String),

    #[error(transparent)]
    Scoped(#[from] ScopedError),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
