use abm_core::CoreError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeomError {
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A point lies outside the domain of a math transform (e.g. a pole
    /// under Web Mercator).
    #[error("cannot transform {point} with {transform}: {reason}")]
    Domain {
        transform: &'static str,
        point:     String,
        reason:    &'static str,
    },
}

pub type GeomResult<T> = Result<T, GeomError>;
