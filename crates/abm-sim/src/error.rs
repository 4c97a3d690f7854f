use abm_behavior::BehaviorError;
use abm_core::{Cycle, ValidationError};
use abm_geom::GeomError;
use abm_scope::ScopedError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path:   String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    #[error("projection setup failed: {0}")]
    Projection(#[from] GeomError),

    /// An abort-class failure halted the cycle.  Nothing from that cycle
    /// was committed and the clock did not advance.
    #[error("{cycle} aborted: {error}")]
    Aborted { cycle: Cycle, error: ScopedError },

    /// The simulation was aborted earlier and has not been reset.
    #[error("simulation is halted after an abort")]
    Halted,
}

pub type SimResult<T> = Result<T, SimError>;
