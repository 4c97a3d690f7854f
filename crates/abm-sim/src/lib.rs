//! `abm-sim`: the step coordinator for the rust_abm runtime.
//!
//! # Cycle loop
//!
//! ```text
//! for cycle in 0..config.total_ticks:
//!   ① Snapshot: living agents in scheduling order (newborns excluded).
//!   ② Visit   : per agent: checkpoint (host pause/abort), pre_step, step.
//!                Requested deaths are marked at once and the victim's
//!                architecture aborted.
//!   ③ Isolate : a failing agent is skipped or killed; the pass goes on.
//!                Abort-class failures stop the cycle, nothing is committed.
//!   ④ Commit  : remove the dead, create births, init newborns.
//!   ⑤ Advance : clock + 1, observer hooks, snapshot at the interval.
//! ```
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs replicates on Rayon's thread pool.                |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use abm_sim::{NoopObserver, SimBuilder, SimConfig};
//!
//! let config = SimConfig::from_toml_path("sim.toml")?;
//! let mut sim = SimBuilder::new(config, Arc::new(model))
//!     .population(population)
//!     .build()?;
//! sim.run_to_end(&mut NoopObserver)?;
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod observer;
pub mod replicate;
pub mod report;
pub mod sim;
pub mod snapshot;


pub use builder::SimBuilder;
pub use config::{FailurePolicy, Isolation, RngScope, SimConfig};
pub use error::{SimError, SimResult};
pub use observer::{NoopObserver, SimObserver};
pub use replicate::{ReplicateOutcome, replicate_seeds, run_replicates};
pub use report::{AgentFailure, StepReport};
pub use sim::Sim;
pub use snapshot::{AgentSnapshot, SimSnapshot};
