//! `abm-behavior`: agent architectures for the `rust_abm` runtime.
//!
//! # Crate layout
//!
//! | Module           | Contents                                                   |
//! |------------------|------------------------------------------------------------|
//! | [`architecture`] | `Architecture`, `Kind`, `ArchitectureExt`, `StepOutcome`   |
//! | [`fsm`]          | `Fsm`, `State`, `Transition`                               |
//! | [`reflex`]       | `Rules`/`Rule`, `Sequence`/`Step`                          |
//! | [`action`]       | `Action`, `Condition` (compiled behavior bodies)           |
//! | [`ctx`]          | `Ctx<'a>`: the mutable view one agent's step runs against  |
//! | [`model`]        | `Model`: species → architecture, verified once at load     |
//! | [`error`]        | `BehaviorError`, `BehaviorResult<T>`                       |
//!
//! # Design notes
//!
//! Architectures are immutable and shared.  Everything that changes while an
//! agent runs (phase, FSM state, state memory) lives in the agent's
//! `ControlState`, reached through [`Ctx`].  The coordinator drives each
//! agent with:
//!
//! 1. `pre_step`: clears leftover flow signals, runs `init` on first use,
//! 2. `step`: before-hooks, the one selected behavior, after-hooks,
//! 3. `abort` when the agent dies.
//!
//! Errors come back as `ScopedError`; the coordinator decides whether they
//! isolate the agent or abort the cycle.

pub mod action;
pub mod architecture;
pub mod ctx;
pub mod error;
pub mod fsm;
pub mod model;
pub mod reflex;


pub use action::{Action, Condition, action, when};
pub use architecture::{Architecture, ArchitectureExt, Kind, StepOutcome};
pub use ctx::Ctx;
pub use error::{BehaviorError, BehaviorResult};
pub use fsm::{Fsm, State, Transition};
pub use model::Model;
pub use reflex::{Rule, Rules, Sequence, Step};
