//! `abm-agent`: agent population storage for the `rust_abm` runtime.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                   |
//! |---------------|------------------------------------------------------------|
//! | [`store`]     | `Population` (SoA arrays), `AgentRngs`, `ScheduleOrder`    |
//! | [`control`]   | `ControlState`, `Phase` (per-agent architecture state)     |
//! | [`lifecycle`] | `LifecycleRequests`, `Birth`, `CommitReport`               |
//! | [`builder`]   | `PopulationBuilder` (fluent construction)                  |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on status and control types. |

pub mod builder;
pub mod control;
pub mod lifecycle;
pub mod store;


pub use builder::PopulationBuilder;
pub use control::{ControlState, Phase};
pub use lifecycle::{Birth, CommitReport, LifecycleRequests};
pub use store::{AgentRngs, AgentSlot, Population, ScheduleOrder, Status};
