//! `abm-core`: foundational types for the `rust_abm` agent runtime.
//!
//! This crate is a dependency of every other `abm-*` crate and has no
//! `abm-*` dependencies of its own.
//!
//! # What lives here
//!
//! | Module    | Contents                                                   |
//! |-----------|------------------------------------------------------------|
//! | [`ids`]   | `AgentId`, `ReplicateId`                                   |
//! | [`geo`]   | `Point3`, `Envelope3`                                      |
//! | [`time`]  | `Cycle`, `SimClock`                                        |
//! | [`value`] | `Value`, `Bindings`                                        |
//! | [`rng`]   | `RandomGenerator`, `RngAlgorithm`, `derive_seed`           |
//! | [`error`] | `CoreError`, `ValidationError`, `Violations`, `CoreResult` |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public data types.   |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;
pub mod value;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CoreError, CoreResult, ValidationError, Violation, Violations};
pub use geo::{Envelope3, Point3};
pub use ids::{AgentId, ReplicateId};
pub use rng::{RandomGenerator, RngAlgorithm, derive_seed};
pub use time::{Cycle, SimClock};
pub use value::{Bindings, Value};
