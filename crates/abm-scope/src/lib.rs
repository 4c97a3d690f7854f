//! `abm-scope`: execution scopes for the `rust_abm` agent runtime.
//!
//! One [`ExecutionScope`] exists per simulation.  Its root frame holds the
//! globals; the step coordinator pushes one agent frame per agent step and
//! behaviors push further frames for nested blocks.
//!
//! | Module     | Contents                                                 |
//! |------------|----------------------------------------------------------|
//! | [`scope`]  | `ExecutionScope`, `FrameGuard`, `FrameId`                |
//! | [`signal`] | `Signal` (break / continue / return / pause / die / abort) |
//! | [`hold`]   | `HoldGate`, `HoldController`                             |
//! | [`error`]  | `ScopedError`, `ErrorKind`, `ScopeResult`                |

pub mod error;
pub mod hold;
pub mod scope;
pub mod signal;

#[cfg(test)]
mod tests;

pub use error::{ErrorKind, ScopeResult, ScopedError};
pub use hold::{HoldController, HoldGate, Wake};
pub use scope::{ExecutionScope, FrameGuard, FrameId};
pub use signal::Signal;
