//! Per-agent architecture bookkeeping.
//!
//! The behavior model itself is immutable and shared; everything that
//! changes while an agent runs lives here, one `ControlState` per agent.

use abm_core::Bindings;

/// Where an agent is in the architecture lifecycle.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Phase {
    #[default]
    Uninitialized,
    Initialized,
    /// Terminal.  Reached through `abort` (death or kill).
    Aborted,
}

#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ControlState {
    pub phase: Phase,
    /// Current FSM state name.  `None` for non-FSM architectures.
    pub state: Option<String>,
    /// The current state's enter block has not run yet.
    pub entering: bool,
    /// Locals remembered by the current state between cycles.
    pub memory: Bindings,
    /// Number of cycles this agent has executed a behavior.
    pub steps: u64,
}

impl ControlState {
    /// Switch to `state`: its enter block runs next step and memory resets.
    pub fn enter_state(&mut self, state: impl Into<String>) {
        self.state = Some(state.into());
        self.entering = true;
        self.memory.clear();
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.phase == Phase::Initialized
    }
}
