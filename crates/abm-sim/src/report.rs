//! Per-cycle results handed back to the host.

use abm_core::{AgentId, Cycle};
use abm_scope::ScopedError;

use crate::config::Isolation;

/// One behavior failure, attributed to its agent.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentFailure {
    pub cycle:   Cycle,
    pub agent:   AgentId,
    pub species: String,
    /// What was done to the agent.
    pub action:  Isolation,
    pub error:   ScopedError,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub cycle:    Cycle,
    /// Agents visited this cycle.
    pub visited:  usize,
    /// Agents whose architecture ran a behavior.
    pub ran:      usize,
    /// Agents with nothing to do.
    pub idle:     usize,
    pub failures: Vec<AgentFailure>,
    pub born:     Vec<AgentId>,
    pub removed:  Vec<AgentId>,
}

impl StepReport {
    pub fn new(cycle: Cycle) -> Self {
        Self { cycle, ..Self::default() }
    }

    pub fn failed(&self, agent: AgentId) -> bool {
        self.failures.iter().any(|f| f.agent == agent)
    }
}
