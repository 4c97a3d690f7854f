//! Plain data row types written by output backends.

use std::collections::BTreeMap;

use abm_core::Value;
use abm_sim::{AgentFailure, AgentSnapshot, StepReport};

/// Totals for one committed cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleSummaryRow {
    pub cycle:          u64,
    /// Simulated wall-clock time at the start of the cycle.
    pub unix_time_secs: i64,
    pub visited:        u64,
    pub ran:            u64,
    pub idle:           u64,
    pub failures:       u64,
    pub born:           u64,
    pub removed:        u64,
}

impl CycleSummaryRow {
    pub fn from_report(report: &StepReport, unix_time_secs: i64) -> Self {
        Self {
            cycle: report.cycle.0,
            unix_time_secs,
            visited:  report.visited as u64,
            ran:      report.ran as u64,
            idle:     report.idle as u64,
            failures: report.failures.len() as u64,
            born:     report.born.len() as u64,
            removed:  report.removed.len() as u64,
        }
    }
}

/// One isolated behavior failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailureRow {
    pub cycle:    u64,
    pub agent_id: u32,
    pub species:  String,
    /// `ignore`, `skip` or `kill`.
    pub action:   &'static str,
    pub kind:     String,
    /// Frame trail, e.g. `model/wolf#3/state:hunt`.
    pub location: String,
    pub message:  String,
}

impl From<&AgentFailure> for FailureRow {
    fn from(f: &AgentFailure) -> Self {
        Self {
            cycle:    f.cycle.0,
            agent_id: f.agent.0,
            species:  f.species.clone(),
            action:   f.action.as_str(),
            kind:     f.error.kind.to_string(),
            location: f.error.location.clone(),
            message:  f.error.message.clone(),
        }
    }
}

/// One living agent at a snapshot cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentSnapshotRow {
    pub cycle:      u64,
    pub agent_id:   u32,
    pub species:    String,
    /// Empty when the agent has no FSM state.
    pub state:      String,
    /// `name=value` pairs sorted by name, joined with `;`.
    pub attributes: String,
}

impl AgentSnapshotRow {
    pub fn new(cycle: u64, agent: &AgentSnapshot) -> Self {
        Self {
            cycle,
            agent_id:   agent.id.0,
            species:    agent.species.clone(),
            state:      agent.state.clone().unwrap_or_default(),
            attributes: render_attributes(&agent.attributes),
        }
    }
}

pub(crate) fn render_attributes(attributes: &BTreeMap<String, Value>) -> String {
    attributes
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(";")
}
