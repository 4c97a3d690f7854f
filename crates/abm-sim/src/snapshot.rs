//! Serialisable view of a running simulation.

use std::collections::BTreeMap;

use abm_agent::{Phase, Population};
use abm_core::{AgentId, Bindings, Cycle, Value};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id:         AgentId,
    pub species:    String,
    pub phase:      Phase,
    /// Current FSM state, if any.
    pub state:      Option<String>,
    pub attributes: BTreeMap<String, Value>,
    /// Locals remembered by the current FSM state.
    pub memory:     BTreeMap<String, Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimSnapshot {
    pub model:     String,
    pub cycle:     Cycle,
    pub seed:      u64,
    pub rng_usage: u64,
    pub globals:   BTreeMap<String, Value>,
    /// Living agents in visiting order.
    pub agents:    Vec<AgentSnapshot>,
}

impl SimSnapshot {
    pub fn agent(&self, id: AgentId) -> Option<&AgentSnapshot> {
        self.agents.iter().find(|a| a.id == id)
    }
}

fn sorted(b: &Bindings) -> BTreeMap<String, Value> {
    b.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
}

pub(crate) fn agents_of(population: &Population) -> Vec<AgentSnapshot> {
    population
        .living()
        .filter_map(|id| {
            let control = population.control(id)?;
            Some(AgentSnapshot {
                id,
                species:    population.species(id)?.to_owned(),
                phase:      control.phase,
                state:      control.state.clone(),
                attributes: sorted(population.attributes(id)?),
                memory:     sorted(&control.memory),
            })
        })
        .collect()
}

pub(crate) fn globals_of(globals: Option<&Bindings>) -> BTreeMap<String, Value> {
    globals.map(sorted).unwrap_or_default()
}
