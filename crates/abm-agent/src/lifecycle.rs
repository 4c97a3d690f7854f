//! Births and deaths requested during a cycle.
//!
//! Behaviors never touch the population directly.  They queue requests
//! here; the step coordinator marks requested deaths immediately (a dying
//! agent never runs again) and commits everything after the full pass.

use abm_core::{AgentId, Bindings};

#[derive(Clone, Debug, PartialEq)]
pub struct Birth {
    pub species: String,
    pub attributes: Bindings,
    /// The agent whose behavior asked for the birth, if any.
    pub parent: Option<AgentId>,
}

#[derive(Clone, Debug, Default)]
pub struct LifecycleRequests {
    births: Vec<Birth>,
    deaths: Vec<AgentId>,
    /// Deaths already acted on by [`drain_new_deaths`](Self::drain_new_deaths).
    seen_deaths: usize,
}

impl LifecycleRequests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_birth(&mut self, species: impl Into<String>, attributes: Bindings, parent: Option<AgentId>) {
        self.births.push(Birth { species: species.into(), attributes, parent });
    }

    pub fn request_death(&mut self, agent: AgentId) {
        if !self.deaths.contains(&agent) {
            self.deaths.push(agent);
        }
    }

    /// Deaths requested since the last call.
    pub fn drain_new_deaths(&mut self) -> &[AgentId] {
        let start = self.seen_deaths;
        self.seen_deaths = self.deaths.len();
        &self.deaths[start..]
    }

    pub fn births(&self) -> &[Birth] {
        &self.births
    }

    pub fn deaths(&self) -> &[AgentId] {
        &self.deaths
    }

    pub fn is_empty(&self) -> bool {
        self.births.is_empty() && self.deaths.is_empty()
    }

    pub(crate) fn take(&mut self) -> (Vec<Birth>, Vec<AgentId>) {
        self.seen_deaths = 0;
        (std::mem::take(&mut self.births), std::mem::take(&mut self.deaths))
    }
}

/// What a commit changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CommitReport {
    pub born:    Vec<AgentId>,
    pub removed: Vec<AgentId>,
}
