//! Agent storage: `Population` (SoA data) and `AgentRngs` (per-agent RNG).
//!
//! # Why two structs?
//!
//! A behavior step needs `&mut` access to one agent's attributes, control
//! state and random stream at the same time, while the coordinator keeps the
//! population borrowed for the living snapshot.  Keeping the per-agent
//! streams in a separate `AgentRngs` lets both borrows coexist without
//! interior mutability.
//!
//! # Identity
//!
//! `AgentId` is the index into every SoA `Vec`.  Ids are never reused: a
//! removed agent stays behind as a tombstone (`Status::Removed`, empty
//! attributes) so stale ids always resolve to "not alive".

use abm_core::{AgentId, Bindings, CoreError, CoreResult, RandomGenerator, RngAlgorithm, Value};
use tracing::debug;

use crate::control::ControlState;
use crate::lifecycle::{CommitReport, LifecycleRequests};

/// Life status of one slot.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Status {
    Alive,
    /// Marked dead this cycle; removed at the next commit.
    Dying,
    Removed,
}

/// Order in which the coordinator visits living agents.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ScheduleOrder {
    #[default]
    Insertion,
    Reverse,
    /// Reshuffled every cycle from the simulation generator.
    Shuffled,
}

// ── AgentRngs ─────────────────────────────────────────────────────────────────

/// Per-agent deterministic streams, separated from [`Population`] so both can
/// be borrowed mutably at once.  Empty when the simulation draws from a
/// single shared generator.
#[derive(Clone, Debug, Default)]
pub struct AgentRngs {
    algorithm: RngAlgorithm,
    seed:      u64,
    inner:     Vec<RandomGenerator>,
    enabled:   bool,
}

impl AgentRngs {
    /// No per-agent streams.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn new(count: usize, algorithm: RngAlgorithm, global_seed: u64) -> Self {
        let mut rngs = Self { algorithm, seed: global_seed, inner: Vec::new(), enabled: true };
        rngs.grow_to(count);
        rngs
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// One agent's stream, `None` when disabled or out of range.
    #[inline]
    pub fn get_mut(&mut self, agent: AgentId) -> Option<&mut RandomGenerator> {
        self.inner.get_mut(agent.index())
    }

    /// Seed streams for ids up to `count`.  New agents get streams derived
    /// from their id, so births never disturb existing streams.
    pub fn grow_to(&mut self, count: usize) {
        if !self.enabled {
            return;
        }
        while self.inner.len() < count {
            let id = AgentId(self.inner.len() as u32);
            self.inner.push(RandomGenerator::for_agent(self.algorithm, self.seed, id));
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

// ── Population ────────────────────────────────────────────────────────────────

/// Mutable borrows of one agent's SoA slots.
#[derive(Debug)]
pub struct AgentSlot<'a> {
    pub id:         AgentId,
    pub species:    &'a str,
    pub attributes: &'a mut Bindings,
    pub control:    &'a mut ControlState,
}

/// Structure-of-Arrays storage for every agent ever created.
///
/// Every `Vec` field has exactly `total()` elements.  The living agents, in
/// visiting order, are listed in `order`.
#[derive(Clone, Debug, Default)]
pub struct Population {
    status:     Vec<Status>,
    species:    Vec<String>,
    attributes: Vec<Bindings>,
    control:    Vec<ControlState>,
    /// Living and dying agents in insertion order.
    order:      Vec<AgentId>,
    schedule:   ScheduleOrder,
}

impl Population {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Agents ever created, tombstones included.
    #[inline]
    pub fn total(&self) -> usize {
        self.status.len()
    }

    /// Agents currently alive.
    pub fn len(&self) -> usize {
        self.order.iter().filter(|a| self.is_alive(**a)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn status(&self, agent: AgentId) -> Option<Status> {
        self.status.get(agent.index()).copied()
    }

    #[inline]
    pub fn is_alive(&self, agent: AgentId) -> bool {
        self.status(agent) == Some(Status::Alive)
    }

    pub fn species(&self, agent: AgentId) -> Option<&str> {
        self.species.get(agent.index()).map(String::as_str)
    }

    pub fn attributes(&self, agent: AgentId) -> Option<&Bindings> {
        self.attributes.get(agent.index())
    }

    pub fn attributes_mut(&mut self, agent: AgentId) -> Option<&mut Bindings> {
        self.attributes.get_mut(agent.index())
    }

    pub fn attribute(&self, agent: AgentId, name: &str) -> Option<&Value> {
        self.attributes(agent).and_then(|a| a.get(name))
    }

    pub fn control(&self, agent: AgentId) -> Option<&ControlState> {
        self.control.get(agent.index())
    }

    pub fn control_mut(&mut self, agent: AgentId) -> Option<&mut ControlState> {
        self.control.get_mut(agent.index())
    }

    /// Split borrows of one agent's slots.
    pub fn slot_mut(&mut self, agent: AgentId) -> Option<AgentSlot<'_>> {
        let i = agent.index();
        let species = self.species.get(i)?;
        let attributes = self.attributes.get_mut(i)?;
        let control = self.control.get_mut(i)?;
        Some(AgentSlot { id: agent, species, attributes, control })
    }

    /// Living agents in insertion order.
    pub fn living(&self) -> impl Iterator<Item = AgentId> + '_ {
        self.order.iter().copied().filter(|a| self.is_alive(*a))
    }

    /// Living agents whose species is `species`.
    pub fn living_of<'a>(&'a self, species: &'a str) -> impl Iterator<Item = AgentId> + 'a {
        self.living().filter(move |a| self.species(*a) == Some(species))
    }

    // ── Scheduling ────────────────────────────────────────────────────────

    pub fn schedule(&self) -> ScheduleOrder {
        self.schedule
    }

    pub fn set_schedule(&mut self, schedule: ScheduleOrder) {
        self.schedule = schedule;
    }

    /// The fixed list of agents the coordinator visits this cycle.
    /// `rng` is only drawn from for [`ScheduleOrder::Shuffled`].
    pub fn snapshot_living(&self, rng: &mut RandomGenerator) -> Vec<AgentId> {
        let mut ids: Vec<AgentId> = self.living().collect();
        match self.schedule {
            ScheduleOrder::Insertion => {}
            ScheduleOrder::Reverse => ids.reverse(),
            ScheduleOrder::Shuffled => rng.shuffle(&mut ids),
        }
        ids
    }

    // ── Lifecycle ─────────────────────────────────────────────────────────

    /// Create an agent immediately.  Only for setup and commit points; during
    /// a cycle use [`LifecycleRequests::request_birth`].
    pub fn spawn(&mut self, species: impl Into<String>, attributes: Bindings) -> AgentId {
        let id = AgentId(self.total() as u32);
        self.status.push(Status::Alive);
        self.species.push(species.into());
        self.attributes.push(attributes);
        self.control.push(ControlState::default());
        self.order.push(id);
        id
    }

    /// Mark `agent` dead now.  It stays in place (and keeps its attributes)
    /// until the next commit.  Returns `false` if it was not alive.
    pub fn mark_dead(&mut self, agent: AgentId) -> bool {
        match self.status.get_mut(agent.index()) {
            Some(s @ Status::Alive) => {
                *s = Status::Dying;
                true
            }
            _ => false,
        }
    }

    /// Commit point: apply queued deaths, then births.  Returns the ids
    /// created and removed.  Newly born agents start `Uninitialized`.
    pub fn commit(&mut self, requests: &mut LifecycleRequests) -> CommitReport {
        let (births, deaths) = requests.take();
        for agent in deaths {
            self.mark_dead(agent);
        }

        let mut report = CommitReport::default();
        for (i, status) in self.status.iter_mut().enumerate() {
            if *status == Status::Dying {
                *status = Status::Removed;
                self.attributes[i].clear();
                self.control[i].memory.clear();
                report.removed.push(AgentId(i as u32));
            }
        }
        if !report.removed.is_empty() {
            let status = &self.status;
            self.order.retain(|a| status[a.index()] != Status::Removed);
        }

        for birth in births {
            report.born.push(self.spawn(birth.species, birth.attributes));
        }

        if !report.born.is_empty() || !report.removed.is_empty() {
            debug!(born = report.born.len(), removed = report.removed.len(), "population commit");
        }
        report
    }

    /// Replace the visiting order.  Must be a permutation of the current
    /// order.
    pub fn set_order(&mut self, order: Vec<AgentId>) -> CoreResult<()> {
        let mut expected = self.order.clone();
        let mut given = order.clone();
        expected.sort();
        given.sort();
        if expected != given {
            return Err(CoreError::argument("order must be a permutation of the current population"));
        }
        self.order = order;
        Ok(())
    }
}
