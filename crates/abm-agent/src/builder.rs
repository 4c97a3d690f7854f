//! Fluent builder for constructing `Population` + `AgentRngs` in one step.
//!
//! # Usage
//!
//! ```rust
//! use abm_agent::PopulationBuilder;
//! use abm_core::{RngAlgorithm, Value};
//!
//! let (population, rngs) = PopulationBuilder::new()
//!     .spawn("ant", 100, |i| [("energy".to_owned(), Value::Int(i as i64))].into())
//!     .spawn("nest", 1, |_| Default::default())
//!     .with_agent_rngs(RngAlgorithm::ChaCha, 42)
//!     .build();
//!
//! assert_eq!(population.len(), 101);
//! assert_eq!(rngs.len(), 101);
//! ```

use abm_core::{Bindings, RngAlgorithm};

use crate::{AgentRngs, Population, ScheduleOrder};

struct Group {
    species: String,
    count:   usize,
    init:    Box<dyn Fn(usize) -> Bindings>,
}

/// Fluent builder for [`Population`] + [`AgentRngs`].
///
/// Agents are created in the order their groups were added, so ids are
/// contiguous per group.
#[derive(Default)]
pub struct PopulationBuilder {
    groups:   Vec<Group>,
    rngs:     Option<(RngAlgorithm, u64)>,
    schedule: ScheduleOrder,
}

impl PopulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` agents of `species`.  `init(i)` supplies the starting
    /// attributes of the `i`-th agent of this group.
    pub fn spawn(mut self, species: impl Into<String>, count: usize, init: impl Fn(usize) -> Bindings + 'static) -> Self {
        self.groups.push(Group { species: species.into(), count, init: Box::new(init) });
        self
    }

    /// Give every agent its own deterministic stream derived from `seed`.
    pub fn with_agent_rngs(mut self, algorithm: RngAlgorithm, seed: u64) -> Self {
        self.rngs = Some((algorithm, seed));
        self
    }

    pub fn schedule(mut self, schedule: ScheduleOrder) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn build(self) -> (Population, AgentRngs) {
        let mut population = Population::new();
        population.set_schedule(self.schedule);
        for group in &self.groups {
            for i in 0..group.count {
                population.spawn(group.species.clone(), (group.init)(i));
            }
        }
        let rngs = match self.rngs {
            Some((algorithm, seed)) => AgentRngs::new(population.total(), algorithm, seed),
            None => AgentRngs::disabled(),
        };
        (population, rngs)
    }
}
