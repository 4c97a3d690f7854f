//! Fluent builder for constructing a [`Sim`].

use std::sync::Arc;

use abm_agent::{AgentRngs, LifecycleRequests, Population};
use abm_behavior::Model;
use abm_core::{Bindings, RandomGenerator, ReplicateId, Value, derive_seed};
use abm_geom::ProjectionFactory;
use abm_scope::ExecutionScope;
use tracing::info;

use crate::config::{RngScope, SimConfig};
use crate::report::StepReport;
use crate::{NoopObserver, Sim, SimResult};

/// Fluent builder for [`Sim`].
///
/// # Required inputs
///
/// - [`SimConfig`]: cycles, seed, RNG, failure policy, …
/// - `Arc<Model>`: the verified behavior definitions
///
/// # Optional inputs (have defaults)
///
/// | Method            | Default                                  |
/// |-------------------|------------------------------------------|
/// | `.population(p)`  | Empty population                         |
/// | `.global(k, v)`   | The model's own initial globals          |
/// | `.replicate(r)`   | Replicate 0 (seed used as-is)            |
///
/// # Example
///
/// ```rust,ignore
/// let (population, _) = PopulationBuilder::new().spawn("ant", 100, |_| Bindings::new()).build();
/// let mut sim = SimBuilder::new(config, Arc::new(model))
///     .population(population)
///     .build()?;
/// sim.run_to_end(&mut NoopObserver)?;
/// ```
pub struct SimBuilder {
    config:     SimConfig,
    model:      Arc<Model>,
    population: Population,
    globals:    Bindings,
    replicate:  Option<ReplicateId>,
}

impl SimBuilder {
    pub fn new(config: SimConfig, model: Arc<Model>) -> Self {
        Self {
            config,
            model,
            population: Population::new(),
            globals:    Bindings::new(),
            replicate:  None,
        }
    }

    /// The starting agents.  Agent ids are kept as given.
    pub fn population(mut self, population: Population) -> Self {
        self.population = population;
        self
    }

    /// Override one of the model's initial globals (parameter sweeps).
    pub fn global(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.globals.insert(name.into(), value.into());
        self
    }

    /// Derive this run's seed from the master seed and replicate index.
    pub fn replicate(mut self, replicate: ReplicateId) -> Self {
        self.replicate = Some(replicate);
        self
    }

    /// Validate everything, set up scope and generators, and run every
    /// starting agent's `init`.
    pub fn build(mut self) -> SimResult<Sim> {
        self.config.validate()?;
        self.model.verify()?;
        for agent in self.population.living() {
            if let Some(species) = self.population.species(agent) {
                self.model.architecture(species)?;
            }
        }

        let root = match self.config.seed {
            Some(seed) => seed,
            None => RandomGenerator::from_entropy(self.config.rng).seed(),
        };
        self.config.seed = Some(root);
        let seed = match self.replicate {
            Some(r) => derive_seed(root, r.0 as u64),
            None => root,
        };

        let rng = RandomGenerator::new(self.config.rng, seed);
        let rngs = match self.config.rng_scope {
            RngScope::Agent => AgentRngs::new(self.population.total(), self.config.rng, seed),
            RngScope::Simulation => AgentRngs::disabled(),
        };

        let mut scope = ExecutionScope::new(self.model.name());
        scope.set_trace(self.config.trace);
        for (name, value) in self.model.globals().iter().chain(self.globals.iter()) {
            scope.set_global(name.as_str(), value.clone());
        }

        let projection = self.config.projection.as_ref().map(ProjectionFactory::from_config).transpose()?;

        let mut population = self.population;
        population.set_schedule(self.config.schedule);
        let starting: Vec<_> = population.living().collect();

        info!(
            model = self.model.name(),
            agents = starting.len(),
            seed,
            rng = self.config.rng.as_str(),
            "simulation built"
        );

        let mut sim = Sim {
            clock: self.config.make_clock(),
            config: self.config,
            model: self.model,
            population,
            rngs,
            rng,
            scope,
            projection,
            requests: LifecycleRequests::new(),
            carried: Vec::new(),
            seed,
            halted: false,
        };

        let cycle = sim.clock.cycle;
        let mut setup = StepReport::new(cycle);
        for agent in starting {
            sim.init_agent(agent, cycle, &mut setup, &mut NoopObserver)?;
        }
        sim.carried = setup.failures;
        Ok(sim)
    }
}
