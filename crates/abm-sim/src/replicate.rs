//! Independent replicates of one model, optionally in parallel.
//!
//! Replicates share nothing but the read-only `Arc<Model>`.  Each builds its
//! own `Sim` (scope tree, generators, population) on the worker thread that
//! runs it, so results depend only on the seed, never on thread timing.

use std::sync::Arc;

use abm_behavior::Model;
use abm_core::{ReplicateId, derive_seed};
use tracing::info;

use crate::report::{AgentFailure, StepReport};
use crate::snapshot::SimSnapshot;
use crate::{SimBuilder, SimConfig, SimObserver, SimResult};

/// Final state of one replicate.
#[derive(Clone, Debug, PartialEq)]
pub struct ReplicateOutcome {
    pub replicate: ReplicateId,
    pub seed:      u64,
    pub cycles:    u64,
    pub failures:  usize,
    pub snapshot:  SimSnapshot,
}

/// `n` seeds derived from `root`, one per replicate.
pub fn replicate_seeds(root: u64, n: u32) -> Vec<u64> {
    (0..n).map(|i| derive_seed(root, i as u64)).collect()
}

#[derive(Default)]
struct Tally {
    failures: usize,
    cycles:   u64,
}

impl SimObserver for Tally {
    fn on_agent_failure(&mut self, _failure: &AgentFailure) {
        self.failures += 1;
    }

    fn on_cycle_end(&mut self, _report: &StepReport) {
        self.cycles += 1;
    }
}

/// Run one replicate per seed for `cycles` cycles each.
///
/// `setup` receives a builder already holding the model and a config whose
/// seed is the replicate's; it adds the population and any per-replicate
/// globals.  Results come back in seed order.  With the `parallel` feature
/// replicates run on Rayon's pool, sized by `config.num_threads`.
pub fn run_replicates<F>(
    model:  Arc<Model>,
    config: &SimConfig,
    seeds:  &[u64],
    cycles: u64,
    setup:  F,
) -> SimResult<Vec<SimResult<ReplicateOutcome>>>
where
    F: Fn(ReplicateId, SimBuilder) -> SimBuilder + Send + Sync,
{
    let jobs: Vec<(ReplicateId, u64)> =
        seeds.iter().enumerate().map(|(i, &seed)| (ReplicateId(i as u32), seed)).collect();
    let run = |&(replicate, seed): &(ReplicateId, u64)| run_one(&model, config, replicate, seed, cycles, &setup);

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;

        let all = || jobs.par_iter().map(run).collect::<Vec<_>>();
        match config.num_threads {
            Some(n) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| crate::SimError::Config(e.to_string()))?;
                Ok(pool.install(all))
            }
            None => Ok(all()),
        }
    }

    #[cfg(not(feature = "parallel"))]
    {
        Ok(jobs.iter().map(run).collect())
    }
}

fn run_one<F>(
    model:     &Arc<Model>,
    config:    &SimConfig,
    replicate: ReplicateId,
    seed:      u64,
    cycles:    u64,
    setup:     &F,
) -> SimResult<ReplicateOutcome>
where
    F: Fn(ReplicateId, SimBuilder) -> SimBuilder,
{
    let mut config = config.clone();
    config.seed = Some(seed);
    let mut sim = setup(replicate, SimBuilder::new(config, Arc::clone(model))).build()?;

    info!(replicate = replicate.0, seed, cycles, "replicate start");
    let mut tally = Tally::default();
    sim.run(cycles, &mut tally)?;
    info!(replicate = replicate.0, failures = tally.failures, living = sim.population.len(), "replicate end");

    Ok(ReplicateOutcome {
        replicate,
        seed,
        cycles: tally.cycles,
        failures: tally.failures,
        snapshot: sim.snapshot(),
    })
}
