//! The `Sim` struct and its cycle loop.

use std::sync::Arc;

use abm_agent::{AgentRngs, LifecycleRequests, Population};
use abm_behavior::{Architecture, Ctx, Model, StepOutcome};
use abm_core::{AgentId, Cycle, RandomGenerator, SimClock};
use abm_geom::Projection;
use abm_scope::{ExecutionScope, HoldController, ScopeResult, ScopedError, Signal};
use tracing::{debug, error, info, warn};

use crate::config::{Isolation, SimConfig};
use crate::report::{AgentFailure, StepReport};
use crate::snapshot::{self, SimSnapshot};
use crate::{NoopObserver, SimError, SimObserver, SimResult};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The step coordinator.
///
/// `Sim` owns everything one simulation mutates and drives the cycle loop:
///
/// 1. **Snapshot**: fix the list of living agents in scheduling order.
///    Agents born during the cycle are not in it.
/// 2. **Visit**: for each agent still alive, `pre_step` then `step` its
///    architecture in a fresh agent frame.  Deaths requested by the agent
///    take effect immediately (the victim's `abort` runs and it is never
///    visited again this cycle).
/// 3. **Isolate**: a failing agent is skipped or killed per
///    [`FailurePolicy`](crate::FailurePolicy); the pass continues.  An
///    abort-class failure ends the cycle with nothing committed.
/// 4. **Commit**: remove the dead, create queued births and run their
///    `init`, then advance the clock.
///
/// Create via [`SimBuilder`](crate::SimBuilder).
pub struct Sim {
    pub config: SimConfig,

    /// Logical clock; advanced once per completed cycle.
    pub clock: SimClock,

    /// Read-only behavior definitions, shareable across replicates.
    pub model: Arc<Model>,

    pub population: Population,

    /// Per-agent streams when `rng_scope = agent`, otherwise empty.
    pub rngs: AgentRngs,

    /// The simulation generator: scheduling shuffles, and behaviors when
    /// `rng_scope = simulation`.
    pub rng: RandomGenerator,

    /// Root frame holds the globals.
    pub scope: ExecutionScope,

    pub projection: Option<Arc<dyn Projection>>,

    pub(crate) requests: LifecycleRequests,
    /// Failures from setup, reported with the first cycle.
    pub(crate) carried:  Vec<AgentFailure>,
    pub(crate) seed:     u64,
    pub(crate) halted:   bool,
}

impl Sim {
    // ── Public API ────────────────────────────────────────────────────────

    /// The seed this run was built with (drawn from entropy if the config
    /// had none).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    #[inline]
    pub fn cycle(&self) -> Cycle {
        self.clock.cycle
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Handle for pausing or aborting this simulation from another thread.
    pub fn hold_controller(&self) -> HoldController {
        self.scope.hold_controller()
    }

    /// Clear a previous abort so stepping can resume.  The aborted cycle's
    /// queued births and deaths are discarded; agents already marked dead
    /// stay dead.
    pub fn reset_abort(&mut self) {
        self.scope.reset_signal();
        self.requests = LifecycleRequests::new();
        self.halted = false;
    }

    /// Run cycles until `config.total_ticks` is reached.
    pub fn run_to_end<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<()> {
        while self.clock.cycle < self.config.end_cycle() {
            self.step_all(observer)?;
        }
        observer.on_sim_end(self.clock.cycle);
        info!(cycle = self.clock.cycle.0, living = self.population.len(), "simulation finished");
        Ok(())
    }

    /// Run exactly `n` cycles from the current position (ignores the end
    /// cycle).
    pub fn run<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<()> {
        for _ in 0..n {
            self.step_all(observer)?;
        }
        Ok(())
    }

    /// One cycle without an observer.
    pub fn step(&mut self) -> SimResult<StepReport> {
        self.step_all(&mut NoopObserver)
    }

    /// Run one full cycle over the living population.
    pub fn step_all<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<StepReport> {
        if self.halted {
            return Err(SimError::Halted);
        }
        let cycle = self.clock.cycle;
        let mut report = StepReport::new(cycle);
        report.failures.append(&mut self.carried);
        observer.on_cycle_start(cycle);

        let order = self.population.snapshot_living(&mut self.rng);
        debug!(cycle = cycle.0, agents = order.len(), "cycle start");

        for agent in order {
            self.host_checkpoint(cycle, observer)?;
            // Killed earlier in this pass.
            if !self.population.is_alive(agent) {
                continue;
            }
            report.visited += 1;

            let result = self.visit(agent, cycle, |arch, ctx| {
                arch.pre_step(ctx)?;
                arch.step(ctx)
            });
            let Some(result) = result else { continue };
            self.apply_requested_deaths(cycle, observer)?;

            match result {
                Ok(StepOutcome::Idle) => report.idle += 1,
                Ok(StepOutcome::Interrupted(Signal::Abort)) => {
                    let err = self.scope.fatal(format!("abort signalled by {agent}"));
                    return Err(self.abort_cycle(cycle, err, observer));
                }
                Ok(_) => report.ran += 1,
                Err(err) if err.is_abort_class() => return Err(self.abort_cycle(cycle, err, observer)),
                Err(err) => self.isolate(agent, cycle, err, &mut report, observer)?,
            }
            self.scope.clear_signal();
        }
        if self.scope.is_aborted() {
            let err = self.scope.fatal("abort signalled");
            return Err(self.abort_cycle(cycle, err, observer));
        }

        self.commit(cycle, &mut report, observer)?;

        self.clock.advance();
        observer.on_cycle_end(&report);
        let interval = self.config.output_interval_ticks;
        if interval > 0 && cycle.0.is_multiple_of(interval) {
            observer.on_snapshot(&self.snapshot());
        }
        debug!(
            cycle = cycle.0,
            ran = report.ran,
            idle = report.idle,
            failures = report.failures.len(),
            "cycle end"
        );
        Ok(report)
    }

    /// A serialisable copy of the current state.
    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            model:     self.model.name().to_owned(),
            cycle:     self.clock.cycle,
            seed:      self.seed,
            rng_usage: self.rng.usage(),
            globals:   snapshot::globals_of(self.scope.globals()),
            agents:    snapshot::agents_of(&self.population),
        }
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Run `f` for one agent inside its own agent frame.  `None` when the
    /// agent has no slot.
    fn visit<F>(&mut self, agent: AgentId, cycle: Cycle, f: F) -> Option<ScopeResult<StepOutcome>>
    where
        F: FnOnce(&Architecture, &mut Ctx<'_>) -> ScopeResult<StepOutcome>,
    {
        // Explicit field borrows so the borrow checker sees disjoint access.
        let model = &self.model;
        let rng = &mut self.rng;
        let rngs = &mut self.rngs;
        let requests = &mut self.requests;
        let scope = &mut self.scope;

        let slot = self.population.slot_mut(agent)?;
        let mut frame = scope.push_agent(format!("{}#{}", slot.species, agent.0), agent);
        let arch = match model.architecture(slot.species) {
            Ok(arch) => arch,
            Err(e) => return Some(Err(frame.error(e.to_string()))),
        };
        let rng = match rngs.get_mut(agent) {
            Some(own) => own,
            None => rng,
        };
        let mut ctx = Ctx::new(&mut *frame, agent, slot.species, slot.attributes, slot.control, rng, requests, cycle);
        Some(f(arch, &mut ctx))
    }

    /// Between agents: honour a host hold, and turn an abort request into an
    /// aborted cycle.
    fn host_checkpoint<O: SimObserver>(&mut self, cycle: Cycle, observer: &mut O) -> SimResult<()> {
        if self.scope.checkpoint() == Signal::Abort {
            let err = self.scope.fatal("abort requested by host");
            return Err(self.abort_cycle(cycle, err, observer));
        }
        Ok(())
    }

    /// Mark every newly requested death and run the victims' `abort`,
    /// following chains of kills until none are left.
    fn apply_requested_deaths<O: SimObserver>(&mut self, cycle: Cycle, observer: &mut O) -> SimResult<()> {
        let dead = self.requests.drain_new_deaths().to_vec();
        for agent in dead {
            self.kill(agent, cycle, observer)?;
        }
        Ok(())
    }

    fn kill<O: SimObserver>(&mut self, agent: AgentId, cycle: Cycle, observer: &mut O) -> SimResult<()> {
        if !self.population.mark_dead(agent) {
            return Ok(());
        }
        // The victim's exit logic must not see the killer's `Die`.
        self.scope.clear_signal();
        let result = self.visit(agent, cycle, |arch, ctx| arch.abort(ctx).map(|_| StepOutcome::Idle));
        self.scope.clear_signal();
        match result {
            Some(Err(err)) if err.is_abort_class() => return Err(self.abort_cycle(cycle, err, observer)),
            Some(Err(err)) => warn!(%agent, error = %err, "error while aborting agent"),
            _ => {}
        }
        // Deaths requested by the victim's exit logic.
        self.apply_requested_deaths(cycle, observer)
    }

    fn isolate<O: SimObserver>(
        &mut self,
        agent:    AgentId,
        cycle:    Cycle,
        err:      ScopedError,
        report:   &mut StepReport,
        observer: &mut O,
    ) -> SimResult<()> {
        let policy = self.config.failure;
        let action = if err.is_warning() { policy.on_warning } else { policy.on_runtime_error };
        let species = self.population.species(agent).unwrap_or_default().to_owned();

        warn!(%agent, species = %species, ?action, error = %err, "agent failure isolated");
        if action == Isolation::Kill {
            self.kill(agent, cycle, observer)?;
        }

        let failure = AgentFailure { cycle, agent, species, action, error: err };
        observer.on_agent_failure(&failure);
        report.failures.push(failure);
        Ok(())
    }

    fn abort_cycle<O: SimObserver>(&mut self, cycle: Cycle, err: ScopedError, observer: &mut O) -> SimError {
        error!(cycle = cycle.0, error = %err, "cycle aborted");
        self.scope.raise(Signal::Abort);
        self.halted = true;
        observer.on_abort(cycle, &err);
        SimError::Aborted { cycle, error: err }
    }

    /// Commit point: deaths, then births, then newborn init.
    fn commit<O: SimObserver>(&mut self, cycle: Cycle, report: &mut StepReport, observer: &mut O) -> SimResult<()> {
        let commit = self.population.commit(&mut self.requests);
        self.rngs.grow_to(self.population.total());

        // A newborn that dies or spawns in its own init is handled at the
        // next commit.
        for &agent in &commit.born {
            self.init_agent(agent, cycle, report, observer)?;
        }

        if !commit.born.is_empty() {
            observer.on_births(cycle, &commit.born);
        }
        if !commit.removed.is_empty() {
            observer.on_deaths(cycle, &commit.removed);
        }
        report.born = commit.born;
        report.removed = commit.removed;
        Ok(())
    }

    /// Run one agent's `init`, isolating non-fatal failures.
    pub(crate) fn init_agent<O: SimObserver>(
        &mut self,
        agent:    AgentId,
        cycle:    Cycle,
        report:   &mut StepReport,
        observer: &mut O,
    ) -> SimResult<()> {
        let result = self.visit(agent, cycle, |arch, ctx| arch.init(ctx).map(|_| StepOutcome::Idle));
        self.apply_requested_deaths(cycle, observer)?;
        let outcome = match result {
            Some(Err(err)) if err.is_abort_class() => Err(self.abort_cycle(cycle, err, observer)),
            Some(Err(err)) => self.isolate(agent, cycle, err, report, observer),
            _ => Ok(()),
        };
        self.scope.clear_signal();
        outcome
    }
}
