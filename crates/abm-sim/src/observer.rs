//! Simulation observer trait for progress reporting and data collection.

use abm_core::{AgentId, Cycle};
use abm_scope::ScopedError;

use crate::report::{AgentFailure, StepReport};
use crate::snapshot::SimSnapshot;

/// Callbacks invoked by [`Sim`](crate::Sim) at key points in the cycle loop.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example: progress printer
///
/// ```rust,ignore
/// struct ProgressPrinter { interval: u64 }
///
/// impl SimObserver for ProgressPrinter {
///     fn on_cycle_end(&mut self, report: &StepReport) {
///         if report.cycle.0 % self.interval == 0 {
///             println!("{}: {} agents ran", report.cycle, report.ran);
///         }
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called before the first agent of a cycle runs.
    fn on_cycle_start(&mut self, _cycle: Cycle) {}

    /// Called as soon as an agent failure has been isolated.
    fn on_agent_failure(&mut self, _failure: &AgentFailure) {}

    /// Agents created at the end of `cycle`.
    fn on_births(&mut self, _cycle: Cycle, _born: &[AgentId]) {}

    /// Agents removed at the end of `cycle`.
    fn on_deaths(&mut self, _cycle: Cycle, _removed: &[AgentId]) {}

    /// Called once the cycle has been committed and the clock advanced.
    fn on_cycle_end(&mut self, _report: &StepReport) {}

    /// Called every `config.output_interval_ticks` cycles, after
    /// `on_cycle_end`.
    fn on_snapshot(&mut self, _snapshot: &SimSnapshot) {}

    /// Called when an abort-class failure halts the cycle.
    fn on_abort(&mut self, _cycle: Cycle, _error: &ScopedError) {}

    /// Called once after the final cycle of [`Sim::run_to_end`](crate::Sim::run_to_end).
    fn on_sim_end(&mut self, _final_cycle: Cycle) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
