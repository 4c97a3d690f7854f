//! `SimOutputObserver<W>`: bridges `SimObserver` to an `OutputWriter`.

use abm_core::Cycle;
use abm_sim::{AgentFailure, SimConfig, SimObserver, SimSnapshot, StepReport};

use crate::row::{AgentSnapshotRow, CycleSummaryRow, FailureRow};
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes cycle summaries, isolated failures and
/// agent snapshots to any [`OutputWriter`].
///
/// Errors from the writer are stored internally because `SimObserver` methods
/// have no return value.  After the run returns, check for errors with
/// [`take_error`][Self::take_error].
pub struct SimOutputObserver<W: OutputWriter> {
    writer:             W,
    start_unix_secs:    i64,
    tick_duration_secs: u32,
    last_error:         Option<OutputError>,
}

impl<W: OutputWriter> SimOutputObserver<W> {
    /// Create an observer backed by `writer`, using `config` for wall-clock
    /// conversion.
    pub fn new(writer: W, config: &SimConfig) -> Self {
        Self {
            writer,
            start_unix_secs:    config.start_unix_secs,
            tick_duration_secs: config.tick_duration_secs,
            last_error:         None,
        }
    }

    /// Take the stored write error (if any).  `None` if all writes succeeded.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    /// Unwrap the inner writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn unix_time(&self, cycle: Cycle) -> i64 {
        self.start_unix_secs + cycle.0 as i64 * self.tick_duration_secs as i64
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        if let Err(e) = result {
            // Keep only the first error.
            if self.last_error.is_none() {
                self.last_error = Some(e);
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for SimOutputObserver<W> {
    fn on_agent_failure(&mut self, failure: &AgentFailure) {
        let result = self.writer.write_failure(&FailureRow::from(failure));
        self.store_err(result);
    }

    fn on_cycle_end(&mut self, report: &StepReport) {
        let row = CycleSummaryRow::from_report(report, self.unix_time(report.cycle));
        let result = self.writer.write_cycle_summary(&row);
        self.store_err(result);
    }

    fn on_snapshot(&mut self, snapshot: &SimSnapshot) {
        let cycle = snapshot.cycle.0;
        let rows: Vec<AgentSnapshotRow> =
            snapshot.agents.iter().map(|agent| AgentSnapshotRow::new(cycle, agent)).collect();

        if !rows.is_empty() {
            let result = self.writer.write_snapshots(&rows);
            self.store_err(result);
        }
    }

    fn on_sim_end(&mut self, _final_cycle: Cycle) {
        let result = self.writer.finish();
        self.store_err(result);
    }
}
