//! The `OutputWriter` trait implemented by output backends.

use crate::{AgentSnapshotRow, CycleSummaryRow, FailureRow, OutputResult};

/// A sink for simulation rows.
///
/// Errors are returned to [`SimOutputObserver`](crate::SimOutputObserver),
/// which keeps the first one for [`take_error`](crate::SimOutputObserver::take_error).
pub trait OutputWriter {
    /// Write one row per living agent of a snapshot.
    fn write_snapshots(&mut self, rows: &[AgentSnapshotRow]) -> OutputResult<()>;

    fn write_cycle_summary(&mut self, row: &CycleSummaryRow) -> OutputResult<()>;

    fn write_failure(&mut self, row: &FailureRow) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent.
    fn finish(&mut self) -> OutputResult<()>;
}
