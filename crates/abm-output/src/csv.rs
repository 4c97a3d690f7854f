//! CSV output backend.
//!
//! Creates three files in the configured output directory:
//! - `cycle_summaries.csv`
//! - `agent_failures.csv`
//! - `agent_snapshots.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{AgentSnapshotRow, CycleSummaryRow, FailureRow, OutputResult};

pub const SUMMARY_HEADER: [&str; 8] =
    ["cycle", "unix_time_secs", "visited", "ran", "idle", "failures", "born", "removed"];
pub const FAILURE_HEADER: [&str; 7] = ["cycle", "agent_id", "species", "action", "kind", "location", "message"];
pub const SNAPSHOT_HEADER: [&str; 5] = ["cycle", "agent_id", "species", "state", "attributes"];

/// Writes simulation output to three CSV files.
pub struct CsvWriter {
    summaries: Writer<File>,
    failures:  Writer<File>,
    snapshots: Writer<File>,
    finished:  bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the three CSV files and write the
    /// header rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut summaries = Writer::from_path(dir.join("cycle_summaries.csv"))?;
        summaries.write_record(SUMMARY_HEADER)?;

        let mut failures = Writer::from_path(dir.join("agent_failures.csv"))?;
        failures.write_record(FAILURE_HEADER)?;

        let mut snapshots = Writer::from_path(dir.join("agent_snapshots.csv"))?;
        snapshots.write_record(SNAPSHOT_HEADER)?;

        Ok(Self { summaries, failures, snapshots, finished: false })
    }
}

impl OutputWriter for CsvWriter {
    fn write_snapshots(&mut self, rows: &[AgentSnapshotRow]) -> OutputResult<()> {
        for row in rows {
            self.snapshots.write_record([
                row.cycle.to_string().as_str(),
                row.agent_id.to_string().as_str(),
                row.species.as_str(),
                row.state.as_str(),
                row.attributes.as_str(),
            ])?;
        }
        Ok(())
    }

    fn write_cycle_summary(&mut self, row: &CycleSummaryRow) -> OutputResult<()> {
        self.summaries.write_record(&[
            row.cycle.to_string(),
            row.unix_time_secs.to_string(),
            row.visited.to_string(),
            row.ran.to_string(),
            row.idle.to_string(),
            row.failures.to_string(),
            row.born.to_string(),
            row.removed.to_string(),
        ])?;
        Ok(())
    }

    fn write_failure(&mut self, row: &FailureRow) -> OutputResult<()> {
        self.failures.write_record([
            row.cycle.to_string().as_str(),
            row.agent_id.to_string().as_str(),
            row.species.as_str(),
            row.action,
            row.kind.as_str(),
            row.location.as_str(),
            row.message.as_str(),
        ])?;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.summaries.flush()?;
        self.failures.flush()?;
        self.snapshots.flush()?;
        Ok(())
    }
}
