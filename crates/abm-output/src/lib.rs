//! `abm-output`: CSV output for rust_abm simulations.
//!
//! [`CsvWriter`] creates three files in the output directory:
//!
//! | File                  | One row per                               |
//! |-----------------------|-------------------------------------------|
//! | `cycle_summaries.csv` | completed cycle                           |
//! | `agent_failures.csv`  | isolated behavior failure                 |
//! | `agent_snapshots.csv` | living agent, every output interval       |
//!
//! Writers implement [`OutputWriter`] and are driven by
//! [`SimOutputObserver`], which implements `abm_sim::SimObserver`.
//!
//! # Usage
//!
//! ```rust,ignore
//! use abm_output::{CsvWriter, SimOutputObserver};
//!
//! let writer = CsvWriter::new(Path::new("./output"))?;
//! let mut obs = SimOutputObserver::new(writer, &sim.config);
//! sim.run_to_end(&mut obs)?;
//! if let Some(e) = obs.take_error() {
//!     eprintln!("output error: {e}");
//! }
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::SimOutputObserver;
pub use row::{AgentSnapshotRow, CycleSummaryRow, FailureRow};
pub use writer::OutputWriter;
