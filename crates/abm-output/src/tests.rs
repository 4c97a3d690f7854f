//! Unit tests for abm-output.

use tempfile::TempDir;

fn tmp() -> TempDir {
    tempfile::tempdir().expect("create temp dir")
}

fn read_rows(dir: &TempDir, file: &str) -> Vec<csv::StringRecord> {
    let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
    rdr.records().map(|r| r.unwrap()).collect()
}

// ── CSV writer ────────────────────────────────────────────────────────────────

#[cfg(test)]
mod csv_tests {
    use std::collections::BTreeMap;

    use abm_core::Value;

    use super::*;
    use crate::csv::{CsvWriter, FAILURE_HEADER, SNAPSHOT_HEADER, SUMMARY_HEADER};
    use crate::row::{AgentSnapshotRow, CycleSummaryRow, FailureRow, render_attributes};
    use crate::writer::OutputWriter;

    fn summary_row(cycle: u64) -> CycleSummaryRow {
        CycleSummaryRow {
            cycle,
            unix_time_secs: cycle as i64 * 60,
            visited: 10,
            ran: 9,
            idle: 1,
            failures: 0,
            born: 2,
            removed: 1,
        }
    }

    #[test]
    fn csv_files_created() {
        let dir = tmp();
        let _w = CsvWriter::new(dir.path()).unwrap();
        assert!(dir.path().join("cycle_summaries.csv").exists());
        assert!(dir.path().join("agent_failures.csv").exists());
        assert!(dir.path().join("agent_snapshots.csv").exists());
    }

    #[test]
    fn missing_output_dir_is_created() {
        let dir = tmp();
        let nested = dir.path().join("run").join("a");
        let mut w = CsvWriter::new(&nested).unwrap();
        w.finish().unwrap();
        assert!(nested.join("cycle_summaries.csv").exists());
    }

    #[test]
    fn csv_headers_correct() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();

        for (file, expected) in [
            ("cycle_summaries.csv", &SUMMARY_HEADER[..]),
            ("agent_failures.csv", &FAILURE_HEADER[..]),
            ("agent_snapshots.csv", &SNAPSHOT_HEADER[..]),
        ] {
            let mut rdr = csv::Reader::from_path(dir.path().join(file)).unwrap();
            let headers: Vec<_> = rdr.headers().unwrap().iter().map(str::to_owned).collect();
            assert_eq!(headers, expected, "{file}");
        }
    }

    #[test]
    fn summaries_written_in_order() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        for cycle in 0..3 {
            w.write_cycle_summary(&summary_row(cycle)).unwrap();
        }
        w.finish().unwrap();

        let rows = read_rows(&dir, "cycle_summaries.csv");
        assert_eq!(rows.len(), 3);
        assert_eq!(&rows[2][0], "2");
        assert_eq!(&rows[2][1], "120");
        assert_eq!(&rows[2][6], "2");
    }

    #[test]
    fn failure_message_with_commas_is_quoted() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.write_failure(&FailureRow {
            cycle:    4,
            agent_id: 7,
            species:  "wolf".into(),
            action:   "skip",
            kind:     "runtime error".into(),
            location: "m/wolf#7/state:hunt".into(),
            message:  "expected int, got \"nil\"".into(),
        })
        .unwrap();
        w.finish().unwrap();

        let rows = read_rows(&dir, "agent_failures.csv");
        assert_eq!(rows.len(), 1);
        assert_eq!(&rows[0][3], "skip");
        assert_eq!(&rows[0][5], "m/wolf#7/state:hunt");
        assert_eq!(&rows[0][6], "expected int, got \"nil\"");
    }

    #[test]
    fn attributes_rendered_sorted() {
        let attrs: BTreeMap<String, Value> =
            [("zeta".to_owned(), Value::Int(3)), ("alpha".to_owned(), Value::from("x"))].into();
        assert_eq!(render_attributes(&attrs), "alpha='x';zeta=3");
        assert_eq!(render_attributes(&BTreeMap::new()), "");
    }

    #[test]
    fn snapshot_rows_written() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        let rows: Vec<_> = (0..3)
            .map(|i| AgentSnapshotRow {
                cycle:      2,
                agent_id:   i,
                species:    "ant".into(),
                state:      String::new(),
                attributes: format!("count={i}"),
            })
            .collect();
        w.write_snapshots(&rows).unwrap();
        w.finish().unwrap();

        let read = read_rows(&dir, "agent_snapshots.csv");
        assert_eq!(read.len(), 3);
        assert_eq!(&read[1][4], "count=1");
    }

    #[test]
    fn finish_is_idempotent() {
        let dir = tmp();
        let mut w = CsvWriter::new(dir.path()).unwrap();
        w.finish().unwrap();
        w.finish().unwrap();
    }
}

// ── Observer ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod observer_tests {
    use std::sync::Arc;

    use abm_agent::PopulationBuilder;
    use abm_behavior::{Architecture, Condition, Model, Rule, action};
    use abm_core::{Bindings, Cycle, Value};
    use abm_sim::{SimBuilder, SimConfig, SimObserver, StepReport};

    use super::*;
    use crate::csv::CsvWriter;
    use crate::row::{AgentSnapshotRow, CycleSummaryRow, FailureRow};
    use crate::writer::OutputWriter;
    use crate::{OutputError, OutputResult, SimOutputObserver};

    fn counting() -> Architecture {
        Architecture::rules(vec![Rule::new(
            "count",
            Condition::always(),
            action(|ctx| {
                ctx.add_attr("count", 1)?;
                if ctx.attr("faulty").is_some() {
                    return Err(ctx.error("bad input"));
                }
                Ok(())
            }),
        )])
    }

    #[test]
    fn sim_run_writes_all_three_files() {
        let model = Model::new("colony").species("ant", counting());
        let (population, _) = PopulationBuilder::new()
            .spawn("ant", 4, |i| {
                if i == 1 { [("faulty".to_owned(), Value::Bool(true))].into() } else { Bindings::new() }
            })
            .build();
        let config = SimConfig {
            seed: Some(7),
            total_ticks: 4,
            start_unix_secs: 1_000,
            tick_duration_secs: 60,
            output_interval_ticks: 2,
            ..SimConfig::default()
        };
        let mut sim = SimBuilder::new(config, Arc::new(model)).population(population).build().unwrap();

        let dir = tmp();
        let writer = CsvWriter::new(dir.path()).unwrap();
        let mut obs = SimOutputObserver::new(writer, &sim.config);
        sim.run_to_end(&mut obs).unwrap();
        assert!(obs.take_error().is_none(), "no write errors expected");

        let summaries = read_rows(&dir, "cycle_summaries.csv");
        assert_eq!(summaries.len(), 4);
        assert_eq!(&summaries[0][2], "4", "all four agents visited in cycle 0");
        assert_eq!(&summaries[0][5], "1");
        assert_eq!(&summaries[0][7], "1", "faulty agent removed at commit");
        assert_eq!(&summaries[1][1], "1060");
        assert_eq!(&summaries[1][2], "3");

        let failures = read_rows(&dir, "agent_failures.csv");
        assert_eq!(failures.len(), 1);
        assert_eq!(&failures[0][1], "1");
        assert_eq!(&failures[0][3], "kill");
        assert_eq!(&failures[0][4], "runtime error");
        assert!(failures[0][5].contains("ant#1"));
        assert!(failures[0][6].contains("bad input"));

        // Snapshots after cycles 0 and 2, three survivors each.
        let snapshots = read_rows(&dir, "agent_snapshots.csv");
        assert_eq!(snapshots.len(), 6);
        assert_eq!(&snapshots[0][0], "1");
        assert_eq!(&snapshots[0][4], "count=1");
        assert_eq!(&snapshots[5][0], "3");
        assert_eq!(&snapshots[5][4], "count=3");
    }

    struct Broken {
        calls: usize,
    }

    impl OutputWriter for Broken {
        fn write_snapshots(&mut self, _rows: &[AgentSnapshotRow]) -> OutputResult<()> {
            Ok(())
        }
        fn write_cycle_summary(&mut self, row: &CycleSummaryRow) -> OutputResult<()> {
            self.calls += 1;
            Err(OutputError::Io(std::io::Error::other(format!("disk full at {}", row.cycle))))
        }
        fn write_failure(&mut self, _row: &FailureRow) -> OutputResult<()> {
            Ok(())
        }
        fn finish(&mut self) -> OutputResult<()> {
            Ok(())
        }
    }

    #[test]
    fn first_write_error_is_kept() {
        let mut obs = SimOutputObserver::new(Broken { calls: 0 }, &SimConfig::default());
        obs.on_cycle_end(&StepReport::new(Cycle(0)));
        obs.on_cycle_end(&StepReport::new(Cycle(1)));
        obs.on_sim_end(Cycle(2));

        let err = obs.take_error().expect("error stored");
        assert!(err.to_string().contains("disk full at 0"));
        assert!(obs.take_error().is_none());
        assert_eq!(obs.into_writer().calls, 2);
    }
}
