//! Simulation configuration, loadable from TOML.
//!
//! Every field has a default, so a config file only lists what it changes:
//!
//! ```toml
//! total_ticks = 500
//! seed        = 42
//! rng         = "chacha"
//! rng_scope   = "agent"
//!
//! [failure]
//! on_runtime_error = "kill"
//! on_warning       = "ignore"
//!
//! [projection]
//! kind   = "scaling"
//! scale  = 2.0
//! ```

use std::path::Path;

use abm_agent::ScheduleOrder;
use abm_core::{Cycle, RngAlgorithm, SimClock, Violations};
use abm_geom::ProjectionConfig;
use serde::{Deserialize, Serialize};

use crate::{SimError, SimResult};

/// Which generator a behavior's `ctx.rng` draws from.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RngScope {
    /// One generator for the whole simulation.
    #[default]
    Simulation,
    /// One stream per agent, derived from the simulation seed and agent id.
    /// Results do not depend on visiting order.
    Agent,
}

/// What happens to an agent whose behavior failed.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    /// Log it and carry on.  Only valid for warnings.
    Ignore,
    /// The agent sits out the rest of the cycle and runs again next cycle.
    Skip,
    /// The agent is marked dead and removed at the end of the cycle.
    Kill,
}

impl Isolation {
    pub fn as_str(self) -> &'static str {
        match self {
            Isolation::Ignore => "ignore",
            Isolation::Skip => "skip",
            Isolation::Kill => "kill",
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct FailurePolicy {
    pub on_runtime_error: Isolation,
    pub on_warning:       Isolation,
}

impl Default for FailurePolicy {
    fn default() -> Self {
        Self { on_runtime_error: Isolation::Kill, on_warning: Isolation::Ignore }
    }
}

/// Top-level simulation configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Unix timestamp of cycle 0.
    pub start_unix_secs: i64,

    /// Simulated seconds per cycle.
    pub tick_duration_secs: u32,

    /// Cycles run by [`Sim::run_to_end`](crate::Sim::run_to_end).
    pub total_ticks: u64,

    /// Master seed.  Drawn from OS entropy when absent; the drawn value is
    /// written back here so the run can be replayed.
    pub seed: Option<u64>,

    pub rng: RngAlgorithm,

    pub rng_scope: RngScope,

    /// Agent visiting order within a cycle.
    pub schedule: ScheduleOrder,

    pub failure: FailurePolicy,

    pub projection: Option<ProjectionConfig>,

    /// Snapshot every N cycles; 0 disables snapshots.
    pub output_interval_ticks: u64,

    /// Worker threads for parallel replicates.  `None` uses all cores.
    pub num_threads: Option<usize>,

    /// Log every frame push at `trace` level.
    pub trace: bool,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            start_unix_secs:       0,
            tick_duration_secs:    1,
            total_ticks:           100,
            seed:                  None,
            rng:                   RngAlgorithm::ChaCha,
            rng_scope:             RngScope::Simulation,
            schedule:              ScheduleOrder::Insertion,
            failure:               FailurePolicy::default(),
            projection:            None,
            output_interval_ticks: 0,
            num_threads:           None,
            trace:                 false,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> SimResult<Self> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_path(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|source| SimError::Io { path: path.display().to_string(), source })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> SimResult<String> {
        toml::to_string(self).map_err(|e| SimError::Config(e.to_string()))
    }

    /// Check every field, reporting all problems at once.
    pub fn validate(&self) -> SimResult<()> {
        let mut v = Violations::new("simulation config");
        if self.tick_duration_secs == 0 {
            v.push("tick_duration_secs", "must be positive");
        }
        if self.failure.on_runtime_error == Isolation::Ignore {
            v.push("failure.on_runtime_error", "runtime errors must skip or kill the agent");
        }
        if self.num_threads == Some(0) {
            v.push("num_threads", "must be positive when set");
        }
        if self.rng_scope == RngScope::Agent && !self.rng.is_deterministic() {
            v.push("rng_scope", "per-agent streams need a deterministic algorithm");
        }
        v.finish()?;
        Ok(())
    }

    /// The cycle at which `run_to_end` stops (exclusive).
    #[inline]
    pub fn end_cycle(&self) -> Cycle {
        Cycle(self.total_ticks)
    }

    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.start_unix_secs, self.tick_duration_secs)
    }
}
