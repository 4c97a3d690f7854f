//! Simulation time model.
//!
//! Time advances in discrete, integer `Cycle`s.  The mapping to wall-clock
//! time is held in `SimClock`:
//!
//!   wall_time = start_unix_secs + cycle * step_secs
//!
//! Only the step coordinator advances the clock, exactly once per completed
//! cycle.  An aborted cycle leaves the clock where it was.

use std::fmt;

// ── Cycle ─────────────────────────────────────────────────────────────────────

/// An absolute simulation cycle counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cycle(pub u64);

impl Cycle {
    pub const ZERO: Cycle = Cycle(0);

    #[inline]
    pub fn next(self) -> Cycle {
        Cycle(self.0 + 1)
    }

    /// Cycles elapsed from `earlier` to `self`, saturating at zero.
    #[inline]
    pub fn since(self, earlier: Cycle) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

impl std::ops::Add<u64> for Cycle {
    type Output = Cycle;
    #[inline]
    fn add(self, rhs: u64) -> Cycle {
        Cycle(self.0 + rhs)
    }
}

impl fmt::Display for Cycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cycle {}", self.0)
    }
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The logical clock of one simulation.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimClock {
    /// Unix timestamp (seconds since epoch) of cycle 0.
    pub start_unix_secs: i64,
    /// Simulated seconds represented by one cycle.
    pub step_secs: u32,
    /// Number of completed cycles.
    pub cycle: Cycle,
}

impl SimClock {
    pub fn new(start_unix_secs: i64, step_secs: u32) -> Self {
        Self { start_unix_secs, step_secs, cycle: Cycle::ZERO }
    }

    /// Advance the clock by one cycle.
    #[inline]
    pub fn advance(&mut self) {
        self.cycle = self.cycle.next();
    }

    /// Elapsed simulated seconds since cycle 0.
    #[inline]
    pub fn elapsed_secs(&self) -> i64 {
        self.cycle.0 as i64 * self.step_secs as i64
    }

    #[inline]
    pub fn current_unix_secs(&self) -> i64 {
        self.start_unix_secs + self.elapsed_secs()
    }

    /// Elapsed time as (day, hour, minute) from the start of the run.
    pub fn elapsed_dhm(&self) -> (u64, u32, u32) {
        let total_secs = self.elapsed_secs().max(0) as u64;
        let days = total_secs / 86_400;
        let hours = ((total_secs % 86_400) / 3_600) as u32;
        let minutes = ((total_secs % 3_600) / 60) as u32;
        (days, hours, minutes)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (d, h, m) = self.elapsed_dhm();
        write!(f, "{} (day {} {:02}:{:02})", self.cycle, d, h, m)
    }
}
