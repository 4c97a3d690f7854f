//! Pluggable, usage-counted random number generation.
//!
//! # Algorithms
//!
//! | Algorithm     | Engine          | Reproducible                      |
//! |---------------|-----------------|-----------------------------------|
//! | `ChaCha`      | `ChaCha12Rng`   | across runs, platforms and machines |
//! | `Small`       | `SmallRng`      | across runs on the same platform  |
//! | `ThreadLocal` | `thread_rng()`  | never; usage is always 0          |
//!
//! # Usage accounting
//!
//! One *primitive draw* is one 32-bit word taken from the engine; a 64-bit
//! draw counts as two.  `next_int` with a power-of-two bound always consumes
//! exactly one primitive.
//!
//! # Fast-forwarding with `set_usage`
//!
//! `set_usage(n)` reseeds and replays `n` draws of `next_int(32)`.  The
//! replayed trajectory matches the original only in draw count, not in which
//! bits were consumed: two generators with the same seed and the same
//! `set_usage(n)` continue identically, but a generator that actually drew
//! `n` doubles will diverge from them.  Reference simulation traces depend on
//! this exact behavior, so it must not be "fixed".
//!
//! # Seeding
//!
//! Derived seeds go through the splitmix64 finaliser:
//!
//!   seed = mix(root + (index + 1) * MIXING_CONSTANT)
//!
//! where the constant is the 64-bit fractional part of the golden ratio.
//! Per-agent streams derive from a separate agent domain of the global seed,
//! so no agent shares a stream with the simulation generator or with an
//! agent of another replicate.  Adding agents never disturbs the streams of
//! existing ones.

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha12Rng;

use crate::{AgentId, CoreError, CoreResult};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Bound replayed by [`RandomGenerator::set_usage`].
const REPLAY_BOUND: i32 = 32;

/// Domain index separating per-agent streams from replicate seeds.
const AGENT_DOMAIN: u64 = u64::MAX;

/// Derive an independent seed for stream `index` from a root seed.
#[inline]
pub fn derive_seed(root: u64, index: u64) -> u64 {
    let mut z = root.wrapping_add(index.wrapping_add(1).wrapping_mul(MIXING_CONSTANT));
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

// ── RngAlgorithm ──────────────────────────────────────────────────────────────

/// Identity of the engine behind a [`RandomGenerator`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RngAlgorithm {
    #[default]
    ChaCha,
    Small,
    ThreadLocal,
}

impl RngAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            RngAlgorithm::ChaCha      => "chacha",
            RngAlgorithm::Small       => "small",
            RngAlgorithm::ThreadLocal => "thread_local",
        }
    }

    /// `false` only for the thread-local family.
    #[inline]
    pub fn is_deterministic(self) -> bool {
        !matches!(self, RngAlgorithm::ThreadLocal)
    }
}

impl fmt::Display for RngAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RngAlgorithm {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        match s {
            "chacha" => Ok(RngAlgorithm::ChaCha),
            "small" => Ok(RngAlgorithm::Small),
            "thread_local" | "threaded" => Ok(RngAlgorithm::ThreadLocal),
            other => Err(CoreError::argument(format!("unknown random algorithm '{other}'"))),
        }
    }
}

// ── Counted engine ────────────────────────────────────────────────────────────

/// Wraps an engine and counts 32-bit words drawn from it.
#[derive(Clone)]
struct Counted<R> {
    inner: R,
    usage: u64,
}

impl<R> Counted<R> {
    fn new(inner: R) -> Self {
        Self { inner, usage: 0 }
    }
}

#[inline]
fn words(bytes: usize) -> u64 {
    bytes.div_ceil(4) as u64
}

impl<R: RngCore> RngCore for Counted<R> {
    fn next_u32(&mut self) -> u32 {
        self.usage += 1;
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.usage += 2;
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.usage += words(dest.len());
        self.inner.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.usage += words(dest.len());
        self.inner.try_fill_bytes(dest)
    }
}

#[derive(Clone)]
enum Engine {
    ChaCha(Counted<ChaCha12Rng>),
    Small(Counted<SmallRng>),
    ThreadLocal,
}

impl Engine {
    fn seeded(algorithm: RngAlgorithm, seed: u64) -> Self {
        match algorithm {
            RngAlgorithm::ChaCha      => Engine::ChaCha(Counted::new(ChaCha12Rng::seed_from_u64(seed))),
            RngAlgorithm::Small       => Engine::Small(Counted::new(SmallRng::seed_from_u64(seed))),
            RngAlgorithm::ThreadLocal => Engine::ThreadLocal,
        }
    }

    fn usage(&self) -> u64 {
        match self {
            Engine::ChaCha(r) => r.usage,
            Engine::Small(r) => r.usage,
            Engine::ThreadLocal => 0,
        }
    }
}

// ── RandomGenerator ───────────────────────────────────────────────────────────

/// A seeded, usage-counted random generator.
///
/// The deterministic family is single-owner: it is `Send` but must not be
/// shared between behaviors on different threads without external
/// synchronisation.  The thread-local family holds no state and can simply
/// be cloned into every worker.
#[derive(Clone)]
pub struct RandomGenerator {
    algorithm:      RngAlgorithm,
    seed:           u64,
    engine:         Engine,
    spare_gaussian: Option<f64>,
}

impl fmt::Debug for RandomGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomGenerator")
            .field("algorithm", &self.algorithm)
            .field("seed", &self.seed)
            .field("usage", &self.usage())
            .finish()
    }
}

impl RandomGenerator {
    pub fn new(algorithm: RngAlgorithm, seed: u64) -> Self {
        Self {
            algorithm,
            seed,
            engine: Engine::seeded(algorithm, seed),
            spare_gaussian: None,
        }
    }

    /// Seed from OS entropy.  The chosen seed stays readable via
    /// [`seed`](Self::seed) so the run can be replayed.
    pub fn from_entropy(algorithm: RngAlgorithm) -> Self {
        Self::new(algorithm, rand::random())
    }

    /// Per-agent stream derived from the run's global seed.
    pub fn for_agent(algorithm: RngAlgorithm, global_seed: u64, agent: AgentId) -> Self {
        Self::new(algorithm, derive_seed(derive_seed(global_seed, AGENT_DOMAIN), agent.0 as u64))
    }

    #[inline]
    pub fn algorithm(&self) -> RngAlgorithm {
        self.algorithm
    }

    #[inline]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Primitive draws since the last (re)seed.  Always 0 for the
    /// thread-local family.
    #[inline]
    pub fn usage(&self) -> u64 {
        self.engine.usage()
    }

    /// Restart the stream from `seed`, resetting usage to 0.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.engine = Engine::seeded(self.algorithm, seed);
        self.spare_gaussian = None;
    }

    /// Reseed and replay `usage` draws of `next_int(32)`.  See the module
    /// docs for why this matches the original stream in count only.
    pub fn set_usage(&mut self, usage: u64) {
        if !self.algorithm.is_deterministic() {
            return;
        }
        self.reseed(self.seed);
        for _ in 0..usage {
            self.draw_pow2(REPLAY_BOUND);
        }
    }

    // ── Draws ─────────────────────────────────────────────────────────────

    /// Uniform integer in `[0, upper)`.  Fails if `upper <= 0`.
    pub fn next_int(&mut self, upper: i32) -> CoreResult<i32> {
        if upper <= 0 {
            return Err(CoreError::argument(format!("upper bound must be positive, got {upper}")));
        }
        if (upper & (upper - 1)) == 0 {
            return Ok(self.draw_pow2(upper));
        }
        Ok(self.with_rng(|r| r.gen_range(0..upper)))
    }

    /// Uniform integer in `[lower, upper)`.  Fails if `lower >= upper`.
    pub fn next_int_range(&mut self, lower: i32, upper: i32) -> CoreResult<i32> {
        if lower >= upper {
            return Err(CoreError::argument(format!("empty range [{lower}, {upper})")));
        }
        Ok(self.with_rng(|r| r.gen_range(lower..upper)))
    }

    /// Uniform double in `[0, 1)`.
    pub fn next_double(&mut self) -> f64 {
        self.with_rng(|r| r.r#gen::<f64>())
    }

    /// Uniform double in `[lower, upper)`; `lower` when the range is empty.
    pub fn next_float_range(&mut self, lower: f64, upper: f64) -> CoreResult<f64> {
        if !(lower.is_finite() && upper.is_finite()) || lower > upper {
            return Err(CoreError::argument(format!("invalid range [{lower}, {upper})")));
        }
        if lower == upper {
            return Ok(lower);
        }
        Ok(self.with_rng(|r| r.gen_range(lower..upper)))
    }

    /// Standard normal draw (Marsaglia polar method, pairs cached).
    pub fn next_gaussian(&mut self) -> f64 {
        if let Some(g) = self.spare_gaussian.take() {
            return g;
        }
        loop {
            let v1 = 2.0 * self.next_double() - 1.0;
            let v2 = 2.0 * self.next_double() - 1.0;
            let s = v1 * v1 + v2 * v2;
            if s < 1.0 && s != 0.0 {
                let m = (-2.0 * s.ln() / s).sqrt();
                self.spare_gaussian = Some(v2 * m);
                return v1 * m;
            }
        }
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    pub fn next_bool(&mut self, p: f64) -> bool {
        let p = if p.is_nan() { 0.0 } else { p.clamp(0.0, 1.0) };
        self.with_rng(|r| r.gen_bool(p))
    }

    /// Shuffle a mutable slice in place (Fisher-Yates).
    pub fn shuffle<T>(&mut self, slice: &mut [T]) {
        self.with_rng(|r| slice.shuffle(r))
    }

    /// Random element of `slice`, `None` if empty.
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        self.with_rng(|r| slice.choose(r))
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Exactly one primitive draw: the top bits of a 31-bit word scaled to
    /// the power-of-two `bound`.
    fn draw_pow2(&mut self, bound: i32) -> i32 {
        let bits = (self.with_rng(|r| r.next_u32()) >> 1) as i64;
        ((bound as i64 * bits) >> 31) as i32
    }

    fn with_rng<T>(&mut self, f: impl FnOnce(&mut dyn RngCore) -> T) -> T {
        match &mut self.engine {
            Engine::ChaCha(r) => f(r),
            Engine::Small(r) => f(r),
            Engine::ThreadLocal => f(&mut rand::thread_rng()),
        }
    }
}
