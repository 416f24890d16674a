//! Virtual time model.
//!
//! # Design
//!
//! Time is represented as a monotonically increasing `Tick` counter.  One
//! virtual time unit (a second in the experiment catalogue) spans
//! `ticks_per_unit` ticks:
//!
//!   ticks = ceil(units * ticks_per_unit)
//!
//! Cycle periods and delays are configured as exact [`Ratio`]s and converted
//! to ticks once at setup, so agents scheduled "at the same instant" compare
//! equal exactly and tie-breaking never depends on floating-point drift.  The
//! default resolution of 3,600 ticks per unit makes halves, thirds, quarters,
//! fifths, sixths, eighths, ninths and tenths of a unit exact.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::{CpsError, CpsResult};

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute virtual-time instant, in ticks since the start of the run.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// The tick `n` steps after `self`, or `None` past `u64::MAX`.
    #[inline]
    pub fn checked_add(self, n: u64) -> Option<Tick> {
        self.0.checked_add(n).map(Tick)
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── Ratio ────────────────────────────────────────────────────────────────────

/// A non-negative exact rational number, always stored in lowest terms.
///
/// Parses from `"1/3"`, `"15"` or `"0.25"`.  Negative values are not
/// representable, so a "negative period" is rejected at parse time.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct Ratio {
    num: u64,
    den: u64,
}

impl Ratio {
    pub const ZERO: Ratio = Ratio { num: 0, den: 1 };
    pub const ONE: Ratio = Ratio { num: 1, den: 1 };

    /// Build `num / den` in lowest terms.
    pub fn new(num: u64, den: u64) -> CpsResult<Ratio> {
        if den == 0 {
            return Err(CpsError::Parse(format!("ratio {num}/0 has a zero denominator")));
        }
        let g = gcd(num, den);
        Ok(Ratio { num: num / g, den: den / g })
    }

    /// The whole number `n`.
    #[inline]
    pub const fn integer(n: u64) -> Ratio {
        Ratio { num: n, den: 1 }
    }

    #[inline]
    pub fn numer(self) -> u64 {
        self.num
    }

    #[inline]
    pub fn denom(self) -> u64 {
        self.den
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.num == 0
    }

    /// Exact product, or `None` on overflow.
    pub fn checked_mul(self, rhs: Ratio) -> Option<Ratio> {
        // Cross-reduce first to keep the intermediate values small.
        let g1 = gcd(self.num, rhs.den).max(1);
        let g2 = gcd(rhs.num, self.den).max(1);
        let num = (self.num / g1).checked_mul(rhs.num / g2)?;
        let den = (self.den / g2).checked_mul(rhs.den / g1)?;
        Ratio::new(num, den).ok()
    }

    /// Convert to ticks, rounding up so an agent is never woken early.
    ///
    /// A non-zero ratio always yields at least one tick.
    pub fn to_ticks(self, ticks_per_unit: u64) -> u64 {
        let scaled = self.num as u128 * ticks_per_unit as u128;
        let ticks = scaled.div_ceil(self.den as u128);
        u64::try_from(ticks).unwrap_or(u64::MAX)
    }

    /// Lossy conversion for display and logging.
    pub fn as_f64(self) -> f64 {
        self.num as f64 / self.den as f64
    }
}

impl Default for Ratio {
    fn default() -> Self {
        Ratio::ZERO
    }
}

impl PartialOrd for Ratio {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ratio {
    fn cmp(&self, other: &Self) -> Ordering {
        let lhs = self.num as u128 * other.den as u128;
        let rhs = other.num as u128 * self.den as u128;
        lhs.cmp(&rhs)
    }
}

impl fmt::Display for Ratio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.den == 1 {
            write!(f, "{}", self.num)
        } else {
            write!(f, "{}/{}", self.num, self.den)
        }
    }
}

impl FromStr for Ratio {
    type Err = CpsError;

    fn from_str(s: &str) -> CpsResult<Ratio> {
        let s = s.trim();
        let bad = || CpsError::Parse(format!("invalid ratio {s:?}: expected \"n\", \"n/d\" or a decimal"));

        if let Some((n, d)) = s.split_once('/') {
            let num = n.trim().parse::<u64>().map_err(|_| bad())?;
            let den = d.trim().parse::<u64>().map_err(|_| bad())?;
            return Ratio::new(num, den);
        }

        if let Some((int, frac)) = s.split_once('.') {
            if frac.is_empty() || frac.len() > 18 || !frac.bytes().all(|b| b.is_ascii_digit()) {
                return Err(bad());
            }
            let int = if int.is_empty() { 0 } else { int.parse::<u64>().map_err(|_| bad())? };
            let den = 10u64.pow(frac.len() as u32);
            let frac = frac.parse::<u64>().map_err(|_| bad())?;
            let num = int
                .checked_mul(den)
                .and_then(|v| v.checked_add(frac))
                .ok_or_else(bad)?;
            return Ratio::new(num, den);
        }

        s.parse::<u64>().map(Ratio::integer).map_err(|_| bad())
    }
}

impl TryFrom<String> for Ratio {
    type Error = CpsError;
    fn try_from(s: String) -> CpsResult<Ratio> {
        s.parse()
    }
}

impl From<Ratio> for String {
    fn from(r: Ratio) -> String {
        r.to_string()
    }
}

fn gcd(mut a: u64, mut b: u64) -> u64 {
    while b != 0 {
        (a, b) = (b, a % b);
    }
    a
}

// ── SimClock ──────────────────────────────────────────────────────────────────

/// The simulation clock: current tick plus the tick ↔ unit mapping.
///
/// Only the scheduler advances it.
#[derive(Clone, Debug)]
pub struct SimClock {
    /// Ticks per virtual time unit.
    pub ticks_per_unit: u64,
    /// The instant of the most recently fired event.
    pub current_tick: Tick,
}

impl SimClock {
    pub fn new(ticks_per_unit: u64) -> Self {
        Self { ticks_per_unit, current_tick: Tick::ZERO }
    }

    /// Move the clock forward to `tick`.
    ///
    /// The clock never runs backwards; an earlier `tick` is ignored.
    #[inline]
    pub fn advance_to(&mut self, tick: Tick) {
        if tick > self.current_tick {
            self.current_tick = tick;
        }
    }

    /// `tick` expressed in virtual time units.
    #[inline]
    pub fn units(&self, tick: Tick) -> f64 {
        tick.0 as f64 / self.ticks_per_unit as f64
    }

    /// Current time in virtual time units.
    #[inline]
    pub fn now_units(&self) -> f64 {
        self.units(self.current_tick)
    }
}

impl fmt::Display for SimClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3} u)", self.current_tick, self.now_units())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level run configuration.
///
/// Typically built by the application crate (from CLI flags or a config
/// file) and passed to the coordinator builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Ticks per virtual time unit.  Default: 3600.
    pub ticks_per_unit: u64,

    /// Length of a cycle with `cycle_period = 1`, in time units.  Agent
    /// periods are multipliers of this value.  Default: 1.
    pub base_cycle_length: Ratio,

    /// Horizon of the run, in time units.  Events at or after this instant
    /// are not fired.  Default: 180.
    pub until: Ratio,

    /// Real-time deadline for every outstanding completion, in
    /// milliseconds.  `None` waits forever.  Default: 60 000.
    pub reply_timeout_ms: Option<u64>,

    /// Retire an agent after this many stalled cycles in a row.  `None`
    /// keeps stalled agents cycling forever.  Default: 3.
    pub max_consecutive_stalls: Option<u32>,

    /// Seed for the simulated worker's latency and duplicate draws.
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks_per_unit:         3_600,
            base_cycle_length:      Ratio::ONE,
            until:                  Ratio::integer(180),
            reply_timeout_ms:       Some(60_000),
            max_consecutive_stalls: Some(3),
            seed:                   42,
        }
    }
}

impl SimConfig {
    /// The horizon as a tick (exclusive upper bound).
    #[inline]
    pub fn until_tick(&self) -> Tick {
        Tick(self.until.to_ticks(self.ticks_per_unit))
    }

    /// Convert an absolute horizon in units to a tick.
    #[inline]
    pub fn tick_at(&self, units: Ratio) -> Tick {
        Tick(units.to_ticks(self.ticks_per_unit))
    }

    /// Ticks spanned by one cycle of `period` (a multiplier of
    /// `base_cycle_length`).
    pub fn cycle_ticks(&self, period: Ratio) -> CpsResult<u64> {
        let units = self.base_cycle_length.checked_mul(period).ok_or_else(|| {
            CpsError::Config(format!(
                "cycle period {period} × base cycle length {} overflows",
                self.base_cycle_length
            ))
        })?;
        Ok(units.to_ticks(self.ticks_per_unit))
    }

    /// Ticks spanned by `delay` time units.
    #[inline]
    pub fn delay_ticks(&self, delay: Ratio) -> u64 {
        delay.to_ticks(self.ticks_per_unit)
    }

    /// The per-request deadline as a `Duration`.
    pub fn reply_timeout(&self) -> Option<Duration> {
        self.reply_timeout_ms.map(Duration::from_millis)
    }

    /// Construct a `SimClock` pre-configured for this run.
    pub fn make_clock(&self) -> SimClock {
        SimClock::new(self.ticks_per_unit)
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> CpsResult<()> {
        if self.ticks_per_unit == 0 {
            return Err(CpsError::Config("ticks_per_unit must be positive".into()));
        }
        if self.base_cycle_length.is_zero() {
            return Err(CpsError::Config("base_cycle_length must be positive".into()));
        }
        if self.max_consecutive_stalls == Some(0) {
            return Err(CpsError::Config("max_consecutive_stalls must be at least 1".into()));
        }
        Ok(())
    }
}
