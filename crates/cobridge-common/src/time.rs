//! Simulation time representation.

use std::fmt;
use std::ops::{Add, AddAssign, Sub};
use std::time::Duration;

/// Simulation time as microseconds since the start of the co-simulation.
///
/// The co-simulation framework reports time in seconds; microsecond
/// resolution is enough to round-trip every value the protocol carries
/// without accumulating floating-point drift step over step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimTime(u64);

impl SimTime {
    /// Time zero (start of the co-simulation).
    pub const ZERO: SimTime = SimTime(0);

    /// Create a simulation time from microseconds.
    pub const fn from_micros(micros: u64) -> Self {
        SimTime(micros)
    }

    /// Create a simulation time from milliseconds.
    pub const fn from_millis(millis: u64) -> Self {
        SimTime(millis * 1_000)
    }

    /// Create a simulation time from (fractional) seconds.
    ///
    /// Negative inputs clamp to [`SimTime::ZERO`].
    pub fn from_secs(secs: f64) -> Self {
        if secs <= 0.0 {
            SimTime::ZERO
        } else {
            SimTime((secs * 1_000_000.0).round() as u64)
        }
    }

    /// Time as whole microseconds.
    pub const fn as_micros(self) -> u64 {
        self.0
    }

    /// Time as fractional seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000_000.0
    }

    /// Convert to a wall-clock [`Duration`].
    pub const fn as_duration(self) -> Duration {
        Duration::from_micros(self.0)
    }
}

impl Add for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimTime) -> SimTime {
        SimTime(self.0 + rhs.0)
    }
}

impl AddAssign for SimTime {
    fn add_assign(&mut self, rhs: SimTime) {
        self.0 += rhs.0;
    }
}

impl Sub for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: SimTime) -> SimTime {
        SimTime(self.0.saturating_sub(rhs.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions_round_trip() {
        let t = SimTime::from_secs(12.5);
        assert_eq!(t.as_micros(), 12_500_000);
        assert_eq!(t.as_secs_f64(), 12.5);
        assert_eq!(SimTime::from_millis(100).as_micros(), 100_000);
    }

    #[test]
    fn test_negative_seconds_clamp_to_zero() {
        assert_eq!(SimTime::from_secs(-1.0), SimTime::ZERO);
    }

    #[test]
    fn test_arithmetic() {
        let a = SimTime::from_secs(1.0);
        let b = SimTime::from_secs(2.5);
        assert_eq!(a + b, SimTime::from_secs(3.5));
        assert_eq!(a - b, SimTime::ZERO);

        let mut t = SimTime::ZERO;
        t += SimTime::from_millis(250);
        assert_eq!(t.as_secs_f64(), 0.25);
    }
}
