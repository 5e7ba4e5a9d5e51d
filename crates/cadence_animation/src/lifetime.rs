//! Animation lifetimes
//!
//! A [`LifeTime`] bounds how long an animation runs and when it starts.
//! It is a plain value: two lifetimes with the same duration, delay and
//! interval are equal.

use crate::error::{AnimationError, Result};
use std::time::Duration;

/// Granularity of a time magnitude
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimeUnit {
    Nanoseconds,
    Microseconds,
    Milliseconds,
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl TimeUnit {
    fn nanos_per_unit(self) -> f64 {
        match self {
            TimeUnit::Nanoseconds => 1.0,
            TimeUnit::Microseconds => 1e3,
            TimeUnit::Milliseconds => 1e6,
            TimeUnit::Seconds => 1e9,
            TimeUnit::Minutes => 60.0 * 1e9,
            TimeUnit::Hours => 3_600.0 * 1e9,
            TimeUnit::Days => 86_400.0 * 1e9,
        }
    }

    /// Convert a magnitude in this unit into a `Duration`
    ///
    /// Fractional magnitudes are rounded to the nearest nanosecond.
    pub fn to_duration(self, magnitude: f64) -> Result<Duration> {
        if !magnitude.is_finite() || magnitude < 0.0 {
            return Err(AnimationError::InvalidArgument(format!(
                "time magnitude must be finite and non-negative, got {magnitude} {self:?}"
            )));
        }
        let nanos = (magnitude * self.nanos_per_unit()).round();
        if nanos >= u64::MAX as f64 {
            return Err(AnimationError::InvalidArgument(format!(
                "time magnitude {magnitude} {self:?} is too large"
            )));
        }
        Ok(Duration::from_nanos(nanos as u64))
    }

    /// Express a `Duration` in this unit
    pub fn from_duration(self, duration: Duration) -> f64 {
        duration.as_nanos() as f64 / self.nanos_per_unit()
    }
}

/// How long an animation lives, after which delay it starts, and how
/// finely its progress is quantised
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct LifeTime {
    /// `None` for an indefinite lifetime
    duration: Option<Duration>,
    delay: Duration,
    interval: Option<Duration>,
}

impl LifeTime {
    /// A lifetime of the given magnitude starting immediately
    pub fn of(magnitude: f64, unit: TimeUnit) -> Result<Self> {
        Ok(Self::from_duration(unit.to_duration(magnitude)?))
    }

    pub const fn from_duration(duration: Duration) -> Self {
        Self {
            duration: Some(duration),
            delay: Duration::ZERO,
            interval: None,
        }
    }

    pub const fn from_millis(millis: u64) -> Self {
        Self::from_duration(Duration::from_millis(millis))
    }

    /// The zero-length lifetime: the animation is applied exactly once
    pub const fn none() -> Self {
        Self::from_duration(Duration::ZERO)
    }

    /// A lifetime that never runs out; only a predicate or cancel ends it
    pub const fn indefinite() -> Self {
        Self {
            duration: None,
            delay: Duration::ZERO,
            interval: None,
        }
    }

    /// The same lifetime, starting after `delay`
    pub fn starting_in(self, delay: f64, unit: TimeUnit) -> Result<Self> {
        Ok(Self {
            delay: unit.to_duration(delay)?,
            ..self
        })
    }

    /// The same lifetime, with progress snapped down to multiples of
    /// `interval / duration`
    pub fn with_interval(self, interval: f64, unit: TimeUnit) -> Result<Self> {
        let interval = unit.to_duration(interval)?;
        if interval.is_zero() {
            return Err(AnimationError::InvalidArgument(
                "progress interval must be greater than zero".to_string(),
            ));
        }
        Ok(Self {
            interval: Some(interval),
            ..self
        })
    }

    /// Length of one cycle, or `None` if indefinite
    pub fn duration(&self) -> Option<Duration> {
        self.duration
    }

    pub fn duration_in(&self, unit: TimeUnit) -> Option<f64> {
        self.duration.map(|d| unit.from_duration(d))
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn delay_in(&self, unit: TimeUnit) -> f64 {
        unit.from_duration(self.delay)
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Whether this is the zero-length "apply once" lifetime
    pub fn is_none(&self) -> bool {
        self.duration == Some(Duration::ZERO)
    }

    pub fn is_indefinite(&self) -> bool {
        self.duration.is_none()
    }
}

impl Default for LifeTime {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_of_converts_units() {
        let life = LifeTime::of(1.5, TimeUnit::Seconds).unwrap();
        assert_eq!(life.duration(), Some(Duration::from_millis(1500)));
        assert_eq!(life.duration_in(TimeUnit::Milliseconds), Some(1500.0));
        assert_eq!(life.delay(), Duration::ZERO);
        assert!(!life.is_none());
        assert!(!life.is_indefinite());

        let day = LifeTime::of(1.0, TimeUnit::Days).unwrap();
        assert_eq!(day.duration(), Some(Duration::from_secs(86_400)));

        let tiny = LifeTime::of(250.0, TimeUnit::Microseconds).unwrap();
        assert_eq!(tiny.duration(), Some(Duration::from_micros(250)));
    }

    #[test]
    fn test_of_rejects_invalid_magnitudes() {
        assert!(matches!(
            LifeTime::of(-1.0, TimeUnit::Milliseconds),
            Err(AnimationError::InvalidArgument(_))
        ));
        assert!(LifeTime::of(f64::NAN, TimeUnit::Seconds).is_err());
        assert!(LifeTime::of(f64::INFINITY, TimeUnit::Seconds).is_err());
        assert!(LifeTime::of(1e300, TimeUnit::Days).is_err());
    }

    #[test]
    fn test_none_and_indefinite() {
        assert!(LifeTime::none().is_none());
        assert_eq!(LifeTime::of(0.0, TimeUnit::Hours).unwrap(), LifeTime::none());
        assert_eq!(LifeTime::default(), LifeTime::none());

        let forever = LifeTime::indefinite();
        assert!(forever.is_indefinite());
        assert!(!forever.is_none());
        assert_eq!(forever.duration(), None);
    }

    #[test]
    fn test_value_equality() {
        let a = LifeTime::of(1.0, TimeUnit::Seconds).unwrap();
        let b = LifeTime::from_millis(1000);
        assert_eq!(a, b);
        assert_ne!(a, a.starting_in(10.0, TimeUnit::Milliseconds).unwrap());
    }

    #[test]
    fn test_starting_in_and_interval() {
        let life = LifeTime::from_millis(300)
            .starting_in(0.5, TimeUnit::Seconds)
            .unwrap()
            .with_interval(50.0, TimeUnit::Milliseconds)
            .unwrap();

        assert_eq!(life.duration(), Some(Duration::from_millis(300)));
        assert_eq!(life.delay(), Duration::from_millis(500));
        assert_eq!(life.delay_in(TimeUnit::Seconds), 0.5);
        assert_eq!(life.interval(), Some(Duration::from_millis(50)));

        assert!(LifeTime::from_millis(300)
            .with_interval(0.0, TimeUnit::Milliseconds)
            .is_err());
        assert!(LifeTime::from_millis(300)
            .starting_in(-5.0, TimeUnit::Milliseconds)
            .is_err());
    }
}
