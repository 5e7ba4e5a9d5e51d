//! Per-tick animation status
//!
//! An [`AnimationStatus`] is created fresh by the scheduler for every live
//! task on every tick and handed to the task's callbacks. It is never mutated.

use crate::lifetime::LifeTime;
use std::f64::consts::PI;
use std::time::Duration;

/// What kind of tick produced a status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AnimationEvent {
    /// First callback delivered to the task
    Started,
    /// Any intermediate callback
    Running,
    /// Terminal callback after the lifetime ran out
    Finished,
    /// The task was stopped before its lifetime ran out
    Cancelled,
}

/// Direction in which progress is reported
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Stride {
    /// Progress goes from 0 to 1
    #[default]
    Progressive,
    /// Progress goes from 1 to 0
    Regressive,
}

/// Snapshot of an animation at one tick
#[derive(Clone, Debug, PartialEq)]
pub struct AnimationStatus {
    start: Duration,
    now: Duration,
    life: LifeTime,
    cycle: u64,
    event: AnimationEvent,
    stride: Stride,
    progress: f64,
}

impl AnimationStatus {
    /// Status of a task started at `start` as seen at `now`
    ///
    /// For finite lifetimes the cycle is derived from the elapsed time and
    /// progress covers only the current cycle.
    pub fn at(
        start: Duration,
        now: Duration,
        life: LifeTime,
        stride: Stride,
        event: AnimationEvent,
    ) -> Self {
        let elapsed = now.saturating_sub(start);
        let (cycle, raw) = match life.duration() {
            None => (0, elapsed.as_secs_f64()),
            Some(duration) if duration.is_zero() => (0, 1.0),
            Some(duration) => {
                let total = duration.as_nanos();
                let elapsed = elapsed.as_nanos();
                let cycle = (elapsed / total) as u64;
                let within = elapsed % total;
                (cycle, within as f64 / total as f64)
            }
        };
        Self::build(start, now, life, cycle, event, stride, raw)
    }

    /// Terminal status: the given cycle has run to completion
    pub fn end_of(
        start: Duration,
        now: Duration,
        life: LifeTime,
        stride: Stride,
        cycle: u64,
        event: AnimationEvent,
    ) -> Self {
        let raw = if life.is_indefinite() {
            now.saturating_sub(start).as_secs_f64()
        } else {
            1.0
        };
        Self::build(start, now, life, cycle, event, stride, raw)
    }

    fn build(
        start: Duration,
        now: Duration,
        life: LifeTime,
        cycle: u64,
        event: AnimationEvent,
        stride: Stride,
        raw: f64,
    ) -> Self {
        let progress = match life.duration() {
            None => raw,
            Some(duration) => {
                let bounded = quantize(raw.clamp(0.0, 1.0), duration, life.interval());
                match stride {
                    Stride::Progressive => bounded,
                    Stride::Regressive => 1.0 - bounded,
                }
            }
        };
        Self {
            start,
            now,
            life,
            cycle,
            event,
            stride,
            progress,
        }
    }

    /// Fraction of the current cycle completed, in [0, 1] for finite lifetimes
    ///
    /// Indefinite lifetimes report elapsed seconds instead, which keeps
    /// growing without bound.
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Number of completed repeats before the current cycle
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    pub fn event(&self) -> AnimationEvent {
        self.event
    }

    pub fn life(&self) -> LifeTime {
        self.life
    }

    pub fn stride(&self) -> Stride {
        self.stride
    }

    /// When the task started (registration time plus delay)
    pub fn start_timestamp(&self) -> Duration {
        self.start
    }

    /// Clock reading for this tick
    pub fn current_timestamp(&self) -> Duration {
        self.now
    }

    /// Total time since the task started, across all cycles
    pub fn age(&self) -> Duration {
        self.now.saturating_sub(self.start)
    }

    /// When the current cycle started
    pub fn cycle_start(&self) -> Duration {
        match self.life.duration() {
            Some(duration) => {
                let offset = duration.saturating_mul(self.cycle.min(u32::MAX as u64) as u32);
                self.start.saturating_add(offset)
            }
            None => self.start,
        }
    }

    /// Time spent in the current cycle
    pub fn elapsed_in_cycle(&self) -> Duration {
        self.now.saturating_sub(self.cycle_start())
    }

    pub fn is_finished(&self) -> bool {
        self.event == AnimationEvent::Finished
    }

    // =========================================================================
    // Progress curves
    // =========================================================================

    /// Linear interpolation from `start` to `end`
    pub fn progress_between(&self, start: f64, end: f64) -> f64 {
        start + (end - start) * self.progress
    }

    /// `1 - progress`
    pub fn regress(&self) -> f64 {
        1.0 - self.progress
    }

    /// Linear interpolation from `end` back to `start`
    pub fn regress_between(&self, end: f64, start: f64) -> f64 {
        start + (end - start) * self.regress()
    }

    /// Half sine wave: 0 at both ends, 1 halfway through
    pub fn pulse(&self) -> f64 {
        (PI * self.progress).sin()
    }

    /// Fast start, slow finish
    pub fn jump_in(&self) -> f64 {
        (PI * self.progress / 2.0).sin()
    }

    /// Mirror of [`AnimationStatus::jump_in`]: 1 at the start, 0 at the end
    pub fn jump_out(&self) -> f64 {
        (PI * (1.0 - self.progress) / 2.0).sin()
    }

    /// Smooth S-curve from 0 to 1
    pub fn fade_in(&self) -> f64 {
        0.5 * (1.0 + (PI * (self.progress - 0.5)).sin())
    }

    pub fn fade_out(&self) -> f64 {
        1.0 - self.fade_in()
    }

    /// Triangle wave: 0 at both ends, 1 halfway through
    pub fn cycle_wave(&self) -> f64 {
        1.0 - (2.0 * self.progress - 1.0).abs()
    }

    /// Triangle wave shifted by `offset` (wrapping around)
    pub fn cycle_wave_offset(&self, offset: f64) -> f64 {
        let shifted = (self.progress + offset).rem_euclid(1.0);
        1.0 - (2.0 * shifted - 1.0).abs()
    }

    /// Progress held within `[from, to]`
    ///
    /// Below `from` this reports `from`, above `to` it reports `to`. Bounds
    /// outside [0, 1] are clamped and reversed bounds swapped.
    pub fn slice(&self, from: f64, to: f64) -> f64 {
        if from == 0.0 && to == 1.0 {
            return self.progress;
        }
        let (mut from, mut to) = (from, to);
        if from == to {
            tracing::warn!(from, to, "Empty progress slice");
        }
        if !(0.0..=1.0).contains(&from) || !(0.0..=1.0).contains(&to) {
            tracing::warn!(from, to, "Progress slice bounds outside [0, 1], clamping");
            from = from.clamp(0.0, 1.0);
            to = to.clamp(0.0, 1.0);
        }
        if from > to {
            tracing::warn!(from, to, "Progress slice bounds reversed, swapping");
            std::mem::swap(&mut from, &mut to);
        }
        self.progress.clamp(from, to)
    }
}

/// Snap progress down to whole steps of `interval` within `duration`
///
/// Rounding down keeps intermediate ticks strictly below 1 so that only the
/// terminal tick of a cycle reports completion.
fn quantize(progress: f64, duration: Duration, interval: Option<Duration>) -> f64 {
    let Some(interval) = interval else {
        return progress;
    };
    if interval.is_zero() || progress >= 1.0 {
        return progress;
    }
    let steps = duration.as_nanos() / interval.as_nanos();
    if steps == 0 {
        return progress;
    }
    let steps = steps as f64;
    (progress * steps).floor() / steps
}
