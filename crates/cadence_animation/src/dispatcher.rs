//! Animation registration
//!
//! [`AnimationDispatcher`] is a builder obtained from
//! [`SchedulerHandle::animate_for`]. The finalisers (`go`, `try_go`,
//! `go_on`) turn it into a task record and hand it to the scheduler.
//!
//! ```ignore
//! let handle = scheduler
//!     .handle()
//!     .animate_for(LifeTime::of(300.0, TimeUnit::Milliseconds)?)
//!     .on(&button)
//!     .until(|status| status.progress() < 0.8)
//!     .go(|status| println!("{:.2}", status.progress()))?;
//! ```

use crate::error::{AnimationError, Result};
use crate::lifetime::LifeTime;
use crate::repaint::Repaint;
use crate::scheduler::SchedulerHandle;
use crate::status::{AnimationStatus, Stride};
use crate::task::{AnimationHandle, TaskRecord, TaskShared};
use crate::transformation::{
    bind_property, both, AnimationTransformation, FinishHook, Predicate, Property, TransformError,
    Transformation, ValidityCheck,
};
use std::fmt;
use std::sync::{Arc, Weak};

/// Builder for one animation
#[must_use = "an animation is only registered by go, try_go or go_on"]
pub struct AnimationDispatcher {
    scheduler: SchedulerHandle,
    life: LifeTime,
    stride: Stride,
    cycle_limit: Option<u64>,
    predicate: Option<Predicate>,
    finish: Option<FinishHook>,
    target: Option<Weak<dyn Repaint>>,
    validity: Option<ValidityCheck>,
    /// Builder misuse, reported by the finaliser
    invalid: Option<String>,
}

impl AnimationDispatcher {
    pub(crate) fn new(scheduler: SchedulerHandle, life: LifeTime) -> Self {
        Self {
            scheduler,
            life,
            stride: Stride::default(),
            cycle_limit: Some(1),
            predicate: None,
            finish: None,
            target: None,
            validity: None,
            invalid: None,
        }
    }

    pub fn life(&self) -> LifeTime {
        self.life
    }

    /// Keep running only while `predicate` holds
    ///
    /// Checked before every tick. The first `false` cancels the task without
    /// invoking the transformation for that tick. Calling `until` twice
    /// requires both predicates to hold.
    ///
    /// The predicate is not consulted once the lifetime has run out: the
    /// terminal callback with progress 1 is always delivered.
    pub fn until<F>(mut self, predicate: F) -> Self
    where
        F: FnMut(&AnimationStatus) -> bool + Send + 'static,
    {
        let predicate: Predicate = Box::new(predicate);
        self.predicate = Some(match self.predicate.take() {
            Some(existing) => both(existing, predicate),
            None => predicate,
        });
        self
    }

    /// Stop as soon as `predicate` holds
    pub fn stop_when<F>(self, mut predicate: F) -> Self
    where
        F: FnMut(&AnimationStatus) -> bool + Send + 'static,
    {
        self.until(move |status: &AnimationStatus| !predicate(status))
    }

    /// Repaint `component` after every tick that touched it
    ///
    /// The component is held weakly; once it is dropped the animation ends
    /// silently.
    pub fn on<C>(self, component: &Arc<C>) -> Self
    where
        C: Repaint + 'static,
    {
        let target: Weak<dyn Repaint> = Arc::downgrade(component) as Weak<dyn Repaint>;
        self.with_target(target)
    }

    pub fn on_dyn(self, component: &Arc<dyn Repaint>) -> Self {
        self.with_target(Arc::downgrade(component))
    }

    pub(crate) fn with_target(mut self, target: Weak<dyn Repaint>) -> Self {
        self.target = Some(target);
        self
    }

    /// End the animation silently once `check` returns false
    ///
    /// Use this when the target can become unusable while still alive, for
    /// example a widget removed from its window.
    pub fn valid_while<F>(mut self, check: F) -> Self
    where
        F: Fn() -> bool + Send + 'static,
    {
        self.validity = Some(Box::new(check));
        self
    }

    /// Run `cycles` full lifetimes back to back
    pub fn repeat(mut self, cycles: u64) -> Self {
        if cycles == 0 {
            self.invalid = Some("repeat count must be at least 1".to_string());
        }
        self.cycle_limit = Some(cycles);
        self
    }

    /// Restart the lifetime forever; only a predicate or cancel ends it
    pub fn forever(mut self) -> Self {
        self.cycle_limit = None;
        self
    }

    pub fn stride(mut self, stride: Stride) -> Self {
        self.stride = stride;
        self
    }

    /// Run `hook` once with the terminal status after a natural finish
    ///
    /// Not invoked when the animation is cancelled.
    pub fn on_finish<F>(mut self, hook: F) -> Self
    where
        F: FnOnce(&AnimationStatus) + Send + 'static,
    {
        self.finish = Some(Box::new(hook));
        self
    }

    /// Register `transformation`, called once per tick
    pub fn go<F>(self, mut transformation: F) -> Result<AnimationHandle>
    where
        F: FnMut(&AnimationStatus) + Send + 'static,
    {
        self.dispatch(Box::new(move |status: &AnimationStatus| {
            transformation(status);
            Ok(())
        }))
    }

    /// Register a fallible transformation
    ///
    /// An `Err` is logged and cancels this animation only.
    pub fn try_go<F, E>(self, mut transformation: F) -> Result<AnimationHandle>
    where
        F: FnMut(&AnimationStatus) -> std::result::Result<(), E> + Send + 'static,
        E: fmt::Display,
    {
        self.dispatch(Box::new(move |status: &AnimationStatus| {
            transformation(status).map_err(|e| TransformError::new(e.to_string()))
        }))
    }

    /// Animate `property`: each tick stores `transformation(current, status)`
    pub fn go_on<T, P, F>(self, property: &Arc<P>, transformation: F) -> Result<AnimationHandle>
    where
        T: 'static,
        P: Property<T> + ?Sized + 'static,
        F: AnimationTransformation<T> + 'static,
    {
        self.dispatch(bind_property(Arc::clone(property), transformation))
    }

    fn dispatch(self, transformation: Transformation) -> Result<AnimationHandle> {
        if let Some(reason) = self.invalid {
            return Err(AnimationError::InvalidArgument(reason));
        }
        let shared = self.scheduler.upgrade()?;

        let id = shared.next_id();
        let task = Arc::new(TaskShared::new());
        let start = shared.now().saturating_add(self.life.delay());

        let mut record = TaskRecord::new(id, self.life, start, transformation, Arc::clone(&task));
        record.stride = self.stride;
        record.cycle_limit = self.cycle_limit;
        record.predicate = self.predicate;
        record.finish = self.finish;
        record.target = self.target;
        record.validity = self.validity;

        tracing::debug!(
            %id,
            life = ?self.life,
            cycles = ?self.cycle_limit,
            "Animation registered"
        );
        shared.submit(record);

        Ok(AnimationHandle::new(id, task))
    }
}

impl fmt::Debug for AnimationDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationDispatcher")
            .field("life", &self.life)
            .field("stride", &self.stride)
            .field("cycle_limit", &self.cycle_limit)
            .field("has_target", &self.target.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::config::SchedulerConfig;
    use crate::repaint::ComponentId;
    use crate::scheduler::AnimationScheduler;
    use crate::task::TaskState;
    use cadence_core::CoupledEventProcessor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    fn scheduler() -> (AnimationScheduler, ManualClock) {
        let clock = ManualClock::new();
        let scheduler = AnimationScheduler::with_clock(
            SchedulerConfig::default(),
            Arc::new(CoupledEventProcessor::lenient()),
            Arc::new(clock.clone()),
        );
        (scheduler, clock)
    }

    fn step(scheduler: &AnimationScheduler, clock: &ManualClock, millis: u64) {
        clock.advance(Duration::from_millis(millis));
        scheduler.tick();
    }

    #[test]
    fn test_repeat_zero_is_rejected() {
        let (scheduler, _clock) = scheduler();

        let result = scheduler
            .animate_for(LifeTime::from_millis(100))
            .repeat(0)
            .go(|_| {});

        assert!(matches!(result, Err(AnimationError::InvalidArgument(_))));
        assert_eq!(scheduler.task_count(), 0);
    }

    #[test]
    fn test_ids_are_unique_and_increasing() {
        let (scheduler, _clock) = scheduler();

        let first = scheduler
            .animate_for(LifeTime::from_millis(100))
            .go(|_| {})
            .unwrap();
        let second = scheduler
            .animate_for(LifeTime::from_millis(100))
            .go(|_| {})
            .unwrap();

        assert!(second.id() > first.id());
    }

    #[test]
    fn test_go_on_updates_property() {
        let (scheduler, clock) = scheduler();
        let opacity = Arc::new(Mutex::new(0.0_f64));

        scheduler
            .animate_for(LifeTime::from_millis(100))
            .go_on(&opacity, |_: f64, status: &AnimationStatus| status.fade_in())
            .unwrap();

        step(&scheduler, &clock, 50);
        assert!((*opacity.lock().unwrap() - 0.5).abs() < 1e-9);

        step(&scheduler, &clock, 60);
        assert_eq!(*opacity.lock().unwrap(), 1.0);
    }

    #[test]
    fn test_go_on_accumulates_from_current_value() {
        let (scheduler, clock) = scheduler();
        let ticks = Arc::new(Mutex::new(0_u32));

        scheduler
            .animate_for(LifeTime::from_millis(100))
            .go_on(&ticks, |count: u32, _: &AnimationStatus| count + 1)
            .unwrap();

        for _ in 0..3 {
            step(&scheduler, &clock, 10);
        }
        assert_eq!(*ticks.lock().unwrap(), 3);
    }

    #[test]
    fn test_regressive_stride() {
        let (scheduler, clock) = scheduler();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        scheduler
            .animate_for(LifeTime::from_millis(100))
            .stride(Stride::Regressive)
            .go(move |status| sink.lock().unwrap().push(status.progress()))
            .unwrap();

        step(&scheduler, &clock, 25);
        step(&scheduler, &clock, 100);

        let seen = seen.lock().unwrap();
        assert!((seen[0] - 0.75).abs() < 1e-9);
        assert_eq!(seen[1], 0.0);
    }

    #[test]
    fn test_finish_hook_skipped_on_cancel() {
        let (scheduler, clock) = scheduler();
        let finished = Arc::new(AtomicUsize::new(0));
        let hook = Arc::clone(&finished);

        let handle = scheduler
            .animate_for(LifeTime::from_millis(100))
            .on_finish(move |_| {
                hook.fetch_add(1, Ordering::SeqCst);
            })
            .go(|_| {})
            .unwrap();

        step(&scheduler, &clock, 10);
        handle.cancel();
        step(&scheduler, &clock, 200);

        assert_eq!(handle.state(), TaskState::Cancelled);
        assert_eq!(finished.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_until_combines_predicates() {
        let (scheduler, clock) = scheduler();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        let handle = scheduler
            .animate_for(LifeTime::from_millis(100))
            .until(|status| status.progress() < 0.9)
            .until(|status| status.progress() < 0.25)
            .go(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        for _ in 0..5 {
            step(&scheduler, &clock, 10);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(handle.state(), TaskState::Cancelled);
    }

    #[test]
    fn test_on_dyn_binds_trait_object() {
        struct Label(AtomicUsize);

        impl Repaint for Label {
            fn component_id(&self) -> ComponentId {
                ComponentId(3)
            }

            fn repaint(&self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let (scheduler, clock) = scheduler();
        let label = Arc::new(Label(AtomicUsize::new(0)));
        let component: Arc<dyn Repaint> = label.clone();

        scheduler
            .animate_for(LifeTime::none())
            .on_dyn(&component)
            .go(|_| {})
            .unwrap();

        step(&scheduler, &clock, 16);
        assert_eq!(label.0.load(Ordering::SeqCst), 1);
    }
}
