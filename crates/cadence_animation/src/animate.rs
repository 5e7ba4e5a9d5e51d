//! Shorthand for the common "run this N times on that component" case

use crate::dispatcher::AnimationDispatcher;
use crate::error::{AnimationError, Result};
use crate::lifetime::LifeTime;
use crate::repaint::Repaint;
use crate::scheduler::SchedulerHandle;
use crate::status::AnimationStatus;
use crate::task::AnimationHandle;
use std::sync::{Arc, Weak};

/// Convenience entry point over [`AnimationDispatcher`]
///
/// ```ignore
/// Animate::on(&scheduler.handle(), LifeTime::from_millis(250))
///     .component(&button)
///     .go_twice(|status| button.set_glow(status.pulse()))?;
/// ```
#[derive(Clone)]
pub struct Animate {
    scheduler: SchedulerHandle,
    life: LifeTime,
    component: Option<Weak<dyn Repaint>>,
    condition: Option<Condition>,
}

/// Continuation check shared by every animation started from one facade
type Condition = Arc<dyn Fn(&AnimationStatus) -> bool + Send + Sync>;

impl Animate {
    pub fn on(scheduler: &SchedulerHandle, life: LifeTime) -> Self {
        Self {
            scheduler: scheduler.clone(),
            life,
            component: None,
            condition: None,
        }
    }

    /// Repaint `component` after every tick
    pub fn component<C>(mut self, component: &Arc<C>) -> Self
    where
        C: Repaint + 'static,
    {
        self.component = Some(Arc::downgrade(component) as Weak<dyn Repaint>);
        self
    }

    /// Keep each animation running only while `condition` holds
    pub fn until<F>(mut self, condition: F) -> Self
    where
        F: Fn(&AnimationStatus) -> bool + Send + Sync + 'static,
    {
        let condition: Condition = match self.condition.take() {
            Some(existing) => Arc::new(move |status: &AnimationStatus| {
                existing(status) && condition(status)
            }),
            None => Arc::new(condition),
        };
        self.condition = Some(condition);
        self
    }

    /// Stop each animation as soon as `condition` holds
    pub fn stop_when<F>(self, condition: F) -> Self
    where
        F: Fn(&AnimationStatus) -> bool + Send + Sync + 'static,
    {
        self.until(move |status: &AnimationStatus| !condition(status))
    }

    pub fn life(&self) -> LifeTime {
        self.life
    }

    /// Run one cycle
    pub fn go_once<F>(&self, transformation: F) -> Result<AnimationHandle>
    where
        F: FnMut(&AnimationStatus) + Send + 'static,
    {
        self.go(1, transformation)
    }

    /// Run two cycles back to back
    pub fn go_twice<F>(&self, transformation: F) -> Result<AnimationHandle>
    where
        F: FnMut(&AnimationStatus) + Send + 'static,
    {
        self.go(2, transformation)
    }

    /// Run `cycles` cycles back to back
    pub fn go<F>(&self, cycles: u64, transformation: F) -> Result<AnimationHandle>
    where
        F: FnMut(&AnimationStatus) + Send + 'static,
    {
        if cycles == 0 {
            return Err(AnimationError::InvalidArgument(
                "an animation must run at least once".to_string(),
            ));
        }
        self.dispatcher().repeat(cycles).go(transformation)
    }

    fn dispatcher(&self) -> AnimationDispatcher {
        let mut dispatcher = self.scheduler.animate_for(self.life);
        if let Some(component) = &self.component {
            dispatcher = dispatcher.with_target(component.clone());
        }
        if let Some(condition) = &self.condition {
            let condition = Arc::clone(condition);
            dispatcher = dispatcher.until(move |status: &AnimationStatus| condition(status));
        }
        dispatcher
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

    struct Button {
        repaints: AtomicUsize,
    }

    impl Repaint for Button {
        fn component_id(&self) -> ComponentId {
            ComponentId(42)
        }

        fn repaint(&self) {
            self.repaints.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn scheduler() -> (AnimationScheduler, ManualClock) {
        let clock = ManualClock::new();
        let scheduler = AnimationScheduler::with_clock(
            SchedulerConfig::default(),
            Arc::new(CoupledEventProcessor::lenient()),
            Arc::new(clock.clone()),
        );
        (scheduler, clock)
    }

    fn cycles_seen(
        scheduler: &AnimationScheduler,
        clock: &ManualClock,
        animate: impl FnOnce(Box<dyn FnMut(&AnimationStatus) + Send>) -> Result<AnimationHandle>,
    ) -> (Vec<u64>, AnimationHandle) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handle = animate(Box::new(move |status: &AnimationStatus| {
            sink.lock().unwrap().push(status.cycle())
        }))
        .unwrap();

        for _ in 0..40 {
            clock.advance(Duration::from_millis(10));
            scheduler.tick();
        }
        let cycles = seen.lock().unwrap().clone();
        (cycles, handle)
    }

    #[test]
    fn test_go_once_runs_single_cycle() {
        let (scheduler, clock) = scheduler();
        let animate = Animate::on(&scheduler.handle(), LifeTime::from_millis(100));

        let (cycles, handle) = cycles_seen(&scheduler, &clock, |f| animate.go_once(f));

        assert_eq!(cycles.iter().max(), Some(&0));
        assert_eq!(handle.state(), TaskState::Finished);
    }

    #[test]
    fn test_go_twice_runs_two_cycles() {
        let (scheduler, clock) = scheduler();
        let animate = Animate::on(&scheduler.handle(), LifeTime::from_millis(100));

        let (cycles, handle) = cycles_seen(&scheduler, &clock, |f| animate.go_twice(f));

        assert_eq!(cycles.iter().max(), Some(&1));
        assert_eq!(cycles.windows(2).filter(|w| w[1] > w[0]).count(), 1);
        assert_eq!(handle.state(), TaskState::Finished);
    }

    #[test]
    fn test_go_n_cycles() {
        let (scheduler, clock) = scheduler();
        let animate = Animate::on(&scheduler.handle(), LifeTime::from_millis(100));

        let (cycles, _handle) = cycles_seen(&scheduler, &clock, |f| animate.go(3, f));
        assert_eq!(cycles.iter().max(), Some(&2));

        assert!(matches!(
            animate.go(0, |_| {}),
            Err(AnimationError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_until_applies_to_every_run() {
        let (scheduler, clock) = scheduler();
        let animate = Animate::on(&scheduler.handle(), LifeTime::from_millis(100))
            .until(|status| status.progress() < 0.55)
            .stop_when(|status| status.cycle() > 0);

        let first = animate.go_twice(|_| {}).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let second = animate
            .go_once(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();

        for _ in 0..10 {
            clock.advance(Duration::from_millis(10));
            scheduler.tick();
        }

        // Progress 0.1 through 0.5 pass, 0.6 stops both
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(first.state(), TaskState::Cancelled);
        assert_eq!(second.state(), TaskState::Cancelled);
    }

    #[test]
    fn test_component_is_repainted() {
        let (scheduler, clock) = scheduler();
        let button = Arc::new(Button {
            repaints: AtomicUsize::new(0),
        });

        Animate::on(&scheduler.handle(), LifeTime::from_millis(30))
            .component(&button)
            .go_once(|_| {})
            .unwrap();

        for _ in 0..5 {
            clock.advance(Duration::from_millis(10));
            scheduler.tick();
        }

        // Ticks at 10, 20 and the terminal tick at 30
        assert_eq!(button.repaints.load(Ordering::SeqCst), 3);
        assert_eq!(scheduler.task_count(), 0);
    }
}
