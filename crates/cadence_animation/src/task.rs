//! Animation task records
//!
//! A [`TaskRecord`] is owned by the scheduler registry and advanced once per
//! tick. Callers only ever see an [`AnimationHandle`], which shares the
//! task's lifecycle state and cancel flag.

use crate::lifetime::LifeTime;
use crate::repaint::{Repaint, RepaintBatch};
use crate::status::{AnimationEvent, AnimationStatus, Stride};
use crate::transformation::{FinishHook, Predicate, Transformation, ValidityCheck};
use cadence_core::panic_message;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

/// Unique identity of a registered animation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

impl AnimationId {
    pub(crate) fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "animation#{}", self.0)
    }
}

/// Lifecycle of a task
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TaskState {
    /// Registered, no callback delivered yet
    Pending = 0,
    /// At least one callback delivered
    Running = 1,
    /// Lifetime ran out; terminal callback delivered
    Finished = 2,
    /// Stopped early by predicate, cancel, failure or stale target
    Cancelled = 3,
}

impl TaskState {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => TaskState::Pending,
            1 => TaskState::Running,
            2 => TaskState::Finished,
            _ => TaskState::Cancelled,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, TaskState::Finished | TaskState::Cancelled)
    }
}

/// State shared between a record and its handles
#[derive(Debug)]
pub(crate) struct TaskShared {
    state: AtomicU8,
    cancel_requested: AtomicBool,
}

impl TaskShared {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(TaskState::Pending as u8),
            cancel_requested: AtomicBool::new(false),
        }
    }

    fn state(&self) -> TaskState {
        TaskState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: TaskState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Caller-side view of a registered animation
#[derive(Clone, Debug)]
pub struct AnimationHandle {
    id: AnimationId,
    shared: Arc<TaskShared>,
}

impl AnimationHandle {
    pub(crate) fn new(id: AnimationId, shared: Arc<TaskShared>) -> Self {
        Self { id, shared }
    }

    pub fn id(&self) -> AnimationId {
        self.id
    }

    pub fn state(&self) -> TaskState {
        self.shared.state()
    }

    /// Whether the task has finished or been cancelled
    pub fn is_done(&self) -> bool {
        self.state().is_terminal()
    }

    /// Ask the scheduler to stop this animation
    ///
    /// Cooperative: the request is honoured at the next tick, which removes
    /// the task without any further callback. Cancelling a task that already
    /// ended does nothing.
    pub fn cancel(&self) {
        self.shared.cancel_requested.store(true, Ordering::Release);
    }

    pub fn is_cancel_requested(&self) -> bool {
        self.shared.cancel_requested.load(Ordering::Acquire)
    }
}

/// What the scheduler should do with a record after advancing it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    Keep,
    Remove(TaskState),
}

/// Registry entry for one animation
pub(crate) struct TaskRecord {
    pub(crate) id: AnimationId,
    pub(crate) life: LifeTime,
    pub(crate) stride: Stride,
    /// Registration time plus delay
    pub(crate) start: Duration,
    pub(crate) cycle: u64,
    /// `None` repeats until cancelled
    pub(crate) cycle_limit: Option<u64>,
    pub(crate) transformation: Transformation,
    pub(crate) predicate: Option<Predicate>,
    pub(crate) finish: Option<FinishHook>,
    pub(crate) target: Option<Weak<dyn Repaint>>,
    pub(crate) validity: Option<ValidityCheck>,
    pub(crate) shared: Arc<TaskShared>,
    pub(crate) ticked: bool,
}

impl TaskRecord {
    pub(crate) fn new(
        id: AnimationId,
        life: LifeTime,
        start: Duration,
        transformation: Transformation,
        shared: Arc<TaskShared>,
    ) -> Self {
        Self {
            id,
            life,
            stride: Stride::default(),
            start,
            cycle: 0,
            cycle_limit: Some(1),
            transformation,
            predicate: None,
            finish: None,
            target: None,
            validity: None,
            shared,
            ticked: false,
        }
    }

    pub(crate) fn id(&self) -> AnimationId {
        self.id
    }

    /// Advance the task to `now`
    ///
    /// User callbacks are isolated: a panic or error ends only this task.
    pub(crate) fn advance(&mut self, now: Duration, repaints: &mut RepaintBatch) -> Step {
        let target = match self.resolve_target() {
            Some(target) => target,
            None => {
                tracing::debug!(id = %self.id, "Animation target is gone, dropping task");
                return Step::Remove(TaskState::Cancelled);
            }
        };

        if self.shared.cancel_requested.load(Ordering::Acquire) {
            tracing::debug!(id = %self.id, "Animation cancelled");
            return Step::Remove(TaskState::Cancelled);
        }

        if now < self.start {
            return Step::Keep;
        }

        let status = self.status_at(now);

        // An exhausted lifetime always ends with its terminal callback
        let predicate = if status.is_finished() {
            None
        } else {
            self.predicate.as_mut()
        };
        if let Some(predicate) = predicate {
            match catch_unwind(AssertUnwindSafe(|| predicate(&status))) {
                Ok(true) => {}
                Ok(false) => {
                    tracing::debug!(id = %self.id, cycle = status.cycle(), "Animation stopped by its predicate");
                    return Step::Remove(TaskState::Cancelled);
                }
                Err(payload) => {
                    tracing::warn!(
                        id = %self.id,
                        "An animation predicate panicked: {}",
                        panic_message(payload.as_ref())
                    );
                    return Step::Remove(TaskState::Cancelled);
                }
            }
        }

        let transformation = &mut self.transformation;
        let outcome = catch_unwind(AssertUnwindSafe(|| transformation(&status)));
        self.ticked = true;

        if let Some(target) = target {
            if !repaints.push(target) {
                return Step::Remove(TaskState::Cancelled);
            }
        }

        match outcome {
            Ok(Ok(())) => {}
            Ok(Err(error)) => {
                tracing::warn!(id = %self.id, "An animation failed: {}", error);
                return Step::Remove(TaskState::Cancelled);
            }
            Err(payload) => {
                tracing::warn!(
                    id = %self.id,
                    "An animation panicked: {}",
                    panic_message(payload.as_ref())
                );
                return Step::Remove(TaskState::Cancelled);
            }
        }

        if status.cycle() > self.cycle {
            tracing::trace!(id = %self.id, cycle = status.cycle(), "Animation entered a new cycle");
        }
        self.cycle = status.cycle();

        if status.is_finished() {
            self.run_finish_hook(&status);
            return Step::Remove(TaskState::Finished);
        }

        self.shared.set_state(TaskState::Running);
        Step::Keep
    }

    /// Record the final state; later calls are ignored
    pub(crate) fn retire(&self, state: TaskState) {
        if !self.shared.state().is_terminal() {
            self.shared.set_state(state);
        }
    }

    /// `Some(None)` when no target is bound, `None` when the target is stale
    fn resolve_target(&self) -> Option<Option<Arc<dyn Repaint>>> {
        if let Some(valid) = self.validity.as_ref() {
            match catch_unwind(AssertUnwindSafe(|| valid())) {
                Ok(true) => {}
                Ok(false) => return None,
                Err(payload) => {
                    tracing::warn!(
                        id = %self.id,
                        "An animation validity check panicked: {}",
                        panic_message(payload.as_ref())
                    );
                    return None;
                }
            }
        }
        match self.target.as_ref() {
            Some(weak) => weak.upgrade().map(Some),
            None => Some(None),
        }
    }

    fn status_at(&self, now: Duration) -> AnimationStatus {
        let event = if self.ticked {
            AnimationEvent::Running
        } else {
            AnimationEvent::Started
        };

        if self.life.is_none() {
            return AnimationStatus::end_of(
                self.start,
                now,
                self.life,
                self.stride,
                0,
                AnimationEvent::Finished,
            );
        }

        let status = AnimationStatus::at(self.start, now, self.life, self.stride, event);
        match self.cycle_limit {
            Some(limit) if status.cycle() >= limit => AnimationStatus::end_of(
                self.start,
                now,
                self.life,
                self.stride,
                limit.saturating_sub(1),
                AnimationEvent::Finished,
            ),
            _ => status,
        }
    }

    fn run_finish_hook(&mut self, status: &AnimationStatus) {
        let Some(hook) = self.finish.take() else {
            return;
        };
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| hook(status))) {
            tracing::warn!(
                id = %self.id,
                "An animation finish hook panicked: {}",
                panic_message(payload.as_ref())
            );
        }
    }
}

impl Drop for TaskRecord {
    fn drop(&mut self) {
        // A record dropped before it was retired has been discarded
        self.retire(TaskState::Cancelled);
    }
}
