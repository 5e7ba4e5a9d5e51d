//! Animation scheduler
//!
//! A single shared ticker drives every registered animation. Each tick:
//!
//! 1. records registered since the previous tick join the registry;
//! 2. every live record is advanced in registration order, with user
//!    callbacks running outside the registry lock;
//! 3. finished, cancelled and stale records are dropped;
//! 4. each component touched during the tick is repainted once.
//!
//! Ticks run on the UI thread. The background ticker never touches the
//! registry itself; it posts each tick through the host's
//! [`EventProcessor`].

use crate::clock::{Clock, SystemClock};
use crate::config::SchedulerConfig;
use crate::dispatcher::AnimationDispatcher;
use crate::error::{AnimationError, Result};
use crate::lifetime::LifeTime;
use crate::repaint::RepaintBatch;
use crate::task::{AnimationId, Step, TaskRecord, TaskState};
use cadence_core::EventProcessor;
use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError, Weak};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

// ============================================================================
// Global Animation Scheduler State
// ============================================================================

/// Default scheduler handle installed at the composition root
static GLOBAL_SCHEDULER: OnceLock<SchedulerHandle> = OnceLock::new();

/// Install the process-wide default scheduler handle
///
/// Call once at app startup after creating the `AnimationScheduler`.
/// Fails with [`AnimationError::AlreadyInitialized`] on a second call.
pub fn set_global_scheduler(handle: SchedulerHandle) -> Result<()> {
    GLOBAL_SCHEDULER
        .set(handle)
        .map_err(|_| AnimationError::AlreadyInitialized)
}

/// Get the process-wide default scheduler handle
pub fn get_scheduler() -> Result<SchedulerHandle> {
    GLOBAL_SCHEDULER
        .get()
        .cloned()
        .ok_or(AnimationError::NotInitialized)
}

/// Try to get the global scheduler (returns None if not initialized)
pub fn try_get_scheduler() -> Option<SchedulerHandle> {
    GLOBAL_SCHEDULER.get().cloned()
}

/// Check if the global scheduler has been initialized
pub fn is_scheduler_initialized() -> bool {
    GLOBAL_SCHEDULER.get().is_some()
}

/// Callback used to wake the host event loop after a tick was posted
pub type WakeCallback = Arc<dyn Fn() + Send + Sync>;

type Registry = IndexMap<AnimationId, TaskRecord, FxBuildHasher>;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Internal state of the animation scheduler
#[derive(Default)]
struct SchedulerInner {
    /// Live records in registration order
    tasks: Registry,
    /// Records registered since the last tick
    pending: Vec<TaskRecord>,
    /// Records moved out of `tasks` while a tick advances them
    in_flight: usize,
    ticking: bool,
    ticks: u64,
}

/// Records taken out of the registry for the duration of one tick
///
/// Dropping it, normally or while unwinding, puts every record that has not
/// been removed back into the registry and ends the tick.
struct CheckedOut<'a> {
    inner: &'a Mutex<SchedulerInner>,
    /// Advanced this tick and still live
    survivors: Registry,
    /// Not advanced yet, in reverse registration order
    records: Registry,
}

impl Drop for CheckedOut<'_> {
    fn drop(&mut self) {
        let mut survivors = std::mem::take(&mut self.survivors);
        let mut unvisited = std::mem::take(&mut self.records);
        unvisited.reverse();
        survivors.extend(unvisited);

        let mut inner = lock(self.inner);
        // Nothing inserts into `tasks` while it is checked out, but keep
        // anything that did land there behind the surviving records.
        let arrived = std::mem::replace(&mut inner.tasks, survivors);
        inner.tasks.extend(arrived);
        inner.in_flight = 0;
        inner.ticking = false;
    }
}

pub(crate) struct Shared {
    inner: Mutex<SchedulerInner>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventProcessor>,
    config: SchedulerConfig,
    next_id: AtomicU64,
    /// A tick has been posted to the UI thread and has not run yet
    tick_queued: AtomicBool,
    stop_flag: AtomicBool,
    thread_handle: Mutex<Option<JoinHandle<()>>>,
    wake_callback: Mutex<Option<WakeCallback>>,
}

impl Shared {
    pub(crate) fn now(&self) -> Duration {
        self.clock.now()
    }

    pub(crate) fn next_id(&self) -> AnimationId {
        AnimationId::new(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Hand a record to the UI thread, which queues it for the next tick
    pub(crate) fn submit(self: &Arc<Self>, record: TaskRecord) {
        let weak = Arc::downgrade(self);
        self.events.process_ui_event(Box::new(move || match weak.upgrade() {
            Some(shared) => lock(&shared.inner).pending.push(record),
            None => {
                record.retire(TaskState::Cancelled);
                tracing::debug!(id = %record.id(), "Scheduler dropped before registration");
            }
        }));

        if self.config.auto_start {
            if let Err(e) = Self::start_ticker(self) {
                tracing::error!("Failed to start animation ticker: {}", e);
            }
        }
    }

    fn tick(&self) -> bool {
        let mut checked_out = {
            let mut inner = lock(&self.inner);
            if inner.ticking {
                tracing::trace!("Tick requested while another tick is running, skipping");
                return true;
            }
            inner.ticking = true;
            inner.ticks += 1;

            let pending = std::mem::take(&mut inner.pending);
            for record in pending {
                inner.tasks.insert(record.id(), record);
            }
            let mut records = std::mem::take(&mut inner.tasks);
            inner.in_flight = records.len();
            // Popped from the back, so reverse to advance in registration order
            records.reverse();
            CheckedOut {
                inner: &self.inner,
                survivors: Registry::default(),
                records,
            }
        };

        let now = self.clock.now();
        let mut repaints = RepaintBatch::default();
        let mut removed = 0;

        while let Some((id, mut record)) = checked_out.records.pop() {
            match record.advance(now, &mut repaints) {
                Step::Keep => {
                    checked_out.survivors.insert(id, record);
                }
                Step::Remove(state) => {
                    record.retire(state);
                    removed += 1;
                    tracing::debug!(%id, ?state, "Animation removed");
                }
            }
        }
        drop(checked_out);

        let has_active = {
            let inner = lock(&self.inner);
            !inner.tasks.is_empty() || !inner.pending.is_empty()
        };

        let batched = repaints.len();
        let repainted = repaints.flush();
        tracing::trace!(
            now_ms = now.as_millis() as u64,
            removed,
            batched,
            repainted,
            "Animation tick complete"
        );

        has_active
    }

    fn task_count(&self) -> usize {
        let inner = lock(&self.inner);
        inner.tasks.len() + inner.pending.len() + inner.in_flight
    }

    /// Post one tick to the UI thread unless one is already waiting there
    fn post_tick(self: &Arc<Self>) {
        if self.tick_queued.swap(true, Ordering::AcqRel) {
            return;
        }
        let weak = Arc::downgrade(self);
        self.events.process_ui_event(Box::new(move || {
            if let Some(shared) = weak.upgrade() {
                shared.tick_queued.store(false, Ordering::Release);
                shared.tick();
            }
        }));

        let wake = lock(&self.wake_callback).clone();
        if let Some(callback) = wake {
            callback();
        }
    }

    fn start_ticker(self: &Arc<Self>) -> Result<()> {
        let mut thread_handle = lock(&self.thread_handle);
        if thread_handle.is_some() {
            return Ok(()); // Already running
        }
        self.stop_flag.store(false, Ordering::Release);

        let weak = Arc::downgrade(self);
        let interval = self.config.tick_interval();
        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || run_ticker(weak, interval))
            .map_err(|e| AnimationError::Ticker(e.to_string()))?;

        tracing::debug!(
            interval_ms = interval.as_millis() as u64,
            "Animation ticker started"
        );
        *thread_handle = Some(handle);
        Ok(())
    }

    fn stop_ticker(&self) {
        self.stop_flag.store(true, Ordering::Release);
        let handle = lock(&self.thread_handle).take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::error!("Animation ticker thread panicked");
            }
        }
    }
}

/// Body of the background ticker thread
///
/// Holds the scheduler only weakly so dropping the scheduler ends the loop.
fn run_ticker(shared: Weak<Shared>, interval: Duration) {
    loop {
        let started = Instant::now();
        {
            let Some(shared) = shared.upgrade() else {
                break;
            };
            if shared.stop_flag.load(Ordering::Acquire) {
                break;
            }
            // Stay quiet while there is nothing to animate
            if shared.task_count() > 0 {
                shared.post_tick();
            }
        }

        // Sleep for remaining frame time
        let elapsed = started.elapsed();
        if elapsed < interval {
            thread::sleep(interval - elapsed);
        }
    }
    tracing::debug!("Animation ticker stopped");
}

/// The animation scheduler that ticks all registered animations
///
/// Typically created once at the composition root and shared through
/// [`SchedulerHandle`]s. Tests construct their own isolated schedulers with a
/// [`ManualClock`](crate::ManualClock) and call [`AnimationScheduler::tick`]
/// directly.
///
/// # Background Thread Mode
///
/// `start_background()` spawns a ticker thread that posts a tick to the UI
/// thread every `tick_interval`. Dropping the scheduler stops the thread.
///
/// ```ignore
/// let scheduler = AnimationScheduler::new(Arc::new(CoupledEventProcessor::new(ui_queue)));
/// scheduler.start_background()?;
/// ```
pub struct AnimationScheduler {
    shared: Arc<Shared>,
}

impl AnimationScheduler {
    pub fn new(events: Arc<dyn EventProcessor>) -> Self {
        Self::with_config(SchedulerConfig::default(), events)
    }

    pub fn with_config(config: SchedulerConfig, events: Arc<dyn EventProcessor>) -> Self {
        Self::with_clock(config, events, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(
        config: SchedulerConfig,
        events: Arc<dyn EventProcessor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(SchedulerInner::default()),
                clock,
                events,
                config,
                next_id: AtomicU64::new(1),
                tick_queued: AtomicBool::new(false),
                stop_flag: AtomicBool::new(false),
                thread_handle: Mutex::new(None),
                wake_callback: Mutex::new(None),
            }),
        }
    }

    /// Set a wake callback invoked whenever the ticker posts a tick
    ///
    /// Use this to wake a host event loop that sleeps until it has work.
    pub fn set_wake_callback<F>(&self, callback: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        *lock(&self.shared.wake_callback) = Some(Arc::new(callback));
    }

    /// Start the background ticker thread
    pub fn start_background(&self) -> Result<()> {
        Shared::start_ticker(&self.shared)
    }

    /// Stop the background ticker thread
    pub fn stop_background(&self) {
        self.shared.stop_ticker();
    }

    /// Check if the background thread is running
    pub fn is_background_running(&self) -> bool {
        lock(&self.shared.thread_handle).is_some()
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Begin registering an animation on this scheduler
    pub fn animate_for(&self, life: LifeTime) -> AnimationDispatcher {
        self.handle().animate_for(life)
    }

    /// Advance every animation by one tick
    ///
    /// Must run on the UI thread. Returns true if animations remain.
    pub fn tick(&self) -> bool {
        self.shared.tick()
    }

    /// Number of registered animations that have not been removed yet
    pub fn task_count(&self) -> usize {
        self.shared.task_count()
    }

    pub fn has_active_animations(&self) -> bool {
        self.task_count() > 0
    }

    /// Number of ticks run so far
    pub fn tick_count(&self) -> u64 {
        lock(&self.shared.inner).ticks
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.shared.config
    }

    pub fn now(&self) -> Duration {
        self.shared.now()
    }
}

impl Drop for AnimationScheduler {
    fn drop(&mut self) {
        // Stop background thread when scheduler is dropped
        self.stop_background();
    }
}

/// A weak handle to the animation scheduler
///
/// This is passed to components that need to register animations.
/// It won't prevent the scheduler from being dropped.
#[derive(Clone)]
pub struct SchedulerHandle {
    shared: Weak<Shared>,
}

impl SchedulerHandle {
    /// Begin registering an animation
    pub fn animate_for(&self, life: LifeTime) -> AnimationDispatcher {
        AnimationDispatcher::new(self.clone(), life)
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }

    /// Number of registered animations, zero if the scheduler is gone
    pub fn task_count(&self) -> usize {
        self.shared
            .upgrade()
            .map(|shared| shared.task_count())
            .unwrap_or(0)
    }

    pub(crate) fn upgrade(&self) -> Result<Arc<Shared>> {
        self.shared.upgrade().ok_or(AnimationError::SchedulerDropped)
    }
}

impl std::fmt::Debug for SchedulerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchedulerHandle")
            .field("alive", &self.is_alive())
            .finish()
    }
}
