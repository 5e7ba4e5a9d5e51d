//! Cadence Animation Engine
//!
//! Time-driven animations for retained-mode UI components, driven by one
//! shared ticker.
//!
//! # Features
//!
//! - **LifeTime**: duration, start delay and progress quantisation as a plain value
//! - **AnimationStatus**: per-tick progress, cycle and event with easing helpers
//! - **Dispatcher**: builder that registers transformations, predicates and repaint targets
//! - **Shared Ticker**: one scheduler advances every animation on the UI thread
//! - **Repaint Batching**: each touched component is repainted once per tick
//! - **Isolation**: a failing animation is logged and cancelled, the rest keep running
//! - **Animatable**: property animations carried around as values
//!
//! # Example
//!
//! ```ignore
//! use cadence_animation::{AnimationScheduler, LifeTime, TimeUnit};
//! use cadence_core::{CoupledEventProcessor, UiEventQueue};
//! use std::sync::Arc;
//!
//! let ui = UiEventQueue::new();
//! let scheduler = AnimationScheduler::new(Arc::new(CoupledEventProcessor::new(ui.clone())));
//! scheduler.start_background()?;
//!
//! scheduler
//!     .handle()
//!     .animate_for(LifeTime::of(300.0, TimeUnit::Milliseconds)?)
//!     .on(&button)
//!     .go(|status| button.set_opacity(status.fade_in()))?;
//!
//! // Host event loop
//! loop {
//!     ui.wait_and_run(std::time::Duration::from_millis(16))?;
//! }
//! ```

pub mod animatable;
pub mod animate;
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod lifetime;
pub mod repaint;
pub mod scheduler;
pub mod status;
pub mod task;
pub mod transformation;

pub use animatable::Animatable;
pub use animate::Animate;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::SchedulerConfig;
pub use dispatcher::AnimationDispatcher;
pub use error::{AnimationError, Result};
pub use lifetime::{LifeTime, TimeUnit};
pub use repaint::{ComponentId, Repaint};
pub use scheduler::{
    get_scheduler, is_scheduler_initialized, set_global_scheduler, try_get_scheduler,
    AnimationScheduler, SchedulerHandle, WakeCallback,
};
pub use status::{AnimationEvent, AnimationStatus, Stride};
pub use task::{AnimationHandle, AnimationId, TaskState};
pub use transformation::{AnimationTransformation, Property, TransformError};
