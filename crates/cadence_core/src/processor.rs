//! Event processors
//!
//! An [`EventProcessor`] decides on which thread a piece of work runs. UI
//! events always end up on the UI thread; application events run either on
//! the UI thread too (coupled) or on a separate application thread
//! (decoupled).

use crate::error::{CoreError, Result};
use crate::ui_queue::{run_isolated, Task, UiEventQueue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// How long `join_app_thread` waits for work before re-checking its stop flag
const APP_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// The host's thread boundary
///
/// Implementations must never let a panicking task unwind into the caller.
pub trait EventProcessor: Send + Sync {
    /// Run `task` on the UI thread: immediately if the caller already is the
    /// UI thread, otherwise marshalled onto it.
    fn process_ui_event(&self, task: Task);

    /// Run `task` on the application thread.
    fn process_app_event(&self, task: Task);
}

impl<P: EventProcessor + ?Sized> EventProcessor for Arc<P> {
    fn process_ui_event(&self, task: Task) {
        (**self).process_ui_event(task)
    }

    fn process_app_event(&self, task: Task) {
        (**self).process_app_event(task)
    }
}

/// Single-threaded application model: UI and application events share the UI thread
///
/// Without a UI queue (see [`CoupledEventProcessor::lenient`]) every task runs
/// inline on the calling thread, which makes the processor convenient for
/// headless hosts and tests.
#[derive(Clone, Debug, Default)]
pub struct CoupledEventProcessor {
    ui: Option<UiEventQueue>,
}

impl CoupledEventProcessor {
    /// Marshal off-thread work onto the given UI queue
    pub fn new(ui: UiEventQueue) -> Self {
        Self { ui: Some(ui) }
    }

    /// Treat whichever thread submits a task as the UI thread
    pub fn lenient() -> Self {
        Self { ui: None }
    }

    pub fn ui_queue(&self) -> Option<&UiEventQueue> {
        self.ui.as_ref()
    }

    fn dispatch(&self, task: Task, origin: &str) {
        match &self.ui {
            Some(queue) if !queue.is_ui_thread() => queue.post(task),
            _ => {
                run_isolated(task, origin);
            }
        }
    }
}

impl EventProcessor for CoupledEventProcessor {
    fn process_ui_event(&self, task: Task) {
        self.dispatch(task, "ui");
    }

    fn process_app_event(&self, task: Task) {
        self.dispatch(task, "app");
    }
}

/// UI events go to the UI thread, application events to a dedicated queue
///
/// The application thread drains its queue with
/// [`DecoupledEventProcessor::run_app_events`] or blocks in
/// [`DecoupledEventProcessor::join_app_thread`].
pub struct DecoupledEventProcessor {
    ui: UiEventQueue,
    app_sender: Sender<Task>,
    app_receiver: Mutex<Receiver<Task>>,
}

impl DecoupledEventProcessor {
    pub fn new(ui: UiEventQueue) -> Self {
        let (app_sender, app_receiver) = mpsc::channel();
        Self {
            ui,
            app_sender,
            app_receiver: Mutex::new(app_receiver),
        }
    }

    pub fn ui_queue(&self) -> &UiEventQueue {
        &self.ui
    }

    /// Run every queued application event
    ///
    /// The UI thread may not act as the application thread.
    pub fn run_app_events(&self) -> Result<usize> {
        self.check_not_ui("run_app_events")?;
        let receiver = self
            .app_receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut ran = 0;
        while let Ok(task) = receiver.try_recv() {
            run_isolated(task, "app");
            ran += 1;
        }
        Ok(ran)
    }

    /// Process application events until `stop` is set
    pub fn join_app_thread(&self, stop: &AtomicBool) -> Result<()> {
        self.check_not_ui("join_app_thread")?;
        tracing::debug!("Application thread joined the event queue");

        while !stop.load(Ordering::Acquire) {
            let next = self
                .app_receiver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .recv_timeout(APP_POLL_INTERVAL);
            match next {
                Ok(task) => {
                    run_isolated(task, "app");
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CoreError::Disconnected("application event queue".to_string()))
                }
            }
        }

        tracing::debug!("Application thread left the event queue");
        Ok(())
    }

    fn check_not_ui(&self, operation: &str) -> Result<()> {
        if self.ui.is_ui_thread() {
            return Err(CoreError::WrongThread(format!(
                "the UI thread cannot {operation} on the application event queue"
            )));
        }
        Ok(())
    }
}

impl EventProcessor for DecoupledEventProcessor {
    fn process_ui_event(&self, task: Task) {
        if self.ui.is_ui_thread() {
            run_isolated(task, "ui");
        } else {
            self.ui.post(task);
        }
    }

    fn process_app_event(&self, task: Task) {
        if self.app_sender.send(task).is_err() {
            tracing::error!("Failed to register application event: queue disconnected");
        }
    }
}
