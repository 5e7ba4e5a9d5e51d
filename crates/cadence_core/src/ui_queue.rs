//! UI thread event queue
//!
//! The thread that creates a [`UiEventQueue`] becomes the UI thread. Other
//! threads post tasks into the queue; the UI thread drains them from its event
//! loop with [`UiEventQueue::run_pending`] or [`UiEventQueue::wait_and_run`].

use crate::error::{CoreError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, ThreadId};
use std::time::Duration;

/// A unit of work handed across the thread boundary
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Extract a readable message from a panic payload
pub fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Run a task, catching and logging a panic instead of unwinding into the caller
///
/// Returns `true` if the task completed normally.
pub fn run_isolated(task: Task, origin: &str) -> bool {
    match std::panic::catch_unwind(std::panic::AssertUnwindSafe(task)) {
        Ok(()) => true,
        Err(payload) => {
            tracing::error!(
                origin = origin,
                "Task panicked on {:?}: {}",
                thread::current().name(),
                panic_message(payload.as_ref())
            );
            false
        }
    }
}

struct QueueInner {
    ui_thread: ThreadId,
    sender: Sender<Task>,
    receiver: Mutex<Receiver<Task>>,
    queued: AtomicUsize,
}

/// A cloneable handle to the UI thread's task queue
#[derive(Clone)]
pub struct UiEventQueue {
    inner: Arc<QueueInner>,
}

impl UiEventQueue {
    /// Create a queue owned by the calling thread
    pub fn new() -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            inner: Arc::new(QueueInner {
                ui_thread: thread::current().id(),
                sender,
                receiver: Mutex::new(receiver),
                queued: AtomicUsize::new(0),
            }),
        }
    }

    /// Check whether the calling thread is the UI thread
    pub fn is_ui_thread(&self) -> bool {
        thread::current().id() == self.inner.ui_thread
    }

    /// Number of tasks posted but not yet run
    pub fn queued(&self) -> usize {
        self.inner.queued.load(Ordering::Acquire)
    }

    /// Post a task to be run on the UI thread
    pub fn post(&self, task: Task) {
        self.inner.queued.fetch_add(1, Ordering::AcqRel);
        if self.inner.sender.send(task).is_err() {
            self.inner.queued.fetch_sub(1, Ordering::AcqRel);
            tracing::error!("UI event queue receiver dropped, task discarded");
        }
    }

    /// Run every task currently queued
    ///
    /// Must be called from the UI thread. Returns the number of tasks run.
    pub fn run_pending(&self) -> Result<usize> {
        self.check_thread("run_pending")?;
        let receiver = self
            .inner
            .receiver
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let mut ran = 0;
        while let Ok(task) = receiver.try_recv() {
            self.inner.queued.fetch_sub(1, Ordering::AcqRel);
            run_isolated(task, "ui");
            ran += 1;
        }
        Ok(ran)
    }

    /// Block for up to `timeout` waiting for a task, then drain the queue
    ///
    /// Must be called from the UI thread. Returns the number of tasks run,
    /// which is zero if the timeout elapsed without any task arriving.
    pub fn wait_and_run(&self, timeout: Duration) -> Result<usize> {
        self.check_thread("wait_and_run")?;
        let first = {
            let receiver = self
                .inner
                .receiver
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match receiver.recv_timeout(timeout) {
                Ok(task) => task,
                Err(RecvTimeoutError::Timeout) => return Ok(0),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(CoreError::Disconnected("UI event queue".to_string()))
                }
            }
        };
        self.inner.queued.fetch_sub(1, Ordering::AcqRel);
        run_isolated(first, "ui");
        Ok(1 + self.run_pending()?)
    }

    fn check_thread(&self, operation: &str) -> Result<()> {
        if self.is_ui_thread() {
            return Ok(());
        }
        Err(CoreError::WrongThread(format!(
            "{operation} must be called from the UI thread, not {:?}",
            thread::current().name().unwrap_or("<unnamed>")
        )))
    }
}

impl Default for UiEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for UiEventQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UiEventQueue")
            .field("ui_thread", &self.inner.ui_thread)
            .field("queued", &self.queued())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;

    #[test]
    fn test_posted_tasks_run_on_ui_thread() {
        let queue = UiEventQueue::new();
        let ui_thread = thread::current().id();
        let ran_on = Arc::new(Mutex::new(None));

        let remote = queue.clone();
        let slot = Arc::clone(&ran_on);
        thread::spawn(move || {
            assert!(!remote.is_ui_thread());
            remote.post(Box::new(move || {
                *slot.lock().unwrap() = Some(thread::current().id());
            }));
        })
        .join()
        .unwrap();

        assert_eq!(queue.queued(), 1);
        assert_eq!(queue.run_pending().unwrap(), 1);
        assert_eq!(queue.queued(), 0);
        assert_eq!(*ran_on.lock().unwrap(), Some(ui_thread));
    }

    #[test]
    fn test_run_pending_rejects_other_threads() {
        let queue = UiEventQueue::new();
        let remote = queue.clone();
        let result = thread::spawn(move || remote.run_pending()).join().unwrap();
        assert!(matches!(result, Err(CoreError::WrongThread(_))));
    }

    #[test]
    fn test_panicking_task_does_not_stop_the_queue() {
        let queue = UiEventQueue::new();
        let after = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&after);

        queue.post(Box::new(|| panic!("boom")));
        queue.post(Box::new(move || flag.store(true, Ordering::SeqCst)));

        assert_eq!(queue.run_pending().unwrap(), 2);
        assert!(after.load(Ordering::SeqCst));
    }

    #[test]
    fn test_wait_and_run_times_out_when_idle() {
        let queue = UiEventQueue::new();
        assert_eq!(queue.wait_and_run(Duration::from_millis(5)).unwrap(), 0);
    }

    #[test]
    fn test_panic_message_extraction() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u32);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
