//! Cadence Core
//!
//! Host boundary primitives for the Cadence animation engine:
//!
//! - **UI Event Queue**: marks one thread as the UI thread and marshals work onto it
//! - **Event Processors**: decide where UI and application events execute
//!
//! # Example
//!
//! ```rust
//! use cadence_core::{CoupledEventProcessor, EventProcessor, UiEventQueue};
//!
//! let queue = UiEventQueue::new();
//! let processor = CoupledEventProcessor::new(queue.clone());
//!
//! // Already on the UI thread, so this runs right away
//! processor.process_ui_event(Box::new(|| println!("hello from the UI thread")));
//! assert_eq!(queue.run_pending().unwrap(), 0);
//! ```

mod error;
mod processor;
mod ui_queue;

pub use error::{CoreError, Result};
pub use processor::{CoupledEventProcessor, DecoupledEventProcessor, EventProcessor};
pub use ui_queue::{panic_message, run_isolated, Task, UiEventQueue};
