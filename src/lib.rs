//! Recurring reminder scheduler for the Hearth family organizer.
//!
//! The host application (tasks, calendar, meals, medication times) builds
//! [`Reminder`] values and hands them to a [`Scheduler`]; this crate owns
//! everything from there: durable storage, one live timer per pending
//! reminder, permission-gated notification delivery, recurrence advancement
//! after every firing, and at-least-once recovery of reminders that came
//! due while the process was not running.
//!
//! ```no_run
//! use std::sync::Arc;
//! use hearth_reminders::{
//!     LogNotifier, Reminder, ReminderStore, RestoreManager, Scheduler,
//! };
//!
//! # async fn bootstrap() -> Result<(), hearth_reminders::Error> {
//! let store = Arc::new(ReminderStore::open(&hearth_reminders::config::DEFAULT_DATA_DIR)?);
//! let scheduler = Scheduler::new(store, Arc::new(LogNotifier));
//!
//! // Once at startup, before any new schedule calls:
//! RestoreManager::new(scheduler.clone()).restore_all().await;
//!
//! scheduler.schedule(Reminder::new(
//!     "task-42",
//!     "Pay rent",
//!     "Transfer before noon",
//!     chrono::Utc::now() + chrono::Duration::hours(1),
//!     None,
//! ))?;
//! # Ok(())
//! # }
//! ```

pub mod config;
mod error;
mod notify;
mod recurrence;
mod reminder;
mod restore;
mod scheduler;
mod store;

pub use error::{Error, Result};
pub use notify::{Delivery, DeniedNotifier, LogNotifier, Notifier};
pub use recurrence::{next_occurrence, Frequency, RecurrencePattern, MAX_INTERVAL};
pub use reminder::Reminder;
pub use restore::RestoreManager;
pub use scheduler::Scheduler;
pub use store::ReminderStore;
