/// Scheduler configuration constants
///
/// Centralized configuration for the reminder scheduler.
use once_cell::sync::Lazy;
use std::path::PathBuf;

/// File name of the durable reminder store inside the data directory
pub const STORE_FILE: &str = "reminders.json";

/// Directory name under the platform-local data dir
pub const APP_DIR: &str = "Hearth";

/// Default data directory for the reminder store.
///
/// Falls back to the current directory when the platform has no local data
/// dir (stripped-down containers); callers can always pass an explicit path
/// to `ReminderStore::open` instead.
pub static DEFAULT_DATA_DIR: Lazy<PathBuf> = Lazy::new(|| {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
});
