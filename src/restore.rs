use crate::scheduler::{Scheduler, GEN_NONE};
use chrono::Utc;
use log::info;
use std::sync::Arc;

/// Startup recovery for reminders that outlived the previous process.
///
/// Run `restore_all` exactly once at startup, before the host makes any new
/// `schedule` calls. Reminders whose due time passed while the process was
/// not running fire immediately through the scheduler's normal fire path
/// (this is what makes delivery at-least-once); the rest get their timers
/// re-armed for the remaining delay. Nothing is re-persisted here — the
/// store already owns every record.
pub struct RestoreManager {
    scheduler: Arc<Scheduler>,
}

impl RestoreManager {
    pub fn new(scheduler: Arc<Scheduler>) -> Self {
        Self { scheduler }
    }

    /// Restore every pending reminder. Never fails: corrupt entries were
    /// already skipped when the store was opened, and an empty store simply
    /// restores nothing.
    pub async fn restore_all(&self) {
        let reminders = self.scheduler.store().list();
        let now = Utc::now();

        let mut fired = 0usize;
        let mut armed = 0usize;

        for reminder in reminders {
            if reminder.is_due(now) {
                // Missed while offline: same path as a live timer firing
                self.scheduler.fire(&reminder.id, GEN_NONE).await;
                fired += 1;
            } else {
                self.scheduler.arm(reminder);
                armed += 1;
            }
        }

        info!("restore complete: {} re-armed, {} missed reminders fired", armed, fired);
    }
}
