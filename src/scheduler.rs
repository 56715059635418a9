use crate::error::{Error, Result};
use crate::notify::{Delivery, Notifier};
use crate::recurrence::next_occurrence;
use crate::reminder::Reminder;
use crate::store::ReminderStore;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::task::JoinHandle;

/// Generation marker for fire calls that do not come from an armed timer
/// (startup recovery). Armed generations start at 1.
pub(crate) const GEN_NONE: u64 = 0;

/// Owns one live timer task per pending reminder.
///
/// An explicit instance rather than a global table, so hosts and tests can
/// run independent schedulers side by side. Per reminder id the lifecycle
/// is: schedule() arms a timer; on fire the notification is delivered
/// first, and only then is the reminder re-armed at its next occurrence
/// (recurring) or removed (one-shot / series exhausted). cancel() tears
/// down both the timer and the stored record.
///
/// Timer handles are ephemeral and never persisted; after a restart they
/// are rebuilt from the store by [`crate::restore::RestoreManager`].
pub struct Scheduler {
    store: Arc<ReminderStore>,
    notifier: Arc<dyn Notifier>,
    timers: Mutex<HashMap<String, (u64, JoinHandle<()>)>>,
    next_gen: AtomicU64,
    permission_warned: AtomicBool,
    self_ref: Weak<Scheduler>,
}

impl Scheduler {
    /// Create a scheduler over `store`, delivering through `notifier`.
    /// Must be used from within a tokio runtime; every armed reminder is
    /// one lightweight timer task.
    pub fn new(store: Arc<ReminderStore>, notifier: Arc<dyn Notifier>) -> Arc<Self> {
        Arc::new_cyclic(|weak| Self {
            store,
            notifier,
            timers: Mutex::new(HashMap::new()),
            next_gen: AtomicU64::new(1),
            permission_warned: AtomicBool::new(false),
            self_ref: weak.clone(),
        })
    }

    /// Validate, persist, and arm a reminder.
    ///
    /// A past `due_at` is legal and fires immediately. Scheduling an id
    /// that is already armed replaces its timer atomically; it never
    /// duplicates.
    pub fn schedule(&self, reminder: Reminder) -> Result<()> {
        if reminder.id.is_empty() {
            return Err(Error::validation("reminder id must not be empty"));
        }
        if let Some(pattern) = &reminder.recurrence {
            pattern.validate()?;
        }

        // Persist before arming: the store must own the reminder before a
        // timer can exist for it
        self.store.add(reminder.clone())?;
        self.arm(reminder);
        Ok(())
    }

    /// Cancel the live timer (if any) and remove the reminder from the
    /// store. No-op on unknown ids.
    pub fn cancel(&self, id: &str) -> Result<()> {
        if let Some((_, handle)) = self.lock_timers().remove(id) {
            handle.abort();
            debug!("cancelled timer for reminder {}", id);
        }
        self.store.remove(id)
    }

    pub fn has_permission(&self) -> bool {
        self.notifier.has_permission()
    }

    pub fn request_permission(&self) -> bool {
        self.notifier.request_permission()
    }

    pub fn store(&self) -> &Arc<ReminderStore> {
        &self.store
    }

    /// Arm a live timer for `reminder.due_at`, replacing any existing one
    /// for the same id. Does not touch the store.
    pub(crate) fn arm(&self, reminder: Reminder) {
        let generation = self.next_gen.fetch_add(1, Ordering::SeqCst);
        let id = reminder.id.clone();
        let due_at = reminder.due_at;

        // The task carries only a weak reference: armed timers must not
        // keep the scheduler alive, or dropping the last host handle could
        // never tear them down
        let weak = self.self_ref.clone();

        // Hold the table lock across spawn-and-insert: a past-due timer can
        // fire at once, and its own forget/re-arm must observe this entry
        let mut timers = self.lock_timers();

        let task_id = id.clone();
        let handle = tokio::spawn(async move {
            let delay = (due_at - Utc::now()).to_std().unwrap_or_default();
            tokio::time::sleep(delay).await;
            let Some(scheduler) = weak.upgrade() else {
                return;
            };
            scheduler.fire(&task_id, generation).await;
        });

        if let Some((_, old)) = timers.insert(id, (generation, handle)) {
            old.abort();
        }
    }

    /// The fire path, shared by live timers and startup recovery.
    ///
    /// Re-checks the store immediately before dispatching so a reminder
    /// cancelled after its timer elapsed is never delivered, and a
    /// duplicate restore pass never delivers twice. Delivery strictly
    /// precedes re-arm/removal.
    pub(crate) async fn fire(&self, id: &str, generation: u64) {
        let reminder = match self.store.get(id) {
            Some(reminder) => reminder,
            None => {
                debug!("timer fired for {} but it is no longer stored, skipping", id);
                self.forget(id, generation);
                return;
            }
        };

        match self.notifier.deliver(&reminder.title, &reminder.body) {
            Delivery::Delivered => debug!("delivered reminder {}", id),
            Delivery::PermissionDenied => {
                // Surface the missing permission once, then stay quiet
                if !self.permission_warned.swap(true, Ordering::SeqCst) {
                    warn!("notification permission denied; reminder {} was suppressed", id);
                } else {
                    debug!("delivery of reminder {} suppressed (no permission)", id);
                }
            }
        }

        if let Err(e) = self.advance(reminder, generation) {
            error!("failed to advance reminder {} after delivery: {}", id, e);
        }
    }

    /// Post-delivery bookkeeping: advance a recurring reminder to its next
    /// occurrence and re-arm, or drop a finished one.
    fn advance(&self, reminder: Reminder, generation: u64) -> Result<()> {
        let id = reminder.id.clone();

        if let Some(pattern) = &reminder.recurrence {
            if let Some(next) = next_occurrence(reminder.due_at, pattern) {
                if self.store.update(&id, |r| r.due_at = next)? {
                    let mut rearmed = reminder;
                    rearmed.due_at = next;
                    self.arm(rearmed);
                } else {
                    // Cancelled between delivery and re-arm
                    debug!("reminder {} was removed during re-arm, dropping", id);
                    self.forget(&id, generation);
                }
                return Ok(());
            }
            info!("reminder {} reached its end date, removing", id);
        }

        self.store.remove(&id)?;
        self.forget(&id, generation);
        Ok(())
    }

    /// Drop this generation's entry from the timer table. A newer
    /// generation armed for the same id is left alone.
    fn forget(&self, id: &str, generation: u64) {
        let mut timers = self.lock_timers();
        if timers.get(id).map(|(g, _)| *g) == Some(generation) {
            timers.remove(id);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_armed(&self, id: &str) -> bool {
        self.lock_timers().contains_key(id)
    }

    /// Lock the timer table, recovering from poison if needed
    fn lock_timers(&self) -> MutexGuard<'_, HashMap<String, (u64, JoinHandle<()>)>> {
        self.timers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        for (_, (_, handle)) in self.lock_timers().drain() {
            handle.abort();
        }
    }
}
