use crate::config::STORE_FILE;
use crate::error::{Error, Result};
use crate::reminder::Reminder;
use log::warn;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Durable record of all pending reminders, keyed by event id.
///
/// Sole owner of persisted reminder state; the scheduler only ever holds
/// ephemeral timer handles derived from it. Backed by a JSON array in
/// `reminders.json` under the store directory, rewritten on every mutation.
/// All operations take a single internal lock, which gives the
/// single-writer-at-a-time discipline the callers rely on.
pub struct ReminderStore {
    path: PathBuf,
    inner: Mutex<HashMap<String, Reminder>>,
}

impl ReminderStore {
    /// Open (or create) the store in `dir`. Corrupt entries in an existing
    /// file are skipped and logged; they never prevent the store from
    /// opening.
    pub fn open(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .map_err(|e| Error::storage(format!("failed to create {}: {}", dir.display(), e)))?;

        let path = dir.join(STORE_FILE);
        let reminders = load_entries(&path);

        Ok(Self {
            path,
            inner: Mutex::new(reminders),
        })
    }

    /// Insert or replace by id. Idempotent.
    pub fn add(&self, reminder: Reminder) -> Result<()> {
        let mut inner = self.lock();
        inner.insert(reminder.id.clone(), reminder);
        self.save(&inner)
    }

    /// Delete by id; no-op if absent.
    pub fn remove(&self, id: &str) -> Result<()> {
        let mut inner = self.lock();
        if inner.remove(id).is_some() {
            self.save(&inner)?;
        }
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<Reminder> {
        self.lock().get(id).cloned()
    }

    /// All pending reminders, in no particular order.
    pub fn list(&self) -> Vec<Reminder> {
        self.lock().values().cloned().collect()
    }

    /// Atomically read-modify-write the reminder with `id`. Returns whether
    /// the id existed. Used after a recurring fire to advance `due_at`.
    pub fn update<F>(&self, id: &str, mutator: F) -> Result<bool>
    where
        F: FnOnce(&mut Reminder),
    {
        let mut inner = self.lock();
        match inner.get_mut(id) {
            Some(reminder) => {
                mutator(reminder);
                self.save(&inner)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Lock the in-memory state, recovering from poison if needed
    fn lock(&self) -> MutexGuard<'_, HashMap<String, Reminder>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self, inner: &HashMap<String, Reminder>) -> Result<()> {
        let mut entries: Vec<&Reminder> = inner.values().collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));

        let content = serde_json::to_string_pretty(&entries)
            .map_err(|e| Error::storage(e.to_string()))?;
        fs::write(&self.path, content)
            .map_err(|e| Error::storage(format!("failed to write {}: {}", self.path.display(), e)))
    }
}

/// Load the persisted array, skipping entries that fail to deserialize.
///
/// Never fails: an unreadable or malformed file degrades to an empty store
/// (logged) so a damaged medium cannot block application startup. Write
/// failures still surface as storage errors from the mutating operations.
fn load_entries(path: &Path) -> HashMap<String, Reminder> {
    if !path.exists() {
        return HashMap::new();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!("failed to read reminder store at {} ({}), starting empty", path.display(), e);
            return HashMap::new();
        }
    };

    let values: Vec<serde_json::Value> = match serde_json::from_str(&content) {
        Ok(values) => values,
        Err(e) => {
            warn!("reminder store at {} is not a JSON array ({}), starting empty", path.display(), e);
            return HashMap::new();
        }
    };

    let mut reminders = HashMap::new();
    for value in values {
        match serde_json::from_value::<Reminder>(value) {
            Ok(reminder) => {
                reminders.insert(reminder.id.clone(), reminder);
            }
            Err(e) => {
                warn!("skipping corrupt reminder entry: {}", e);
            }
        }
    }

    reminders
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::env;

    fn test_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join(format!("hearth_store_{}", name));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    fn make_reminder(id: &str) -> Reminder {
        Reminder::new(
            id,
            format!("Title {}", id),
            "body",
            Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap(),
            None,
        )
    }

    #[test]
    fn test_open_nonexistent_starts_empty() {
        let dir = test_dir("nonexistent");
        let store = ReminderStore::open(&dir).unwrap();
        assert!(store.is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_add_and_reload_roundtrip() {
        let dir = test_dir("roundtrip");
        {
            let store = ReminderStore::open(&dir).unwrap();
            store.add(make_reminder("a")).unwrap();
            store.add(make_reminder("b")).unwrap();
        }

        let reloaded = ReminderStore::open(&dir).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.get("a").unwrap().title, "Title a");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_add_same_id_replaces() {
        let dir = test_dir("replace");
        let store = ReminderStore::open(&dir).unwrap();

        store.add(make_reminder("a")).unwrap();
        let mut updated = make_reminder("a");
        updated.title = "Changed".to_string();
        store.add(updated).unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a").unwrap().title, "Changed");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let dir = test_dir("remove_absent");
        let store = ReminderStore::open(&dir).unwrap();
        assert!(store.remove("ghost").is_ok());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_update_advances_due_and_persists() {
        let dir = test_dir("update");
        let store = ReminderStore::open(&dir).unwrap();
        store.add(make_reminder("a")).unwrap();

        let new_due = Utc.with_ymd_and_hms(2024, 6, 17, 9, 0, 0).unwrap();
        let found = store.update("a", |r| r.due_at = new_due).unwrap();
        assert!(found);

        let reloaded = ReminderStore::open(&dir).unwrap();
        assert_eq!(reloaded.get("a").unwrap().due_at, new_due);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_update_unknown_id_reports_absent() {
        let dir = test_dir("update_absent");
        let store = ReminderStore::open(&dir).unwrap();
        let found = store.update("ghost", |_| {}).unwrap();
        assert!(!found);
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_corrupt_entry_skipped_good_entries_load() {
        let dir = test_dir("corrupt_entry");
        fs::create_dir_all(&dir).unwrap();
        let content = r#"[
            {"id":"good","title":"t","body":"b","dueAt":1718010000000},
            {"id":"bad","title":"t","dueAt":"not-a-timestamp"}
        ]"#;
        fs::write(dir.join(STORE_FILE), content).unwrap();

        let store = ReminderStore::open(&dir).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("good").is_some());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unreadable_file_loads_empty() {
        // A directory where the file should be makes the read itself fail;
        // the store must still open, just empty
        let dir = test_dir("unreadable");
        fs::create_dir_all(dir.join(STORE_FILE)).unwrap();

        let store = ReminderStore::open(&dir).unwrap();
        assert!(store.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_non_array_file_loads_empty() {
        let dir = test_dir("non_array");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(STORE_FILE), "{\"oops\": true}").unwrap();

        let store = ReminderStore::open(&dir).unwrap();
        assert!(store.is_empty());

        let _ = fs::remove_dir_all(&dir);
    }
}
