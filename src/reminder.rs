use crate::recurrence::RecurrencePattern;
use chrono::{serde::ts_milliseconds, DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single logical scheduled notification, one-shot or recurring.
///
/// `id` is stable per logical event, not per occurrence: a recurring
/// reminder keeps its id while `due_at` advances after every firing.
/// Persisted as `{ id, title, body, dueAt: epoch-ms, recurrence: {...} | null }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub title: String,
    pub body: String,
    #[serde(with = "ts_milliseconds")]
    pub due_at: DateTime<Utc>,
    #[serde(default)]
    pub recurrence: Option<RecurrencePattern>,
}

impl Reminder {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        due_at: DateTime<Utc>,
        recurrence: Option<RecurrencePattern>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            due_at,
            recurrence,
        }
    }

    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }

    /// Whether this reminder's due time has passed relative to `now`.
    /// Restore uses this to tell a missed reminder from a pending one.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.due_at <= now
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recurrence::{Frequency, RecurrencePattern};
    use chrono::TimeZone;

    #[test]
    fn test_persisted_shape_uses_epoch_ms() {
        let due = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        let reminder = Reminder::new("med-1", "Medication", "Take iron", due, None);

        let json = serde_json::to_value(&reminder).unwrap();
        assert_eq!(json["id"], "med-1");
        assert_eq!(json["dueAt"], due.timestamp_millis());
        assert!(json["recurrence"].is_null());
    }

    #[test]
    fn test_recurrence_serializes_camel_case() {
        let due = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        let mut pattern = RecurrencePattern::new(Frequency::Weekly, 1);
        pattern.days_of_week = Some(vec![1, 3, 5]);
        let reminder = Reminder::new("gym", "Gym", "Leg day", due, Some(pattern));

        let json = serde_json::to_value(&reminder).unwrap();
        assert_eq!(json["recurrence"]["frequency"], "weekly");
        assert_eq!(json["recurrence"]["interval"], 1);
        assert_eq!(json["recurrence"]["daysOfWeek"][0], 1);
    }

    #[test]
    fn test_deserializes_missing_recurrence_as_one_shot() {
        let json = r#"{"id":"a","title":"t","body":"b","dueAt":1718010000000}"#;
        let reminder: Reminder = serde_json::from_str(json).unwrap();
        assert!(!reminder.is_recurring());
    }

    #[test]
    fn test_is_due_boundary_is_inclusive() {
        let due = Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap();
        let reminder = Reminder::new("a", "t", "b", due, None);
        assert!(reminder.is_due(due));
        assert!(!reminder.is_due(due - chrono::Duration::seconds(1)));
    }
}
