use log::info;

/// Outcome of a delivery attempt.
///
/// A denied permission is an expected, non-fatal outcome: the caller still
/// advances recurrence or removes the reminder, it just skips the visual
/// rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    PermissionDenied,
}

/// Permission-gated notification delivery.
///
/// The scheduler calls `deliver` for every fire, whether from a live timer
/// or from startup recovery. Hosts with a native notification facility
/// (system tray, OS notification center) implement this; platforms without
/// one degrade gracefully through [`LogNotifier`] instead of crashing the
/// scheduler.
pub trait Notifier: Send + Sync {
    fn has_permission(&self) -> bool;

    /// Ask the user for permission. Returns false when denied or when the
    /// platform has nothing to ask.
    fn request_permission(&self) -> bool;

    fn deliver(&self, title: &str, body: &str) -> Delivery;
}

/// Fallback notifier for headless hosts: permission is always granted and
/// notifications are rendered into the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn has_permission(&self) -> bool {
        true
    }

    fn request_permission(&self) -> bool {
        true
    }

    fn deliver(&self, title: &str, body: &str) -> Delivery {
        info!("reminder due: {} - {}", title, body);
        Delivery::Delivered
    }
}

/// Notifier for platforms where permission is permanently unavailable.
/// Every delivery is suppressed; scheduling still works.
#[derive(Debug, Default)]
pub struct DeniedNotifier;

impl Notifier for DeniedNotifier {
    fn has_permission(&self) -> bool {
        false
    }

    fn request_permission(&self) -> bool {
        false
    }

    fn deliver(&self, _title: &str, _body: &str) -> Delivery {
        Delivery::PermissionDenied
    }
}

/// Test double recording every delivered title.
#[cfg(test)]
pub(crate) struct RecordingNotifier {
    pub delivered: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            delivered: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().unwrap().len()
    }
}

#[cfg(test)]
impl Notifier for RecordingNotifier {
    fn has_permission(&self) -> bool {
        true
    }

    fn request_permission(&self) -> bool {
        true
    }

    fn deliver(&self, title: &str, _body: &str) -> Delivery {
        self.delivered.lock().unwrap().push(title.to_string());
        Delivery::Delivered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_notifier_always_has_permission() {
        let notifier = LogNotifier;
        assert!(notifier.has_permission());
        assert!(notifier.request_permission());
        assert_eq!(notifier.deliver("t", "b"), Delivery::Delivered);
    }

    #[test]
    fn test_denied_notifier_suppresses_delivery() {
        let notifier = DeniedNotifier;
        assert!(!notifier.has_permission());
        assert!(!notifier.request_permission());
        assert_eq!(notifier.deliver("t", "b"), Delivery::PermissionDenied);
    }
}
