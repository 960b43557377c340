//! Native alert surface for newly pushed notifications.

/// Permission state of the platform alert surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlertPermission {
    Granted,
    Denied,
    /// The user has not been asked yet.
    #[default]
    Undecided,
}

/// Shows system-level notices. The engine queries `permission` before every
/// alert and calls `request_permission` once at startup without waiting on it.
pub trait AlertSink: Send + Sync {
    fn permission(&self) -> AlertPermission;
    fn request_permission(&self);
    fn show(&self, title: &str, body: &str);
}

/// Alert sink for hosts without a notification surface.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAlerts;

impl AlertSink for NoopAlerts {
    fn permission(&self) -> AlertPermission {
        AlertPermission::Denied
    }

    fn request_permission(&self) {}

    fn show(&self, title: &str, _body: &str) {
        tracing::debug!(%title, "alert suppressed");
    }
}
