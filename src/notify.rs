//! Notification sink for conversion outcomes.
//!
//! Inject an [`Arc<dyn Notifier>`] via
//! [`crate::session::ConversionSession::with_notifier`] to receive the
//! toast-style messages the session emits when a conversion completes, fails,
//! or a download is produced. Delivery is fire-and-forget: the session never
//! inspects what the sink does with a notification.
//!
//! # Example
//!
//! ```rust
//! use file_converter::{Notification, Notifier, Severity};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct Collecting(Mutex<Vec<Notification>>);
//!
//! impl Notifier for Collecting {
//!     fn notify(&self, notification: Notification) {
//!         self.0.lock().unwrap().push(notification);
//!     }
//! }
//!
//! let sink = Arc::new(Collecting::default());
//! sink.notify(Notification::new("Done", "All good", Severity::Info));
//! assert_eq!(sink.0.lock().unwrap().len(), 1);
//! ```

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Visual weight of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Neutral or positive outcome.
    Info,
    /// A failed attempt.
    Destructive,
}

/// A `{title, description, severity}` message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub title: String,
    pub description: String,
    pub severity: Severity,
}

impl Notification {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        severity: Severity,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity,
        }
    }

    pub(crate) fn conversion_completed() -> Self {
        Self::new(
            "Conversion completed!",
            "Your file has been converted successfully.",
            Severity::Info,
        )
    }

    pub(crate) fn conversion_failed(message: impl Into<String>) -> Self {
        Self::new("Conversion failed", message, Severity::Destructive)
    }

    pub(crate) fn download_started() -> Self {
        Self::new(
            "Download started",
            "Your converted file is being downloaded.",
            Severity::Info,
        )
    }
}

/// Receives notifications emitted by a conversion session.
///
/// Implementations must be `Send + Sync`; the session may notify from
/// whichever task completes a conversion.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Discards every notification. The default sink.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: Notification) {}
}

/// Forwards notifications to `tracing` at `info` or `warn` level.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, n: Notification) {
        match n.severity {
            Severity::Info => info!(title = %n.title, "{}", n.description),
            Severity::Destructive => warn!(title = %n.title, "{}", n.description),
        }
    }
}

/// Convenience alias for the shared sink stored by the session.
pub type SharedNotifier = Arc<dyn Notifier>;
