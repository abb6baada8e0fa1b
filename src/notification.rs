use notify_rust::Notification;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::NotificationConfig;

/// Something that can tell the user about a conversion
pub trait Notifier: Send + Sync {
    fn notify(&self, body: &str);
}

/// Desktop notifications through the platform notification service
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    summary: String,
    icon: Option<PathBuf>,
    timeout: Duration,
}

impl DesktopNotifier {
    pub fn new(summary: impl Into<String>, icon: Option<PathBuf>, timeout: Duration) -> Self {
        DesktopNotifier {
            summary: summary.into(),
            icon,
            timeout,
        }
    }
}

impl Notifier for DesktopNotifier {
    fn notify(&self, body: &str) {
        let mut notification = Notification::new();
        notification
            .summary(&self.summary)
            .body(body)
            .timeout(self.timeout);
        if let Some(icon) = &self.icon {
            notification.icon(&icon.display().to_string());
        }

        if let Err(e) = notification.show() {
            log::warn!("Could not send desktop notification: {}", e);
        }
    }
}

/// Writes notifications to the log instead of the desktop
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, body: &str) {
        log::info!("{}", body);
    }
}

/// Build the notifier described by `config`
pub fn from_config(config: &NotificationConfig) -> Box<dyn Notifier> {
    if !config.enabled {
        return Box::new(LogNotifier);
    }

    let icon = config.icon.clone().map(crate::storage::expand_home);
    Box::new(DesktopNotifier::new(
        config.summary.clone(),
        icon,
        Duration::from_millis(config.timeout_ms),
    ))
}
