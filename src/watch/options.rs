use std::time::Duration;

// Heuristic defaults. They were picked by hand for human copy gestures and
// are open to tuning; every one of them can be overridden per session.

/// Poll cadence of raw change watches
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Poll cadence of the text watch while the clipboard is active
pub const DEFAULT_FAST_INTERVAL: Duration = Duration::from_millis(100);

/// Poll cadence of the text watch after sustained inactivity
pub const DEFAULT_SLOW_INTERVAL: Duration = Duration::from_millis(200);

/// Two identical copies closer than this count as a confirmation
pub const DEFAULT_CONFIRM_WINDOW: Duration = Duration::from_millis(500);

/// Idle ticks after which the text watch widens to the slow cadence
pub const DEFAULT_BACKOFF_STREAK: u32 = 50;

/// Idle streak above which the slow cadence is forced regardless
pub const DEFAULT_BACKOFF_CEILING: u32 = 100;

/// How often a write monitor samples the counter
pub const DEFAULT_MONITOR_INTERVAL: Duration = Duration::from_secs(1);

/// Settings of the double-submit detector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DoubleSubmitOptions {
    pub fast_interval: Duration,
    pub slow_interval: Duration,
    pub confirm_window: Duration,
    pub backoff_streak: u32,
    pub backoff_ceiling: u32,
    /// Longer candidates never reach the detector
    pub max_text_len: Option<usize>,
}

impl Default for DoubleSubmitOptions {
    fn default() -> Self {
        DoubleSubmitOptions {
            fast_interval: DEFAULT_FAST_INTERVAL,
            slow_interval: DEFAULT_SLOW_INTERVAL,
            confirm_window: DEFAULT_CONFIRM_WINDOW,
            backoff_streak: DEFAULT_BACKOFF_STREAK,
            backoff_ceiling: DEFAULT_BACKOFF_CEILING,
            max_text_len: None,
        }
    }
}

/// Settings shared by all sessions of one `Clipboard`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchOptions {
    pub tick_interval: Duration,
    pub double_submit: DoubleSubmitOptions,
    pub monitor_interval: Duration,
    /// Give up on a write monitor after this long; `None` waits until
    /// the counter moves or the signal is abandoned
    pub monitor_timeout: Option<Duration>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        WatchOptions {
            tick_interval: DEFAULT_TICK_INTERVAL,
            double_submit: DoubleSubmitOptions::default(),
            monitor_interval: DEFAULT_MONITOR_INTERVAL,
            monitor_timeout: None,
        }
    }
}
