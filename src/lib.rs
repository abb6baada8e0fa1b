//! Clipwatch - clipboard change detection with double-copy confirmation
//!
//! The library exposes the clipboard service and its watchers; the binary
//! builds a timestamp conversion daemon on top of them.

pub mod app;
pub mod clipboard;
pub mod convert;
pub mod logging;
pub mod notification;
pub mod storage;
pub mod watch;
