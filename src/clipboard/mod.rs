pub mod backend;
pub mod counter;
pub mod error;
pub mod format;
pub mod guard;
pub mod memory;
pub mod native;
pub mod service;
#[cfg(all(unix, not(any(target_os = "macos", target_os = "android", target_os = "emscripten"))))]
pub mod x11;

use std::fmt;
use std::str::FromStr;

pub use backend::ClipboardBackend;
pub use counter::{EventCounter, FingerprintCounter};
pub use error::ClipboardError;
pub use format::Format;
pub use guard::{SerialAccess, SerialAccessGuard};
pub use memory::MemoryBackend;
pub use native::NativeBackend;
pub use service::{Clipboard, SharedBackend};

/// Which backend to drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    /// The host clipboard
    #[default]
    Native,
    /// A process-local clipboard, mostly useful for testing
    Memory,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Native => f.write_str("native"),
            BackendKind::Memory => f.write_str("memory"),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ClipboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "native" | "host" => Ok(BackendKind::Native),
            "memory" => Ok(BackendKind::Memory),
            other => Err(ClipboardError::unsupported(format!("backend {other}"))),
        }
    }
}

/// Create a clipboard backend of the requested kind
/// Returns error if the host clipboard cannot be opened
pub fn create_backend(kind: BackendKind) -> Result<Box<dyn ClipboardBackend>, ClipboardError> {
    match kind {
        BackendKind::Native => {
            let backend = NativeBackend::new()?;
            log::info!("Opened host clipboard");
            Ok(Box::new(backend))
        }
        BackendKind::Memory => {
            log::info!("Using in-memory clipboard");
            Ok(Box::new(MemoryBackend::new()))
        }
    }
}
