use parking_lot::{Mutex, MutexGuard};

/// Serializes every call into the native clipboard
///
/// Some hosts abort the process on concurrent clipboard access, so at most one
/// read, write or counter sample may be in flight at a time. The guard is not
/// reentrant: while a [`SerialAccess`] is held, call the raw backend only.
#[derive(Debug, Default)]
pub struct SerialAccessGuard {
    lock: Mutex<()>,
}

/// Exclusive access token, released on drop
#[must_use = "access is released as soon as the token is dropped"]
pub struct SerialAccess<'a> {
    _inner: MutexGuard<'a, ()>,
}

impl SerialAccessGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until exclusive access is granted
    pub fn acquire(&self) -> SerialAccess<'_> {
        SerialAccess {
            _inner: self.lock.lock(),
        }
    }

    /// Run `f` with exclusive access, releasing on every exit path
    pub fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        let _access = self.acquire();
        f()
    }

    /// Check if some caller currently holds access
    pub fn is_held(&self) -> bool {
        self.lock.is_locked()
    }
}
