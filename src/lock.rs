use std::sync::{Mutex, MutexGuard};

/// Lock a mutex shared with producer threads, taking the data back if one of them
/// panicked while holding it.
pub(crate) fn lock_or_recover<'a, T>(lock: &'a Mutex<T>, what: &str) -> MutexGuard<'a, T> {
    lock.lock().unwrap_or_else(|poisoned| {
        tracing::warn!(target: "irpanel::lock", "{what} mutex poisoned; recovering");
        poisoned.into_inner()
    })
}
