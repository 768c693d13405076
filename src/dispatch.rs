//! Routes each call to the plain or the recursive algorithm by the mutex's type tag.
//!
//! The tag is decoded again on every call; nothing about a mutex is remembered
//! between calls.
use crate::errno::{Errno, Result};
use crate::kind::{LockKind, MutexKind, Normal, Recursive};
use crate::layout::RawMutex;

/// Locks `mutex`, spinning until it is available. Never fails.
#[inline]
pub fn lock(mutex: &RawMutex) {
    match mutex.kind() {
        MutexKind::Normal => Normal::lock(mutex),
        MutexKind::Recursive => Recursive::lock(mutex),
    }
}

/// Locks `mutex` if that can be done without waiting.
///
/// # Returns
///
/// * `Ok(())` if the lock was taken (or re-entered, for a recursive mutex)
/// * `Err(Errno::BUSY)` if another thread holds it
#[inline]
pub fn try_lock(mutex: &RawMutex) -> Result<()> {
    let locked = match mutex.kind() {
        MutexKind::Normal => Normal::try_lock(mutex),
        MutexKind::Recursive => Recursive::try_lock(mutex),
    };
    if locked {
        Ok(())
    } else {
        Err(Errno::BUSY)
    }
}

/// Unlocks `mutex`. Must be called by the holder.
#[inline]
pub fn unlock(mutex: &RawMutex) {
    match mutex.kind() {
        MutexKind::Normal => Normal::unlock(mutex),
        MutexKind::Recursive => Recursive::unlock(mutex),
    }
}
