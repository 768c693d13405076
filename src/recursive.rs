//! Reentrant locking on top of the spin word.
//!
//! `owner` and `count` are written only by the thread that holds the spin word,
//! so relaxed atomics are enough for them: the acquire on the word orders the
//! new holder after the previous holder's reset of both fields. Other threads
//! may read `owner` while it changes, but they only compare it against their
//! own id, which can never be the value being written.
use crate::layout::RawMutex;
use crate::thread::current_tid;
use std::sync::atomic::Ordering::Relaxed;

/// Takes the lock, or re-enters it if the calling thread already holds it.
pub fn lock(mutex: &RawMutex) {
    let me = current_tid();
    if mutex.owner.load(Relaxed) != me {
        mutex.lock.lock();
        mutex.owner.store(me, Relaxed);
    }
    increment(mutex);
}

/// Tries to take or re-enter the lock without waiting.
///
/// # Returns
///
/// `false` if another thread holds the lock, in which case neither `owner` nor
/// `count` is touched.
pub fn try_lock(mutex: &RawMutex) -> bool {
    let me = current_tid();
    if mutex.owner.load(Relaxed) != me {
        if !mutex.lock.try_lock() {
            return false;
        }
        mutex.owner.store(me, Relaxed);
    }
    increment(mutex);
    true
}

/// Leaves one level of nesting, releasing the spin word when the last level is left.
///
/// Unlocking from a thread that does not hold the lock, or more often than it
/// was locked, is undefined as it is for glibc's `PTHREAD_MUTEX_RECURSIVE`.
pub fn unlock(mutex: &RawMutex) {
    let count = mutex.count.load(Relaxed).wrapping_sub(1);
    mutex.count.store(count, Relaxed);
    if count == 0 {
        mutex.owner.store(0, Relaxed);
        mutex.lock.unlock();
    }
}

#[inline]
fn increment(mutex: &RawMutex) {
    let count = mutex.count.load(Relaxed);
    mutex.count.store(count.wrapping_add(1), Relaxed);
}
