// Spin-only variant of the word lock used by std's futex mutex, without the futex fallback.
use libc::c_int;
use std::sync::atomic::{
    AtomicI32,
    Ordering::{Acquire, Relaxed, Release},
};

pub const UNLOCKED: c_int = 0;
pub const LOCKED: c_int = 1;

/// A test-and-test-and-set spinlock over a single `int`.
///
/// The layout is exactly one `c_int`, so a `SpinLock` can sit in place of the
/// `__lock` word of a foreign `pthread_mutex_t`.
#[repr(transparent)]
pub struct SpinLock {
    word: AtomicI32,
}

impl Default for SpinLock {
    fn default() -> Self {
        Self::new()
    }
}

impl SpinLock {
    #[inline]
    pub const fn new() -> Self {
        Self {
            word: AtomicI32::new(UNLOCKED),
        }
    }

    /// Attempts to take the lock with a single exchange.
    ///
    /// # Returns
    ///
    /// `true` if the word was free before the exchange and now belongs to the caller.
    /// A held word is left held.
    #[inline]
    pub fn try_lock(&self) -> bool {
        self.word.swap(LOCKED, Acquire) == UNLOCKED
    }

    /// Takes the lock, busy-waiting for as long as it is held elsewhere.
    ///
    /// There is no timeout and no fallback to a kernel wait.
    #[inline]
    pub fn lock(&self) {
        if !self.try_lock() {
            self.lock_contended();
        }
    }

    #[cold]
    fn lock_contended(&self) {
        loop {
            self.spin();
            if self.try_lock() {
                return;
            }
        }
    }

    fn spin(&self) {
        // We only use `load` (and not `swap`) while spinning,
        // to be easier on the caches.
        while self.word.load(Relaxed) != UNLOCKED {
            std::hint::spin_loop();
        }
    }

    /// Releases the lock.
    ///
    /// Must only be called by the thread that last acquired it.
    #[inline]
    pub fn unlock(&self) {
        self.word.store(UNLOCKED, Release);
    }

    /// Returns whether the word is currently held. Only a snapshot.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.word.load(Relaxed) != UNLOCKED
    }
}
