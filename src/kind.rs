use crate::layout::RawMutex;
use crate::recursive;
use libc::c_int;

/// Only the low seven bits of `__kind` carry the mutex type; the upper bits are
/// glibc flags such as the process-shared marker.
pub const KIND_MASK: c_int = 127;
pub const PTHREAD_MUTEX_RECURSIVE_NP: c_int = 1;

/// The behaviour class a mutex is serviced with.
///
/// Every tag other than recursive, including error-checking and adaptive,
/// is serviced as `Normal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutexKind {
    Normal,
    Recursive,
}

impl MutexKind {
    /// Decodes a raw `__kind` value.
    ///
    /// # Examples
    /// ```
    /// use spinmutex::MutexKind;
    ///
    /// assert_eq!(MutexKind::decode(1), MutexKind::Recursive);
    /// assert_eq!(MutexKind::decode(1 | 128), MutexKind::Recursive);
    /// assert_eq!(MutexKind::decode(0), MutexKind::Normal);
    /// assert_eq!(MutexKind::decode(2), MutexKind::Normal);
    /// ```
    #[inline]
    pub const fn decode(tag: c_int) -> Self {
        if tag & KIND_MASK == PTHREAD_MUTEX_RECURSIVE_NP {
            MutexKind::Recursive
        } else {
            MutexKind::Normal
        }
    }
}

/// Acquire, release and try-acquire over a `RawMutex`.
pub trait LockKind {
    fn lock(mutex: &RawMutex);
    fn try_lock(mutex: &RawMutex) -> bool;
    fn unlock(mutex: &RawMutex);
}

/// Plain spinlock on the `__lock` word.
pub struct Normal;

impl LockKind for Normal {
    #[inline]
    fn lock(mutex: &RawMutex) {
        mutex.lock.lock();
    }

    #[inline]
    fn try_lock(mutex: &RawMutex) -> bool {
        mutex.lock.try_lock()
    }

    #[inline]
    fn unlock(mutex: &RawMutex) {
        mutex.lock.unlock();
    }
}

/// Reentrant lock keyed by the calling thread's id.
pub struct Recursive;

impl LockKind for Recursive {
    #[inline]
    fn lock(mutex: &RawMutex) {
        recursive::lock(mutex);
    }

    #[inline]
    fn try_lock(mutex: &RawMutex) -> bool {
        recursive::try_lock(mutex)
    }

    #[inline]
    fn unlock(mutex: &RawMutex) {
        recursive::unlock(mutex);
    }
}
