//! A structural view of glibc's `pthread_mutex_t`.
//!
//! The field order and widths follow `struct __pthread_mutex_s` from glibc's
//! `bits/struct_mutex.h` on x86_64. Only `lock`, `count`, `owner` and `kind` are
//! touched by this crate; the remaining fields exist to pin the size and the
//! offsets. The offsets are checked at compile time below, so a platform whose
//! layout differs fails to build instead of corrupting memory at run time.
use crate::kind::MutexKind;
use crate::spinlock::SpinLock;
use libc::{c_int, c_short, c_uint, c_void, pthread_mutex_t};
use std::mem::{align_of, offset_of, size_of};
use std::sync::atomic::{AtomicI32, AtomicU32, Ordering};

/// In-place view of a `pthread_mutex_t` owned by the caller.
#[repr(C)]
#[allow(dead_code)]
pub struct RawMutex {
    /// `__lock`: the spin word, 0 when free and 1 when held.
    pub(crate) lock: SpinLock,
    /// `__count`: nesting depth of a recursive mutex.
    pub(crate) count: AtomicU32,
    /// `__owner`: kernel thread id of the recursive holder, 0 when unheld.
    pub(crate) owner: AtomicI32,
    /// `__nusers`
    nusers: c_uint,
    /// `__kind`: the type tag set by `pthread_mutex_init`.
    kind: AtomicI32,
    /// `__spins`
    spins: c_short,
    /// `__elision`
    elision: c_short,
    /// `__list`
    list: [*mut c_void; 2],
}

const _: () = {
    if size_of::<RawMutex>() != 40 {
        panic!("pthread_mutex_t size mismatch");
    }
    if size_of::<RawMutex>() != size_of::<pthread_mutex_t>() {
        panic!("pthread_mutex_t size differs from the libc crate");
    }
    if align_of::<RawMutex>() != align_of::<pthread_mutex_t>() {
        panic!("pthread_mutex_t alignment differs from the libc crate");
    }
    if offset_of!(RawMutex, lock) != 0 {
        panic!("__lock offset mismatch");
    }
    if offset_of!(RawMutex, count) != 4 {
        panic!("__count offset mismatch");
    }
    if offset_of!(RawMutex, owner) != 8 {
        panic!("__owner offset mismatch");
    }
    if offset_of!(RawMutex, nusers) != 12 {
        panic!("__nusers offset mismatch");
    }
    if offset_of!(RawMutex, kind) != 16 {
        panic!("__kind offset mismatch");
    }
    if offset_of!(RawMutex, spins) != 20 || offset_of!(RawMutex, elision) != 22 {
        panic!("__spins/__elision offset mismatch");
    }
    if offset_of!(RawMutex, list) != 24 {
        panic!("__list offset mismatch");
    }
};

// Safety: every field touched across threads is atomic; `list` is never dereferenced.
unsafe impl Sync for RawMutex {}
unsafe impl Send for RawMutex {}

impl Default for RawMutex {
    fn default() -> Self {
        Self::new(0)
    }
}

impl RawMutex {
    /// Creates an unlocked mutex with the given raw type tag.
    ///
    /// This is equivalent to a zeroed `pthread_mutex_t` whose `__kind` is `kind`,
    /// which is what `PTHREAD_MUTEX_INITIALIZER` and its recursive sibling produce.
    pub const fn new(kind: c_int) -> Self {
        Self {
            lock: SpinLock::new(),
            count: AtomicU32::new(0),
            owner: AtomicI32::new(0),
            nusers: 0,
            kind: AtomicI32::new(kind),
            spins: 0,
            elision: 0,
            list: [std::ptr::null_mut(); 2],
        }
    }

    /// Reinterprets caller memory as a `RawMutex`.
    ///
    /// # Safety
    ///
    /// `ptr` must point to a live, initialised `pthread_mutex_t` that outlives `'a`.
    #[inline]
    pub unsafe fn from_ptr<'a>(ptr: *mut pthread_mutex_t) -> &'a Self {
        &*ptr.cast::<Self>()
    }

    /// Returns a pointer suitable for the exported C entry points.
    #[inline]
    pub fn as_ptr(&self) -> *mut pthread_mutex_t {
        self as *const Self as *mut pthread_mutex_t
    }

    /// The raw, unmasked type tag.
    #[inline]
    pub fn raw_kind(&self) -> c_int {
        self.kind.load(Ordering::Relaxed)
    }

    /// The decoded behaviour class.
    #[inline]
    pub fn kind(&self) -> MutexKind {
        MutexKind::decode(self.raw_kind())
    }

    /// Whether the spin word is currently held.
    #[inline]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }

    /// Kernel thread id of the recursive holder, or 0.
    #[inline]
    pub fn owner(&self) -> c_int {
        self.owner.load(Ordering::Relaxed)
    }

    /// Recursive nesting depth.
    #[inline]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Relaxed)
    }
}
