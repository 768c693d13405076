//! The pthread entry points this library replaces.
//!
//! With the `interpose` feature (on by default) each function is exported under
//! its C name, so preloading the shared object makes the dynamic loader bind a
//! program's calls here instead of to glibc:
//!
//! ```text
//! $ LD_PRELOAD=./libspinmutex.so your-program your-arguments
//! ```
//!
//! Nothing on these paths logs or allocates: a logger may itself take a
//! pthread mutex and would re-enter the lock being serviced.
use crate::dispatch;
use crate::errno::e;
use crate::layout::RawMutex;
use libc::{c_int, pthread_mutex_t};

/// # Safety
///
/// `mutex` must point to an initialised `pthread_mutex_t`.
#[cfg_attr(feature = "interpose", no_mangle)]
pub unsafe extern "C" fn pthread_mutex_lock(mutex: *mut pthread_mutex_t) -> c_int {
    dispatch::lock(RawMutex::from_ptr(mutex));
    0
}

/// Alias glibc uses for `pthread_mutex_lock` inside its own objects.
///
/// # Safety
///
/// See [`pthread_mutex_lock`].
#[cfg_attr(feature = "interpose", no_mangle)]
pub unsafe extern "C" fn __pthread_mutex_lock(mutex: *mut pthread_mutex_t) -> c_int {
    dispatch::lock(RawMutex::from_ptr(mutex));
    0
}

/// Re-lock path taken by condition-variable waits.
///
/// # Safety
///
/// See [`pthread_mutex_lock`].
#[cfg_attr(feature = "interpose", no_mangle)]
pub unsafe extern "C" fn __pthread_mutex_cond_lock(mutex: *mut pthread_mutex_t) -> c_int {
    dispatch::lock(RawMutex::from_ptr(mutex));
    0
}

/// Returns 0 if the lock was taken, `EBUSY` otherwise.
///
/// # Safety
///
/// See [`pthread_mutex_lock`].
#[cfg_attr(feature = "interpose", no_mangle)]
pub unsafe extern "C" fn pthread_mutex_trylock(mutex: *mut pthread_mutex_t) -> c_int {
    e(dispatch::try_lock(RawMutex::from_ptr(mutex)))
}

/// # Safety
///
/// `mutex` must point to an initialised `pthread_mutex_t` held by the calling thread.
#[cfg_attr(feature = "interpose", no_mangle)]
pub unsafe extern "C" fn pthread_mutex_unlock(mutex: *mut pthread_mutex_t) -> c_int {
    dispatch::unlock(RawMutex::from_ptr(mutex));
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kind::PTHREAD_MUTEX_RECURSIVE_NP;
    use rand::Rng;
    use std::cell::UnsafeCell;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;

    struct Guarded<T> {
        mutex: UnsafeCell<pthread_mutex_t>,
        data: UnsafeCell<T>,
    }

    unsafe impl<T: Send> Sync for Guarded<T> {}

    impl<T> Guarded<T> {
        fn new(mutex: pthread_mutex_t, data: T) -> Self {
            Self {
                mutex: UnsafeCell::new(mutex),
                data: UnsafeCell::new(data),
            }
        }

        fn raw(&self) -> *mut pthread_mutex_t {
            self.mutex.get()
        }
    }

    fn recursive_initializer() -> pthread_mutex_t {
        let mut mutex = libc::PTHREAD_MUTEX_INITIALIZER;
        let raw = RawMutex::new(PTHREAD_MUTEX_RECURSIVE_NP);
        unsafe { std::ptr::copy_nonoverlapping(raw.as_ptr(), &mut mutex, 1) };
        mutex
    }

    #[test]
    fn test_entry_points_status_codes() {
        let mut mutex = libc::PTHREAD_MUTEX_INITIALIZER;
        unsafe {
            assert_eq!(pthread_mutex_trylock(&mut mutex), 0);
            assert_eq!(pthread_mutex_trylock(&mut mutex), libc::EBUSY);
            assert_eq!(pthread_mutex_unlock(&mut mutex), 0);
            assert_eq!(pthread_mutex_lock(&mut mutex), 0);
            assert_eq!(pthread_mutex_unlock(&mut mutex), 0);
            assert_eq!(__pthread_mutex_lock(&mut mutex), 0);
            assert_eq!(pthread_mutex_trylock(&mut mutex), libc::EBUSY);
            assert_eq!(pthread_mutex_unlock(&mut mutex), 0);
            assert_eq!(__pthread_mutex_cond_lock(&mut mutex), 0);
            assert_eq!(pthread_mutex_unlock(&mut mutex), 0);
            assert!(!RawMutex::from_ptr(&mut mutex).is_locked());
        }
    }

    #[test]
    fn test_lock_variants_share_recursive_state() {
        let mut mutex = recursive_initializer();
        unsafe {
            assert_eq!(pthread_mutex_lock(&mut mutex), 0);
            assert_eq!(__pthread_mutex_lock(&mut mutex), 0);
            assert_eq!(__pthread_mutex_cond_lock(&mut mutex), 0);
            assert_eq!(pthread_mutex_trylock(&mut mutex), 0);
            assert_eq!(RawMutex::from_ptr(&mut mutex).count(), 4);
            for _ in 0..4 {
                assert!(RawMutex::from_ptr(&mut mutex).is_locked());
                assert_eq!(pthread_mutex_unlock(&mut mutex), 0);
            }
            assert!(!RawMutex::from_ptr(&mut mutex).is_locked());
            assert_eq!(RawMutex::from_ptr(&mut mutex).owner(), 0);
        }
    }

    #[test]
    fn test_counter_through_entry_points() {
        const THREADS: usize = 4;
        const ITERATIONS: u64 = 1000;
        const REPETITIONS: u64 = 10;

        for initializer in [libc::PTHREAD_MUTEX_INITIALIZER, recursive_initializer()] {
            let shared = Arc::new(Guarded::new(initializer, 0u64));
            for _ in 0..REPETITIONS {
                let handles: Vec<_> = (0..THREADS)
                    .map(|_| {
                        let shared = shared.clone();
                        std::thread::spawn(move || {
                            for _ in 0..ITERATIONS {
                                unsafe {
                                    assert_eq!(pthread_mutex_lock(shared.raw()), 0);
                                    *shared.data.get() += 1;
                                    assert_eq!(pthread_mutex_unlock(shared.raw()), 0);
                                }
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    handle.join().unwrap();
                }
            }
            assert_eq!(unsafe { *shared.data.get() }, 40000);
        }
    }

    #[test]
    fn test_writes_visible_to_next_holder() {
        // Two plain (non-atomic) words that are only ever updated together.
        // A holder seeing them differ observed a torn or stale write.
        const THREADS: usize = 8;
        const ITERATIONS: usize = 1000;

        let shared = Arc::new(Guarded::new(libc::PTHREAD_MUTEX_INITIALIZER, [0u64; 2]));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let shared = shared.clone();
                std::thread::spawn(move || {
                    for _ in 0..ITERATIONS {
                        unsafe {
                            pthread_mutex_lock(shared.raw());
                            let data = &mut *shared.data.get();
                            assert_eq!(data[0], data[1]);
                            data[0] += 1;
                            data[1] += 1;
                            pthread_mutex_unlock(shared.raw());
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        let data = unsafe { *shared.data.get() };
        assert_eq!(data, [(THREADS * ITERATIONS) as u64; 2]);
    }

    #[test]
    fn test_every_waiter_eventually_acquires() {
        // No ordering among waiters is assumed; each one only has to get in once
        // while the others keep cycling the lock.
        const THREADS: usize = 8;

        let shared = Arc::new(Guarded::new(libc::PTHREAD_MUTEX_INITIALIZER, ()));
        let acquired = Arc::new(AtomicUsize::new(0));
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let shared = shared.clone();
                let acquired = acquired.clone();
                std::thread::spawn(move || {
                    let mut rng = rand::thread_rng();
                    let mut counted = false;
                    while acquired.load(Ordering::Acquire) < THREADS {
                        unsafe { pthread_mutex_lock(shared.raw()) };
                        if !counted {
                            counted = true;
                            acquired.fetch_add(1, Ordering::AcqRel);
                        }
                        for _ in 0..rng.gen_range(0..64) {
                            std::hint::spin_loop();
                        }
                        unsafe { pthread_mutex_unlock(shared.raw()) };
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(acquired.load(Ordering::Acquire), THREADS);
    }

    #[test]
    fn test_trylock_never_enters_held_lock() {
        let shared = Arc::new(Guarded::new(libc::PTHREAD_MUTEX_INITIALIZER, 0u32));
        let inside = Arc::new(AtomicBool::new(false));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = shared.clone();
                let inside = inside.clone();
                std::thread::spawn(move || {
                    let mut taken = 0;
                    for _ in 0..5000 {
                        if unsafe { pthread_mutex_trylock(shared.raw()) } == 0 {
                            assert!(!inside.swap(true, Ordering::Relaxed));
                            unsafe { *shared.data.get() += 1 };
                            inside.store(false, Ordering::Relaxed);
                            unsafe { pthread_mutex_unlock(shared.raw()) };
                            taken += 1;
                        }
                    }
                    taken
                })
            })
            .collect();
        let taken: u32 = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(unsafe { *shared.data.get() }, taken);
        assert!(taken > 0);
    }
}
