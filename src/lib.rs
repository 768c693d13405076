//! A drop-in replacement for glibc's pthread mutex lock entry points that spins
//! in user space instead of blocking in the kernel.
//!
//! # Overview
//! `spinmutex` is built as a shared object meant to be preloaded beneath an
//! existing binary. Calls to `pthread_mutex_lock`, `pthread_mutex_trylock`,
//! `pthread_mutex_unlock` and the two internal lock aliases are then served by
//! a test-and-test-and-set spinlock operating directly on the caller's
//! `pthread_mutex_t`. This trades CPU time spent waiting for lower hand-off
//! latency, which pays off for short critical sections under light contention.
//!
//! # Features
//! - Binary compatible with glibc's x86_64 `pthread_mutex_t`, checked at compile time
//! - Normal and recursive mutexes, selected by the mutex's own type tag
//! - `EBUSY` from try-lock, 0 from everything else
//! - No allocation, no logging and no system calls on the lock path
//!   (apart from a one-time `gettid` per thread for recursive mutexes)
//!
//! There is no fairness between waiters and no timeout: a thread waits for as
//! long as the holder keeps the lock.
//!
//! # Examples
//! ```
//! use spinmutex::{dispatch, Errno, RawMutex, PTHREAD_MUTEX_RECURSIVE_NP};
//!
//! let mutex = RawMutex::new(PTHREAD_MUTEX_RECURSIVE_NP);
//! dispatch::lock(&mutex);
//! dispatch::lock(&mutex);
//! assert_eq!(mutex.count(), 2);
//! dispatch::unlock(&mutex);
//! dispatch::unlock(&mutex);
//!
//! let mutex = RawMutex::default();
//! dispatch::lock(&mutex);
//! assert_eq!(dispatch::try_lock(&mutex), Err(Errno::BUSY));
//! dispatch::unlock(&mutex);
//! ```
#[cfg(not(all(target_arch = "x86_64", target_os = "linux", target_env = "gnu")))]
compile_error!("spinmutex only supports the glibc pthread_mutex_t layout on x86_64 Linux");

pub mod dispatch;
mod errno;
pub mod interpose;
mod kind;
mod layout;
mod recursive;
mod spinlock;
pub mod thread;

pub use errno::*;
pub use kind::*;
pub use layout::*;
pub use spinlock::*;
