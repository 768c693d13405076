use libc::pid_t;
use std::cell::Cell;

thread_local! {
    // 0 is never a valid tid, so it doubles as "not fetched yet".
    static CACHED_TID: Cell<pid_t> = const { Cell::new(0) };
}

/// Returns the kernel thread id of the calling thread.
///
/// glibc stores the same value in `__owner`, so recursive mutexes locked by
/// either implementation agree on who holds them. The value is cached per
/// thread and is stale in the child of a `fork` until that child execs.
#[inline]
pub fn current_tid() -> pid_t {
    CACHED_TID.with(|cached| {
        let tid = cached.get();
        if tid != 0 {
            return tid;
        }
        let tid = unsafe { libc::syscall(libc::SYS_gettid) } as pid_t;
        cached.set(tid);
        tid
    })
}
