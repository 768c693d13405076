use libc::c_int;
use std::fmt;

/// A POSIX error number as returned by the pthread entry points.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Errno(pub c_int);

impl Errno {
    /// The lock is held and the caller asked not to wait.
    pub const BUSY: Errno = Errno(libc::EBUSY);
}

impl fmt::Display for Errno {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            libc::EBUSY => write!(f, "mutex is busy (EBUSY)"),
            code => write!(f, "errno {code}"),
        }
    }
}

impl std::error::Error for Errno {}

pub type Result<T> = std::result::Result<T, Errno>;

/// Converts an internal result to the C status code: 0 or the error number.
#[inline]
pub fn e(result: Result<()>) -> c_int {
    match result {
        Ok(()) => 0,
        Err(Errno(error)) => error,
    }
}
