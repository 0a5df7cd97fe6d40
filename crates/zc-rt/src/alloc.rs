use std::ffi::c_void;

use crate::diag::{die, FatalKind};

// Thin forwards to the platform heap. No bookkeeping, null on exhaustion.

#[inline]
pub fn allocate(n: usize) -> *mut c_void {
    unsafe { libc::malloc(n) }
}

/// # Safety
/// `ptr` must be null or a live block from [`allocate`]/[`reallocate`].
#[inline]
pub unsafe fn reallocate(ptr: *mut c_void, n: usize) -> *mut c_void {
    libc::realloc(ptr, n)
}

/// # Safety
/// `ptr` must be null or a live block from [`allocate`]/[`reallocate`].
#[inline]
pub unsafe fn release(ptr: *mut c_void) {
    libc::free(ptr)
}

/// Releases `*slot` if it is non-null, then nulls it. Safe to call twice.
///
/// # Safety
/// `*slot` must be null or a live block from [`allocate`]/[`reallocate`].
pub unsafe fn release_owned(slot: &mut *mut c_void) {
    if !slot.is_null() {
        release(*slot);
        *slot = std::ptr::null_mut();
    }
}

/// Writes `Panic: <message>` to stderr and terminates the process.
pub fn panic(message: &str) -> ! {
    die(FatalKind::Panic, message, None)
}

#[doc(hidden)]
#[cold]
pub fn assert_failed(message: &str) -> ! {
    die(FatalKind::Assert, message, None)
}

/// Terminates the process when `cond` is false. The message is only formatted
/// on failure.
#[macro_export]
macro_rules! rt_assert {
    ($cond:expr $(,)?) => {
        $crate::rt_assert!($cond, "{}", stringify!($cond))
    };
    ($cond:expr, $($arg:tt)+) => {
        if !($cond) {
            $crate::alloc::assert_failed(&::std::format!($($arg)+))
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_owned_is_idempotent() {
        let mut p = allocate(16);
        assert!(!p.is_null());
        unsafe {
            release_owned(&mut p);
            assert!(p.is_null());
            release_owned(&mut p);
        }
        assert!(p.is_null());
    }

    #[test]
    fn reallocate_preserves_prefix() {
        unsafe {
            let p = allocate(4) as *mut u8;
            assert!(!p.is_null());
            std::ptr::copy_nonoverlapping(b"abcd".as_ptr(), p, 4);
            let q = reallocate(p as *mut c_void, 4096) as *mut u8;
            assert!(!q.is_null());
            assert_eq!(std::slice::from_raw_parts(q, 4), b"abcd");
            release(q as *mut c_void);
        }
    }

    #[test]
    fn passing_assert_is_a_no_op() {
        let x = 3;
        crate::rt_assert!(x == 3);
        crate::rt_assert!(x > 0, "x was {}", x);
    }
}
