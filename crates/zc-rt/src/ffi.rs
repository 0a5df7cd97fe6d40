//! C entry points linked into generated programs.
//!
//! None of these unwind into C: a Rust panic is caught and turned into the
//! runtime's fatal path.

use std::ffi::{c_char, c_void, CStr};
use std::panic::UnwindSafe;

use crate::alloc::{self, allocate, reallocate, release, release_owned};
use crate::bounds::checked_index;
use crate::line::read_line;
#[cfg(unix)]
use crate::redirect::{restore, suppress};
use crate::vec::{DynArray, Opaque};

fn guarded<T>(f: impl FnOnce() -> T + UnwindSafe) -> T {
    std::panic::catch_unwind(f).unwrap_or_else(|_| alloc::panic("internal runtime error"))
}

unsafe fn message_from<'a>(msg: *const c_char) -> std::borrow::Cow<'a, str> {
    if msg.is_null() {
        return "(null)".into();
    }
    CStr::from_ptr(msg).to_string_lossy()
}

#[no_mangle]
pub extern "C" fn zc_rt_malloc(n: usize) -> *mut c_void {
    allocate(n)
}

#[no_mangle]
pub unsafe extern "C" fn zc_rt_realloc(ptr: *mut c_void, n: usize) -> *mut c_void {
    reallocate(ptr, n)
}

#[no_mangle]
pub unsafe extern "C" fn zc_rt_free(ptr: *mut c_void) {
    release(ptr)
}

/// Scope-exit cleanup: `slot` points at an owned pointer that may already be null.
#[no_mangle]
pub unsafe extern "C" fn zc_rt_autofree(slot: *mut *mut c_void) {
    if let Some(slot) = slot.as_mut() {
        release_owned(slot);
    }
}

#[no_mangle]
pub unsafe extern "C" fn zc_rt_panic(msg: *const c_char) -> ! {
    let msg = message_from(msg);
    alloc::panic(&msg)
}

#[no_mangle]
pub unsafe extern "C" fn zc_rt_assert_fail(msg: *const c_char) -> ! {
    let msg = message_from(msg);
    alloc::assert_failed(&msg)
}

#[no_mangle]
pub extern "C" fn zc_rt_bool_str(b: bool) -> *const c_char {
    let s: &'static [u8] = if b { b"true\0" } else { b"false\0" };
    s.as_ptr() as *const c_char
}

#[no_mangle]
pub extern "C" fn zc_rt_vec_new() -> DynArray {
    DynArray::new()
}

#[no_mangle]
pub unsafe extern "C" fn zc_rt_vec_push(v: *mut DynArray, item: *mut c_void) {
    let Some(v) = v.as_mut() else {
        alloc::panic("vector push through a null pointer");
    };
    guarded(std::panic::AssertUnwindSafe(|| v.push(item)))
}

/// Builds an array from `count` items in one allocation.
#[no_mangle]
pub unsafe extern "C" fn zc_rt_vec_make(count: usize, items: *const Opaque) -> DynArray {
    if count == 0 || items.is_null() {
        return DynArray::build(&[]);
    }
    let items = std::slice::from_raw_parts(items, count);
    guarded(|| DynArray::build(items))
}

#[no_mangle]
pub unsafe extern "C" fn zc_rt_vec_free(v: *mut DynArray) {
    if let Some(v) = v.as_mut() {
        v.clear_and_release();
    }
}

#[no_mangle]
pub extern "C" fn zc_rt_check_bounds(index: i64, limit: i64) -> i64 {
    checked_index(index, limit)
}

#[cfg(unix)]
#[no_mangle]
pub extern "C" fn zc_rt_suppress_stdout() {
    guarded(suppress)
}

#[cfg(unix)]
#[no_mangle]
pub extern "C" fn zc_rt_restore_stdout() {
    guarded(restore)
}

/// Returns a heap line the caller frees with `free`, or null at end of input
/// and on any read failure.
#[no_mangle]
pub extern "C" fn zc_rt_readln() -> *mut c_char {
    guarded(|| match read_line() {
        Ok(Some(line)) => line.into_raw(),
        Ok(None) | Err(_) => std::ptr::null_mut(),
    })
}
