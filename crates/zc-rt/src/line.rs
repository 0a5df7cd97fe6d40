use std::ffi::{c_char, c_void};
use std::fmt;
use std::io::{self, BufRead};

use crate::alloc::{allocate, reallocate, release};
use crate::config::policy;
use crate::error::RtError;

pub const INITIAL_LINE_CAPACITY: usize = 64;

/// Heap buffer holding one input line, always NUL-terminated.
///
/// The allocation comes from the platform heap, so [`LineBuf::into_raw`] can
/// hand it to C code that releases it with `free`.
pub struct LineBuf {
    ptr: *mut u8,
    len: usize,
    cap: usize,
}

impl LineBuf {
    pub fn with_capacity(cap: usize) -> Result<Self, RtError> {
        let cap = cap.max(1);
        let ptr = allocate(cap) as *mut u8;
        if ptr.is_null() {
            return Err(RtError::OutOfMemory);
        }
        unsafe { ptr.write(0) };
        Ok(LineBuf { ptr, len: 0, cap })
    }

    fn grow_for(&mut self, extra: usize) -> Result<(), RtError> {
        let need = self
            .len
            .checked_add(extra)
            .and_then(|n| n.checked_add(1))
            .ok_or(RtError::OutOfMemory)?;
        let mut new_cap = self.cap;
        while new_cap < need {
            new_cap = new_cap.checked_mul(2).ok_or(RtError::OutOfMemory)?;
        }
        if new_cap == self.cap {
            return Ok(());
        }
        let ptr = unsafe { reallocate(self.ptr as *mut c_void, new_cap) } as *mut u8;
        if ptr.is_null() {
            // The old block is still ours and is released on drop.
            return Err(RtError::OutOfMemory);
        }
        self.ptr = ptr;
        self.cap = new_cap;
        Ok(())
    }

    pub fn extend_from_slice(&mut self, bytes: &[u8]) -> Result<(), RtError> {
        self.grow_for(bytes.len())?;
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.ptr.add(self.len), bytes.len());
            self.len += bytes.len();
            self.ptr.add(self.len).write(0);
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.cap
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub fn as_bytes_with_nul(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.ptr, self.len + 1) }
    }

    pub fn to_str(&self) -> Result<&str, std::str::Utf8Error> {
        std::str::from_utf8(self.as_bytes())
    }

    pub fn as_c_ptr(&self) -> *const c_char {
        self.ptr as *const c_char
    }

    /// Gives up ownership. The caller must eventually `free` the pointer.
    pub fn into_raw(self) -> *mut c_char {
        let ptr = self.ptr as *mut c_char;
        std::mem::forget(self);
        ptr
    }
}

impl Drop for LineBuf {
    fn drop(&mut self) {
        unsafe { release(self.ptr as *mut c_void) }
    }
}

impl fmt::Debug for LineBuf {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineBuf")
            .field("line", &String::from_utf8_lossy(self.as_bytes()))
            .field("cap", &self.cap)
            .finish()
    }
}

/// Reads up to and excluding the next `\n`.
///
/// `Ok(None)` means end of input before any byte was read. A final line without
/// a trailing newline is still returned.
pub fn read_line_from<R: BufRead + ?Sized>(r: &mut R) -> Result<Option<LineBuf>, RtError> {
    read_line_limited(r, policy().max_line_bytes)
}

pub fn read_line() -> Result<Option<LineBuf>, RtError> {
    let mut stdin = io::stdin().lock();
    read_line_from(&mut stdin)
}

pub(crate) fn read_line_limited<R: BufRead + ?Sized>(
    r: &mut R,
    max: usize,
) -> Result<Option<LineBuf>, RtError> {
    let mut line = LineBuf::with_capacity(INITIAL_LINE_CAPACITY)?;
    let mut saw_any = false;

    loop {
        let (consume_n, saw_newline, too_large) = {
            let buf = match r.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if buf.is_empty() {
                if !saw_any {
                    return Ok(None);
                }
                break;
            }
            saw_any = true;

            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) if line.len().saturating_add(pos) > max => (pos + 1, true, true),
                Some(pos) => {
                    line.extend_from_slice(&buf[..pos])?;
                    (pos + 1, true, false)
                }
                None if line.len().saturating_add(buf.len()) > max => (buf.len(), false, true),
                None => {
                    line.extend_from_slice(buf)?;
                    (buf.len(), false, false)
                }
            }
        };

        r.consume(consume_n);

        if too_large {
            if !saw_newline {
                skip_rest_of_line(r)?;
            }
            return Err(RtError::LineTooLong { max });
        }
        if saw_newline {
            break;
        }
    }

    Ok(Some(line))
}

fn skip_rest_of_line<R: BufRead + ?Sized>(r: &mut R) -> Result<(), RtError> {
    loop {
        let (consume_n, saw_newline) = {
            let buf = match r.fill_buf() {
                Ok(buf) => buf,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            if buf.is_empty() {
                return Ok(());
            }
            match buf.iter().position(|&b| b == b'\n') {
                Some(pos) => (pos + 1, true),
                None => (buf.len(), false),
            }
        };
        r.consume(consume_n);
        if saw_newline {
            return Ok(());
        }
    }
}
