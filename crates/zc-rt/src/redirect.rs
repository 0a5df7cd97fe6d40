//! Descriptor-level suppression of standard output.
//!
//! While suppressed, fd 1 points at the discard sink, so raw `write(2)` calls and
//! child processes are silenced along with formatted prints. The original
//! descriptor is kept as a duplicate until the matching restore.

use std::fs::OpenOptions;
use std::io;
use std::os::fd::{AsRawFd as _, FromRawFd as _, OwnedFd};
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::OnceCell;

use crate::alloc::panic;
use crate::config::policy;
use crate::diag::flush_all_stdout;
use crate::error::RtError;

static SAVED_STDOUT: OnceCell<Mutex<Option<OwnedFd>>> = OnceCell::new();

fn saved_stdout() -> MutexGuard<'static, Option<OwnedFd>> {
    SAVED_STDOUT
        .get_or_init(|| Mutex::new(None))
        .lock()
        .unwrap_or_else(|e| e.into_inner())
}

fn dup2_onto_stdout(fd: &OwnedFd) -> io::Result<()> {
    if unsafe { libc::dup2(fd.as_raw_fd(), libc::STDOUT_FILENO) } < 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Returns `Ok(true)` if this call activated suppression, `Ok(false)` if it was
/// already active. On error nothing changes.
pub fn try_suppress() -> Result<bool, RtError> {
    flush_all_stdout();
    let mut saved = saved_stdout();
    if saved.is_some() {
        return Ok(false);
    }

    let orig = unsafe { libc::dup(libc::STDOUT_FILENO) };
    if orig < 0 {
        return Err(io::Error::last_os_error().into());
    }
    let orig = unsafe { OwnedFd::from_raw_fd(orig) };

    let sink: OwnedFd = OpenOptions::new()
        .write(true)
        .open(&policy().null_device)?
        .into();
    dup2_onto_stdout(&sink)?;
    drop(sink);

    *saved = Some(orig);
    Ok(true)
}

/// Returns `Ok(true)` if a saved descriptor was put back, `Ok(false)` if
/// nothing was suppressed.
pub fn try_restore() -> Result<bool, RtError> {
    flush_all_stdout();
    let mut saved = saved_stdout();
    let Some(orig) = saved.take() else {
        return Ok(false);
    };
    if let Err(e) = dup2_onto_stdout(&orig) {
        *saved = Some(orig);
        return Err(e.into());
    }
    Ok(true)
}

pub fn suppress() {
    if let Err(e) = try_suppress() {
        panic(&format!("cannot suppress stdout: {e}"));
    }
}

pub fn restore() {
    if let Err(e) = try_restore() {
        panic(&format!("cannot restore stdout: {e}"));
    }
}

pub fn is_suppressed() -> bool {
    saved_stdout().is_some()
}

/// Suppresses stdout for its lifetime.
///
/// Only the guard whose acquisition activated suppression restores on drop, so
/// nested guards unwind in stack order.
#[must_use = "stdout is restored when the guard is dropped"]
#[derive(Debug)]
pub struct SuppressGuard {
    activated: bool,
}

impl SuppressGuard {
    pub fn acquire() -> Self {
        let activated = match try_suppress() {
            Ok(activated) => activated,
            Err(e) => panic(&format!("cannot suppress stdout: {e}")),
        };
        SuppressGuard { activated }
    }

    pub fn try_acquire() -> Result<Self, RtError> {
        Ok(SuppressGuard {
            activated: try_suppress()?,
        })
    }

    pub fn activated(&self) -> bool {
        self.activated
    }
}

impl Drop for SuppressGuard {
    fn drop(&mut self) {
        if self.activated {
            restore();
        }
    }
}
