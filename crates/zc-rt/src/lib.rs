//! Native runtime support for programs emitted by the zc transpiler.
//!
//! Generated code calls straight into these facilities: type-directed printing
//! ([`fmt`]), an untyped growable array ([`vec`]), the bounds guard behind every
//! subscript ([`bounds`]), stdout suppression ([`redirect`]), and line input
//! ([`line`], [`scan`]). Contract violations end the process through [`diag`];
//! the C-callable surface lives in [`ffi`].

#![allow(clippy::missing_safety_doc)]

pub mod alloc;
pub mod bounds;
pub mod config;
pub mod diag;
pub mod error;
pub mod ffi;
pub mod fmt;
pub mod line;
#[cfg(unix)]
pub mod redirect;
pub mod scan;
pub mod vec;

pub use alloc::{allocate, panic, reallocate, release, release_owned};
pub use bounds::{checked_index, try_checked_index, IndexValue};
pub use error::RtError;
pub use fmt::{format_value, print_value, println_value, FormatArg, FormatTag, Printable};
pub use line::{read_line, read_line_from, LineBuf};
#[cfg(unix)]
pub use redirect::{is_suppressed, restore, suppress, SuppressGuard};
pub use scan::{scan, scan_str, ScanFormat, ScanSlot};
pub use vec::{DynArray, Opaque};
