//! Type-directed value formatting.
//!
//! Each supported primitive implements [`Printable`], which pins a printf-style
//! tag at compile time and hands out the argument to render. Types without an
//! impl are rejected by the compiler; there is no runtime fallback.

use std::io::{self, Write};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatTag {
    /// Text, including the `true`/`false` rendering of booleans.
    Str,
    Char,
    Int,
    Long,
    UInt,
    ULong,
    Float,
    Pointer,
}

impl FormatTag {
    pub fn as_printf(self) -> &'static str {
        match self {
            FormatTag::Str => "%s",
            FormatTag::Char => "%c",
            FormatTag::Int => "%d",
            FormatTag::Long => "%ld",
            FormatTag::UInt => "%u",
            FormatTag::ULong => "%lu",
            FormatTag::Float => "%f",
            FormatTag::Pointer => "%p",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FormatArg<'a> {
    Str(&'a str),
    Char(char),
    Signed(i64),
    Unsigned(u64),
    Float(f64),
    Pointer(usize),
}

impl FormatArg<'_> {
    pub fn write_to<W: Write + ?Sized>(&self, w: &mut W) -> io::Result<()> {
        match *self {
            FormatArg::Str(s) => w.write_all(s.as_bytes()),
            FormatArg::Char(c) => {
                let mut buf = [0u8; 4];
                w.write_all(c.encode_utf8(&mut buf).as_bytes())
            }
            FormatArg::Signed(v) => {
                let mut buf = itoa::Buffer::new();
                w.write_all(buf.format(v).as_bytes())
            }
            FormatArg::Unsigned(v) => {
                let mut buf = itoa::Buffer::new();
                w.write_all(buf.format(v).as_bytes())
            }
            FormatArg::Float(v) => w.write_all(fixed_f64(v).as_bytes()),
            FormatArg::Pointer(0) => w.write_all(b"(nil)"),
            FormatArg::Pointer(addr) => write!(w, "{addr:#x}"),
        }
    }
}

/// `%f` rendering: six fractional digits, C spellings for non-finite values.
fn fixed_f64(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else if v == f64::INFINITY {
        "inf".to_string()
    } else if v == f64::NEG_INFINITY {
        "-inf".to_string()
    } else {
        format!("{v:.6}")
    }
}

pub trait Printable {
    const TAG: FormatTag;

    fn format_arg(&self) -> FormatArg<'_>;
}

impl Printable for bool {
    const TAG: FormatTag = FormatTag::Str;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Str(bool_str(*self))
    }
}

impl Printable for char {
    const TAG: FormatTag = FormatTag::Char;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Char(*self)
    }
}

macro_rules! printable_int {
    ($variant:ident as $wide:ty: $($t:ty => $tag:ident),* $(,)?) => {
        $(
            impl Printable for $t {
                const TAG: FormatTag = FormatTag::$tag;

                fn format_arg(&self) -> FormatArg<'_> {
                    FormatArg::$variant(*self as $wide)
                }
            }
        )*
    };
}

/// `i8` is a number, not a character: Rust keeps text in `char`, so only
/// `char` takes `%c`.
impl Printable for i8 {
    const TAG: FormatTag = FormatTag::Int;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Signed(*self as i64)
    }
}

printable_int!(Signed as i64: i16 => Int, i32 => Int, i64 => Long, isize => Long);
printable_int!(Unsigned as u64: u8 => UInt, u16 => UInt, u32 => UInt, u64 => ULong, usize => ULong);

impl Printable for f32 {
    const TAG: FormatTag = FormatTag::Float;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Float(*self as f64)
    }
}

impl Printable for f64 {
    const TAG: FormatTag = FormatTag::Float;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Float(*self)
    }
}

impl Printable for str {
    const TAG: FormatTag = FormatTag::Str;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Str(self)
    }
}

impl Printable for String {
    const TAG: FormatTag = FormatTag::Str;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Str(self.as_str())
    }
}

impl<T: Printable + ?Sized> Printable for &T {
    const TAG: FormatTag = T::TAG;

    fn format_arg(&self) -> FormatArg<'_> {
        (**self).format_arg()
    }
}

impl<T: ?Sized> Printable for *const T {
    const TAG: FormatTag = FormatTag::Pointer;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Pointer(self.cast::<()>() as usize)
    }
}

impl<T: ?Sized> Printable for *mut T {
    const TAG: FormatTag = FormatTag::Pointer;

    fn format_arg(&self) -> FormatArg<'_> {
        FormatArg::Pointer(self.cast::<()>() as usize)
    }
}

pub fn bool_str(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// The printf tag selected for `T`.
pub fn tag_of<T: Printable + ?Sized>(_: &T) -> FormatTag {
    T::TAG
}

pub fn write_value<W: Write + ?Sized, T: Printable + ?Sized>(w: &mut W, v: &T) -> io::Result<()> {
    v.format_arg().write_to(w)
}

pub fn format_value<T: Printable + ?Sized>(v: &T) -> String {
    let mut out = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_value(&mut out, v);
    String::from_utf8_lossy(&out).into_owned()
}

/// Writes to stdout without a newline. Errors are dropped, as with printf.
pub fn print_value<T: Printable + ?Sized>(v: &T) {
    let mut stdout = io::stdout().lock();
    let _ = write_value(&mut stdout, v);
}

pub fn println_value<T: Printable + ?Sized>(v: &T) {
    let mut stdout = io::stdout().lock();
    let _ = write_value(&mut stdout, v);
    let _ = stdout.write_all(b"\n");
}

/// Prints each argument with its own [`Printable`] rule, back to back.
#[macro_export]
macro_rules! zc_print {
    ($($v:expr),* $(,)?) => {{
        $( $crate::fmt::print_value(&$v); )*
    }};
}

#[macro_export]
macro_rules! zc_println {
    ($($v:expr),* $(,)?) => {{
        $( $crate::fmt::print_value(&$v); )*
        $crate::fmt::print_value("\n");
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bools_are_words() {
        assert_eq!(format_value(&true), "true");
        assert_eq!(format_value(&false), "false");
        assert_eq!(tag_of(&true), FormatTag::Str);
    }

    #[test]
    fn integers() {
        assert_eq!(format_value(&-5i32), "-5");
        assert_eq!(format_value(&i64::MIN), "-9223372036854775808");
        assert_eq!(format_value(&u64::MAX), "18446744073709551615");
        assert_eq!(format_value(&200u8), "200");
        assert_eq!(format_value(&-65i8), "-65");
        assert_eq!(tag_of(&65i8).as_printf(), "%d");
        assert_eq!(tag_of(&1i16).as_printf(), "%d");
        assert_eq!(tag_of(&1i64).as_printf(), "%ld");
        assert_eq!(tag_of(&1u32).as_printf(), "%u");
        assert_eq!(tag_of(&1usize).as_printf(), "%lu");
    }

    #[test]
    fn floats_use_fixed_notation() {
        assert_eq!(format_value(&10.0f64), "10.000000");
        assert_eq!(format_value(&0.5f32), "0.500000");
        assert_eq!(format_value(&-1.25f64), "-1.250000");
        assert_eq!(format_value(&f64::NAN), "nan");
        assert_eq!(format_value(&f64::NEG_INFINITY), "-inf");
        assert_eq!(tag_of(&1.0f32).as_printf(), "%f");
    }

    #[test]
    fn text_and_chars() {
        assert_eq!(format_value("hi there"), "hi there");
        assert_eq!(format_value(&String::from("owned")), "owned");
        assert_eq!(format_value(&'z'), "z");
        assert_eq!(format_value(&'é'), "é");
        assert_eq!(tag_of(&'z').as_printf(), "%c");
    }

    #[test]
    fn pointers_are_hex() {
        let p = 0x1000usize as *const u8;
        assert_eq!(format_value(&p), "0x1000");
        let null: *mut u8 = std::ptr::null_mut();
        assert_eq!(format_value(&null), "(nil)");
        assert_eq!(tag_of(&p).as_printf(), "%p");
    }

    #[test]
    fn references_dispatch_to_the_pointee() {
        let x = 7u16;
        let r = &x;
        assert_eq!(format_value(&r), "7");
        assert_eq!(tag_of(&r), FormatTag::UInt);
    }
}
