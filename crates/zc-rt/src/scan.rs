//! `scanf`-style field extraction from a single input line.
//!
//! The format is parsed once into directives and checked against the typed
//! output slots before any input is touched; a conversion can only ever write
//! into a slot of the matching kind.

use crate::error::RtError;
use crate::line::read_line;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ConvKind {
    Decimal,
    AutoBase,
    Unsigned,
    Hex,
    Float,
    Char,
    Str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Length {
    Default,
    Short,
    Long,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotKind {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Char,
    Str,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Conversion {
    kind: ConvKind,
    length: Length,
    width: Option<usize>,
    suppress: bool,
}

impl Conversion {
    fn slot_kind(&self) -> SlotKind {
        match (self.kind, self.length) {
            (ConvKind::Decimal | ConvKind::AutoBase, Length::Long) => SlotKind::I64,
            (ConvKind::Decimal | ConvKind::AutoBase, _) => SlotKind::I32,
            (ConvKind::Unsigned | ConvKind::Hex, Length::Long) => SlotKind::U64,
            (ConvKind::Unsigned | ConvKind::Hex, _) => SlotKind::U32,
            (ConvKind::Float, Length::Long) => SlotKind::F64,
            (ConvKind::Float, _) => SlotKind::F32,
            (ConvKind::Char, _) => SlotKind::Char,
            (ConvKind::Str, _) => SlotKind::Str,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Directive {
    /// Any run of input whitespace, including none.
    Space,
    Literal(u8),
    Conv(Conversion),
}

/// Output slot for one assigned conversion.
#[derive(Debug)]
pub enum ScanSlot<'a> {
    I32(&'a mut i32),
    I64(&'a mut i64),
    U32(&'a mut u32),
    U64(&'a mut u64),
    F32(&'a mut f32),
    F64(&'a mut f64),
    Char(&'a mut char),
    Str(&'a mut String),
}

impl ScanSlot<'_> {
    pub fn kind(&self) -> SlotKind {
        match self {
            ScanSlot::I32(_) => SlotKind::I32,
            ScanSlot::I64(_) => SlotKind::I64,
            ScanSlot::U32(_) => SlotKind::U32,
            ScanSlot::U64(_) => SlotKind::U64,
            ScanSlot::F32(_) => SlotKind::F32,
            ScanSlot::F64(_) => SlotKind::F64,
            ScanSlot::Char(_) => SlotKind::Char,
            ScanSlot::Str(_) => SlotKind::Str,
        }
    }
}

#[derive(Debug, PartialEq)]
enum Parsed {
    Int(i128),
    Float(f64),
    Char(char),
    Str(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanFormat {
    directives: Vec<Directive>,
}

impl ScanFormat {
    pub fn parse(fmt: &str) -> Result<Self, RtError> {
        let b = fmt.as_bytes();
        let mut directives = Vec::new();
        let mut i = 0;
        while i < b.len() {
            let c = b[i];
            if c.is_ascii_whitespace() {
                if directives.last() != Some(&Directive::Space) {
                    directives.push(Directive::Space);
                }
                i += 1;
                continue;
            }
            if c != b'%' {
                directives.push(Directive::Literal(c));
                i += 1;
                continue;
            }

            let start = i;
            i += 1;
            if b.get(i) == Some(&b'%') {
                directives.push(Directive::Literal(b'%'));
                i += 1;
                continue;
            }

            let suppress = b.get(i) == Some(&b'*');
            if suppress {
                i += 1;
            }

            let mut width: Option<usize> = None;
            while let Some(d) = b.get(i).filter(|d| d.is_ascii_digit()) {
                let w = width
                    .unwrap_or(0)
                    .checked_mul(10)
                    .and_then(|w| w.checked_add((d - b'0') as usize))
                    .ok_or(RtError::BadFormat { offset: start })?;
                width = Some(w);
                i += 1;
            }
            if width == Some(0) {
                return Err(RtError::BadFormat { offset: start });
            }

            let length = match b.get(i) {
                Some(b'h') => {
                    i += 1;
                    Length::Short
                }
                Some(b'l') => {
                    i += 1;
                    if b.get(i) == Some(&b'l') {
                        i += 1;
                    }
                    Length::Long
                }
                _ => Length::Default,
            };

            let kind = match b.get(i) {
                Some(b'd') => ConvKind::Decimal,
                Some(b'i') => ConvKind::AutoBase,
                Some(b'u') => ConvKind::Unsigned,
                Some(b'x' | b'X') => ConvKind::Hex,
                Some(b'f' | b'F' | b'e' | b'E' | b'g' | b'G') => ConvKind::Float,
                Some(b'c') => ConvKind::Char,
                Some(b's') => ConvKind::Str,
                _ => return Err(RtError::BadFormat { offset: start }),
            };
            i += 1;

            let bad_length = match kind {
                ConvKind::Float => length == Length::Short,
                ConvKind::Char | ConvKind::Str => length != Length::Default,
                _ => false,
            };
            if bad_length || (kind == ConvKind::Char && width.is_some_and(|w| w != 1)) {
                return Err(RtError::BadFormat { offset: start });
            }

            directives.push(Directive::Conv(Conversion {
                kind,
                length,
                width,
                suppress,
            }));
        }
        Ok(ScanFormat { directives })
    }

    fn assigned(&self) -> impl Iterator<Item = &Conversion> {
        self.directives.iter().filter_map(|d| match d {
            Directive::Conv(c) if !c.suppress => Some(c),
            _ => None,
        })
    }

    /// Number of conversions that write to a slot.
    pub fn fields(&self) -> usize {
        self.assigned().count()
    }

    pub fn check_slots(&self, slots: &[ScanSlot<'_>]) -> Result<(), RtError> {
        let mut n = 0;
        for (field, conv) in self.assigned().enumerate() {
            match slots.get(field) {
                Some(slot) if slot.kind() == conv.slot_kind() => {}
                _ => return Err(RtError::SlotMismatch { field }),
            }
            n += 1;
        }
        if slots.len() != n {
            return Err(RtError::SlotMismatch { field: n });
        }
        Ok(())
    }

    /// Matches `line` and returns the number of slots assigned. Stops at the
    /// first literal mismatch or failed conversion.
    pub fn apply(&self, line: &[u8], slots: &mut [ScanSlot<'_>]) -> Result<usize, RtError> {
        self.check_slots(slots)?;

        let mut cur = Cursor { s: line, pos: 0 };
        let mut assigned = 0;
        for d in &self.directives {
            match *d {
                Directive::Space => cur.skip_ws(),
                Directive::Literal(b) => {
                    if cur.peek() != Some(b) {
                        break;
                    }
                    cur.pos += 1;
                }
                Directive::Conv(conv) => {
                    if conv.kind != ConvKind::Char {
                        cur.skip_ws();
                    }
                    let Some(value) = cur.convert(conv) else {
                        break;
                    };
                    if conv.suppress {
                        continue;
                    }
                    if !store(&mut slots[assigned], value) {
                        break;
                    }
                    assigned += 1;
                }
            }
        }
        Ok(assigned)
    }
}

fn store(slot: &mut ScanSlot<'_>, value: Parsed) -> bool {
    match (slot, value) {
        (ScanSlot::I32(out), Parsed::Int(v)) => i32::try_from(v).map(|v| **out = v).is_ok(),
        (ScanSlot::I64(out), Parsed::Int(v)) => i64::try_from(v).map(|v| **out = v).is_ok(),
        // Negative input wraps, as strtoul does.
        (ScanSlot::U32(out), Parsed::Int(v)) if v.unsigned_abs() <= u32::MAX as u128 => {
            **out = v as u32;
            true
        }
        (ScanSlot::U64(out), Parsed::Int(v)) if v.unsigned_abs() <= u64::MAX as u128 => {
            **out = v as u64;
            true
        }
        (ScanSlot::F32(out), Parsed::Float(v)) => {
            **out = v as f32;
            true
        }
        (ScanSlot::F64(out), Parsed::Float(v)) => {
            **out = v;
            true
        }
        (ScanSlot::Char(out), Parsed::Char(c)) => {
            **out = c;
            true
        }
        (ScanSlot::Str(out), Parsed::Str(s)) => {
            **out = s;
            true
        }
        _ => false,
    }
}

struct Cursor<'a> {
    s: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<u8> {
        self.s.get(self.pos).copied()
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn window(&self, width: Option<usize>) -> &'a [u8] {
        let s: &'a [u8] = self.s;
        let rest = &s[self.pos..];
        match width {
            Some(w) if w < rest.len() => &rest[..w],
            _ => rest,
        }
    }

    fn convert(&mut self, conv: Conversion) -> Option<Parsed> {
        let win = self.window(conv.width);
        let (used, value) = match conv.kind {
            ConvKind::Decimal | ConvKind::Unsigned => scan_int(win, Some(10))?,
            ConvKind::Hex => scan_int(win, Some(16))?,
            ConvKind::AutoBase => scan_int(win, None)?,
            ConvKind::Float => scan_float(win)?,
            ConvKind::Char => scan_char(win)?,
            ConvKind::Str => scan_word(win)?,
        };
        self.pos += used;
        Some(value)
    }
}

fn digit_value(b: u8, radix: u32) -> Option<u32> {
    (b as char).to_digit(radix)
}

/// `radix: None` picks the base from the prefix, like `%i`.
fn scan_int(win: &[u8], radix: Option<u32>) -> Option<(usize, Parsed)> {
    let mut i = 0;
    let negative = match win.first() {
        Some(b'-') => {
            i += 1;
            true
        }
        Some(b'+') => {
            i += 1;
            false
        }
        _ => false,
    };

    let has_hex_prefix = |at: usize| {
        win.get(at) == Some(&b'0')
            && matches!(win.get(at + 1), Some(b'x' | b'X'))
            && win.get(at + 2).is_some_and(|&b| digit_value(b, 16).is_some())
    };
    let radix = match radix {
        Some(16) => {
            if has_hex_prefix(i) {
                i += 2;
            }
            16
        }
        Some(r) => r,
        None if has_hex_prefix(i) => {
            i += 2;
            16
        }
        None if win.get(i) == Some(&b'0') => 8,
        None => 10,
    };

    let digits_start = i;
    let mut acc: i128 = 0;
    while let Some(d) = win.get(i).and_then(|&b| digit_value(b, radix)) {
        acc = acc.checked_mul(radix as i128)?.checked_add(d as i128)?;
        i += 1;
    }
    if i == digits_start {
        return None;
    }
    Some((i, Parsed::Int(if negative { -acc } else { acc })))
}

fn scan_float(win: &[u8]) -> Option<(usize, Parsed)> {
    let mut i = 0;
    if matches!(win.first(), Some(b'-' | b'+')) {
        i += 1;
    }

    let starts_with_ci = |at: usize, word: &[u8]| {
        win.len() >= at + word.len() && win[at..at + word.len()].eq_ignore_ascii_case(word)
    };
    if starts_with_ci(i, b"infinity") {
        i += 8;
    } else if starts_with_ci(i, b"inf") || starts_with_ci(i, b"nan") {
        i += 3;
    } else {
        let int_start = i;
        while win.get(i).is_some_and(|b| b.is_ascii_digit()) {
            i += 1;
        }
        let mut mantissa_digits = i - int_start;
        if win.get(i) == Some(&b'.') {
            let frac_start = i + 1;
            let mut j = frac_start;
            while win.get(j).is_some_and(|b| b.is_ascii_digit()) {
                j += 1;
            }
            mantissa_digits += j - frac_start;
            if mantissa_digits > 0 {
                i = j;
            }
        }
        if mantissa_digits == 0 {
            return None;
        }
        if matches!(win.get(i), Some(b'e' | b'E')) {
            let mut j = i + 1;
            if matches!(win.get(j), Some(b'-' | b'+')) {
                j += 1;
            }
            let exp_start = j;
            while win.get(j).is_some_and(|b| b.is_ascii_digit()) {
                j += 1;
            }
            if j > exp_start {
                i = j;
            }
        }
    }

    let text = std::str::from_utf8(&win[..i]).ok()?;
    let v: f64 = text.parse().ok()?;
    Some((i, Parsed::Float(v)))
}

fn scan_char(win: &[u8]) -> Option<(usize, Parsed)> {
    let first = *win.first()?;
    let n = match first {
        0x00..=0x7f => 1,
        0xc0..=0xdf => 2,
        0xe0..=0xef => 3,
        0xf0..=0xf7 => 4,
        _ => 1,
    };
    if let Some(c) = win
        .get(..n)
        .and_then(|b| std::str::from_utf8(b).ok())
        .and_then(|s| s.chars().next())
    {
        return Some((n, Parsed::Char(c)));
    }
    Some((1, Parsed::Char(first as char)))
}

fn scan_word(win: &[u8]) -> Option<(usize, Parsed)> {
    let n = win
        .iter()
        .position(|b| b.is_ascii_whitespace())
        .unwrap_or(win.len());
    if n == 0 {
        return None;
    }
    Some((n, Parsed::Str(String::from_utf8_lossy(&win[..n]).into_owned())))
}

/// Parses an in-memory line.
pub fn scan_str(line: &[u8], fmt: &str, slots: &mut [ScanSlot<'_>]) -> Result<usize, RtError> {
    ScanFormat::parse(fmt)?.apply(line, slots)
}

/// Reads one line from stdin and parses it. End of input yields zero fields.
pub fn scan(fmt: &str, slots: &mut [ScanSlot<'_>]) -> Result<usize, RtError> {
    let fmt = ScanFormat::parse(fmt)?;
    fmt.check_slots(slots)?;
    let Some(line) = read_line()? else {
        return Ok(0);
    };
    fmt.apply(line.as_bytes(), slots)
}
