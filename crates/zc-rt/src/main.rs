use std::io::Write as _;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};

use zc_contracts::ZC_RT_REPORT_SCHEMA_VERSION;
use zc_rt::fmt::tag_of;
use zc_rt::{format_value, DynArray, Printable, ScanSlot};

#[derive(Parser)]
#[command(name = "zc-rt")]
#[command(about = "Drives the zc runtime facilities in a real process.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Format one sample of every supported primitive.
    Fmt,
    /// Push `count` words and report the growth sequence.
    #[command(name = "vec")]
    Array {
        #[arg(long, default_value_t = 20)]
        count: usize,
        /// Seed the array in one pass instead of pushing.
        #[arg(long)]
        build: bool,
        /// Read one element back through the bounds-checked accessor.
        #[arg(long, allow_hyphen_values = true)]
        at: Option<i64>,
    },
    /// Run one index through the bounds guard.
    Bounds {
        #[arg(long, allow_hyphen_values = true)]
        index: i64,
        #[arg(long, allow_hyphen_values = true)]
        limit: i64,
    },
    Panic {
        #[arg(long)]
        message: String,
    },
    Assert {
        #[arg(long)]
        holds: bool,
        #[arg(long)]
        message: String,
    },
    /// Write around a suppress/restore pair. Output is plain text.
    Redirect {
        #[arg(long, value_enum, default_value_t = RedirectMode::Pair)]
        mode: RedirectMode,
    },
    /// Read stdin line by line until end of input.
    ReadLines {
        /// Go through the C export and free each line with `free`.
        #[arg(long)]
        c_abi: bool,
    },
    /// Call scan `times` times against stdin.
    Scan {
        #[arg(long)]
        format: String,
        #[arg(long, value_enum, value_delimiter = ',')]
        slots: Vec<SlotArg>,
        #[arg(long, default_value_t = 1)]
        times: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab_case")]
enum RedirectMode {
    /// One suppress/restore pair with print, raw write and child output inside.
    Pair,
    /// Two suppress calls, two restore calls.
    Nested,
    /// Nested scoped guards.
    Guard,
    /// Restore without a prior suppress.
    RestoreOnly,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[clap(rename_all = "kebab_case")]
enum SlotArg {
    I32,
    I64,
    U32,
    U64,
    F32,
    F64,
    Char,
    Str,
}

enum SlotValue {
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    Str(String),
}

impl SlotValue {
    fn zero(kind: SlotArg) -> Self {
        match kind {
            SlotArg::I32 => SlotValue::I32(0),
            SlotArg::I64 => SlotValue::I64(0),
            SlotArg::U32 => SlotValue::U32(0),
            SlotArg::U64 => SlotValue::U64(0),
            SlotArg::F32 => SlotValue::F32(0.0),
            SlotArg::F64 => SlotValue::F64(0.0),
            SlotArg::Char => SlotValue::Char('\0'),
            SlotArg::Str => SlotValue::Str(String::new()),
        }
    }

    fn as_slot(&mut self) -> ScanSlot<'_> {
        match self {
            SlotValue::I32(v) => ScanSlot::I32(v),
            SlotValue::I64(v) => ScanSlot::I64(v),
            SlotValue::U32(v) => ScanSlot::U32(v),
            SlotValue::U64(v) => ScanSlot::U64(v),
            SlotValue::F32(v) => ScanSlot::F32(v),
            SlotValue::F64(v) => ScanSlot::F64(v),
            SlotValue::Char(v) => ScanSlot::Char(v),
            SlotValue::Str(v) => ScanSlot::Str(v),
        }
    }

    fn to_json(&self) -> Value {
        match self {
            SlotValue::I32(v) => json!(v),
            SlotValue::I64(v) => json!(v),
            SlotValue::U32(v) => json!(v),
            SlotValue::U64(v) => json!(v),
            SlotValue::F32(v) => json!(v),
            SlotValue::F64(v) => json!(v),
            SlotValue::Char(v) => json!(v.to_string()),
            SlotValue::Str(v) => json!(v),
        }
    }
}

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(2)
        }
    }
}

fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let report = match cli.cmd {
        Cmd::Fmt => cmd_fmt(),
        Cmd::Array { count, build, at } => cmd_array(count, build, at),
        Cmd::Bounds { index, limit } => {
            let got = zc_rt::checked_index(index, limit);
            json!({ "index": got, "limit": limit })
        }
        Cmd::Panic { message } => zc_rt::panic(&message),
        Cmd::Assert { holds, message } => {
            zc_rt::rt_assert!(holds, "{}", message);
            json!({ "holds": holds })
        }
        Cmd::Redirect { mode } => {
            cmd_redirect(mode)?;
            return Ok(ExitCode::SUCCESS);
        }
        Cmd::ReadLines { c_abi: false } => cmd_read_lines()?,
        Cmd::ReadLines { c_abi: true } => cmd_read_lines_c_abi(),
        Cmd::Scan {
            format,
            slots,
            times,
        } => cmd_scan(&format, &slots, times)?,
    };

    let mut doc = json!({ "schema_version": ZC_RT_REPORT_SCHEMA_VERSION });
    if let (Some(doc), Value::Object(body)) = (doc.as_object_mut(), report) {
        doc.extend(body);
    }
    println!("{}", serde_json::to_string(&doc)?);
    Ok(ExitCode::SUCCESS)
}

fn sample<T: Printable + ?Sized>(ty: &str, v: &T) -> Value {
    json!({
        "type": ty,
        "tag": tag_of(v).as_printf(),
        "text": format_value(v),
    })
}

fn cmd_fmt() -> Value {
    let null: *const u8 = std::ptr::null();
    json!({
        "values": [
            sample("bool", &true),
            sample("bool", &false),
            sample("char", &'x'),
            sample("i32", &-5i32),
            sample("i64", &i64::MIN),
            sample("u8", &255u8),
            sample("u64", &u64::MAX),
            sample("f32", &0.25f32),
            sample("f64", &10.0f64),
            sample("str", "text"),
            sample("ptr", &null),
        ]
    })
}

fn cmd_array(count: usize, build: bool, at: Option<i64>) -> Value {
    let mut growth = Vec::new();
    let v = if build {
        let items: Vec<zc_rt::Opaque> = (0..count).map(|i| i as zc_rt::Opaque).collect();
        let v = DynArray::build(&items);
        growth.push(v.capacity());
        v
    } else {
        let mut v = DynArray::new();
        for i in 0..count {
            let before = v.capacity();
            v.push_word(i);
            if v.capacity() != before {
                growth.push(v.capacity());
            }
        }
        v
    };
    let in_order = v.iter().enumerate().all(|(i, p)| p as usize == i);
    let picked = at.map(|i| v.at(i) as usize);
    json!({
        "len": v.len(),
        "capacity": v.capacity(),
        "growth": growth,
        "in_order": in_order,
        "at": picked,
    })
}

#[cfg(unix)]
fn raw_stdout_write(bytes: &[u8]) {
    unsafe {
        libc::write(
            libc::STDOUT_FILENO,
            bytes.as_ptr() as *const libc::c_void,
            bytes.len(),
        );
    }
}

#[cfg(unix)]
fn cmd_redirect(mode: RedirectMode) -> Result<()> {
    use zc_rt::{restore, suppress, SuppressGuard};

    let mut stdout = std::io::stdout();
    match mode {
        RedirectMode::Pair => {
            writeln!(stdout, "before")?;
            suppress();
            writeln!(stdout, "hidden print")?;
            raw_stdout_write(b"hidden raw\n");
            std::process::Command::new("sh")
                .args(["-c", "echo hidden child"])
                .status()
                .context("spawn sh")?;
            restore();
            writeln!(stdout, "after")?;
        }
        RedirectMode::Nested => {
            writeln!(stdout, "before")?;
            suppress();
            writeln!(stdout, "hidden outer")?;
            suppress();
            writeln!(stdout, "hidden inner")?;
            restore();
            writeln!(stdout, "after")?;
            restore();
            writeln!(stdout, "end")?;
        }
        RedirectMode::Guard => {
            writeln!(stdout, "before")?;
            {
                let outer = SuppressGuard::acquire();
                writeln!(stdout, "hidden outer")?;
                {
                    let inner = SuppressGuard::acquire();
                    anyhow::ensure!(!inner.activated(), "inner guard must not activate");
                    writeln!(stdout, "hidden inner")?;
                }
                anyhow::ensure!(outer.activated(), "outer guard must activate");
                writeln!(stdout, "hidden still")?;
            }
            writeln!(stdout, "after")?;
        }
        RedirectMode::RestoreOnly => {
            writeln!(stdout, "before")?;
            restore();
            writeln!(stdout, "after")?;
        }
    }
    stdout.flush()?;
    Ok(())
}

#[cfg(not(unix))]
fn cmd_redirect(_mode: RedirectMode) -> Result<()> {
    anyhow::bail!("stdout redirection requires a unix target")
}

fn cmd_read_lines() -> Result<Value> {
    let mut lines = Vec::new();
    while let Some(line) = zc_rt::read_line().context("read line")? {
        lines.push(json!({
            "text": String::from_utf8_lossy(line.as_bytes()),
            "len": line.len(),
            "capacity": line.capacity(),
        }));
    }
    Ok(json!({ "lines": lines }))
}

fn cmd_read_lines_c_abi() -> Value {
    let mut lines = Vec::new();
    loop {
        let raw = zc_rt::ffi::zc_rt_readln();
        if raw.is_null() {
            break;
        }
        let text = unsafe { std::ffi::CStr::from_ptr(raw) }
            .to_string_lossy()
            .into_owned();
        unsafe { libc::free(raw as *mut libc::c_void) };
        lines.push(json!({ "text": text }));
    }
    json!({ "lines": lines })
}

fn cmd_scan(format: &str, slots: &[SlotArg], times: usize) -> Result<Value> {
    let mut calls = Vec::new();
    for _ in 0..times {
        let mut values: Vec<SlotValue> = slots.iter().map(|&k| SlotValue::zero(k)).collect();
        let fields = {
            let mut refs: Vec<ScanSlot<'_>> = values.iter_mut().map(SlotValue::as_slot).collect();
            zc_rt::scan(format, &mut refs).with_context(|| format!("scan {format:?}"))?
        };
        calls.push(json!({
            "fields": fields,
            "values": values.iter().map(SlotValue::to_json).collect::<Vec<_>>(),
        }));
    }
    Ok(json!({ "calls": calls }))
}
