use std::fmt;
use std::io;

// -------------------------
// Error code space (runtime v1)
// -------------------------

pub const RT_ERR_OUT_OF_MEMORY: u32 = 60401;
pub const RT_ERR_IO: u32 = 60402;
pub const RT_ERR_LINE_TOO_LONG: u32 = 60403;
pub const RT_ERR_INDEX_OUT_OF_BOUNDS: u32 = 60404;
pub const RT_ERR_BAD_FORMAT: u32 = 60405;
pub const RT_ERR_SLOT_MISMATCH: u32 = 60406;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RtError {
    OutOfMemory,
    Io(io::ErrorKind),
    LineTooLong { max: usize },
    IndexOutOfBounds { index: i128, limit: i128 },
    BadFormat { offset: usize },
    SlotMismatch { field: usize },
}

impl RtError {
    pub fn code(&self) -> u32 {
        match self {
            RtError::OutOfMemory => RT_ERR_OUT_OF_MEMORY,
            RtError::Io(_) => RT_ERR_IO,
            RtError::LineTooLong { .. } => RT_ERR_LINE_TOO_LONG,
            RtError::IndexOutOfBounds { .. } => RT_ERR_INDEX_OUT_OF_BOUNDS,
            RtError::BadFormat { .. } => RT_ERR_BAD_FORMAT,
            RtError::SlotMismatch { .. } => RT_ERR_SLOT_MISMATCH,
        }
    }
}

impl fmt::Display for RtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RtError::OutOfMemory => write!(f, "out of memory"),
            RtError::Io(kind) => write!(f, "io error: {kind}"),
            RtError::LineTooLong { max } => write!(f, "line exceeds {max} bytes"),
            RtError::IndexOutOfBounds { index, limit } => {
                write!(f, "Index out of bounds: {index} (limit {limit})")
            }
            RtError::BadFormat { offset } => {
                write!(f, "malformed scan format at byte {offset}")
            }
            RtError::SlotMismatch { field } => {
                write!(f, "scan slot {field} does not match its conversion")
            }
        }
    }
}

impl std::error::Error for RtError {}

impl From<io::Error> for RtError {
    fn from(e: io::Error) -> Self {
        RtError::Io(e.kind())
    }
}
