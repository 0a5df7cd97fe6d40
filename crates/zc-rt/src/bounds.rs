use crate::diag::{die, FatalKind};
use crate::error::RtError;

/// Integer types accepted as an index or a limit.
pub trait IndexValue: Copy {
    fn widen(self) -> i128;
}

macro_rules! index_value {
    ($($t:ty),* $(,)?) => {
        $(
            impl IndexValue for $t {
                #[inline]
                fn widen(self) -> i128 {
                    self as i128
                }
            }
        )*
    };
}

index_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

#[inline]
fn in_range(index: i128, limit: i128) -> bool {
    index >= 0 && index < limit
}

/// Returns `index` unchanged when `0 <= index < limit`, otherwise reports the
/// index and limit on stderr and terminates the process.
#[inline]
pub fn checked_index<I: IndexValue, L: IndexValue>(index: I, limit: L) -> I {
    let (i, l) = (index.widen(), limit.widen());
    if !in_range(i, l) {
        bounds_violation(i, l);
    }
    index
}

pub fn try_checked_index<I: IndexValue, L: IndexValue>(index: I, limit: L) -> Result<usize, RtError> {
    let (i, l) = (index.widen(), limit.widen());
    if !in_range(i, l) {
        return Err(RtError::IndexOutOfBounds { index: i, limit: l });
    }
    Ok(i as usize)
}

#[cold]
fn bounds_violation(index: i128, limit: i128) -> ! {
    let msg = RtError::IndexOutOfBounds { index, limit }.to_string();
    die(FatalKind::Bounds, &msg, Some((index, limit)))
}

/// `check_bounds!(i, len)` evaluates `i` once and yields it if in range.
#[macro_export]
macro_rules! check_bounds {
    ($index:expr, $limit:expr $(,)?) => {
        $crate::bounds::checked_index($index, $limit)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_range_indices_pass_through() {
        for i in 0..5i32 {
            assert_eq!(checked_index(i, 5usize), i);
        }
        assert_eq!(checked_index(0u8, 1u64), 0u8);
    }

    #[test]
    fn index_is_evaluated_once() {
        let mut calls = 0;
        let mut next = || {
            calls += 1;
            2i64
        };
        assert_eq!(crate::check_bounds!(next(), 3), 2);
        assert_eq!(calls, 1);
    }

    #[test]
    fn try_variant_rejects_edges() {
        assert_eq!(try_checked_index(2u32, 3u32), Ok(2));
        assert_eq!(
            try_checked_index(3u32, 3u32),
            Err(RtError::IndexOutOfBounds { index: 3, limit: 3 })
        );
        assert_eq!(
            try_checked_index(-1i32, 3u32),
            Err(RtError::IndexOutOfBounds {
                index: -1,
                limit: 3
            })
        );
        assert!(try_checked_index(0i32, 0usize).is_err());
        assert_eq!(try_checked_index(u64::MAX - 1, u64::MAX), Ok((u64::MAX - 1) as usize));
    }
}
