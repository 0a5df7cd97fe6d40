use std::ffi::c_void;

use crate::alloc::{allocate, panic, reallocate, release};
use crate::bounds::checked_index;

/// Word-sized element. The array never looks at or frees the pointee.
pub type Opaque = *mut c_void;

pub const MIN_CAPACITY: usize = 8;

/// Growable, order-preserving array of opaque references.
///
/// Laid out as `{ data, len, cap }` so generated C can hold it by value.
/// Any pointer obtained from [`DynArray::as_ptr`] is invalidated by the next
/// push that grows the array.
#[repr(C)]
#[derive(Debug)]
pub struct DynArray {
    data: *mut Opaque,
    len: usize,
    cap: usize,
}

fn block_bytes(cap: usize) -> usize {
    match cap.checked_mul(std::mem::size_of::<Opaque>()) {
        Some(n) => n,
        None => panic("vector capacity overflow"),
    }
}

impl DynArray {
    pub const fn new() -> Self {
        DynArray {
            data: std::ptr::null_mut(),
            len: 0,
            cap: 0,
        }
    }

    /// Seeds the array from `values` in one allocation of `max(len, 8)` slots.
    pub fn build(values: &[Opaque]) -> Self {
        let cap = values.len().max(MIN_CAPACITY);
        let data = allocate(block_bytes(cap)) as *mut Opaque;
        if data.is_null() {
            panic("vector allocation failed");
        }
        unsafe {
            std::ptr::copy_nonoverlapping(values.as_ptr(), data, values.len());
        }
        DynArray {
            data,
            len: values.len(),
            cap,
        }
    }

    fn grow(&mut self) {
        let new_cap = self.cap.saturating_mul(2).max(MIN_CAPACITY);
        let bytes = block_bytes(new_cap);
        let data = unsafe { reallocate(self.data as *mut c_void, bytes) } as *mut Opaque;
        if data.is_null() {
            panic("vector growth failed");
        }
        self.data = data;
        self.cap = new_cap;
    }

    pub fn push(&mut self, value: Opaque) {
        if self.len == self.cap {
            self.grow();
        }
        unsafe {
            self.data.add(self.len).write(value);
        }
        self.len += 1;
    }

    /// Stores an integer as a word-sized reference.
    pub fn push_word(&mut self, word: usize) {
        self.push(word as Opaque);
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

    pub fn as_ptr(&self) -> *const Opaque {
        self.data
    }

    pub fn as_slice(&self) -> &[Opaque] {
        if self.data.is_null() {
            return &[];
        }
        unsafe { std::slice::from_raw_parts(self.data, self.len) }
    }

    pub fn get(&self, index: usize) -> Option<Opaque> {
        self.as_slice().get(index).copied()
    }

    /// Indexing routed through the bounds guard; out of range is fatal.
    pub fn at<I: crate::bounds::IndexValue>(&self, index: I) -> Opaque {
        checked_index(index, self.len);
        self.as_slice()[index_to_usize(index)]
    }

    pub fn iter(&self) -> impl Iterator<Item = Opaque> + '_ {
        self.as_slice().iter().copied()
    }

    /// Releases the backing block and resets to the empty state.
    pub fn clear_and_release(&mut self) {
        let data = std::mem::replace(&mut self.data, std::ptr::null_mut());
        self.len = 0;
        self.cap = 0;
        unsafe {
            release(data as *mut c_void);
        }
    }
}

fn index_to_usize<I: crate::bounds::IndexValue>(index: I) -> usize {
    // Only reached after `checked_index` accepted the value.
    index.widen() as usize
}

impl Default for DynArray {
    fn default() -> Self {
        DynArray::new()
    }
}

impl Drop for DynArray {
    fn drop(&mut self) {
        if !self.data.is_null() {
            unsafe {
                release(self.data as *mut c_void);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn w(x: usize) -> Opaque {
        x as Opaque
    }

    #[test]
    fn new_is_empty_without_allocation() {
        let v = DynArray::new();
        assert_eq!(v.len(), 0);
        assert_eq!(v.capacity(), 0);
        assert!(v.as_ptr().is_null());
        assert!(v.as_slice().is_empty());
        assert_eq!(v.get(0), None);
    }

    #[test]
    fn pushes_keep_insertion_order() {
        let mut v = DynArray::new();
        for i in 0..100 {
            v.push_word(i);
        }
        assert_eq!(v.len(), 100);
        let got: Vec<usize> = v.iter().map(|p| p as usize).collect();
        assert_eq!(got, (0..100).collect::<Vec<_>>());
        assert_eq!(v.at(42i32) as usize, 42);
    }

    #[test]
    fn growth_follows_doubling_with_floor_of_eight() {
        let mut v = DynArray::new();
        let mut seen = Vec::new();
        for i in 0..33 {
            let before = v.capacity();
            v.push(w(i));
            if v.capacity() != before {
                assert_eq!(v.capacity(), (before * 2).max(8));
                seen.push(v.capacity());
            }
            for j in 0..=i {
                assert_eq!(v.get(j), Some(w(j)));
            }
        }
        assert_eq!(seen, vec![8, 16, 32, 64]);
    }

    #[test]
    fn build_presizes() {
        let small = DynArray::build(&[w(1), w(2), w(3)]);
        assert_eq!(small.len(), 3);
        assert_eq!(small.capacity(), 8);
        assert_eq!(small.get(2), Some(w(3)));

        let items: Vec<Opaque> = (0..20).map(w).collect();
        let mut big = DynArray::build(&items);
        assert_eq!(big.capacity(), 20);
        big.push(w(20));
        assert_eq!(big.capacity(), 40);
        assert_eq!(big.len(), 21);

        let empty = DynArray::build(&[]);
        assert_eq!(empty.len(), 0);
        assert_eq!(empty.capacity(), 8);
    }

    #[test]
    fn clear_and_release_resets() {
        let mut v = DynArray::build(&[w(9)]);
        v.clear_and_release();
        assert_eq!(v.capacity(), 0);
        v.push(w(1));
        assert_eq!(v.get(0), Some(w(1)));
    }

    #[test]
    fn release_then_reuse_frees_each_block_once() {
        let mut v = DynArray::build(&[w(9)]);
        v.clear_and_release();
        assert!(v.as_ptr().is_null());
        v.clear_and_release();

        // A stale pointer left behind would be handed out again here and
        // freed a second time when `v` drops.
        let a = allocate(64);
        let b = allocate(64);
        assert!(!a.is_null() && !b.is_null());
        unsafe {
            release(a);
            release(b);
        }

        for i in 0..9 {
            v.push(w(i));
        }
        assert_eq!(v.capacity(), 16);
        assert_eq!(v.get(8), Some(w(8)));
        drop(v);
    }
}
