//! Aliasing guard: length, capacity and overlap validation.
//!
//! Safe slices can never partially overlap, but the raw surface
//! ([`Kernel::apply_raw`](crate::Kernel::apply_raw)) can, so every call goes
//! through [`validate`] before a single element is written.

use core::mem::size_of;

use crate::error::{KernelError, Operand};

/// Read-only view of `len` contiguous `f32` values starting at `ptr`.
///
/// Constructing a `RawSlice` is safe; reading through it is not, which is why
/// only the `unsafe` kernel entry points accept one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSlice {
    ptr: *const f32,
    len: usize,
}

impl RawSlice {
    #[inline]
    pub const fn new(ptr: *const f32, len: usize) -> Self {
        Self { ptr, len }
    }

    #[inline]
    pub fn from_slice(s: &[f32]) -> Self {
        Self::new(s.as_ptr(), s.len())
    }

    #[inline]
    pub const fn as_ptr(self) -> *const f32 {
        self.ptr
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }
}

/// Writable view of `len` contiguous `f32` values starting at `ptr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawSliceMut {
    ptr: *mut f32,
    len: usize,
}

impl RawSliceMut {
    #[inline]
    pub const fn new(ptr: *mut f32, len: usize) -> Self {
        Self { ptr, len }
    }

    #[inline]
    pub fn from_slice(s: &mut [f32]) -> Self {
        Self::new(s.as_mut_ptr(), s.len())
    }

    #[inline]
    pub const fn as_mut_ptr(self) -> *mut f32 {
        self.ptr
    }

    #[inline]
    pub const fn len(self) -> usize {
        self.len
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn as_const(self) -> RawSlice {
        RawSlice::new(self.ptr as *const f32, self.len)
    }
}

/// Checks that `x`, `y` and `destination` form a legal kernel call.
///
/// Checks run in a fixed order (length, capacity, overlap with `x`, overlap
/// with `y`) so the same invalid call always reports the same error.
/// Nothing is dereferenced.
pub fn validate(x: RawSlice, y: RawSlice, destination: RawSliceMut) -> Result<(), KernelError> {
    if x.len() != y.len() {
        return Err(KernelError::LengthMismatch {
            x: x.len(),
            y: y.len(),
        });
    }

    if x.len() > destination.len() {
        return Err(KernelError::Capacity {
            required: x.len(),
            available: destination.len(),
        });
    }

    let d = destination.as_const();
    if overlaps_and_not_same(x, d) {
        return Err(KernelError::Overlap {
            operand: Operand::X,
        });
    }
    if overlaps_and_not_same(y, d) {
        return Err(KernelError::Overlap {
            operand: Operand::Y,
        });
    }

    Ok(())
}

/// True when the two ranges share at least one byte but start at different
/// addresses. Empty ranges never overlap.
#[inline]
pub fn overlaps_and_not_same(a: RawSlice, b: RawSlice) -> bool {
    let a_start = a.as_ptr() as usize;
    let b_start = b.as_ptr() as usize;

    if a_start == b_start || a.is_empty() || b.is_empty() {
        return false;
    }

    let a_end = a_start.saturating_add(a.len().saturating_mul(size_of::<f32>()));
    let b_end = b_start.saturating_add(b.len().saturating_mul(size_of::<f32>()));

    a_start < b_end && b_start < a_end
}
