//! Width-adaptive elementwise kernel.
//!
//! Every call runs the same straight-line sequence:
//!
//! 1. aliasing guard ([`crate::guard::validate`]), before any write
//! 2. width selection ([`crate::width::select_width`])
//! 3. inputs shorter than one register go to the small-input dispatcher and
//!    the call ends there
//! 4. otherwise the begin/end windows are preloaded, the bulk loop runs, and
//!    the boundary reconciler stores the tail and both windows
//!
//! The per-width code is a single generic routine over [`Register`]; the only
//! per-width items are the `target_feature` entry points below.
#![allow(unsafe_code)]

use crate::boundary::Boundary;
use crate::bulk;
use crate::error::KernelError;
use crate::guard::{RawSlice, RawSliceMut, validate};
use crate::op::BinaryOp;
use crate::register::Register;
use crate::small::scalar_loop;
use crate::width::{CapabilityQuery, HostCapabilities, Width, select_width};

#[cfg(target_arch = "x86_64")]
use crate::register::{V128, V256, V512};

/// Output size, in bytes, above which the bulk loop switches to
/// non-temporal stores.
///
/// Roughly half of a per-core last-level cache, which hardware optimization
/// manuals recommend. Measuring the real cache topology is error prone, so
/// this is a fixed value matching what native `memcpy` implementations use:
/// about 1 MiB of L3 per core shared by two hyperthreads gives 512 KiB per
/// thread, half of which is 256 KiB. Override it per kernel with
/// [`Kernel::with_non_temporal_threshold`].
pub const NON_TEMPORAL_BYTE_THRESHOLD: usize = 256 * 1024;

/// Elementwise kernel configuration.
///
/// Holds no per-call state, so one value can be shared freely between
/// threads and reused for any number of calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel<Q = HostCapabilities> {
    capabilities: Q,
    non_temporal_threshold: usize,
}

impl Kernel<HostCapabilities> {
    /// Kernel using the host's widest vector tier and the default streaming
    /// threshold.
    #[inline]
    pub const fn new() -> Self {
        Self {
            capabilities: HostCapabilities,
            non_temporal_threshold: NON_TEMPORAL_BYTE_THRESHOLD,
        }
    }
}

impl Default for Kernel<HostCapabilities> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Q: CapabilityQuery> Kernel<Q> {
    /// Replaces the capability source.
    #[inline]
    pub fn with_capabilities<C: CapabilityQuery>(self, capabilities: C) -> Kernel<C> {
        Kernel {
            capabilities,
            non_temporal_threshold: self.non_temporal_threshold,
        }
    }

    /// Sets the output size, in bytes, above which streaming stores are used.
    #[inline]
    pub fn with_non_temporal_threshold(mut self, bytes: usize) -> Self {
        self.non_temporal_threshold = bytes;
        self
    }

    #[inline]
    pub fn capabilities(&self) -> &Q {
        &self.capabilities
    }

    #[inline]
    pub fn non_temporal_threshold(&self) -> usize {
        self.non_temporal_threshold
    }

    /// The tier a call made now would use.
    #[inline]
    pub fn width(&self) -> Width {
        select_width(&self.capabilities)
    }

    /// `destination[i] = Op(x[i], y[i])` for every `i < x.len()`.
    ///
    /// Elements of `destination` past `x.len()` are left untouched.
    ///
    /// # Errors
    ///
    /// [`KernelError::LengthMismatch`] if `x` and `y` differ in length,
    /// [`KernelError::Capacity`] if `destination` is shorter than them.
    ///
    /// # Examples
    /// ```
    /// use fastarith::{Kernel, op::Add};
    /// let mut d = [0.0f32; 3];
    /// Kernel::new().apply::<Add>(&[1.0, 2.0, 3.0], &[10.0, 20.0, 30.0], &mut d).unwrap();
    /// assert_eq!(d, [11.0, 22.0, 33.0]);
    /// ```
    pub fn apply<Op: BinaryOp>(
        &self,
        x: &[f32],
        y: &[f32],
        destination: &mut [f32],
    ) -> Result<(), KernelError> {
        // SAFETY: the ranges come from live slices, and a `&mut` cannot alias
        // the shared operands.
        unsafe {
            self.apply_raw::<Op>(
                RawSlice::from_slice(x),
                RawSlice::from_slice(y),
                RawSliceMut::from_slice(destination),
            )
        }
    }

    /// `x[i] = Op(x[i], y[i])`: the destination is the left operand.
    ///
    /// # Errors
    ///
    /// [`KernelError::LengthMismatch`] if `x` and `y` differ in length.
    pub fn apply_in_place<Op: BinaryOp>(&self, x: &mut [f32], y: &[f32]) -> Result<(), KernelError> {
        let d = RawSliceMut::from_slice(x);
        // SAFETY: `d` is a live exclusive slice used as both `x` and the
        // destination, which is the identical-region case the kernel supports.
        unsafe { self.apply_raw::<Op>(d.as_const(), RawSlice::from_slice(y), d) }
    }

    /// `y[i] = Op(x[i], y[i])`: the destination is the right operand.
    ///
    /// # Errors
    ///
    /// [`KernelError::LengthMismatch`] if `x` and `y` differ in length.
    pub fn apply_in_place_rhs<Op: BinaryOp>(
        &self,
        x: &[f32],
        y: &mut [f32],
    ) -> Result<(), KernelError> {
        let d = RawSliceMut::from_slice(y);
        // SAFETY: as in `apply_in_place`, with the roles of the operands swapped.
        unsafe { self.apply_raw::<Op>(RawSlice::from_slice(x), d.as_const(), d) }
    }

    /// `values[i] = Op(values[i], values[i])`: both operands and the
    /// destination are the same buffer. Cannot fail.
    pub fn apply_square<Op: BinaryOp>(&self, values: &mut [f32]) {
        let n = values.len();
        let p = values.as_mut_ptr();
        // SAFETY: all three ranges are the identical live slice.
        unsafe { self.execute::<Op>(p, p, p, n) }
    }

    /// Raw entry point; the only one on which partial overlap can be
    /// expressed, and therefore rejected.
    ///
    /// # Errors
    ///
    /// [`KernelError::LengthMismatch`], [`KernelError::Capacity`] or
    /// [`KernelError::Overlap`]; the destination is untouched in every case.
    ///
    /// # Safety
    ///
    /// - `x` and `y` must be valid for reads of their lengths, and
    ///   `destination` for writes of its length, for the duration of the call
    /// - no other thread may write to any of the ranges during the call
    ///
    /// Pointers need not be aligned.
    pub unsafe fn apply_raw<Op: BinaryOp>(
        &self,
        x: RawSlice,
        y: RawSlice,
        destination: RawSliceMut,
    ) -> Result<(), KernelError> {
        validate(x, y, destination)?;
        unsafe { self.execute::<Op>(x.as_ptr(), y.as_ptr(), destination.as_mut_ptr(), x.len()) };
        Ok(())
    }

    /// # Safety
    ///
    /// Validated ranges: `x`, `y` readable and `d` writable for `n` elements,
    /// `d` either disjoint from or identical to each operand.
    unsafe fn execute<Op: BinaryOp>(&self, x: *const f32, y: *const f32, d: *mut f32, n: usize) {
        let threshold = self.non_temporal_threshold;

        // SAFETY: `select_width` only returns widths the capability source
        // vouches for.
        unsafe {
            match select_width(&self.capabilities) {
                #[cfg(target_arch = "x86_64")]
                Width::W512 => operate_512::<Op>(x, y, d, n, threshold),
                #[cfg(target_arch = "x86_64")]
                Width::W256 => operate_256::<Op>(x, y, d, n, threshold),
                #[cfg(target_arch = "x86_64")]
                Width::W128 => operate_128::<Op>(x, y, d, n, threshold),
                _ => scalar_loop::<Op>(x, y, d, n),
            }
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx512f")]
unsafe fn operate_512<Op: BinaryOp>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
    threshold: usize,
) {
    unsafe { operate::<V512, Op>(x, y, d, n, threshold) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx")]
unsafe fn operate_256<Op: BinaryOp>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
    threshold: usize,
) {
    unsafe { operate::<V256, Op>(x, y, d, n, threshold) }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "sse2")]
unsafe fn operate_128<Op: BinaryOp>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
    threshold: usize,
) {
    unsafe { operate::<V128, Op>(x, y, d, n, threshold) }
}

/// One tier's full path: small dispatch, or preload, bulk loop and tail.
#[inline(always)]
unsafe fn operate<R: Register, Op: BinaryOp>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
    threshold: usize,
) {
    unsafe {
        if n < R::LANES {
            R::operate_small::<Op>(x, y, d, n);
            return;
        }

        let boundary = Boundary::<R>::preload::<Op>(x, y, n);
        let cursor = bulk::run::<R, Op>(x, y, d, n, threshold);
        boundary.reconcile::<Op>(x, y, d, n, cursor);
    }
}
