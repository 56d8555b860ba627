//! Bulk loop engine: destination alignment, store-policy selection and the
//! four-register unrolled loop.
//!
//! Only the destination is aligned. Aligning the sources as well is possible
//! only when all three share the same misalignment, so loads stay unaligned.
#![allow(unsafe_code)]

use core::mem::size_of;

use log::trace;

use crate::op::BinaryOp;
use crate::register::Register;

/// Registers processed per loop iteration.
pub const UNROLL: usize = 4;

/// Position of the bulk loop within the call.
///
/// `offset + remainder` always equals the element count of the call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Cursor {
    pub offset: usize,
    pub remainder: usize,
}

impl Cursor {
    #[inline(always)]
    pub fn start(n: usize) -> Self {
        Self {
            offset: 0,
            remainder: n,
        }
    }

    #[inline(always)]
    fn advance(&mut self, elements: usize) {
        debug_assert!(elements <= self.remainder);
        self.offset += elements;
        self.remainder -= elements;
    }
}

/// How the bulk loop writes its results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorePolicy {
    /// Destination could not be aligned.
    Unaligned,
    /// Ordinary register-aligned stores.
    Aligned,
    /// Non-temporal aligned stores that bypass the cache, followed by a fence.
    Streaming,
}

/// Elements to skip so that `d` lands on a `bytes` boundary, or `None` when
/// `d` is not a multiple of the element size and can never be aligned.
#[inline(always)]
pub(crate) fn alignment_skip(d: *const f32, bytes: usize) -> Option<usize> {
    let addr = d as usize;
    if addr % size_of::<f32>() != 0 {
        return None;
    }
    let misalign = addr % bytes;
    Some(((bytes - misalign) % bytes) / size_of::<f32>())
}

/// Streaming stores pay off only for large, aligned transfers.
#[inline(always)]
pub(crate) fn select_store_policy(
    remaining_bytes: usize,
    aligned: bool,
    non_temporal_threshold: usize,
) -> StorePolicy {
    match (aligned, remaining_bytes > non_temporal_threshold) {
        (false, _) => StorePolicy::Unaligned,
        (true, true) => StorePolicy::Streaming,
        (true, false) => StorePolicy::Aligned,
    }
}

trait StoreKind {
    unsafe fn store<R: Register>(ptr: *mut f32, v: R::Vector);
}

struct UnalignedStore;
struct AlignedStore;
struct StreamingStore;

impl StoreKind for UnalignedStore {
    #[inline(always)]
    unsafe fn store<R: Register>(ptr: *mut f32, v: R::Vector) {
        unsafe { R::store(ptr, v) }
    }
}

impl StoreKind for AlignedStore {
    #[inline(always)]
    unsafe fn store<R: Register>(ptr: *mut f32, v: R::Vector) {
        unsafe { R::store_aligned(ptr, v) }
    }
}

impl StoreKind for StreamingStore {
    #[inline(always)]
    unsafe fn store<R: Register>(ptr: *mut f32, v: R::Vector) {
        unsafe { R::store_streaming(ptr, v) }
    }
}

/// Runs the bulk phase over `n` elements and returns where it stopped.
///
/// Does nothing unless `n` exceeds [`UNROLL`] registers; the boundary
/// reconciler then covers everything. On return `cursor.remainder` is below
/// `UNROLL * R::LANES`.
///
/// # Safety
///
/// The CPU must support `R`; `x`, `y` readable and `d` writable for `n`
/// elements. `d` may equal `x` or `y` but must not otherwise overlap them.
#[inline(always)]
pub(crate) unsafe fn run<R: Register, Op: BinaryOp>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
    non_temporal_threshold: usize,
) -> Cursor {
    let mut cursor = Cursor::start(n);
    if n <= UNROLL * R::LANES {
        return cursor;
    }

    // The skipped prefix is shorter than one register and is covered by the
    // preloaded begin window.
    let skip = alignment_skip(d, R::BYTES);
    if let Some(skip) = skip {
        cursor.advance(skip);
    }

    let policy = select_store_policy(
        cursor.remainder.saturating_mul(size_of::<f32>()),
        skip.is_some(),
        non_temporal_threshold,
    );
    trace!(
        "{:?} bulk loop: {} elements from offset {}, {:?} stores",
        R::WIDTH,
        cursor.remainder,
        cursor.offset,
        policy
    );

    unsafe {
        match policy {
            StorePolicy::Unaligned => unrolled::<R, Op, UnalignedStore>(x, y, d, n, &mut cursor),
            StorePolicy::Aligned => unrolled::<R, Op, AlignedStore>(x, y, d, n, &mut cursor),
            StorePolicy::Streaming => {
                unrolled::<R, Op, StreamingStore>(x, y, d, n, &mut cursor);
                R::fence_streaming();
            }
        }
    }

    cursor
}

#[inline(always)]
unsafe fn unrolled<R: Register, Op: BinaryOp, S: StoreKind>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
    cursor: &mut Cursor,
) {
    let lanes = R::LANES;
    let step = UNROLL * lanes;

    while cursor.remainder >= step {
        let at = cursor.offset;
        debug_assert!(at + step <= n);

        unsafe {
            let v0 = Op::vector::<R>(R::load(x.add(at)), R::load(y.add(at)));
            let v1 = Op::vector::<R>(R::load(x.add(at + lanes)), R::load(y.add(at + lanes)));
            let v2 = Op::vector::<R>(
                R::load(x.add(at + 2 * lanes)),
                R::load(y.add(at + 2 * lanes)),
            );
            let v3 = Op::vector::<R>(
                R::load(x.add(at + 3 * lanes)),
                R::load(y.add(at + 3 * lanes)),
            );

            S::store::<R>(d.add(at), v0);
            S::store::<R>(d.add(at + lanes), v1);
            S::store::<R>(d.add(at + 2 * lanes), v2);
            S::store::<R>(d.add(at + 3 * lanes), v3);
        }

        cursor.advance(step);
    }
}
