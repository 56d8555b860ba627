//! Boundary reconciler: begin/end windows and the tail table.
//!
//! The first and last register of the result are computed before the bulk
//! loop touches the destination, so an in-place call still sees the original
//! inputs at both edges. After the bulk loop the tail is finished with up to
//! three full registers, then the end window, then the begin window. The begin
//! window goes last because it may overlap the alignment prefix the bulk loop
//! skipped and the registers stored just before it.
#![allow(unsafe_code)]

use crate::bulk::{Cursor, UNROLL};
use crate::op::BinaryOp;
use crate::register::Register;

/// Remainder rounded up to whole registers, and the resulting register count.
#[inline(always)]
pub(crate) fn tail_blocks(remainder: usize, lanes: usize) -> (usize, usize) {
    debug_assert!(lanes.is_power_of_two());
    let rounded = (remainder + lanes - 1) & !(lanes - 1);
    (rounded, rounded / lanes)
}

/// Preloaded results for the first and last register of the call.
pub(crate) struct Boundary<R: Register> {
    begin: R::Vector,
    end: R::Vector,
}

impl<R: Register> Boundary<R> {
    /// # Safety
    ///
    /// The CPU must support `R`; `x` and `y` readable for `n >= R::LANES`
    /// elements.
    #[inline(always)]
    pub unsafe fn preload<Op: BinaryOp>(x: *const f32, y: *const f32, n: usize) -> Self {
        debug_assert!(n >= R::LANES);
        let last = n - R::LANES;
        unsafe {
            Self {
                begin: Op::vector::<R>(R::load(x), R::load(y)),
                end: Op::vector::<R>(R::load(x.add(last)), R::load(y.add(last))),
            }
        }
    }

    /// Stores everything from `cursor` to the end, then the two windows.
    ///
    /// # Safety
    ///
    /// Same as [`Boundary::preload`], plus `d` writable for `n` elements and
    /// `cursor` as returned by [`crate::bulk::run`] for the same call.
    #[inline(always)]
    pub unsafe fn reconcile<Op: BinaryOp>(
        self,
        x: *const f32,
        y: *const f32,
        d: *mut f32,
        n: usize,
        cursor: Cursor,
    ) {
        let lanes = R::LANES;
        let (rounded, blocks) = tail_blocks(cursor.remainder, lanes);
        debug_assert!(blocks <= UNROLL);
        debug_assert_eq!(cursor.offset + cursor.remainder, n);

        // Full register `k` counted back from the rounded-up end.
        let block = |k: usize| {
            let at = cursor.offset + rounded - k * lanes;
            debug_assert!(at + lanes <= n);
            unsafe {
                let v = Op::vector::<R>(R::load(x.add(at)), R::load(y.add(at)));
                R::store(d.add(at), v);
            }
        };

        if blocks >= 4 {
            block(4);
        }
        if blocks >= 3 {
            block(3);
        }
        if blocks >= 2 {
            block(2);
        }
        unsafe {
            if blocks >= 1 {
                R::store(d.add(n - lanes), self.end);
            }
            R::store(d, self.begin);
        }
    }
}
