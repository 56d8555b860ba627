//! Small-input dispatcher and scalar fallback.
//!
//! Inputs shorter than one register of the selected tier never enter a loop:
//! each tier hands them to the next narrower tier, which either covers them
//! with a begin/end pair of its own registers or cascades further down. The
//! 128-bit tier finishes with up to three scalar element operations.
//!
//! Scalar element access goes through `read_unaligned`/`write_unaligned` so
//! that raw callers may pass pointers that are not `f32`-aligned.
#![allow(unsafe_code)]

use core::ptr::{read_unaligned, write_unaligned};

use crate::op::BinaryOp;
use crate::register::Register;

/// One scalar element: `d[i] = op(x[i], y[i])`.
///
/// # Safety
///
/// `x`, `y` must be readable and `d` writable at index `i`.
#[inline(always)]
unsafe fn element<Op: BinaryOp>(x: *const f32, y: *const f32, d: *mut f32, i: usize) {
    unsafe {
        let a = read_unaligned(x.add(i));
        let b = read_unaligned(y.add(i));
        write_unaligned(d.add(i), Op::scalar(a, b));
    }
}

/// Descending fallthrough for `n < 4`: index 2, then 1, then 0.
///
/// # Safety
///
/// `x`, `y` readable and `d` writable for `n` elements.
#[inline(always)]
pub(crate) unsafe fn scalar_fallthrough<Op: BinaryOp>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
) {
    debug_assert!(n < 4);

    unsafe {
        if n >= 3 {
            element::<Op>(x, y, d, 2);
        }
        if n >= 2 {
            element::<Op>(x, y, d, 1);
        }
        if n >= 1 {
            element::<Op>(x, y, d, 0);
        }
    }
}

/// Covers `n` elements using registers of the narrower tier `N`.
///
/// For `n` in `[N::LANES, 2 * N::LANES)` a begin register and, when `n`
/// exceeds one register, an overlapping end register are both computed before
/// either is stored, so `d` may alias `x` or `y`. Anything shorter cascades to
/// `N`'s own small dispatcher.
///
/// # Safety
///
/// The CPU must support `N`; `x`, `y` readable and `d` writable for `n`
/// elements.
#[inline(always)]
pub(crate) unsafe fn cascade<N: Register, Op: BinaryOp>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
) {
    let lanes = N::LANES;
    debug_assert!(n < 2 * lanes);

    unsafe {
        if n < lanes {
            N::operate_small::<Op>(x, y, d, n);
            return;
        }

        let begin = Op::vector::<N>(N::load(x), N::load(y));
        if n == lanes {
            N::store(d, begin);
            return;
        }

        let last = n - lanes;
        let end = Op::vector::<N>(N::load(x.add(last)), N::load(y.add(last)));
        N::store(d, begin);
        N::store(d.add(last), end);
    }
}

/// Plain element loop used when no vector tier is available.
///
/// Each element is read before it is written, so `d` may alias `x` or `y`.
///
/// # Safety
///
/// `x`, `y` readable and `d` writable for `n` elements.
#[inline]
pub(crate) unsafe fn scalar_loop<Op: BinaryOp>(
    x: *const f32,
    y: *const f32,
    d: *mut f32,
    n: usize,
) {
    for i in 0..n {
        unsafe { element::<Op>(x, y, d, i) };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::op::{Add, Sub};

    fn operands(n: usize) -> (Vec<f32>, Vec<f32>) {
        let x = (0..n).map(|i| i as f32 * 0.5 + 1.0).collect();
        let y = (0..n).map(|i| 10.0 - i as f32).collect();
        (x, y)
    }

    #[test]
    fn test_scalar_fallthrough_sizes() {
        for n in 0..4 {
            let (x, y) = operands(n);
            let mut d = [f32::NAN; 4];
            unsafe { scalar_fallthrough::<Add>(x.as_ptr(), y.as_ptr(), d.as_mut_ptr(), n) };
            for i in 0..n {
                assert_eq!(d[i], x[i] + y[i], "size {} index {}", n, i);
            }
            for (i, v) in d.iter().enumerate().skip(n) {
                assert!(v.is_nan(), "size {} overwrote index {}", n, i);
            }
        }
    }

    #[test]
    fn test_scalar_loop_in_place() {
        let (mut x, y) = operands(37);
        let expect: Vec<f32> = x.iter().zip(&y).map(|(a, b)| a - b).collect();
        let p = x.as_mut_ptr();
        unsafe { scalar_loop::<Sub>(p, y.as_ptr(), p, x.len()) };
        assert_eq!(x, expect);
    }

    #[cfg(target_arch = "x86_64")]
    fn check_cascade<N: Register>() {
        for n in 0..2 * N::LANES {
            let (x, y) = operands(n);
            let mut d = vec![f32::NAN; 2 * N::LANES];
            unsafe { cascade::<N, Sub>(x.as_ptr(), y.as_ptr(), d.as_mut_ptr(), n) };
            for i in 0..n {
                assert_eq!(d[i], x[i] - y[i], "{:?} size {} index {}", N::WIDTH, n, i);
            }
            assert!(d[n..].iter().all(|v| v.is_nan()), "{:?} size {}", N::WIDTH, n);

            // Destination identical to x.
            let (mut xd, y) = operands(n);
            let expect: Vec<f32> = xd.iter().zip(&y).map(|(a, b)| a - b).collect();
            let p = xd.as_mut_ptr();
            unsafe { cascade::<N, Sub>(p, y.as_ptr(), p, n) };
            assert_eq!(xd, expect, "{:?} in-place size {}", N::WIDTH, n);
        }
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_cascade_128() {
        check_cascade::<crate::register::V128>();
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_cascade_256() {
        if !std::is_x86_feature_detected!("avx") {
            return;
        }
        check_cascade::<crate::register::V256>();
    }

    #[cfg(target_arch = "x86_64")]
    #[test]
    fn test_tier_small_paths() {
        use crate::register::{V128, V256, V512};

        fn check<R: Register>() {
            for n in 0..R::LANES {
                let (x, y) = operands(n);
                let mut d = vec![f32::NAN; R::LANES];
                unsafe { R::operate_small::<Add>(x.as_ptr(), y.as_ptr(), d.as_mut_ptr(), n) };
                for i in 0..n {
                    assert_eq!(d[i], x[i] + y[i], "{:?} size {} index {}", R::WIDTH, n, i);
                }
                assert!(d[n..].iter().all(|v| v.is_nan()), "{:?} size {}", R::WIDTH, n);
            }
        }

        check::<V128>();
        if std::is_x86_feature_detected!("avx") {
            check::<V256>();
        }
        if std::is_x86_feature_detected!("avx512f") {
            check::<V512>();
        }
    }
}
