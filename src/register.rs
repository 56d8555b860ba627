//! Vector register tiers for x86_64.
//!
//! Every tier exposes the same primitive set (unaligned load, three store
//! flavours and the four arithmetic operations), which is all the generic
//! kernel needs. Methods are `#[inline(always)]` without `target_feature` so
//! that they inline into the tier entry points in `kernel`, which do carry the
//! feature attribute.
#![allow(unsafe_code)]

#[cfg(target_arch = "x86_64")]
use core::arch::x86_64::*;

use crate::op::BinaryOp;
use crate::width::Width;

mod sealed {
    pub trait Sealed {}
}

/// One SIMD register tier holding `f32` lanes.
///
/// Sealed: the kernel relies on `WIDTH` matching the real register size.
///
/// # Safety
///
/// All methods issue instructions of the tier's extension. Callers must have
/// established (through a [`CapabilityQuery`](crate::width::CapabilityQuery))
/// that the CPU supports `WIDTH`. Pointers must be valid for `LANES` elements;
/// aligned and streaming stores additionally require `BYTES` alignment.
pub trait Register: sealed::Sealed + Copy {
    type Vector: Copy;

    const WIDTH: Width;
    const LANES: usize = Self::WIDTH.lanes();
    const BYTES: usize = Self::WIDTH.bytes();

    unsafe fn load(ptr: *const f32) -> Self::Vector;
    unsafe fn store(ptr: *mut f32, v: Self::Vector);
    unsafe fn store_aligned(ptr: *mut f32, v: Self::Vector);
    unsafe fn store_streaming(ptr: *mut f32, v: Self::Vector);

    /// Orders prior streaming stores before any later store.
    unsafe fn fence_streaming();

    unsafe fn add(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    unsafe fn sub(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    unsafe fn mul(a: Self::Vector, b: Self::Vector) -> Self::Vector;
    unsafe fn div(a: Self::Vector, b: Self::Vector) -> Self::Vector;

    /// Handles `n < LANES` elements without a loop, cascading into narrower
    /// tiers. See [`crate::small`].
    unsafe fn operate_small<Op: BinaryOp>(x: *const f32, y: *const f32, d: *mut f32, n: usize);
}

/// 128-bit SSE registers, 4 lanes.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone, Copy)]
pub struct V128;

/// 256-bit AVX registers, 8 lanes.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone, Copy)]
pub struct V256;

/// 512-bit AVX-512F registers, 16 lanes.
#[cfg(target_arch = "x86_64")]
#[derive(Debug, Clone, Copy)]
pub struct V512;

#[cfg(target_arch = "x86_64")]
impl sealed::Sealed for V128 {}
#[cfg(target_arch = "x86_64")]
impl sealed::Sealed for V256 {}
#[cfg(target_arch = "x86_64")]
impl sealed::Sealed for V512 {}

#[cfg(target_arch = "x86_64")]
impl Register for V128 {
    type Vector = __m128;

    const WIDTH: Width = Width::W128;

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> __m128 {
        unsafe { _mm_loadu_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn store(ptr: *mut f32, v: __m128) {
        unsafe { _mm_storeu_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn store_aligned(ptr: *mut f32, v: __m128) {
        unsafe { _mm_store_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn store_streaming(ptr: *mut f32, v: __m128) {
        unsafe { _mm_stream_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn fence_streaming() {
        unsafe { _mm_sfence() }
    }

    #[inline(always)]
    unsafe fn add(a: __m128, b: __m128) -> __m128 {
        unsafe { _mm_add_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn sub(a: __m128, b: __m128) -> __m128 {
        unsafe { _mm_sub_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn mul(a: __m128, b: __m128) -> __m128 {
        unsafe { _mm_mul_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn div(a: __m128, b: __m128) -> __m128 {
        unsafe { _mm_div_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn operate_small<Op: BinaryOp>(x: *const f32, y: *const f32, d: *mut f32, n: usize) {
        unsafe { crate::small::scalar_fallthrough::<Op>(x, y, d, n) }
    }
}

#[cfg(target_arch = "x86_64")]
impl Register for V256 {
    type Vector = __m256;

    const WIDTH: Width = Width::W256;

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> __m256 {
        unsafe { _mm256_loadu_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn store(ptr: *mut f32, v: __m256) {
        unsafe { _mm256_storeu_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn store_aligned(ptr: *mut f32, v: __m256) {
        unsafe { _mm256_store_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn store_streaming(ptr: *mut f32, v: __m256) {
        unsafe { _mm256_stream_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn fence_streaming() {
        unsafe { _mm_sfence() }
    }

    #[inline(always)]
    unsafe fn add(a: __m256, b: __m256) -> __m256 {
        unsafe { _mm256_add_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn sub(a: __m256, b: __m256) -> __m256 {
        unsafe { _mm256_sub_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn mul(a: __m256, b: __m256) -> __m256 {
        unsafe { _mm256_mul_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn div(a: __m256, b: __m256) -> __m256 {
        unsafe { _mm256_div_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn operate_small<Op: BinaryOp>(x: *const f32, y: *const f32, d: *mut f32, n: usize) {
        unsafe { crate::small::cascade::<V128, Op>(x, y, d, n) }
    }
}

#[cfg(target_arch = "x86_64")]
impl Register for V512 {
    type Vector = __m512;

    const WIDTH: Width = Width::W512;

    #[inline(always)]
    unsafe fn load(ptr: *const f32) -> __m512 {
        unsafe { _mm512_loadu_ps(ptr) }
    }

    #[inline(always)]
    unsafe fn store(ptr: *mut f32, v: __m512) {
        unsafe { _mm512_storeu_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn store_aligned(ptr: *mut f32, v: __m512) {
        unsafe { _mm512_store_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn store_streaming(ptr: *mut f32, v: __m512) {
        unsafe { _mm512_stream_ps(ptr, v) }
    }

    #[inline(always)]
    unsafe fn fence_streaming() {
        unsafe { _mm_sfence() }
    }

    #[inline(always)]
    unsafe fn add(a: __m512, b: __m512) -> __m512 {
        unsafe { _mm512_add_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn sub(a: __m512, b: __m512) -> __m512 {
        unsafe { _mm512_sub_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn mul(a: __m512, b: __m512) -> __m512 {
        unsafe { _mm512_mul_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn div(a: __m512, b: __m512) -> __m512 {
        unsafe { _mm512_div_ps(a, b) }
    }

    #[inline(always)]
    unsafe fn operate_small<Op: BinaryOp>(x: *const f32, y: *const f32, d: *mut f32, n: usize) {
        unsafe { crate::small::cascade::<V256, Op>(x, y, d, n) }
    }
}

#[cfg(all(test, target_arch = "x86_64"))]
mod tests {
    use super::*;
    use crate::op::{Add, Div, Mul, Sub};
    use std::is_x86_feature_detected;

    fn check_ops<R: Register>() {
        let x: Vec<f32> = (0..R::LANES).map(|i| i as f32 * 1.5 - 3.0).collect();
        let y: Vec<f32> = (0..R::LANES).map(|i| 0.25 + i as f32).collect();

        fn run<R: Register, Op: BinaryOp>(x: &[f32], y: &[f32]) -> Vec<f32> {
            let mut out = vec![0.0f32; R::LANES];
            unsafe {
                let v = Op::vector::<R>(R::load(x.as_ptr()), R::load(y.as_ptr()));
                R::store(out.as_mut_ptr(), v);
            }
            out
        }

        let expect = |f: fn(f32, f32) -> f32| -> Vec<f32> {
            x.iter().zip(&y).map(|(&a, &b)| f(a, b)).collect()
        };

        assert_eq!(run::<R, Add>(&x, &y), expect(Add::scalar), "add {:?}", R::WIDTH);
        assert_eq!(run::<R, Sub>(&x, &y), expect(Sub::scalar), "sub {:?}", R::WIDTH);
        assert_eq!(run::<R, Mul>(&x, &y), expect(Mul::scalar), "mul {:?}", R::WIDTH);
        assert_eq!(run::<R, Div>(&x, &y), expect(Div::scalar), "div {:?}", R::WIDTH);
    }

    #[test]
    fn test_v128_matches_scalar() {
        check_ops::<V128>();
    }

    #[test]
    fn test_v256_matches_scalar() {
        if !is_x86_feature_detected!("avx") {
            return;
        }
        check_ops::<V256>();
    }

    #[test]
    fn test_v512_matches_scalar() {
        if !is_x86_feature_detected!("avx512f") {
            return;
        }
        check_ops::<V512>();
    }

    #[test]
    fn test_lane_constants() {
        assert_eq!(V128::LANES, 4);
        assert_eq!(V256::LANES, 8);
        assert_eq!(V512::LANES, 16);
        assert_eq!(V512::BYTES, 64);
    }
}
