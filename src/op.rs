//! Elementwise binary operations the kernel can run.

use crate::register::Register;

/// A binary operation that maps to a single instruction per element.
///
/// `vector` must compute, lane by lane, exactly what `scalar` computes, so
/// results do not depend on which tier the hardware selects.
pub trait BinaryOp {
    fn scalar(a: f32, b: f32) -> f32;

    /// # Safety
    ///
    /// The CPU must support `R`'s register width.
    unsafe fn vector<R: Register>(a: R::Vector, b: R::Vector) -> R::Vector;
}

/// `x + y`
#[derive(Debug, Clone, Copy, Default)]
pub struct Add;

/// `x - y`
#[derive(Debug, Clone, Copy, Default)]
pub struct Sub;

/// `x * y`
#[derive(Debug, Clone, Copy, Default)]
pub struct Mul;

/// `x / y`
#[derive(Debug, Clone, Copy, Default)]
pub struct Div;

impl BinaryOp for Add {
    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        a + b
    }

    #[inline(always)]
    unsafe fn vector<R: Register>(a: R::Vector, b: R::Vector) -> R::Vector {
        unsafe { R::add(a, b) }
    }
}

impl BinaryOp for Sub {
    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        a - b
    }

    #[inline(always)]
    unsafe fn vector<R: Register>(a: R::Vector, b: R::Vector) -> R::Vector {
        unsafe { R::sub(a, b) }
    }
}

impl BinaryOp for Mul {
    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        a * b
    }

    #[inline(always)]
    unsafe fn vector<R: Register>(a: R::Vector, b: R::Vector) -> R::Vector {
        unsafe { R::mul(a, b) }
    }
}

impl BinaryOp for Div {
    #[inline(always)]
    fn scalar(a: f32, b: f32) -> f32 {
        a / b
    }

    #[inline(always)]
    unsafe fn vector<R: Register>(a: R::Vector, b: R::Vector) -> R::Vector {
        unsafe { R::div(a, b) }
    }
}
