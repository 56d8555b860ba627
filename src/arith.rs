//! Elementwise arithmetic on `f32` slices.
//!
//! Safe wrappers around [`Kernel`] with host detection and the default
//! streaming threshold. Each `*_assign` form writes its result into the left
//! operand.

use crate::error::KernelError;
use crate::kernel::Kernel;
use crate::op::{Add, Div, Mul, Sub};

/// `destination[i] = x[i] + y[i]`
///
/// # Examples
/// ```
/// use fastarith::arith::add;
/// let mut d = [0.0f32; 1];
/// add(&[2.0], &[3.0], &mut d).unwrap();
/// assert_eq!(d, [5.0]);
/// ```
pub fn add(x: &[f32], y: &[f32], destination: &mut [f32]) -> Result<(), KernelError> {
    Kernel::new().apply::<Add>(x, y, destination)
}

/// `x[i] += y[i]`
///
/// # Examples
/// ```
/// use fastarith::arith::add_assign;
/// let mut x = [1.0f32, 2.0, 3.0];
/// add_assign(&mut x, &[0.5, 0.5, 0.5]).unwrap();
/// assert_eq!(x, [1.5, 2.5, 3.5]);
/// ```
pub fn add_assign(x: &mut [f32], y: &[f32]) -> Result<(), KernelError> {
    Kernel::new().apply_in_place::<Add>(x, y)
}

/// `destination[i] = x[i] - y[i]`
pub fn sub(x: &[f32], y: &[f32], destination: &mut [f32]) -> Result<(), KernelError> {
    Kernel::new().apply::<Sub>(x, y, destination)
}

/// `x[i] -= y[i]`
pub fn sub_assign(x: &mut [f32], y: &[f32]) -> Result<(), KernelError> {
    Kernel::new().apply_in_place::<Sub>(x, y)
}

/// `destination[i] = x[i] * y[i]`
pub fn mul(x: &[f32], y: &[f32], destination: &mut [f32]) -> Result<(), KernelError> {
    Kernel::new().apply::<Mul>(x, y, destination)
}

/// `x[i] *= y[i]`
pub fn mul_assign(x: &mut [f32], y: &[f32]) -> Result<(), KernelError> {
    Kernel::new().apply_in_place::<Mul>(x, y)
}

/// `destination[i] = x[i] / y[i]`
pub fn div(x: &[f32], y: &[f32], destination: &mut [f32]) -> Result<(), KernelError> {
    Kernel::new().apply::<Div>(x, y, destination)
}

/// `x[i] /= y[i]`
pub fn div_assign(x: &mut [f32], y: &[f32]) -> Result<(), KernelError> {
    Kernel::new().apply_in_place::<Div>(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_basic() {
        let x: Vec<f32> = (0..100).map(|i| i as f32).collect();
        let y = vec![0.5f32; 100];
        let mut d = vec![0.0f32; 100];
        add(&x, &y, &mut d).unwrap();
        for (i, &v) in d.iter().enumerate() {
            assert_eq!(v, i as f32 + 0.5, "index {}", i);
        }
    }

    #[test]
    fn test_assign_forms() {
        let y = [2.0f32; 50];

        let mut x = [8.0f32; 50];
        add_assign(&mut x, &y).unwrap();
        assert!(x.iter().all(|&v| v == 10.0));

        sub_assign(&mut x, &y).unwrap();
        assert!(x.iter().all(|&v| v == 8.0));

        mul_assign(&mut x, &y).unwrap();
        assert!(x.iter().all(|&v| v == 16.0));

        div_assign(&mut x, &y).unwrap();
        assert!(x.iter().all(|&v| v == 8.0));
    }

    #[test]
    fn test_binary_forms() {
        let x = [6.0f32; 21];
        let y = [3.0f32; 21];
        let mut d = [0.0f32; 21];

        sub(&x, &y, &mut d).unwrap();
        assert!(d.iter().all(|&v| v == 3.0));
        mul(&x, &y, &mut d).unwrap();
        assert!(d.iter().all(|&v| v == 18.0));
        div(&x, &y, &mut d).unwrap();
        assert!(d.iter().all(|&v| v == 2.0));
    }

    #[test]
    fn test_length_mismatch() {
        let mut d = [0.0f32; 4];
        assert_eq!(
            add(&[1.0; 4], &[1.0; 3], &mut d),
            Err(KernelError::LengthMismatch { x: 4, y: 3 })
        );
        assert_eq!(d, [0.0; 4]);
    }
}
