//! Errors reported by the elementwise kernel.

use core::fmt;

use thiserror::Error;

/// Which input operand an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operand {
    /// The left-hand operand `x`.
    X,
    /// The right-hand operand `y`.
    Y,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::X => f.write_str("x"),
            Operand::Y => f.write_str("y"),
        }
    }
}

/// Caller misuse detected before any element is written.
///
/// Every variant is raised by the aliasing guard, so a returned error always
/// means the destination is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum KernelError {
    /// The two operands have different lengths.
    #[error("operand lengths differ: x has {x} elements, y has {y}")]
    LengthMismatch { x: usize, y: usize },

    /// The destination is shorter than the operands.
    #[error("destination holds {available} elements but {required} are required")]
    Capacity { required: usize, available: usize },

    /// The destination shares storage with an operand without starting at
    /// the same address.
    #[error("destination partially overlaps operand {operand}")]
    Overlap { operand: Operand },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_condition() {
        let e = KernelError::LengthMismatch { x: 3, y: 4 };
        assert_eq!(e.to_string(), "operand lengths differ: x has 3 elements, y has 4");

        let e = KernelError::Capacity {
            required: 9,
            available: 8,
        };
        assert_eq!(
            e.to_string(),
            "destination holds 8 elements but 9 are required"
        );

        let e = KernelError::Overlap {
            operand: Operand::Y,
        };
        assert_eq!(e.to_string(), "destination partially overlaps operand y");
    }
}
