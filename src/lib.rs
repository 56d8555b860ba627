//! fastarith: width-adaptive SIMD elementwise arithmetic on `f32` buffers.
//!
//! The kernel picks the widest vector tier the CPU supports (AVX-512F, AVX,
//! SSE2, or scalar) on every call, aligns the destination, and switches to
//! non-temporal stores for large outputs. The destination may be one of the
//! operands.
#![cfg_attr(not(target_arch = "x86_64"), allow(dead_code))]

pub mod arith;
mod boundary;
mod bulk;
pub mod error;
pub mod guard;
pub mod kernel;
pub mod op;
pub mod register;
mod small;
pub mod width;

pub use arith::{add, add_assign, div, div_assign, mul, mul_assign, sub, sub_assign};
pub use error::{KernelError, Operand};
pub use guard::{RawSlice, RawSliceMut};
pub use kernel::{Kernel, NON_TEMPORAL_BYTE_THRESHOLD};
pub use width::{CapabilityQuery, CappedCapabilities, HostCapabilities, Width, WidthSet};
