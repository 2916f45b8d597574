//! Clockwork Fixed-Point Kernel
//!
//! Bit-exact signed fixed-point numbers with an explicit `[left, right]` bit
//! range. Arithmetic grows the result format the way a hardware adder or
//! multiplier does, so no precision is lost until a value is explicitly
//! resized (or auto-resized on a register write in `clockwork-sim`).
//!
//! - `Sfix`: real fixed-point value, mantissa stored exactly as `i128`
//! - `Complex`: pair of `Sfix` components with componentwise arithmetic
//! - `Format` / `Quantization` / `FormatSpec`: bit ranges and requantization targets

mod complex;
mod error;
mod format;
mod quantize;
mod sfix;

pub use complex::Complex;
pub use error::{FixedError, Result};
pub use format::{Format, FormatSpec, Overflow, Quantization, Rounding, MAX_WIDTH};
pub use sfix::Sfix;
