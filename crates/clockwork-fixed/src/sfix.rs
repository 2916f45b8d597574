//! Signed fixed-point value

use crate::error::{FixedError, Result};
use crate::format::{Format, Overflow, Quantization, Rounding, MAX_WIDTH};
use crate::quantize::{decompose, magnitude_bits, requantize};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Mul, Neg, Shl, Shr, Sub};

/// Signed fixed-point number `mantissa * 2^right` within `[left, right]`.
///
/// Values are immutable. Arithmetic produces a new value in the exact
/// hardware result format (see `checked_add`, `checked_mul`); precision is
/// only dropped by `resize`.
///
/// Equality and ordering compare the represented number, not the format:
/// `0.5` in `sfix[0, -1]` equals `0.5` in `sfix[4, -20]`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(try_from = "RawSfix")]
pub struct Sfix {
    mantissa: i128,
    format: Format,
    overflow: Overflow,
    rounding: Rounding,
}

/// Unchecked wire form of `Sfix`
#[derive(Deserialize)]
struct RawSfix {
    mantissa: i128,
    format: Format,
    overflow: Overflow,
    rounding: Rounding,
}

impl TryFrom<RawSfix> for Sfix {
    type Error = FixedError;

    fn try_from(raw: RawSfix) -> Result<Self> {
        if !raw.format.contains_mantissa(raw.mantissa) {
            return Err(FixedError::MantissaOutOfRange {
                mantissa: raw.mantissa,
                format: raw.format.to_string(),
            });
        }
        Ok(Self {
            mantissa: raw.mantissa,
            format: raw.format,
            overflow: raw.overflow,
            rounding: raw.rounding,
        })
    }
}

impl Sfix {
    /// Quantize `value` into `[left, right]` with the given styles
    pub fn new(
        value: f64,
        left: i32,
        right: i32,
        overflow: Overflow,
        rounding: Rounding,
    ) -> Result<Self> {
        Self::quantize(value, Quantization::new(left, right, overflow, rounding)?)
    }

    pub fn quantize(value: f64, target: Quantization) -> Result<Self> {
        let format = Format::new(target.format.left, target.format.right)?;
        let (mantissa, exponent) = decompose(value)?;
        Ok(Self {
            mantissa: requantize(mantissa, exponent, &target),
            format,
            overflow: target.overflow,
            rounding: target.rounding,
        })
    }

    /// Lossless conversion of a real number into the tightest format that
    /// holds it. Every finite `f64` is a dyadic rational, so this only fails
    /// for non-finite input or values needing more than `MAX_WIDTH` bits.
    pub fn exact(value: f64, overflow: Overflow, rounding: Rounding) -> Result<Self> {
        let (mantissa, exponent) = decompose(value)?;
        let right = exponent.min(0);
        let lift = exponent.max(0);
        let needed = i64::from(magnitude_bits(mantissa)) + i64::from(lift) + 1;
        if needed > i64::from(MAX_WIDTH) {
            return Err(FixedError::TooWide {
                left: exponent.saturating_add(magnitude_bits(mantissa)),
                right,
                width: needed,
                limit: MAX_WIDTH,
            });
        }
        let mantissa = mantissa << lift;
        let format = Format::new(right + magnitude_bits(mantissa), right)?;
        Ok(Self {
            mantissa,
            format,
            overflow,
            rounding,
        })
    }

    /// Integer in format `[bits(n), 0]`
    pub fn from_integer(value: i64, overflow: Overflow, rounding: Rounding) -> Self {
        let mantissa = i128::from(value);
        Self {
            mantissa,
            format: Format {
                left: magnitude_bits(mantissa),
                right: 0,
            },
            overflow,
            rounding,
        }
    }

    /// Explicit requantization; the only place precision is meant to be lost
    pub fn resize(
        &self,
        left: i32,
        right: i32,
        overflow: Overflow,
        rounding: Rounding,
    ) -> Result<Self> {
        self.resize_to(&Quantization::new(left, right, overflow, rounding)?)
    }

    pub fn resize_to(&self, target: &Quantization) -> Result<Self> {
        let format = Format::new(target.format.left, target.format.right)?;
        Ok(Self {
            mantissa: requantize(self.mantissa, self.format.right, target),
            format,
            overflow: target.overflow,
            rounding: target.rounding,
        })
    }

    pub fn left(&self) -> i32 {
        self.format.left
    }

    pub fn right(&self) -> i32 {
        self.format.right
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn width(&self) -> u32 {
        self.format.width()
    }

    pub fn overflow(&self) -> Overflow {
        self.overflow
    }

    pub fn rounding(&self) -> Rounding {
        self.rounding
    }

    pub fn quantization(&self) -> Quantization {
        Quantization {
            format: self.format,
            overflow: self.overflow,
            rounding: self.rounding,
        }
    }

    /// Integer multiple of `2^right` that this value represents
    pub fn mantissa(&self) -> i128 {
        self.mantissa
    }

    pub fn to_f64(&self) -> f64 {
        self.mantissa as f64 * 2f64.powi(self.format.right)
    }

    pub fn is_zero(&self) -> bool {
        self.mantissa == 0
    }

    /// `self + rhs` in `[max(l1, l2) + 1, min(r1, r2)]`
    pub fn checked_add(&self, rhs: &Sfix) -> Result<Sfix> {
        let (format, a, b) = self.align(rhs)?;
        Ok(self.derive(a + b, format))
    }

    /// `self - rhs` in `[max(l1, l2) + 1, min(r1, r2)]`
    pub fn checked_sub(&self, rhs: &Sfix) -> Result<Sfix> {
        let (format, a, b) = self.align(rhs)?;
        Ok(self.derive(a - b, format))
    }

    /// `self * rhs` in `[l1 + l2 + 1, r1 + r2]`
    pub fn checked_mul(&self, rhs: &Sfix) -> Result<Sfix> {
        let format = Format::arithmetic(
            self.format.left + rhs.format.left + 1,
            self.format.right + rhs.format.right,
        )?;
        Ok(self.derive(self.mantissa * rhs.mantissa, format))
    }

    /// `-self` in `[left + 1, right]`
    pub fn checked_neg(&self) -> Result<Sfix> {
        let format = Format::arithmetic(self.format.left + 1, self.format.right)?;
        Ok(self.derive(-self.mantissa, format))
    }

    /// Scale by `2^shift`; the bit pattern is kept and the range moves
    pub fn scalb(&self, shift: i32) -> Sfix {
        let format = Format {
            left: self.format.left + shift,
            right: self.format.right + shift,
        };
        self.derive(self.mantissa, format)
    }

    /// Add a real constant taken at infinite precision
    pub fn checked_add_real(&self, constant: f64) -> Result<Sfix> {
        self.checked_add(&self.constant(constant)?)
    }

    pub fn checked_sub_real(&self, constant: f64) -> Result<Sfix> {
        self.checked_sub(&self.constant(constant)?)
    }

    pub fn checked_mul_real(&self, constant: f64) -> Result<Sfix> {
        self.checked_mul(&self.constant(constant)?)
    }

    fn constant(&self, value: f64) -> Result<Sfix> {
        Sfix::exact(value, self.overflow, self.rounding)
    }

    fn integer(&self, value: i64) -> Sfix {
        Sfix::from_integer(value, self.overflow, self.rounding)
    }

    fn align(&self, rhs: &Sfix) -> Result<(Format, i128, i128)> {
        let right = self.format.right.min(rhs.format.right);
        let format = Format::arithmetic(self.format.left.max(rhs.format.left) + 1, right)?;
        let a = self.mantissa << (self.format.right - right) as u32;
        let b = rhs.mantissa << (rhs.format.right - right) as u32;
        Ok((format, a, b))
    }

    fn derive(&self, mantissa: i128, format: Format) -> Sfix {
        Sfix {
            mantissa,
            format,
            overflow: self.overflow,
            rounding: self.rounding,
        }
    }
}

/// Compare `mantissa * 2^shift` against `other`
fn compare_scaled(mantissa: i128, shift: i64, other: i128) -> Ordering {
    if mantissa == 0 {
        return 0.cmp(&other);
    }
    if shift < 127 {
        if let Some(scaled) = mantissa.checked_mul(1i128 << shift) {
            return scaled.cmp(&other);
        }
    }
    // magnitude exceeds anything an i128 can hold
    if mantissa > 0 {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

impl Ord for Sfix {
    fn cmp(&self, other: &Self) -> Ordering {
        let (ar, br) = (i64::from(self.format.right), i64::from(other.format.right));
        if ar >= br {
            compare_scaled(self.mantissa, ar - br, other.mantissa)
        } else {
            compare_scaled(other.mantissa, br - ar, self.mantissa).reverse()
        }
    }
}

impl PartialOrd for Sfix {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Sfix {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Sfix {}

impl fmt::Display for Sfix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_f64(), self.format)
    }
}

fn exact_or_panic(result: Result<Sfix>, op: &str) -> Sfix {
    match result {
        Ok(value) => value,
        Err(e) => panic!("fixed-point {op} cannot be represented exactly: {e}"),
    }
}

// Operators panic when the exact result is wider than MAX_WIDTH, like the
// integer operators on overflow. Use the checked_* methods to handle it.

impl Add for Sfix {
    type Output = Sfix;

    fn add(self, rhs: Sfix) -> Sfix {
        exact_or_panic(self.checked_add(&rhs), "addition")
    }
}

impl Sub for Sfix {
    type Output = Sfix;

    fn sub(self, rhs: Sfix) -> Sfix {
        exact_or_panic(self.checked_sub(&rhs), "subtraction")
    }
}

impl Mul for Sfix {
    type Output = Sfix;

    fn mul(self, rhs: Sfix) -> Sfix {
        exact_or_panic(self.checked_mul(&rhs), "multiplication")
    }
}

impl Neg for Sfix {
    type Output = Sfix;

    fn neg(self) -> Sfix {
        exact_or_panic(self.checked_neg(), "negation")
    }
}

impl Add<f64> for Sfix {
    type Output = Sfix;

    fn add(self, rhs: f64) -> Sfix {
        exact_or_panic(self.checked_add_real(rhs), "addition")
    }
}

impl Sub<f64> for Sfix {
    type Output = Sfix;

    fn sub(self, rhs: f64) -> Sfix {
        exact_or_panic(self.checked_sub_real(rhs), "subtraction")
    }
}

impl Mul<f64> for Sfix {
    type Output = Sfix;

    fn mul(self, rhs: f64) -> Sfix {
        exact_or_panic(self.checked_mul_real(rhs), "multiplication")
    }
}

impl Add<i64> for Sfix {
    type Output = Sfix;

    fn add(self, rhs: i64) -> Sfix {
        exact_or_panic(self.checked_add(&self.integer(rhs)), "addition")
    }
}

impl Sub<i64> for Sfix {
    type Output = Sfix;

    fn sub(self, rhs: i64) -> Sfix {
        exact_or_panic(self.checked_sub(&self.integer(rhs)), "subtraction")
    }
}

impl Mul<i64> for Sfix {
    type Output = Sfix;

    fn mul(self, rhs: i64) -> Sfix {
        exact_or_panic(self.checked_mul(&self.integer(rhs)), "multiplication")
    }
}

impl Shl<i32> for Sfix {
    type Output = Sfix;

    fn shl(self, shift: i32) -> Sfix {
        self.scalb(shift)
    }
}

impl Shr<i32> for Sfix {
    type Output = Sfix;

    fn shr(self, shift: i32) -> Sfix {
        self.scalb(-shift)
    }
}
