//! Bit ranges, overflow/rounding styles and requantization targets

use crate::error::{FixedError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Widest supported format in bits. Mantissas are stored exactly in an `i128`.
pub const MAX_WIDTH: u32 = 127;

/// What happens when a quantized value falls outside its format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Overflow {
    /// Clamp to the nearest representable bound
    Saturate,
    /// Two's-complement wraparound
    Wrap,
}

/// How values are brought onto the `2^right` grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rounding {
    /// Round half away from zero
    Round,
    /// Round toward negative infinity
    Truncate,
}

impl fmt::Display for Overflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Overflow::Saturate => write!(f, "saturate"),
            Overflow::Wrap => write!(f, "wrap"),
        }
    }
}

impl fmt::Display for Rounding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rounding::Round => write!(f, "round"),
            Rounding::Truncate => write!(f, "truncate"),
        }
    }
}

/// Signed bit range `[left, right]`.
///
/// `left` is the index of the most significant integer bit (the sign bit
/// sits just above it) and `right` the index of the least significant
/// fraction bit, so the representable range is `[-2^left, 2^left - 2^right]`
/// in steps of `2^right`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawFormat")]
pub struct Format {
    pub(crate) left: i32,
    pub(crate) right: i32,
}

/// Unchecked wire form of `Format`
#[derive(Deserialize)]
struct RawFormat {
    left: i32,
    right: i32,
}

impl TryFrom<RawFormat> for Format {
    type Error = FixedError;

    fn try_from(raw: RawFormat) -> Result<Self> {
        Self::arithmetic(raw.left, raw.right)
    }
}

impl Format {
    /// Declared format: `left >= right`, `right <= 0`, at most `MAX_WIDTH` bits.
    pub fn new(left: i32, right: i32) -> Result<Self> {
        if right > 0 {
            return Err(FixedError::PositiveRight(right));
        }
        Self::arithmetic(left, right)
    }

    /// Format produced by arithmetic. A left shift may push `right` above zero.
    pub(crate) fn arithmetic(left: i32, right: i32) -> Result<Self> {
        if left < right {
            return Err(FixedError::InvertedRange { left, right });
        }
        let width = i64::from(left) - i64::from(right) + 1;
        if width > i64::from(MAX_WIDTH) {
            return Err(FixedError::TooWide {
                left,
                right,
                width,
                limit: MAX_WIDTH,
            });
        }
        Ok(Self { left, right })
    }

    pub fn left(&self) -> i32 {
        self.left
    }

    pub fn right(&self) -> i32 {
        self.right
    }

    /// True when `mantissa * 2^right` lies inside the range
    pub fn contains_mantissa(&self, mantissa: i128) -> bool {
        (self.min_mantissa()..=self.max_mantissa()).contains(&mantissa)
    }

    /// Number of bits including the sign bit
    pub fn width(&self) -> u32 {
        (self.left - self.right + 1) as u32
    }

    pub fn min_mantissa(&self) -> i128 {
        -(1i128 << (self.width() - 1))
    }

    pub fn max_mantissa(&self) -> i128 {
        (1i128 << (self.width() - 1)) - 1
    }

    /// Grid step `2^right`
    pub fn step(&self) -> f64 {
        2f64.powi(self.right)
    }

    pub fn min_value(&self) -> f64 {
        -(2f64.powi(self.left))
    }

    pub fn max_value(&self) -> f64 {
        2f64.powi(self.left) - self.step()
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sfix[{}, {}]", self.left, self.right)
    }
}

/// Complete requantization target used by construct and resize
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Quantization {
    pub format: Format,
    pub overflow: Overflow,
    pub rounding: Rounding,
}

impl Quantization {
    pub fn new(left: i32, right: i32, overflow: Overflow, rounding: Rounding) -> Result<Self> {
        Ok(Self {
            format: Format::new(left, right)?,
            overflow,
            rounding,
        })
    }
}

impl fmt::Display for Quantization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.format, self.overflow, self.rounding)
    }
}

/// Declared format of a register field.
///
/// `left` and `right` may be left open; an open bound is taken from the
/// first value written during calibration and fixed by finalization.
/// Overflow and rounding styles are always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FormatSpec {
    pub left: Option<i32>,
    pub right: Option<i32>,
    pub overflow: Overflow,
    pub rounding: Rounding,
}

impl FormatSpec {
    pub fn new(left: i32, right: i32, overflow: Overflow, rounding: Rounding) -> Self {
        Self {
            left: Some(left),
            right: Some(right),
            overflow,
            rounding,
        }
    }

    /// Both bounds open
    pub fn lazy(overflow: Overflow, rounding: Rounding) -> Self {
        Self {
            left: None,
            right: None,
            overflow,
            rounding,
        }
    }

    pub fn with_left(mut self, left: i32) -> Self {
        self.left = Some(left);
        self
    }

    pub fn with_right(mut self, right: i32) -> Self {
        self.right = Some(right);
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    /// Fully declared target; fails while a bound is still open
    pub fn resolve(&self) -> Result<Quantization> {
        match (self.left, self.right) {
            (Some(left), Some(right)) => {
                Quantization::new(left, right, self.overflow, self.rounding)
            }
            _ => Err(FixedError::Unresolved(self.to_string())),
        }
    }

    /// Target obtained by filling open bounds from an observed format.
    /// An observed `right` above zero (left-shifted value) is pulled down to 0.
    pub fn complete(&self, observed: Format) -> Result<Quantization> {
        let right = self.right.unwrap_or(observed.right.min(0));
        let left = self.left.unwrap_or(observed.left.max(right));
        Quantization::new(left, right, self.overflow, self.rounding)
    }
}

impl From<Quantization> for FormatSpec {
    fn from(q: Quantization) -> Self {
        Self::new(q.format.left, q.format.right, q.overflow, q.rounding)
    }
}

impl fmt::Display for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound = |b: Option<i32>| b.map_or_else(|| "?".to_string(), |v| v.to_string());
        write!(
            f,
            "sfix[{}, {}] {}/{}",
            bound(self.left),
            bound(self.right),
            self.overflow,
            self.rounding
        )
    }
}
