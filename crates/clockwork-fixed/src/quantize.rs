//! Exact requantization of `mantissa * 2^right` onto a target grid
//!
//! All arithmetic is on integers; no floating-point rounding is involved
//! once a real number has been decomposed into its exact dyadic form.

use crate::error::{FixedError, Result};
use crate::format::{Overflow, Quantization, Rounding};

/// Requantize the exact value `mantissa * 2^right` to `target`, applying
/// rounding first and overflow handling second.
pub(crate) fn requantize(mantissa: i128, right: i32, target: &Quantization) -> i128 {
    let shift = i64::from(right) - i64::from(target.format.right);
    if shift >= 0 {
        match scale_up(mantissa, shift) {
            Some(scaled) => fit(scaled, target),
            None => match target.overflow {
                Overflow::Saturate if mantissa < 0 => target.format.min_mantissa(),
                Overflow::Saturate => target.format.max_mantissa(),
                // low 128 bits of the product are exact under wrapping shifts
                Overflow::Wrap if shift < 128 => {
                    wrap(mantissa.wrapping_shl(shift as u32), target.format.width())
                }
                Overflow::Wrap => 0,
            },
        }
    } else {
        let rounded = scale_down(mantissa, (-shift) as u64, target.rounding);
        fit(rounded, target)
    }
}

fn scale_up(mantissa: i128, shift: i64) -> Option<i128> {
    if mantissa == 0 {
        return Some(0);
    }
    if shift >= 127 {
        return None;
    }
    mantissa.checked_mul(1i128 << shift)
}

/// Divide by `2^shift` with the given rounding. Inputs are within 127-bit
/// formats, so `|mantissa| <= 2^126`.
fn scale_down(mantissa: i128, shift: u64, rounding: Rounding) -> i128 {
    if shift >= 128 {
        return match rounding {
            Rounding::Truncate if mantissa < 0 => -1,
            _ => 0,
        };
    }
    let shift = shift as u32;
    let floor = mantissa >> shift;
    match rounding {
        Rounding::Truncate => floor,
        Rounding::Round => {
            let remainder = mantissa.wrapping_sub(floor.wrapping_shl(shift));
            let half = 1i128 << (shift - 1);
            if remainder > half || (remainder == half && mantissa > 0) {
                floor + 1
            } else {
                floor
            }
        }
    }
}

fn fit(value: i128, target: &Quantization) -> i128 {
    match target.overflow {
        Overflow::Saturate => {
            value.clamp(target.format.min_mantissa(), target.format.max_mantissa())
        }
        Overflow::Wrap => wrap(value, target.format.width()),
    }
}

/// Sign-extend the low `width` bits
fn wrap(value: i128, width: u32) -> i128 {
    let unused = 128 - width;
    value.wrapping_shl(unused).wrapping_shr(unused)
}

/// Decompose a finite f64 into `(mantissa, exponent)` with
/// `value == mantissa * 2^exponent` exactly and an odd mantissa (or zero).
pub(crate) fn decompose(value: f64) -> Result<(i128, i32)> {
    if !value.is_finite() {
        return Err(FixedError::NonFinite(value));
    }
    let bits = value.to_bits();
    let negative = bits >> 63 == 1;
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    let (mut mantissa, mut exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    };
    if mantissa == 0 {
        return Ok((0, 0));
    }
    let zeros = mantissa.trailing_zeros();
    mantissa >>= zeros;
    exponent += zeros as i32;
    let mantissa = i128::from(mantissa);
    Ok((if negative { -mantissa } else { mantissa }, exponent))
}

/// Smallest `left` such that `mantissa` fits a format with `right == 0`
pub(crate) fn magnitude_bits(mantissa: i128) -> i32 {
    let magnitude = if mantissa < 0 { !mantissa } else { mantissa };
    (128 - magnitude.leading_zeros()) as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Quantization;

    fn q(left: i32, right: i32, overflow: Overflow, rounding: Rounding) -> Quantization {
        Quantization::new(left, right, overflow, rounding).unwrap()
    }

    #[test]
    fn test_decompose() {
        assert_eq!(decompose(0.0).unwrap(), (0, 0));
        assert_eq!(decompose(0.5).unwrap(), (1, -1));
        assert_eq!(decompose(-3.0).unwrap(), (-3, 0));
        assert_eq!(decompose(6.0).unwrap(), (3, 1));
        assert_eq!(decompose(0.1875).unwrap(), (3, -4));
        assert!(matches!(decompose(f64::NAN), Err(FixedError::NonFinite(_))));
        assert!(decompose(f64::INFINITY).is_err());
    }

    #[test]
    fn test_round_half_away_from_zero() {
        let target = q(8, 0, Overflow::Saturate, Rounding::Round);
        // 1.5 -> 2, -1.5 -> -2, 2.5 -> 3, -2.5 -> -3
        assert_eq!(requantize(3, -1, &target), 2);
        assert_eq!(requantize(-3, -1, &target), -2);
        assert_eq!(requantize(5, -1, &target), 3);
        assert_eq!(requantize(-5, -1, &target), -3);
        // 1.25 -> 1, -1.25 -> -1, -1.75 -> -2
        assert_eq!(requantize(5, -2, &target), 1);
        assert_eq!(requantize(-5, -2, &target), -1);
        assert_eq!(requantize(-7, -2, &target), -2);
    }

    #[test]
    fn test_truncate_is_floor() {
        let target = q(8, 0, Overflow::Saturate, Rounding::Truncate);
        assert_eq!(requantize(7, -2, &target), 1);
        assert_eq!(requantize(-5, -2, &target), -2);
        assert_eq!(requantize(-1, -100, &target), -1);
        assert_eq!(requantize(1, -200, &target), 0);
        assert_eq!(requantize(-1, -200, &target), -1);
    }

    #[test]
    fn test_overflow_styles() {
        let sat = q(0, -4, Overflow::Saturate, Rounding::Truncate);
        let wrap = q(0, -4, Overflow::Wrap, Rounding::Truncate);
        // 1.0, 1.5, 2.0
        assert_eq!(requantize(1, 0, &sat), 15);
        assert_eq!(requantize(1, 0, &wrap), -16);
        assert_eq!(requantize(3, -1, &wrap), -8);
        assert_eq!(requantize(2, 0, &wrap), 0);
        assert_eq!(requantize(-3, 0, &sat), -16);
    }

    #[test]
    fn test_huge_scale_up() {
        let sat = q(0, -4, Overflow::Saturate, Rounding::Round);
        let wrap = q(0, -4, Overflow::Wrap, Rounding::Round);
        assert_eq!(requantize(1, 300, &sat), 15);
        assert_eq!(requantize(-1, 300, &sat), -16);
        assert_eq!(requantize(3, 300, &wrap), 0);
        assert_eq!(requantize(0, 300, &wrap), 0);
    }

    #[test]
    fn test_magnitude_bits() {
        assert_eq!(magnitude_bits(0), 0);
        assert_eq!(magnitude_bits(-1), 0);
        assert_eq!(magnitude_bits(5), 3);
        assert_eq!(magnitude_bits(-8), 3);
        assert_eq!(magnitude_bits(8), 4);
    }
}
