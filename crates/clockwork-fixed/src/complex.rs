//! Complex fixed-point value

use crate::error::Result;
use crate::format::{Overflow, Quantization, Rounding};
use crate::sfix::Sfix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Mul, Neg, Shl, Shr, Sub};

/// Pair of `Sfix` components. The parts share no format: each one grows and
/// resizes on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Complex {
    pub re: Sfix,
    pub im: Sfix,
}

impl Complex {
    pub fn new(re: Sfix, im: Sfix) -> Self {
        Self { re, im }
    }

    /// Quantize both parts into the same target
    pub fn quantize(re: f64, im: f64, target: Quantization) -> Result<Self> {
        Ok(Self {
            re: Sfix::quantize(re, target)?,
            im: Sfix::quantize(im, target)?,
        })
    }

    pub fn from_parts(
        re: f64,
        im: f64,
        left: i32,
        right: i32,
        overflow: Overflow,
        rounding: Rounding,
    ) -> Result<Self> {
        Self::quantize(re, im, Quantization::new(left, right, overflow, rounding)?)
    }

    pub fn exact(re: f64, im: f64, overflow: Overflow, rounding: Rounding) -> Result<Self> {
        Ok(Self {
            re: Sfix::exact(re, overflow, rounding)?,
            im: Sfix::exact(im, overflow, rounding)?,
        })
    }

    pub fn real(&self) -> Sfix {
        self.re
    }

    pub fn imag(&self) -> Sfix {
        self.im
    }

    /// Resize each part to its own target
    pub fn resize(&self, re: &Quantization, im: &Quantization) -> Result<Self> {
        Ok(Self {
            re: self.re.resize_to(re)?,
            im: self.im.resize_to(im)?,
        })
    }

    pub fn resize_uniform(&self, target: &Quantization) -> Result<Self> {
        self.resize(target, target)
    }

    pub fn to_f64(&self) -> (f64, f64) {
        (self.re.to_f64(), self.im.to_f64())
    }

    pub fn checked_add(&self, rhs: &Complex) -> Result<Complex> {
        Ok(Self {
            re: self.re.checked_add(&rhs.re)?,
            im: self.im.checked_add(&rhs.im)?,
        })
    }

    pub fn checked_sub(&self, rhs: &Complex) -> Result<Complex> {
        Ok(Self {
            re: self.re.checked_sub(&rhs.re)?,
            im: self.im.checked_sub(&rhs.im)?,
        })
    }

    /// Four real products and two add/subs, all in exact result formats:
    /// `re = ar*br - ai*bi`, `im = ar*bi + ai*br`.
    pub fn checked_mul(&self, rhs: &Complex) -> Result<Complex> {
        let rr = self.re.checked_mul(&rhs.re)?;
        let ii = self.im.checked_mul(&rhs.im)?;
        let ri = self.re.checked_mul(&rhs.im)?;
        let ir = self.im.checked_mul(&rhs.re)?;
        Ok(Self {
            re: rr.checked_sub(&ii)?,
            im: ri.checked_add(&ir)?,
        })
    }

    /// Scale both parts by a real value
    pub fn checked_scale(&self, rhs: &Sfix) -> Result<Complex> {
        Ok(Self {
            re: self.re.checked_mul(rhs)?,
            im: self.im.checked_mul(rhs)?,
        })
    }

    pub fn checked_neg(&self) -> Result<Complex> {
        Ok(Self {
            re: self.re.checked_neg()?,
            im: self.im.checked_neg()?,
        })
    }

    pub fn scalb(&self, shift: i32) -> Complex {
        Self {
            re: self.re.scalb(shift),
            im: self.im.scalb(shift),
        }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (re, im) = self.to_f64();
        if im < 0.0 {
            write!(f, "{}-{}j", re, -im)
        } else {
            write!(f, "{}+{}j", re, im)
        }
    }
}

fn exact_or_panic(result: Result<Complex>, op: &str) -> Complex {
    match result {
        Ok(value) => value,
        Err(e) => panic!("complex fixed-point {op} cannot be represented exactly: {e}"),
    }
}

impl Add for Complex {
    type Output = Complex;

    fn add(self, rhs: Complex) -> Complex {
        exact_or_panic(self.checked_add(&rhs), "addition")
    }
}

impl Sub for Complex {
    type Output = Complex;

    fn sub(self, rhs: Complex) -> Complex {
        exact_or_panic(self.checked_sub(&rhs), "subtraction")
    }
}

impl Mul for Complex {
    type Output = Complex;

    fn mul(self, rhs: Complex) -> Complex {
        exact_or_panic(self.checked_mul(&rhs), "multiplication")
    }
}

impl Mul<Sfix> for Complex {
    type Output = Complex;

    fn mul(self, rhs: Sfix) -> Complex {
        exact_or_panic(self.checked_scale(&rhs), "multiplication")
    }
}

impl Neg for Complex {
    type Output = Complex;

    fn neg(self) -> Complex {
        exact_or_panic(self.checked_neg(), "negation")
    }
}

impl Shl<i32> for Complex {
    type Output = Complex;

    fn shl(self, shift: i32) -> Complex {
        self.scalb(shift)
    }
}

impl Shr<i32> for Complex {
    type Output = Complex;

    fn shr(self, shift: i32) -> Complex {
        self.scalb(-shift)
    }
}
