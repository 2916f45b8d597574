//! Output comparison
//!
//! Flattens simulation outputs into real samples and checks them against a
//! reference with a relative and an absolute tolerance, the way outputs of
//! different simulation stages are checked against each other.

use crate::error::{SimulationError, SimulationResult};
use crate::value::{EnumValue, Value};
use clockwork_fixed::{Complex, Sfix};
use serde::Serialize;

/// Types whose values flatten into real samples
pub trait Samples {
    fn extend_samples(&self, out: &mut Vec<f64>);

    fn samples(&self) -> Vec<f64> {
        let mut out = Vec::new();
        self.extend_samples(&mut out);
        out
    }
}

impl Samples for bool {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        out.push(if *self { 1.0 } else { 0.0 });
    }
}

impl Samples for i64 {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        out.push(*self as f64);
    }
}

impl Samples for f64 {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        out.push(*self);
    }
}

impl Samples for Sfix {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        out.push(self.to_f64());
    }
}

/// Variant index
impl Samples for EnumValue {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        out.push(f64::from(self.index));
    }
}

/// Real part, then imaginary part
impl Samples for Complex {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        out.push(self.re.to_f64());
        out.push(self.im.to_f64());
    }
}

impl Samples for Value {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        match self {
            Value::Bool(b) => b.extend_samples(out),
            Value::Int(n) => n.extend_samples(out),
            Value::Float(x) => x.extend_samples(out),
            Value::Enum(e) => e.extend_samples(out),
            Value::Fixed(x) => x.extend_samples(out),
            Value::Complex(c) => c.extend_samples(out),
        }
    }
}

impl<T: Samples> Samples for [T] {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        for item in self {
            item.extend_samples(out);
        }
    }
}

impl<T: Samples> Samples for Vec<T> {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        self.as_slice().extend_samples(out);
    }
}

impl<T: Samples + ?Sized> Samples for &T {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        (**self).extend_samples(out);
    }
}

impl<A: Samples, B: Samples> Samples for (A, B) {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        self.0.extend_samples(out);
        self.1.extend_samples(out);
    }
}

impl<A: Samples, B: Samples, C: Samples> Samples for (A, B, C) {
    fn extend_samples(&self, out: &mut Vec<f64>) {
        self.0.extend_samples(out);
        self.1.extend_samples(out);
        self.2.extend_samples(out);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleMismatch {
    pub index: usize,
    pub expected: f64,
    pub actual: f64,
}

impl SampleMismatch {
    pub fn error(&self) -> f64 {
        (self.actual - self.expected).abs()
    }
}

/// Outcome of comparing two sample sequences
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub rtol: f64,
    pub atol: f64,
    pub compared: usize,
    pub mismatches: Vec<SampleMismatch>,
}

impl Comparison {
    pub fn is_close(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("=== Comparison Report ===\n\n");
        report.push_str(&format!("Samples: {}\n", self.compared));
        report.push_str(&format!("Tolerance: rtol={} atol={}\n", self.rtol, self.atol));
        report.push_str(&format!("Mismatches: {}\n", self.mismatches.len()));

        if !self.mismatches.is_empty() {
            report.push_str("\nMismatched Samples:\n");
            report.push_str("-------------------\n");
            for mismatch in &self.mismatches {
                report.push_str(&format!(
                    "  Sample {}:\n    Expected: {}\n    Actual:   {}\n",
                    mismatch.index, mismatch.expected, mismatch.actual
                ));
            }
        }

        report
    }
}

fn within(actual: f64, expected: f64, rtol: f64, atol: f64) -> bool {
    actual == expected || (actual - expected).abs() <= atol + rtol * expected.abs()
}

/// Compare `actual` against `expected` sample by sample:
/// `|a - e| <= atol + rtol * |e|`. NaN never matches.
pub fn compare<A, E>(actual: &A, expected: &E, rtol: f64, atol: f64) -> SimulationResult<Comparison>
where
    A: Samples + ?Sized,
    E: Samples + ?Sized,
{
    let actual = actual.samples();
    let expected = expected.samples();
    if actual.len() != expected.len() {
        return Err(SimulationError::SampleCountMismatch {
            actual: actual.len(),
            expected: expected.len(),
        });
    }

    let mismatches = actual
        .iter()
        .zip(&expected)
        .enumerate()
        .filter(|(_, (a, e))| !within(**a, **e, rtol, atol))
        .map(|(index, (a, e))| SampleMismatch {
            index,
            expected: *e,
            actual: *a,
        })
        .collect();

    Ok(Comparison {
        rtol,
        atol,
        compared: actual.len(),
        mismatches,
    })
}

/// True when both sides have the same sample count and every sample is close
pub fn sims_close<A, E>(actual: &A, expected: &E, rtol: f64, atol: f64) -> bool
where
    A: Samples + ?Sized,
    E: Samples + ?Sized,
{
    compare(actual, expected, rtol, atol)
        .map(|c| c.is_close())
        .unwrap_or(false)
}
