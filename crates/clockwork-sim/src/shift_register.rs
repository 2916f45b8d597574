//! Shift register built on a register array

use crate::cycle::Cycle;
use crate::error::SimulationResult;
use crate::module::Scope;
use crate::register::{FieldFormat, RegArray};
use crate::value::Signal;

/// Delay line: `push_next` shifts a new value in at the back, `peek` reads
/// the oldest committed value at the front.
#[derive(Debug)]
pub struct ShiftRegister<T> {
    taps: RegArray<T>,
}

impl<T> Clone for ShiftRegister<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ShiftRegister<T> {}

impl<T: Signal> ShiftRegister<T> {
    pub fn new(scope: &mut Scope<'_>, name: &str, initial: Vec<T>) -> SimulationResult<Self> {
        Ok(Self {
            taps: scope.register_array(name, initial)?,
        })
    }

    /// Shift register whose element format is fixed by calibration
    pub fn lazy(
        scope: &mut Scope<'_>,
        name: &str,
        initial: Vec<T>,
        format: FieldFormat,
    ) -> SimulationResult<Self> {
        Ok(Self {
            taps: scope.lazy_register_array(name, initial, format)?,
        })
    }

    pub fn len(&self) -> usize {
        self.taps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }

    pub fn taps(&self) -> RegArray<T> {
        self.taps
    }

    /// next = current[1..] ++ [value]
    pub fn push_next(&self, cx: &mut Cycle<'_>, value: T) -> SimulationResult<()> {
        let mut values = cx.get_all(self.taps)?;
        values.remove(0);
        values.push(value);
        cx.set_all(self.taps, values)
    }

    /// Oldest committed element
    pub fn peek(&self, cx: &Cycle<'_>) -> SimulationResult<T> {
        cx.get_at(self.taps, 0)
    }

    pub fn get_all(&self, cx: &Cycle<'_>) -> SimulationResult<Vec<T>> {
        cx.get_all(self.taps)
    }
}
