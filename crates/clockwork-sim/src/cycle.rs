//! Per-cycle evaluation context
//!
//! `Cycle` is handed to `Hardware::evaluate`. Reads always see the value as
//! of the previous commit; writes land in the pending slot and stay invisible
//! until the driver commits the whole tree.

use crate::design::{Design, ModuleId};
use crate::error::{SimulationError, SimulationResult};
use crate::module::{Hardware, Instance};
use crate::register::{Reg, RegArray, SlotId};
use crate::value::Signal;

pub struct Cycle<'d> {
    design: &'d mut Design,
    scope: ModuleId,
    auto_resize: bool,
    tentative: bool,
}

impl<'d> Cycle<'d> {
    pub(crate) fn new(
        design: &'d mut Design,
        scope: ModuleId,
        auto_resize: bool,
        tentative: bool,
    ) -> Self {
        Self {
            design,
            scope,
            auto_resize,
            tentative,
        }
    }

    /// Module currently being evaluated
    pub fn scope(&self) -> ModuleId {
        self.scope
    }

    pub fn path(&self) -> &str {
        self.design.module_path(self.scope).unwrap_or_default()
    }

    /// True during calibration runs
    pub fn is_tentative(&self) -> bool {
        self.tentative
    }

    pub fn get<T: Signal>(&self, reg: Reg<T>) -> SimulationResult<T> {
        self.read(reg.slot())
    }

    pub fn get_at<T: Signal>(&self, reg: RegArray<T>, index: usize) -> SimulationResult<T> {
        let slot = self.element(&reg, index)?;
        self.read(slot)
    }

    pub fn get_all<T: Signal>(&self, reg: RegArray<T>) -> SimulationResult<Vec<T>> {
        reg.slots().map(|slot| self.read(slot)).collect()
    }

    pub fn set<T: Signal>(&mut self, reg: Reg<T>, value: T) -> SimulationResult<()> {
        self.check_owner(reg.slot())?;
        self.write(reg.slot(), value)
    }

    pub fn set_at<T: Signal>(
        &mut self,
        reg: RegArray<T>,
        index: usize,
        value: T,
    ) -> SimulationResult<()> {
        let slot = self.element(&reg, index)?;
        self.check_owner(slot)?;
        self.write(slot, value)
    }

    /// Write every element; the value count must match the declared length.
    /// Nothing is written unless every element is accepted.
    pub fn set_all<T: Signal>(&mut self, reg: RegArray<T>, values: Vec<T>) -> SimulationResult<()> {
        if values.len() != reg.len() {
            return Err(SimulationError::LengthMismatch {
                register: self.array_name(&reg),
                expected: reg.len(),
                actual: values.len(),
            });
        }
        let mut prepared = Vec::with_capacity(values.len());
        for (slot, value) in reg.slots().zip(values) {
            self.check_owner(slot)?;
            let value = self
                .design
                .slot(slot)?
                .prepare(value.into_value(), self.auto_resize)?;
            prepared.push((slot, value));
        }
        for (slot, value) in prepared {
            self.design.slot_mut(slot)?.store(value, self.tentative);
        }
        Ok(())
    }

    /// Evaluate a direct child module. Its writes go to its own registers;
    /// only its returned output comes back to the caller.
    pub fn call<H: Hardware>(
        &mut self,
        child: &Instance<H>,
        input: H::Input,
    ) -> SimulationResult<H::Output> {
        if self.design.parent(child.id()) != Some(self.scope) {
            return Err(SimulationError::ForeignCall {
                module: self
                    .design
                    .module_path(child.id())
                    .unwrap_or_default()
                    .to_string(),
                scope: self.path().to_string(),
            });
        }
        let caller = std::mem::replace(&mut self.scope, child.id());
        let result = child.evaluate(self, input);
        self.scope = caller;
        result
    }

    fn read<T: Signal>(&self, id: SlotId) -> SimulationResult<T> {
        let slot = self.design.slot(id)?;
        if !self.design.is_within(slot.owner, self.scope) {
            return Err(SimulationError::ForeignRead {
                register: slot.path.clone(),
                scope: self.path().to_string(),
            });
        }
        T::from_value(slot.current).ok_or_else(|| SimulationError::KindMismatch {
            field: slot.path.clone(),
            expected: T::KIND,
            actual: slot.current.kind(),
        })
    }

    fn check_owner(&self, id: SlotId) -> SimulationResult<()> {
        let slot = self.design.slot(id)?;
        if slot.owner != self.scope {
            return Err(SimulationError::ForeignWrite {
                register: slot.path.clone(),
                scope: self.path().to_string(),
            });
        }
        Ok(())
    }

    fn write<T: Signal>(&mut self, id: SlotId, value: T) -> SimulationResult<()> {
        let (auto_resize, observe) = (self.auto_resize, self.tentative);
        self.design
            .slot_mut(id)?
            .write(value.into_value(), auto_resize, observe)
    }

    fn element<T: Signal>(&self, reg: &RegArray<T>, index: usize) -> SimulationResult<SlotId> {
        reg.slot(index).ok_or_else(|| SimulationError::IndexOutOfRange {
            register: self.array_name(reg),
            index,
            len: reg.len(),
        })
    }

    fn array_name<T: Signal>(&self, reg: &RegArray<T>) -> String {
        match reg.slot(0) {
            Some(first) => self.design.array_path(first),
            None => String::from("<empty>"),
        }
    }
}
