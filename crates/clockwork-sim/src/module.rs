//! Hardware modules and their construction
//!
//! A user module is a plain Rust struct holding register handles, constants
//! and child `Instance`s. It is built inside a `Scope`, which allocates the
//! register slots in the design arena and records the field list, and it
//! implements `Hardware` to describe one clock cycle of behavior.

use crate::cycle::Cycle;
use crate::design::{Design, Field, ModuleId};
use crate::error::{SimulationError, SimulationResult};
use crate::register::{Const, FieldFormat, Reg, RegArray, RegisterSlot, SlotId};
use crate::value::{Signal, Value, ValueKind};
use std::ops::Deref;

/// Per-cycle behavior of a module
pub trait Hardware {
    type Input;
    type Output;

    /// Read `current` register values, write `next` values and return the
    /// cycle's outputs. Must depend only on register state and `input`.
    fn evaluate(&self, cx: &mut Cycle<'_>, input: Self::Input) -> SimulationResult<Self::Output>;
}

/// A module placed in a design
#[derive(Debug)]
pub struct Instance<H> {
    id: ModuleId,
    inner: H,
}

impl<H> Instance<H> {
    pub(crate) fn new(id: ModuleId, inner: H) -> Self {
        Self { id, inner }
    }

    pub fn id(&self) -> ModuleId {
        self.id
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }
}

impl<H> Deref for Instance<H> {
    type Target = H;

    fn deref(&self) -> &H {
        &self.inner
    }
}

/// Builder for the fields of one module
pub struct Scope<'d> {
    design: &'d mut Design,
    module: ModuleId,
}

impl<'d> Scope<'d> {
    pub(crate) fn new(design: &'d mut Design, module: ModuleId) -> Self {
        Self { design, module }
    }

    pub fn module(&self) -> ModuleId {
        self.module
    }

    pub fn path(&self) -> &str {
        self.design.module_path(self.module).unwrap_or_default()
    }

    /// Register whose format is the initial value's own format
    pub fn register<T: Signal>(&mut self, name: &str, initial: T) -> SimulationResult<Reg<T>> {
        let first = self.declare(name, vec![initial.into_value()], None, false)?;
        self.design.add_field(self.module, name, Field::Register(first))?;
        Ok(Reg::new(first))
    }

    /// Register with a declared format. Open bounds are fixed by calibration;
    /// a fully declared format requantizes the initial value right away.
    pub fn lazy_register<T: Signal>(
        &mut self,
        name: &str,
        initial: T,
        format: FieldFormat,
    ) -> SimulationResult<Reg<T>> {
        let first = self.declare(name, vec![initial.into_value()], Some(format), false)?;
        self.design.add_field(self.module, name, Field::Register(first))?;
        Ok(Reg::new(first))
    }

    /// Homogeneous sequence of registers; every element must share a format
    pub fn register_array<T: Signal>(
        &mut self,
        name: &str,
        initial: Vec<T>,
    ) -> SimulationResult<RegArray<T>> {
        let len = initial.len();
        let values = initial.into_iter().map(Signal::into_value).collect();
        let first = self.declare(name, values, None, true)?;
        self.design
            .add_field(self.module, name, Field::RegisterArray { first, len })?;
        Ok(RegArray::new(first, len))
    }

    pub fn lazy_register_array<T: Signal>(
        &mut self,
        name: &str,
        initial: Vec<T>,
        format: FieldFormat,
    ) -> SimulationResult<RegArray<T>> {
        let len = initial.len();
        let values = initial.into_iter().map(Signal::into_value).collect();
        let first = self.declare(name, values, Some(format), true)?;
        self.design
            .add_field(self.module, name, Field::RegisterArray { first, len })?;
        Ok(RegArray::new(first, len))
    }

    /// Constant field; never committed or reset
    pub fn constant<T: Signal>(&mut self, name: &str, value: T) -> SimulationResult<Const<T>> {
        self.design
            .add_field(self.module, name, Field::Constant(value.clone().into_value()))?;
        Ok(Const::new(value))
    }

    /// Build a child module owned by this one
    pub fn submodule<H, F>(&mut self, name: &str, build: F) -> SimulationResult<Instance<H>>
    where
        F: FnOnce(&mut Scope<'_>) -> SimulationResult<H>,
    {
        self.design.check_field_free(self.module, name)?;
        let path = format!("{}.{}", self.path(), name);
        let child = self.design.add_module(name, path, Some(self.module));
        let inner = build(&mut Scope::new(self.design, child))?;
        self.design
            .add_field(self.module, name, Field::Submodule(child))?;
        Ok(Instance::new(child, inner))
    }

    /// Build `count` child modules addressed as `name[i]`
    pub fn submodule_array<H, F>(
        &mut self,
        name: &str,
        count: usize,
        mut build: F,
    ) -> SimulationResult<Vec<Instance<H>>>
    where
        F: FnMut(usize, &mut Scope<'_>) -> SimulationResult<H>,
    {
        self.design.check_field_free(self.module, name)?;
        if count == 0 {
            return Err(SimulationError::EmptyArray {
                field: format!("{}.{}", self.path(), name),
            });
        }
        let mut instances = Vec::with_capacity(count);
        for index in 0..count {
            let element = format!("{}[{}]", name, index);
            let path = format!("{}.{}", self.path(), element);
            let child = self.design.add_module(&element, path, Some(self.module));
            let inner = build(index, &mut Scope::new(self.design, child))?;
            instances.push(Instance::new(child, inner));
        }
        let ids = instances.iter().map(Instance::id).collect();
        self.design
            .add_field(self.module, name, Field::SubmoduleArray(ids))?;
        Ok(instances)
    }

    /// Allocate contiguous slots for `values`; returns the first slot
    fn declare(
        &mut self,
        name: &str,
        values: Vec<Value>,
        declared: Option<FieldFormat>,
        array: bool,
    ) -> SimulationResult<SlotId> {
        self.design.check_field_free(self.module, name)?;
        let field = format!("{}.{}", self.path(), name);
        let Some(first) = values.first() else {
            return Err(SimulationError::EmptyArray { field });
        };

        let format = match declared {
            Some(format) => {
                check_declared(&format, first.kind(), &field)?;
                format
            }
            None => FieldFormat::of(first),
        };
        if values.iter().any(|v| v.kind() != first.kind()) {
            return Err(SimulationError::NonHomogeneous { field });
        }
        if declared.is_none() && values.iter().any(|v| FieldFormat::of(v) != format) {
            return Err(SimulationError::NonHomogeneous { field });
        }

        let mut first_slot = None;
        for (index, value) in values.into_iter().enumerate() {
            let path = if array {
                format!("{}[{}]", field, index)
            } else {
                field.clone()
            };
            let value = format.conform(value, true, &path)?;
            let slot = self
                .design
                .add_slot(RegisterSlot::new(path, self.module, value, format));
            first_slot.get_or_insert(slot);
        }
        first_slot.ok_or(SimulationError::EmptyArray { field })
    }
}

fn check_declared(format: &FieldFormat, kind: ValueKind, field: &str) -> SimulationResult<()> {
    if format.accepts(kind) {
        return Ok(());
    }
    let expected = match (format, kind) {
        (_, ValueKind::Bool | ValueKind::Int | ValueKind::Float | ValueKind::Enum) => {
            return Err(SimulationError::LazyPlainRegister {
                field: field.to_string(),
                kind,
            });
        }
        // plain declarations cannot hold a fixed-point value
        (FieldFormat::Plain, _) => {
            return Err(SimulationError::PlainFormatMismatch {
                field: field.to_string(),
                kind,
            });
        }
        (FieldFormat::Complex { .. }, _) => ValueKind::Complex,
        (FieldFormat::Fixed(_), _) => ValueKind::Fixed,
    };
    Err(SimulationError::KindMismatch {
        field: field.to_string(),
        expected,
        actual: kind,
    })
}
