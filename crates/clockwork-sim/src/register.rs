//! Register shadow pairs and typed register handles
//!
//! Every register field owns one `RegisterSlot` in the design arena. A slot
//! carries the visible `current` value, the pending `next` value written
//! during evaluation, and the `initial` value restored on reset.

use crate::design::ModuleId;
use crate::error::{SimulationError, SimulationResult};
use crate::value::{Shape, Signal, Value, ValueKind};
use clockwork_fixed::{Complex, FormatSpec, Sfix};
use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;

/// Declared format of a register field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum FieldFormat {
    /// Kinds other than fixed-point carry no bit range
    Plain,
    Fixed(FormatSpec),
    /// Real and imaginary parts resize independently
    Complex { re: FormatSpec, im: FormatSpec },
}

impl FieldFormat {
    /// Format declared by an initial value
    pub fn of(value: &Value) -> Self {
        match value {
            Value::Bool(_) | Value::Int(_) | Value::Float(_) | Value::Enum(_) => {
                FieldFormat::Plain
            }
            Value::Fixed(x) => FieldFormat::Fixed(x.quantization().into()),
            Value::Complex(c) => FieldFormat::Complex {
                re: c.re.quantization().into(),
                im: c.im.quantization().into(),
            },
        }
    }

    pub fn is_resolved(&self) -> bool {
        match self {
            FieldFormat::Plain => true,
            FieldFormat::Fixed(spec) => spec.is_resolved(),
            FieldFormat::Complex { re, im } => re.is_resolved() && im.is_resolved(),
        }
    }

    pub fn accepts(&self, kind: ValueKind) -> bool {
        matches!(
            (self, kind),
            (
                FieldFormat::Plain,
                ValueKind::Bool | ValueKind::Int | ValueKind::Float | ValueKind::Enum
            )
                | (FieldFormat::Fixed(_), ValueKind::Fixed)
                | (FieldFormat::Complex { .. }, ValueKind::Complex)
        )
    }

    /// Bring a written value into this format. Values written while a bound
    /// is still open are kept as they are.
    pub(crate) fn conform(
        &self,
        value: Value,
        auto_resize: bool,
        register: &str,
    ) -> SimulationResult<Value> {
        if !self.is_resolved() {
            return Ok(value);
        }
        match (self, value) {
            (FieldFormat::Fixed(spec), Value::Fixed(x)) => {
                Ok(Value::Fixed(conform_part(spec, x, auto_resize, register)?))
            }
            (FieldFormat::Complex { re, im }, Value::Complex(c)) => Ok(Value::Complex(Complex::new(
                conform_part(re, c.re, auto_resize, register)?,
                conform_part(im, c.im, auto_resize, register)?,
            ))),
            _ => Ok(value),
        }
    }

    /// Fill open bounds from an observed shape
    pub(crate) fn complete(&self, shape: &Shape, register: &str) -> SimulationResult<FieldFormat> {
        match (self, shape) {
            (FieldFormat::Plain, _) => Ok(FieldFormat::Plain),
            (FieldFormat::Fixed(spec), Shape::Fixed(observed)) => {
                Ok(FieldFormat::Fixed(spec.complete(*observed)?.into()))
            }
            (FieldFormat::Complex { re, im }, Shape::Complex { re: ore, im: oim }) => {
                Ok(FieldFormat::Complex {
                    re: re.complete(*ore)?.into(),
                    im: im.complete(*oim)?.into(),
                })
            }
            (format, shape) => Err(SimulationError::KindMismatch {
                field: register.to_string(),
                expected: format.kind(),
                actual: shape.kind(),
            }),
        }
    }

    fn kind(&self) -> ValueKind {
        match self {
            // plain formats never reach a kind mismatch
            FieldFormat::Plain => ValueKind::Int,
            FieldFormat::Fixed(_) => ValueKind::Fixed,
            FieldFormat::Complex { .. } => ValueKind::Complex,
        }
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldFormat::Plain => write!(f, "plain"),
            FieldFormat::Fixed(spec) => write!(f, "{}", spec),
            FieldFormat::Complex { re, im } => write!(f, "complex({}; {})", re, im),
        }
    }
}

fn conform_part(
    spec: &FormatSpec,
    x: Sfix,
    auto_resize: bool,
    register: &str,
) -> SimulationResult<Sfix> {
    let target = spec.resolve()?;
    if x.format() != target.format && !auto_resize {
        return Err(SimulationError::FormatMismatch {
            register: register.to_string(),
            expected: target.to_string(),
            actual: x.format().to_string(),
        });
    }
    // same-format resizes only relabel the styles
    Ok(x.resize_to(&target)?)
}

/// Index of a register slot in the design arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub(crate) usize);

impl SlotId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Current/next shadow pair of one register field
#[derive(Debug, Clone)]
pub(crate) struct RegisterSlot {
    pub(crate) path: String,
    pub(crate) owner: ModuleId,
    pub(crate) kind: ValueKind,
    pub(crate) format: FieldFormat,
    pub(crate) current: Value,
    pub(crate) next: Value,
    pub(crate) initial: Value,
    /// Shapes written while the format is open
    pub(crate) observed: IndexSet<Shape>,
}

impl RegisterSlot {
    /// Init: `current = next = initial = value`
    pub(crate) fn new(path: String, owner: ModuleId, value: Value, format: FieldFormat) -> Self {
        Self {
            path,
            owner,
            kind: value.kind(),
            format,
            current: value,
            next: value,
            initial: value,
            observed: IndexSet::new(),
        }
    }

    pub(crate) fn is_lazy(&self) -> bool {
        !self.format.is_resolved()
    }

    /// Write the pending value; last write within a cycle wins
    pub(crate) fn write(
        &mut self,
        value: Value,
        auto_resize: bool,
        observe: bool,
    ) -> SimulationResult<()> {
        let value = self.prepare(value, auto_resize)?;
        self.store(value, observe);
        Ok(())
    }

    /// Check a value against this register and bring it into its format,
    /// without touching the pending slot
    pub(crate) fn prepare(&self, value: Value, auto_resize: bool) -> SimulationResult<Value> {
        if value.kind() != self.kind {
            return Err(SimulationError::KindMismatch {
                field: self.path.clone(),
                expected: self.kind,
                actual: value.kind(),
            });
        }
        self.format.conform(value, auto_resize, &self.path)
    }

    /// Store a prepared value. Open formats keep values as written, so the
    /// recorded shape is the shape of the written value.
    pub(crate) fn store(&mut self, value: Value, observe: bool) {
        if observe && self.is_lazy() {
            self.observed.insert(value.shape());
        }
        self.next = value;
    }

    pub(crate) fn commit(&mut self) {
        self.current = self.next;
    }

    pub(crate) fn reset(&mut self) {
        self.current = self.initial;
        self.next = self.initial;
    }
}

/// Typed handle to a scalar register
pub struct Reg<T> {
    slot: SlotId,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Signal> Reg<T> {
    pub(crate) fn new(slot: SlotId) -> Self {
        Self {
            slot,
            _marker: PhantomData,
        }
    }

    pub fn slot(&self) -> SlotId {
        self.slot
    }
}

impl<T> Clone for Reg<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Reg<T> {}

impl<T> fmt::Debug for Reg<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reg").field(&self.slot.0).finish()
    }
}

/// Typed handle to a homogeneous sequence of registers (contiguous slots)
pub struct RegArray<T> {
    first: SlotId,
    len: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Signal> RegArray<T> {
    pub(crate) fn new(first: SlotId, len: usize) -> Self {
        Self {
            first,
            len,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn slot(&self, index: usize) -> Option<SlotId> {
        (index < self.len).then(|| SlotId(self.first.0 + index))
    }

    pub fn slots(&self) -> impl Iterator<Item = SlotId> {
        let first = self.first.0;
        (first..first + self.len).map(SlotId)
    }

    /// Scalar handle to one element
    pub fn element(&self, index: usize) -> Option<Reg<T>> {
        self.slot(index).map(Reg::new)
    }
}

impl<T> Clone for RegArray<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for RegArray<T> {}

impl<T> fmt::Debug for RegArray<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegArray")
            .field("first", &self.first.0)
            .field("len", &self.len)
            .finish()
    }
}

/// Constant field: fixed at construction, never committed or reset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Const<T> {
    value: T,
}

impl<T: Signal> Const<T> {
    pub(crate) fn new(value: T) -> Self {
        Self { value }
    }

    pub fn get(&self) -> T {
        self.value.clone()
    }
}
