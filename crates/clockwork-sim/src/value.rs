//! Register values
//!
//! A register holds one of a closed set of kinds. `Value` is the type-erased
//! form stored in the register arena; `Signal` maps each Rust type that may
//! live in a register onto its `Value` variant so that register handles stay
//! statically typed.

use clockwork_fixed::{Complex, Format, Sfix};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tag of a `Value`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Bool,
    Int,
    Float,
    Enum,
    Fixed,
    Complex,
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueKind::Bool => write!(f, "bool"),
            ValueKind::Int => write!(f, "int"),
            ValueKind::Float => write!(f, "float"),
            ValueKind::Enum => write!(f, "enum"),
            ValueKind::Fixed => write!(f, "sfix"),
            ValueKind::Complex => write!(f, "complex"),
        }
    }
}

/// Variant of a user enum stored in a register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct EnumValue {
    pub ty: &'static str,
    pub index: u32,
}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.ty, self.index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Value {
    Bool(bool),
    Int(i64),
    /// Plain floating-point register; never quantized
    Float(f64),
    Enum(EnumValue),
    Fixed(Sfix),
    Complex(Complex),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Float(_) => ValueKind::Float,
            Value::Enum(_) => ValueKind::Enum,
            Value::Fixed(_) => ValueKind::Fixed,
            Value::Complex(_) => ValueKind::Complex,
        }
    }

    /// Kind plus bit ranges, as seen by format inference
    pub fn shape(&self) -> Shape {
        match self {
            Value::Bool(_) => Shape::Bool,
            Value::Int(_) => Shape::Int,
            Value::Float(_) => Shape::Float,
            Value::Enum(e) => Shape::Enum(e.ty),
            Value::Fixed(x) => Shape::Fixed(x.format()),
            Value::Complex(c) => Shape::Complex {
                re: c.re.format(),
                im: c.im.format(),
            },
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Enum(e) => write!(f, "{}", e),
            Value::Fixed(x) => write!(f, "{}", x),
            Value::Complex(c) => write!(f, "{}", c),
        }
    }
}

/// Observed shape of a value written into a register
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Shape {
    Bool,
    Int,
    Float,
    Enum(&'static str),
    Fixed(Format),
    Complex { re: Format, im: Format },
}

impl Shape {
    pub fn kind(&self) -> ValueKind {
        match self {
            Shape::Bool => ValueKind::Bool,
            Shape::Int => ValueKind::Int,
            Shape::Float => ValueKind::Float,
            Shape::Enum(_) => ValueKind::Enum,
            Shape::Fixed(_) => ValueKind::Fixed,
            Shape::Complex { .. } => ValueKind::Complex,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Shape::Bool => write!(f, "bool"),
            Shape::Int => write!(f, "int"),
            Shape::Float => write!(f, "float"),
            Shape::Enum(ty) => write!(f, "enum {}", ty),
            Shape::Fixed(format) => write!(f, "{}", format),
            Shape::Complex { re, im } => write!(f, "complex({}, {})", re, im),
        }
    }
}

/// Rust types that can be stored in a register
pub trait Signal: Sized + Clone {
    const KIND: ValueKind;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> Option<Self>;
}

impl Signal for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn into_value(self) -> Value {
        Value::Bool(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl Signal for i64 {
    const KIND: ValueKind = ValueKind::Int;

    fn into_value(self) -> Value {
        Value::Int(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(n) => Some(n),
            _ => None,
        }
    }
}

impl Signal for Sfix {
    const KIND: ValueKind = ValueKind::Fixed;

    fn into_value(self) -> Value {
        Value::Fixed(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Fixed(x) => Some(x),
            _ => None,
        }
    }
}

impl Signal for Complex {
    const KIND: ValueKind = ValueKind::Complex;

    fn into_value(self) -> Value {
        Value::Complex(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Complex(c) => Some(c),
            _ => None,
        }
    }
}

impl Signal for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(x) => Some(x),
            _ => None,
        }
    }
}

/// Fieldless user enum that can live in a register or constant field.
///
/// ```
/// use clockwork_sim::HardwareEnum;
///
/// #[derive(Debug, Clone, Copy, PartialEq)]
/// enum Mode {
///     Idle,
///     Busy,
/// }
///
/// impl HardwareEnum for Mode {
///     const TYPE_NAME: &'static str = "Mode";
///
///     fn index(self) -> u32 {
///         self as u32
///     }
///
///     fn from_index(index: u32) -> Option<Self> {
///         [Mode::Idle, Mode::Busy].get(index as usize).copied()
///     }
/// }
/// ```
pub trait HardwareEnum: Copy + 'static {
    const TYPE_NAME: &'static str;

    fn index(self) -> u32;

    fn from_index(index: u32) -> Option<Self>;
}

impl<E: HardwareEnum> Signal for E {
    const KIND: ValueKind = ValueKind::Enum;

    fn into_value(self) -> Value {
        Value::Enum(EnumValue {
            ty: E::TYPE_NAME,
            index: self.index(),
        })
    }

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Enum(e) if e.ty == E::TYPE_NAME => E::from_index(e.index),
            _ => None,
        }
    }
}
