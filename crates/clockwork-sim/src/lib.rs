//! Clockwork Simulation Engine
//!
//! Gives ordinary Rust structs hardware-register semantics. Every register
//! field is a shadow pair: evaluation reads the committed `current` value and
//! writes a pending `next` value, and the simulator commits the whole module
//! tree at once after each cycle.
//!
//! - `Design`: arena of modules and register slots
//! - `Scope`: builds one module's fields (registers, constants, submodules)
//! - `Hardware` / `Cycle`: per-cycle behavior and its evaluation context
//! - `Simulator`: evaluate/commit driver with format calibration
//! - `compare` / `sims_close`: tolerance-based output comparison

pub mod calibration;
pub mod compare;
pub mod cycle;
pub mod description;
pub mod design;
pub mod error;
pub mod module;
pub mod register;
pub mod shift_register;
pub mod simulator;
pub mod value;

pub use calibration::{Readiness, MIN_CALIBRATION_RUNS};
pub use compare::{compare, sims_close, Comparison, SampleMismatch, Samples};
pub use cycle::Cycle;
pub use description::{DesignDescription, FieldDescription, ModuleDescription};
pub use design::{Design, Field, ModuleId};
pub use error::{SimulationError, SimulationResult};
pub use module::{Hardware, Instance, Scope};
pub use register::{Const, FieldFormat, Reg, RegArray, SlotId};
pub use shift_register::ShiftRegister;
pub use simulator::{RegisterSnapshot, SimulationConfig, Simulator};
pub use value::{EnumValue, HardwareEnum, Shape, Signal, Value, ValueKind};

pub use clockwork_fixed::{Complex, Format, FormatSpec, Overflow, Quantization, Rounding, Sfix};
