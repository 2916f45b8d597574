//! Simulation error types

use crate::value::ValueKind;
use clockwork_fixed::FixedError;
use thiserror::Error;

/// Errors that can occur while building or simulating a design
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimulationError {
    #[error("Fixed-point error: {0}")]
    Fixed(#[from] FixedError),

    #[error("Duplicate field '{field}' in module '{module}'")]
    DuplicateField { module: String, field: String },

    #[error("Module '{scope}' cannot write register '{register}' it does not own")]
    ForeignWrite { register: String, scope: String },

    #[error("Module '{scope}' cannot read register '{register}' outside its subtree")]
    ForeignRead { register: String, scope: String },

    #[error("Module '{scope}' cannot call '{module}', which is not a direct child")]
    ForeignCall { module: String, scope: String },

    #[error("Register '{register}' holds {expected} elements, got {actual}")]
    LengthMismatch {
        register: String,
        expected: usize,
        actual: usize,
    },

    #[error("Index {index} out of range for register '{register}' of length {len}")]
    IndexOutOfRange {
        register: String,
        index: usize,
        len: usize,
    },

    #[error("Field '{field}' expects a {expected} value, got {actual}")]
    KindMismatch {
        field: String,
        expected: ValueKind,
        actual: ValueKind,
    },

    #[error("Register '{register}' is declared {expected}, written value is {actual}")]
    FormatMismatch {
        register: String,
        expected: String,
        actual: String,
    },

    #[error("Register array '{field}' must have at least one element")]
    EmptyArray { field: String },

    #[error("Register array '{field}' mixes element formats")]
    NonHomogeneous { field: String },

    #[error("Register '{field}' holds a {kind} value and cannot take an open format")]
    LazyPlainRegister { field: String, kind: ValueKind },

    #[error("Register '{field}' holds a {kind} value and cannot be declared plain")]
    PlainFormatMismatch { field: String, kind: ValueKind },

    #[error("Design '{design}' has tentative formats; calibrate before evaluating")]
    NotReady { design: String },

    #[error("Calibration needs {required} runs, only {runs} recorded")]
    InsufficientCalibration { runs: usize, required: usize },

    #[error("Unstable formats after calibration: {}", .0.join(", "))]
    UnstableFormats(Vec<String>),

    #[error("Register '{register}' was never written during calibration")]
    UnresolvedFormat { register: String },

    #[error("Unknown register: {0}")]
    UnknownRegister(String),

    #[error("Run of {requested} cycles exceeds the limit of {limit}")]
    CycleLimit { requested: u64, limit: u64 },

    #[error("Sample count mismatch: actual has {actual}, expected has {expected}")]
    SampleCountMismatch { actual: usize, expected: usize },
}

/// Result type for simulation operations
pub type SimulationResult<T> = Result<T, SimulationError>;
