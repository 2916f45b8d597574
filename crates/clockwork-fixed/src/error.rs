//! Fixed-point error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FixedError {
    #[error("Invalid format: left {left} is below right {right}")]
    InvertedRange { left: i32, right: i32 },

    #[error("Invalid format: right {0} must not be positive")]
    PositiveRight(i32),

    #[error("Format [{left}, {right}] is {width} bits wide (limit {limit})")]
    TooWide {
        left: i32,
        right: i32,
        width: i64,
        limit: u32,
    },

    #[error("Mantissa {mantissa} does not fit {format}")]
    MantissaOutOfRange { mantissa: i128, format: String },

    #[error("Cannot quantize non-finite value {0}")]
    NonFinite(f64),

    #[error("Unresolved format: {0}")]
    Unresolved(String),
}

pub type Result<T> = std::result::Result<T, FixedError>;
