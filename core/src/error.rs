use thiserror::Error;

/// Reasons a configuration may be rejected before the systems are built.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    /// A bounds pair is not finite or its minimum exceeds its maximum.
    #[error("{field} bounds are invalid: min {min} > max {max}")]
    InvertedBounds {
        /// Name of the offending setting.
        field: &'static str,
        /// Configured minimum.
        min: f32,
        /// Configured maximum.
        max: f32,
    },
    /// A numeric setting lies outside its permitted range.
    #[error("{field} must be {expectation}, got {value}")]
    OutOfRange {
        /// Name of the offending setting.
        field: &'static str,
        /// Human readable description of the permitted range.
        expectation: &'static str,
        /// Value that was configured.
        value: f64,
    },
    /// A list that must contain at least one element is empty.
    #[error("{field} must not be empty")]
    Empty {
        /// Name of the offending setting.
        field: &'static str,
    },
}
