//! Error types for parliament

use thiserror::Error;

/// Parliament error type
///
/// Every variant is a configuration defect: the caller handed the network
/// something whose shape disagrees with how it was built. File persistence
/// reports through `anyhow` instead.
#[derive(Debug, Error)]
pub enum ParliamentError {
    /// Bad shape specification, rate, or trainer setting
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// A vector's length disagrees with the width the network was built for
    #[error("Dimension mismatch in {context}: expected {expected}, got {actual}")]
    DimensionMismatch {
        context: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Batch inputs and targets have different lengths
    #[error("Length mismatch: {inputs} inputs but {targets} targets")]
    LengthMismatch { inputs: usize, targets: usize },

    /// Class label outside the encoder's range
    #[error("Label {label} out of range for {classes} classes")]
    InvalidLabel { label: usize, classes: usize },
}

impl ParliamentError {
    pub(crate) fn dimension(context: &'static str, expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch {
            context,
            expected,
            actual,
        }
    }
}

pub type Result<T> = std::result::Result<T, ParliamentError>;
