//! Input errors raised while building a policy snapshot.

use thiserror::Error;

/// A malformed input that prevents a snapshot from being evaluated.
///
/// Business outcomes (night mode, exhausted quota, ...) are never errors;
/// these variants only describe inputs the engine cannot reason about.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    /// Priority classes start at 1 (protected).
    #[error("invalid priority class {class} for device \"{device}\": must be >= 1")]
    InvalidPriority { device: String, class: u32 },

    /// The comfort band is inverted or contains a non-finite bound.
    #[error("invalid comfort band [{low}, {high}]: bounds must be finite and low <= high")]
    InvalidComfortBand { low: f64, high: f64 },

    /// A numeric input is NaN or infinite.
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: &'static str, value: f64 },
}
