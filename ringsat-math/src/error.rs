//! Error types for the math providers.

use thiserror::Error;

/// Errors raised when constructing math providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// The requested bit-width is outside `1..=MAX_WIDTH`.
    #[error("bit-width {0} is outside the supported range 1..=64")]
    InvalidWidth(u32),
}
