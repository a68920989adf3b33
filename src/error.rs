//! Crate-wide error type.
//!
//! Every fallible operation in `redox_rs` returns [`Result<T>`]. Parameter
//! problems are detected before any work buffer is allocated, numerical
//! failures are reported with the offending index instead of leaking NaN
//! or Inf into a returned trace.

use thiserror::Error;

/// Top-level error type for the crate.
#[derive(Debug, Error)]
pub enum RedoxError {
    /// A scalar parameter is outside its admissible range.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Two sequences that must be index-aligned have different lengths.
    #[error("length mismatch for {what}: expected {expected}, got {actual}")]
    LengthMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A site distribution name that the surface layer model does not know.
    #[error("unsupported distribution type: {0}")]
    UnsupportedDistribution(String),

    /// NaN or Inf produced during a computation.
    #[error("numeric instability: {0}")]
    NumericInstability(String),

    /// Experiment description could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// File output failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<toml::de::Error> for RedoxError {
    fn from(err: toml::de::Error) -> Self {
        RedoxError::Config(err.to_string())
    }
}

/// Shorthand for results produced by this crate.
pub type Result<T> = std::result::Result<T, RedoxError>;

/// Fails with [`RedoxError::InvalidParameter`] unless `value` is finite and
/// strictly positive.
pub(crate) fn ensure_positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(RedoxError::InvalidParameter(format!(
            "{name} must be finite and strictly positive (got {value})"
        )));
    }
    Ok(())
}

/// Fails with [`RedoxError::InvalidParameter`] unless `value` is finite.
pub(crate) fn ensure_finite(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(RedoxError::InvalidParameter(format!(
            "{name} must be finite (got {value})"
        )));
    }
    Ok(())
}
