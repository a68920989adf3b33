//! Uniformly sampled sequences: applied potentials and currents.
//!
//! Both types wrap a `DVector<f64>` together with the time increment they
//! were sampled at. They are immutable once built: producers hand them out,
//! consumers only read.

use nalgebra::DVector;

use crate::error::{ensure_positive, RedoxError, Result};

// =================================================================================================
// Potential sequence
// =================================================================================================

/// Potentials (V), one per time step, sampled every `time_increment` seconds.
///
/// # Invariants
///
/// - at least one sample
/// - `time_increment` finite and > 0
/// - every value finite
#[derive(Clone, Debug, PartialEq)]
pub struct PotentialSequence {
    values: DVector<f64>,
    time_increment: f64,
}

impl PotentialSequence {
    pub fn new(values: DVector<f64>, time_increment: f64) -> Result<Self> {
        ensure_positive("time increment", time_increment)?;
        if values.is_empty() {
            return Err(RedoxError::InvalidParameter(
                "potential sequence must contain at least one sample".to_string(),
            ));
        }
        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(RedoxError::InvalidParameter(format!(
                "potential sequence holds a non-finite value at index {index}"
            )));
        }
        Ok(Self { values, time_increment })
    }

    pub fn from_vec(values: Vec<f64>, time_increment: f64) -> Result<Self> {
        Self::new(DVector::from_vec(values), time_increment)
    }

    /// Number of samples (never zero).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Always `false`; kept for the `len`/`is_empty` pair convention.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }

    pub fn time_increment(&self) -> f64 {
        self.time_increment
    }

    /// Total duration covered by the samples, `(len - 1) · dt`.
    pub fn duration(&self) -> f64 {
        (self.len() - 1) as f64 * self.time_increment
    }

    pub fn into_values(self) -> DVector<f64> {
        self.values
    }
}

// =================================================================================================
// Current trace
// =================================================================================================

/// Net current (A per unit electrode area), one value per time step.
///
/// Same length and time increment as the potential sequence it was computed
/// from. Values are checked to be finite when the trace is built.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrentTrace {
    values: DVector<f64>,
    time_increment: f64,
}

impl CurrentTrace {
    pub fn new(values: DVector<f64>, time_increment: f64) -> Result<Self> {
        ensure_positive("time increment", time_increment)?;
        crate::solver::validate_trace(&values, "current trace")?;
        Ok(Self { values, time_increment })
    }

    pub fn zeros(len: usize, time_increment: f64) -> Result<Self> {
        Self::new(DVector::zeros(len), time_increment)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &DVector<f64> {
        &self.values
    }

    pub fn as_slice(&self) -> &[f64] {
        self.values.as_slice()
    }

    pub fn time_increment(&self) -> f64 {
        self.time_increment
    }

    /// Charge passed over the trace (rectangle rule), C per unit area.
    pub fn charge(&self) -> f64 {
        self.values.sum() * self.time_increment
    }

    pub fn into_values(self) -> DVector<f64> {
        self.values
    }
}
