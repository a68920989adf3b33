//! Triangular ramp for cyclic voltammetry.
//!
//! The forward leg goes from `e_start` to `e_end` in `forward` samples, the
//! backward leg retraces it in `forward - 1` samples, so a sweep always has
//! `2 · forward - 1` samples with the turning point at index `forward - 1`.
//!
//! Both legs are generated from the same interpolation and the backward leg
//! is the mirror image of the forward one. The turning sample equals
//! `e_end` and the last sample equals `e_start` bit for bit, whatever the
//! sweep direction.
//!
//! The number of steps per leg is `|e_end − e_start| · points_per_volt`
//! rounded to the nearest integer, so the actual potential step can differ
//! slightly from `1 / points_per_volt`. [`CyclicSweep`] derives its time
//! increment from the actual step, which keeps the scan rate exact.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, RedoxError, Result};
use crate::physics::PotentialSequence;
use crate::waveform::Waveform;

/// Default sampling density of a CV sweep (points per volt).
pub const DEFAULT_POINTS_PER_VOLT: f64 = 50_000.0;

/// Number of samples on the forward leg.
fn forward_length(e_start: f64, e_end: f64, points_per_volt: f64) -> usize {
    ((e_end - e_start).abs() * points_per_volt).round() as usize + 1
}

/// Total number of samples of a sweep between the two vertices.
///
/// ```rust
/// use redox_rs::waveform::cv_sequence_length;
///
/// assert_eq!(cv_sequence_length(0.3, -0.4, 100.0).unwrap(), 141);
/// ```
pub fn cv_sequence_length(e_start: f64, e_end: f64, points_per_volt: f64) -> Result<usize> {
    ensure_finite("start potential", e_start)?;
    ensure_finite("end potential", e_end)?;
    ensure_positive("points per volt", points_per_volt)?;
    Ok(2 * forward_length(e_start, e_end, points_per_volt) - 1)
}

/// Triangular potential ramp `e_start → e_end → e_start`.
///
/// `length` must equal [`cv_sequence_length`] for the same vertices and
/// density; anything else is rejected instead of being truncated or padded.
pub fn build_cv_sequence(
    e_start: f64,
    e_end: f64,
    points_per_volt: f64,
    length: usize,
) -> Result<DVector<f64>> {
    let expected = cv_sequence_length(e_start, e_end, points_per_volt)?;
    if length != expected {
        return Err(RedoxError::LengthMismatch {
            what: "cyclic sweep",
            expected,
            actual: length,
        });
    }

    let forward = forward_length(e_start, e_end, points_per_volt);
    let last = (forward - 1) as f64;
    let leg: Vec<f64> = (0..forward)
        .map(|i| {
            if forward == 1 {
                return e_start;
            }
            let t = i as f64 / last;
            (1.0 - t) * e_start + t * e_end
        })
        .collect();

    let mut values = Vec::with_capacity(length);
    values.extend_from_slice(&leg);
    values.extend(leg.iter().rev().skip(1));

    Ok(DVector::from_vec(values))
}

// =================================================================================================
// Cyclic sweep waveform
// =================================================================================================

/// Cyclic voltammetry sweep parameters.
///
/// Time increment is `step_size / scan_rate`, which is
/// `1 / (scan_rate · points_per_volt)` whenever the span is a whole number
/// of nominal steps.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CyclicSweep {
    /// Starting (and final) potential, V
    pub e_start: f64,
    /// Vertex potential, V
    pub e_end: f64,
    /// Scan rate, V/s
    pub scan_rate: f64,
    /// Sampling density, points per volt
    #[serde(default = "default_points_per_volt")]
    pub points_per_volt: f64,
}

fn default_points_per_volt() -> f64 {
    DEFAULT_POINTS_PER_VOLT
}

impl CyclicSweep {
    pub fn new(e_start: f64, e_end: f64, scan_rate: f64) -> Self {
        Self {
            e_start,
            e_end,
            scan_rate,
            points_per_volt: DEFAULT_POINTS_PER_VOLT,
        }
    }

    pub fn with_points_per_volt(mut self, points_per_volt: f64) -> Self {
        self.points_per_volt = points_per_volt;
        self
    }

    /// Index of the vertex sample.
    pub fn turning_index(&self) -> usize {
        forward_length(self.e_start, self.e_end, self.points_per_volt) - 1
    }

    /// Potential step between consecutive samples, V.
    pub fn step_size(&self) -> f64 {
        match self.turning_index() {
            0 => 1.0 / self.points_per_volt,
            steps => (self.e_end - self.e_start).abs() / steps as f64,
        }
    }
}

impl Waveform for CyclicSweep {
    fn name(&self) -> &str {
        "Cyclic voltammetry"
    }

    fn validate(&self) -> Result<()> {
        ensure_finite("start potential", self.e_start)?;
        ensure_finite("end potential", self.e_end)?;
        ensure_positive("scan rate", self.scan_rate)?;
        ensure_positive("points per volt", self.points_per_volt)?;
        Ok(())
    }

    fn time_increment(&self) -> f64 {
        self.step_size() / self.scan_rate
    }

    fn len(&self) -> usize {
        2 * forward_length(self.e_start, self.e_end, self.points_per_volt) - 1
    }

    fn sequence(&self) -> Result<PotentialSequence> {
        self.validate()?;
        let values = build_cv_sequence(self.e_start, self.e_end, self.points_per_volt, self.len())?;
        PotentialSequence::new(values, self.time_increment())
    }
}
