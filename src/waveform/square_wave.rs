//! Staircase-plus-pulse waveform for square-wave voltammetry.
//!
//! One period spans `2 · points_per_pulse` samples. The staircase advances by
//! `e_step` at the start of every period; a square pulse of `± amplitude`
//! flips sign every half period. The first half period of each step is the
//! *forward* pulse: it points in the scan direction (`+amplitude` for an
//! oxidative scan, `-amplitude` for a reductive one).
//!
//! ```text
//!        ┌──┐     ┌──┐
//!        │  │  ┌──┘  │
//!  ┌──┐  │  └──┘     └──
//!  │  └──┘
//! ─┘
//!  |<-2·ppp->|
//! ```

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, RedoxError, Result};
use crate::physics::PotentialSequence;
use crate::waveform::Waveform;

/// Default number of samples per pulse (half period).
pub const DEFAULT_POINTS_PER_PULSE: usize = 100;

/// Staircase potential with a superimposed square wave.
///
/// `value[i] = e_start + ⌊i / 2ppp⌋ · e_step ± amplitude`, where the pulse
/// sign is `+` on even half periods and `-` on odd ones, all multiplied by
/// the sign of `e_step`.
///
/// # Errors
///
/// `InvalidParameter` for a zero or non-finite `e_step`, a non-finite
/// amplitude or start potential, or `points_per_pulse == 0`.
pub fn build_swv_sequence(
    e_step: f64,
    amplitude: f64,
    e_start: f64,
    length: usize,
    points_per_pulse: usize,
) -> Result<DVector<f64>> {
    ensure_finite("potential step", e_step)?;
    ensure_finite("pulse amplitude", amplitude)?;
    ensure_finite("start potential", e_start)?;
    if e_step == 0.0 {
        return Err(RedoxError::InvalidParameter(
            "potential step must be non-zero".to_string(),
        ));
    }
    if points_per_pulse == 0 {
        return Err(RedoxError::InvalidParameter(
            "points per pulse must be at least 1".to_string(),
        ));
    }

    let direction = if e_step < 0.0 { -1.0 } else { 1.0 };
    let period = 2 * points_per_pulse;

    Ok(DVector::from_fn(length, |i, _| {
        let stair = (i / period) as f64 * e_step;
        let pulse = if (i / points_per_pulse) % 2 == 0 { amplitude } else { -amplitude };
        e_start + stair + direction * pulse
    }))
}

/// Number of staircase steps between `e_start` and `e_end` inclusive.
pub fn swv_period_count(e_start: f64, e_end: f64, e_step: f64) -> Result<usize> {
    ensure_finite("start potential", e_start)?;
    ensure_finite("end potential", e_end)?;
    ensure_finite("potential step", e_step)?;
    if e_step == 0.0 {
        return Err(RedoxError::InvalidParameter(
            "potential step must be non-zero".to_string(),
        ));
    }
    let span = e_end - e_start;
    if span * e_step < 0.0 {
        return Err(RedoxError::InvalidParameter(format!(
            "potential step {e_step} points away from the scan direction {e_start} -> {e_end}"
        )));
    }
    Ok((span / e_step).round() as usize + 1)
}

// =================================================================================================
// Square wave waveform
// =================================================================================================

/// Square-wave voltammetry parameters.
///
/// The pulse duration is `1 / (2 f)` with `f = 10^log_frequency`, and each
/// pulse is sampled with `points_per_pulse` points.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SquareWave {
    /// First staircase potential, V
    pub e_start: f64,
    /// Last staircase potential, V
    pub e_end: f64,
    /// Staircase increment, V (sign follows the scan direction)
    pub e_step: f64,
    /// Pulse amplitude, V
    pub amplitude: f64,
    /// log10 of the square-wave frequency in Hz
    pub log_frequency: f64,
    #[serde(default = "default_points_per_pulse")]
    pub points_per_pulse: usize,
}

fn default_points_per_pulse() -> usize {
    DEFAULT_POINTS_PER_PULSE
}

impl SquareWave {
    pub fn new(e_start: f64, e_end: f64, e_step: f64, amplitude: f64, log_frequency: f64) -> Self {
        Self {
            e_start,
            e_end,
            e_step,
            amplitude,
            log_frequency,
            points_per_pulse: DEFAULT_POINTS_PER_PULSE,
        }
    }

    pub fn with_points_per_pulse(mut self, points_per_pulse: usize) -> Self {
        self.points_per_pulse = points_per_pulse;
        self
    }

    /// Same staircase at another frequency.
    pub fn at_log_frequency(&self, log_frequency: f64) -> Self {
        Self { log_frequency, ..self.clone() }
    }

    pub fn frequency(&self) -> f64 {
        10f64.powf(self.log_frequency)
    }

    /// Duration of one pulse (half period), s.
    pub fn pulse_time(&self) -> f64 {
        1.0 / (2.0 * self.frequency())
    }

    /// Number of staircase steps. Zero when the parameters are invalid.
    pub fn period_count(&self) -> usize {
        swv_period_count(self.e_start, self.e_end, self.e_step).unwrap_or(0)
    }

    /// Staircase potential of each period, `e_start + k · e_step`.
    pub fn potential_scale(&self) -> DVector<f64> {
        DVector::from_fn(self.period_count(), |k, _| self.e_start + k as f64 * self.e_step)
    }
}

impl Waveform for SquareWave {
    fn name(&self) -> &str {
        "Square-wave voltammetry"
    }

    fn validate(&self) -> Result<()> {
        swv_period_count(self.e_start, self.e_end, self.e_step)?;
        ensure_finite("pulse amplitude", self.amplitude)?;
        ensure_finite("log10 frequency", self.log_frequency)?;
        ensure_positive("pulse time", self.pulse_time())?;
        if self.points_per_pulse == 0 {
            return Err(RedoxError::InvalidParameter(
                "points per pulse must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    fn time_increment(&self) -> f64 {
        self.pulse_time() / self.points_per_pulse as f64
    }

    fn len(&self) -> usize {
        2 * self.points_per_pulse * self.period_count()
    }

    fn sequence(&self) -> Result<PotentialSequence> {
        self.validate()?;
        let values = build_swv_sequence(
            self.e_step,
            self.amplitude,
            self.e_start,
            self.len(),
            self.points_per_pulse,
        )?;
        PotentialSequence::new(values, self.time_increment())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_oxidative_staircase_shape() {
        let seq = build_swv_sequence(0.01, 0.025, -0.2, 12, 2).unwrap();
        let expected = [
            -0.175, -0.175, -0.225, -0.225, // step 0
            -0.165, -0.165, -0.215, -0.215, // step 1
            -0.155, -0.155, -0.205, -0.205, // step 2
        ];
        for (value, target) in seq.iter().zip(expected) {
            assert!((value - target).abs() < 1e-12, "{value} vs {target}");
        }
    }

    #[test]
    fn test_reductive_scan_flips_pulse_sign() {
        let seq = build_swv_sequence(-0.01, 0.025, 0.2, 4, 2).unwrap();
        assert!((seq[0] - 0.175).abs() < 1e-12);
        assert!((seq[2] - 0.225).abs() < 1e-12);
    }

    #[test]
    fn test_rejects_invalid_parameters() {
        assert!(build_swv_sequence(0.0, 0.025, 0.0, 10, 2).is_err());
        assert!(build_swv_sequence(0.01, 0.025, 0.0, 10, 0).is_err());
        assert!(build_swv_sequence(f64::NAN, 0.025, 0.0, 10, 2).is_err());
    }

    #[test]
    fn test_period_count_checks_direction() {
        assert_eq!(swv_period_count(-0.3, 0.3, 0.005).unwrap(), 121);
        assert_eq!(swv_period_count(0.3, -0.3, -0.005).unwrap(), 121);
        assert!(swv_period_count(0.3, -0.3, 0.005).is_err());
    }

    #[test]
    fn test_square_wave_timing() {
        let swv = SquareWave::new(-0.3, 0.3, 0.005, 0.025, 1.0).with_points_per_pulse(50);
        assert!((swv.pulse_time() - 0.05).abs() < 1e-15);
        assert!((swv.time_increment() - 1e-3).abs() < 1e-15);
        assert_eq!(swv.len(), 2 * 50 * 121);

        let scale = swv.potential_scale();
        assert_eq!(scale.len(), 121);
        assert!((scale[120] - 0.3).abs() < 1e-12);

        let seq = swv.sequence().unwrap();
        assert_eq!(seq.len(), swv.len());
    }

    #[test]
    fn test_at_log_frequency_keeps_staircase() {
        let swv = SquareWave::new(0.2, -0.2, -0.01, 0.02, 0.0);
        let fast = swv.at_log_frequency(2.0);
        assert_eq!(fast.len(), swv.len());
        assert!(fast.time_increment() < swv.time_increment());
    }
}
