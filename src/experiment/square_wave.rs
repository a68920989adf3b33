//! Square-wave voltammetry.
//!
//! The differential curve is built from the tail of every pulse: the last
//! `sampling_fraction` of the samples of each half period are averaged, the
//! first half period of a step is the forward pulse and the second one the
//! backward pulse, and the differential current is `forward − backward`.

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{RedoxError, Result};
use crate::experiment::{assemble, CellParameters, Voltammogram};
use crate::physics::PopulationSet;
use crate::solver::Integrator;
use crate::waveform::square_wave::DEFAULT_POINTS_PER_PULSE;
use crate::waveform::{SquareWave, Waveform};

/// Default share of every pulse that is averaged when sampling the current.
pub const DEFAULT_SAMPLING_FRACTION: f64 = 0.1;

/// Description of an SWV experiment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SwvParameters {
    pub e_start: f64,
    pub e_end: f64,
    pub e_step: f64,
    pub amplitude: f64,
    /// log10 of the frequency in Hz
    pub log_frequency: f64,
    pub resistance: f64,
    pub capacitance: f64,
    #[serde(default = "default_points_per_pulse")]
    pub points_per_pulse: usize,
    #[serde(default = "default_sampling_fraction")]
    pub sampling_fraction: f64,
}

fn default_points_per_pulse() -> usize {
    DEFAULT_POINTS_PER_PULSE
}

fn default_sampling_fraction() -> f64 {
    DEFAULT_SAMPLING_FRACTION
}

impl SwvParameters {
    pub fn waveform(&self) -> SquareWave {
        SquareWave::new(self.e_start, self.e_end, self.e_step, self.amplitude, self.log_frequency)
            .with_points_per_pulse(self.points_per_pulse)
    }

    pub fn cell(&self) -> CellParameters {
        CellParameters::new(self.resistance, self.capacitance)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.sampling_fraction > 0.0 && self.sampling_fraction <= 1.0) {
            return Err(RedoxError::InvalidParameter(format!(
                "sampling fraction must lie in (0, 1] (got {})",
                self.sampling_fraction
            )));
        }
        self.waveform().validate()?;
        self.cell().validate()
    }
}

/// Sampled SWV response.
#[derive(Clone, Debug)]
pub struct SwvResponse {
    /// Time-domain response
    pub voltammogram: Voltammogram,
    /// Staircase potential of each step, V
    pub potential_scale: DVector<f64>,
    /// Sampled current of the forward pulses, A
    pub forward: DVector<f64>,
    /// Sampled current of the backward pulses, A
    pub backward: DVector<f64>,
    /// `forward − backward`, A
    pub differential: DVector<f64>,
}

/// Average the tail of every pulse and split into forward / backward.
///
/// Returns `(forward, backward)`, one value per staircase step. The trace
/// length must be a whole number of periods (`2 · points_per_pulse`).
///
/// ```rust
/// use nalgebra::DVector;
/// use redox_rs::experiment::differential_currents;
///
/// let trace = DVector::from_vec(vec![0.0, 4.0, 0.0, 1.0, 0.0, 6.0, 0.0, 2.0]);
/// let (forward, backward) = differential_currents(&trace, 2, 0.5).unwrap();
/// assert_eq!(forward.as_slice(), &[4.0, 6.0]);
/// assert_eq!(backward.as_slice(), &[1.0, 2.0]);
/// ```
pub fn differential_currents(
    total: &DVector<f64>,
    points_per_pulse: usize,
    sampling_fraction: f64,
) -> Result<(DVector<f64>, DVector<f64>)> {
    if points_per_pulse == 0 {
        return Err(RedoxError::InvalidParameter(
            "points per pulse must be at least 1".to_string(),
        ));
    }
    if !(sampling_fraction > 0.0 && sampling_fraction <= 1.0) {
        return Err(RedoxError::InvalidParameter(format!(
            "sampling fraction must lie in (0, 1] (got {sampling_fraction})"
        )));
    }
    let period = 2 * points_per_pulse;
    if total.len() % period != 0 {
        return Err(RedoxError::LengthMismatch {
            what: "square-wave current trace",
            expected: (total.len() / period + 1) * period,
            actual: total.len(),
        });
    }

    let sampled = ((points_per_pulse as f64 * sampling_fraction).round() as usize).clamp(1, points_per_pulse);
    let steps = total.len() / period;
    let pulse_tail = |pulse: usize| {
        let end = (pulse + 1) * points_per_pulse;
        total.rows(end - sampled, sampled).mean()
    };

    let forward = DVector::from_fn(steps, |k, _| pulse_tail(2 * k));
    let backward = DVector::from_fn(steps, |k, _| pulse_tail(2 * k + 1));
    Ok((forward, backward))
}

/// SWV assembler.
#[derive(Clone, Debug, PartialEq)]
pub struct SquareWaveVoltammetry {
    parameters: SwvParameters,
}

impl SquareWaveVoltammetry {
    pub fn new(parameters: SwvParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &SwvParameters {
        &self.parameters
    }

    /// Run the experiment; `None` gives the blank-electrode response.
    pub fn simulate(
        &self,
        populations: Option<&PopulationSet>,
        integrator: &dyn Integrator,
    ) -> Result<SwvResponse> {
        self.parameters.validate()?;
        let waveform = self.parameters.waveform();
        log::debug!(
            "SWV at 10^{:.3} Hz, {} steps, dt = {:e} s",
            self.parameters.log_frequency,
            waveform.period_count(),
            waveform.time_increment()
        );

        let voltammogram = assemble(&waveform, &self.parameters.cell(), populations, integrator)?;
        let (forward, backward) = differential_currents(
            voltammogram.total.values(),
            self.parameters.points_per_pulse,
            self.parameters.sampling_fraction,
        )?;
        let differential = &forward - &backward;

        Ok(SwvResponse {
            voltammogram,
            potential_scale: waveform.potential_scale(),
            forward,
            backward,
            differential,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::SitePopulation;
    use crate::solver::PacketIntegrator;

    fn parameters() -> SwvParameters {
        SwvParameters {
            e_start: 0.3,
            e_end: -0.3,
            e_step: -0.005,
            amplitude: 0.025,
            log_frequency: 1.0,
            resistance: 10.0,
            capacitance: 1e-6,
            points_per_pulse: 20,
            sampling_fraction: DEFAULT_SAMPLING_FRACTION,
        }
    }

    #[test]
    fn test_differential_uses_pulse_tails() {
        // two steps, 10 points per pulse, tail = last sample only
        let values: Vec<f64> = (0..40).map(|i| i as f64).collect();
        let (forward, backward) = differential_currents(&DVector::from_vec(values), 10, 0.1).unwrap();
        assert_eq!(forward.as_slice(), &[9.0, 29.0]);
        assert_eq!(backward.as_slice(), &[19.0, 39.0]);
    }

    #[test]
    fn test_differential_rejects_partial_period() {
        let trace = DVector::zeros(15);
        let err = differential_currents(&trace, 5, 0.1).unwrap_err();
        assert!(matches!(err, RedoxError::LengthMismatch { actual: 15, .. }));
        assert!(differential_currents(&DVector::zeros(10), 5, 0.0).is_err());
    }

    #[test]
    fn test_swv_from_toml_defaults() {
        let params: SwvParameters = toml::from_str(
            r#"
            e_start = 0.5
            e_end = -0.5
            e_step = -0.01
            amplitude = 0.025
            log_frequency = 2.0
            resistance = 10.0
            capacitance = 1e-4
            "#,
        )
        .unwrap();
        assert_eq!(params.points_per_pulse, 100);
        assert_eq!(params.sampling_fraction, 0.1);
        assert_eq!(params.waveform().period_count(), 101);
    }

    #[test]
    fn test_reductive_scan_gives_negative_peak_at_formal_potential() {
        // k0 · pulse time ≈ 1: close to the quasi-reversible maximum
        let swv = SquareWaveVoltammetry::new(parameters());
        let pops = PopulationSet::single(SitePopulation::new(1e-10, 0.05, 20.0, 0.5, 1).unwrap());
        let response = swv.simulate(Some(&pops), &PacketIntegrator::new()).unwrap();

        assert_eq!(response.differential.len(), response.potential_scale.len());
        let peak = response.differential.imin();
        assert!(response.differential[peak] < 0.0);
        assert!((response.potential_scale[peak] - 0.05).abs() < 0.03);
    }

    #[test]
    fn test_blank_electrode_differential_is_small() {
        let swv = SquareWaveVoltammetry::new(parameters());
        let response = swv.simulate(None, &PacketIntegrator::new()).unwrap();
        // RC = 1e-5 s, the charging current has decayed by the pulse tail
        assert!(response.differential.amax() < 1e-9);
    }
}
