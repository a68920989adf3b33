//! Variable-frequency square-wave voltammetry (VF-SWV).
//!
//! The same staircase is swept at a series of frequencies, evenly spaced in
//! log10 from the highest to the lowest. Every differential curve is divided
//! by its frequency, which turns current into charge per period and makes the
//! rows of the map comparable.
//!
//! Each frequency is an independent simulation. With the `parallel` feature
//! the sweep runs on the Rayon pool once it has more rows than
//! [`parallel_threshold`](crate::solver::parallel_threshold).

use nalgebra::{DMatrix, DVector};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, RedoxError, Result};
use crate::experiment::square_wave::{SquareWaveVoltammetry, SwvParameters, DEFAULT_SAMPLING_FRACTION};
use crate::layer::distribution::linspace;
use crate::physics::PopulationSet;
use crate::solver::Integrator;
use crate::waveform::square_wave::DEFAULT_POINTS_PER_PULSE;

/// Default number of frequencies in a sweep.
pub const DEFAULT_FREQUENCY_RESOLUTION: usize = 61;

/// Description of a VF-SWV experiment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VfSwvParameters {
    pub e_start: f64,
    pub e_end: f64,
    pub e_step: f64,
    pub amplitude: f64,
    pub log_frequency_min: f64,
    pub log_frequency_max: f64,
    pub resistance: f64,
    pub capacitance: f64,
    #[serde(default = "default_points_per_pulse")]
    pub points_per_pulse: usize,
    #[serde(default = "default_frequency_resolution")]
    pub frequency_resolution: usize,
    #[serde(default = "default_sampling_fraction")]
    pub sampling_fraction: f64,
}

fn default_points_per_pulse() -> usize {
    DEFAULT_POINTS_PER_PULSE
}

fn default_frequency_resolution() -> usize {
    DEFAULT_FREQUENCY_RESOLUTION
}

fn default_sampling_fraction() -> f64 {
    DEFAULT_SAMPLING_FRACTION
}

impl VfSwvParameters {
    pub fn validate(&self) -> Result<()> {
        ensure_finite("minimum log10 frequency", self.log_frequency_min)?;
        ensure_finite("maximum log10 frequency", self.log_frequency_max)?;
        if self.log_frequency_min > self.log_frequency_max {
            return Err(RedoxError::InvalidParameter(format!(
                "frequency range is reversed: 10^{} > 10^{} Hz",
                self.log_frequency_min, self.log_frequency_max
            )));
        }
        if self.frequency_resolution == 0 {
            return Err(RedoxError::InvalidParameter(
                "frequency resolution must be at least 1".to_string(),
            ));
        }
        self.at_log_frequency(self.log_frequency_max).validate()
    }

    /// log10 frequencies of the sweep, highest first.
    pub fn log_frequencies(&self) -> DVector<f64> {
        linspace(self.log_frequency_max, self.log_frequency_min, self.frequency_resolution)
    }

    /// Single-frequency experiment of this sweep.
    pub fn at_log_frequency(&self, log_frequency: f64) -> SwvParameters {
        SwvParameters {
            e_start: self.e_start,
            e_end: self.e_end,
            e_step: self.e_step,
            amplitude: self.amplitude,
            log_frequency,
            resistance: self.resistance,
            capacitance: self.capacitance,
            points_per_pulse: self.points_per_pulse,
            sampling_fraction: self.sampling_fraction,
        }
    }
}

/// VF-SWV charge map.
#[derive(Clone, Debug)]
pub struct VfSwvMap {
    /// One entry per row, highest frequency first
    pub log_frequencies: DVector<f64>,
    /// One entry per column, V
    pub potential_scale: DVector<f64>,
    /// Differential current divided by frequency, C
    pub charge: DMatrix<f64>,
}

impl VfSwvMap {
    pub fn frequency_count(&self) -> usize {
        self.charge.nrows()
    }

    pub fn potential_count(&self) -> usize {
        self.charge.ncols()
    }

    /// Location of the largest |charge|: `(log10 f, E, charge)`.
    pub fn extremum(&self) -> (f64, f64, f64) {
        let (row, col) = self.charge.iamax_full();
        (self.log_frequencies[row], self.potential_scale[col], self.charge[(row, col)])
    }
}

/// VF-SWV assembler.
#[derive(Clone, Debug, PartialEq)]
pub struct VariableFrequencySwv {
    parameters: VfSwvParameters,
}

impl VariableFrequencySwv {
    pub fn new(parameters: VfSwvParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &VfSwvParameters {
        &self.parameters
    }

    fn charge_row(
        &self,
        log_frequency: f64,
        populations: Option<&PopulationSet>,
        integrator: &dyn Integrator,
    ) -> Result<DVector<f64>> {
        let experiment = SquareWaveVoltammetry::new(self.parameters.at_log_frequency(log_frequency));
        let response = experiment.simulate(populations, integrator)?;
        Ok(response.differential / 10f64.powf(log_frequency))
    }

    /// Run the sweep; `None` gives the blank-electrode map.
    pub fn simulate(
        &self,
        populations: Option<&PopulationSet>,
        integrator: &dyn Integrator,
    ) -> Result<VfSwvMap> {
        self.parameters.validate()?;
        let log_frequencies = self.parameters.log_frequencies();
        let potential_scale = self
            .parameters
            .at_log_frequency(self.parameters.log_frequency_max)
            .waveform()
            .potential_scale();

        log::info!(
            "VF-SWV: {} frequencies from 10^{} to 10^{} Hz, {} potentials",
            log_frequencies.len(),
            self.parameters.log_frequency_max,
            self.parameters.log_frequency_min,
            potential_scale.len()
        );

        let rows: Vec<Result<DVector<f64>>> = {
            #[cfg(feature = "parallel")]
            {
                if log_frequencies.len() > crate::solver::parallel_threshold() {
                    log_frequencies
                        .as_slice()
                        .par_iter()
                        .map(|&log_f| self.charge_row(log_f, populations, integrator))
                        .collect()
                } else {
                    log_frequencies
                        .iter()
                        .map(|&log_f| self.charge_row(log_f, populations, integrator))
                        .collect()
                }
            }
            #[cfg(not(feature = "parallel"))]
            {
                log_frequencies
                    .iter()
                    .map(|&log_f| self.charge_row(log_f, populations, integrator))
                    .collect()
            }
        };

        let mut charge = DMatrix::zeros(log_frequencies.len(), potential_scale.len());
        for (i, row) in rows.into_iter().enumerate() {
            let row = row?;
            charge.set_row(i, &row.transpose());
        }

        Ok(VfSwvMap {
            log_frequencies,
            potential_scale,
            charge,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::SitePopulation;
    use crate::solver::PacketIntegrator;

    fn parameters() -> VfSwvParameters {
        VfSwvParameters {
            e_start: 0.2,
            e_end: -0.2,
            e_step: -0.01,
            amplitude: 0.025,
            log_frequency_min: 0.0,
            log_frequency_max: 2.0,
            resistance: 10.0,
            capacitance: 1e-6,
            points_per_pulse: 20,
            frequency_resolution: 5,
            sampling_fraction: 0.1,
        }
    }

    fn layer() -> PopulationSet {
        PopulationSet::single(SitePopulation::new(1e-10, 0.0, 10.0, 0.5, 1).unwrap())
    }

    #[test]
    fn test_frequencies_run_from_high_to_low() {
        let log_f = parameters().log_frequencies();
        assert_eq!(log_f.as_slice(), &[2.0, 1.5, 1.0, 0.5, 0.0]);
    }

    #[test]
    fn test_map_shape_and_peak_location() {
        let vf = VariableFrequencySwv::new(parameters());
        let map = vf.simulate(Some(&layer()), &PacketIntegrator::new()).unwrap();

        assert_eq!(map.frequency_count(), 5);
        assert_eq!(map.potential_count(), 41);
        let (_, potential, charge) = map.extremum();
        assert!(charge < 0.0);
        assert!(potential.abs() < 0.03);
    }

    #[test]
    fn test_rows_match_single_frequency_runs() {
        // five rows exceed the default threshold: dispatched with `parallel`
        let vf = VariableFrequencySwv::new(parameters());
        let integrator = PacketIntegrator::new();
        let pops = layer();
        let map = vf.simulate(Some(&pops), &integrator).unwrap();

        for (i, &log_f) in map.log_frequencies.iter().enumerate() {
            let row = vf.charge_row(log_f, Some(&pops), &integrator).unwrap();
            assert_eq!(map.charge.row(i), row.transpose());
        }
    }

    #[test]
    fn test_reversed_range_is_rejected() {
        let mut params = parameters();
        params.log_frequency_min = 3.0;
        assert!(VariableFrequencySwv::new(params).simulate(None, &PacketIntegrator::new()).is_err());
    }
}
