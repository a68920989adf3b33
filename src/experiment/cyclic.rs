//! Cyclic voltammetry.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::experiment::{assemble, CellParameters, Voltammogram};
use crate::physics::PopulationSet;
use crate::solver::Integrator;
use crate::waveform::cyclic::DEFAULT_POINTS_PER_VOLT;
use crate::waveform::CyclicSweep;

/// Description of a CV experiment.
///
/// ```toml
/// e_start = 0.4
/// e_end = -0.4
/// scan_rate = 0.1
/// resistance = 10.0
/// capacitance = 1e-5
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CvParameters {
    pub e_start: f64,
    pub e_end: f64,
    /// V/s
    pub scan_rate: f64,
    /// Ω
    pub resistance: f64,
    /// F
    pub capacitance: f64,
    #[serde(default = "default_points_per_volt")]
    pub points_per_volt: f64,
}

fn default_points_per_volt() -> f64 {
    DEFAULT_POINTS_PER_VOLT
}

impl CvParameters {
    pub fn sweep(&self) -> CyclicSweep {
        CyclicSweep::new(self.e_start, self.e_end, self.scan_rate).with_points_per_volt(self.points_per_volt)
    }

    pub fn cell(&self) -> CellParameters {
        CellParameters::new(self.resistance, self.capacitance)
    }
}

/// CV assembler.
#[derive(Clone, Debug, PartialEq)]
pub struct CyclicVoltammetry {
    parameters: CvParameters,
}

impl CyclicVoltammetry {
    pub fn new(parameters: CvParameters) -> Self {
        Self { parameters }
    }

    pub fn parameters(&self) -> &CvParameters {
        &self.parameters
    }

    /// Run the experiment; `None` gives the blank-electrode response.
    pub fn simulate(
        &self,
        populations: Option<&PopulationSet>,
        integrator: &dyn Integrator,
    ) -> Result<Voltammogram> {
        let sweep = self.parameters.sweep();
        log::info!(
            "CV {} -> {} V at {} V/s, {} samples",
            self.parameters.e_start,
            self.parameters.e_end,
            self.parameters.scan_rate,
            crate::waveform::Waveform::len(&sweep)
        );
        assemble(&sweep, &self.parameters.cell(), populations, integrator)
    }
}
