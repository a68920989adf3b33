//! Response assemblers
//!
//! Glue between the waveform generators, the RC filter and an integrator:
//!
//! ```text
//! waveform ──► applied ──► apply_rc ──► filtered
//!                 │                        │
//!                 └──── ohmic_current ─────┴──► capacitive current
//!                                          │
//!        populations ──► Scenario ◄────────┘
//!                           │
//!                      Integrator ──► total current
//! ```
//!
//! Without a surface layer only the non-faradaic (capacitive) response is
//! produced, which is what a blank electrode would show.
//!
//! - [`cyclic`]: cyclic voltammetry
//! - [`square_wave`]: square-wave voltammetry and its differential curve
//! - [`variable_frequency`]: VF-SWV charge maps over a frequency range

pub mod cyclic;
pub mod square_wave;
pub mod variable_frequency;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{RedoxError, Result};
use crate::physics::{CurrentTrace, PopulationSet, PotentialSequence};
use crate::solver::{apply_rc, ohmic_current, IntegrationDiagnostics, Integrator, Scenario};
use crate::waveform::Waveform;

pub use cyclic::{CvParameters, CyclicVoltammetry};
pub use square_wave::{differential_currents, SquareWaveVoltammetry, SwvParameters, SwvResponse};
pub use variable_frequency::{VariableFrequencySwv, VfSwvMap, VfSwvParameters};

/// Electrical properties of the cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellParameters {
    /// Uncompensated solution resistance, Ω
    pub resistance: f64,
    /// Double-layer capacitance, F
    pub capacitance: f64,
}

impl CellParameters {
    pub fn new(resistance: f64, capacitance: f64) -> Self {
        Self { resistance, capacitance }
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("resistance", self.resistance), ("capacitance", self.capacitance)] {
            if !value.is_finite() || value < 0.0 {
                return Err(RedoxError::InvalidParameter(format!(
                    "cell {name} must be finite and non-negative (got {value})"
                )));
            }
        }
        Ok(())
    }
}

/// Full time-domain response of one experiment.
#[derive(Clone, Debug)]
pub struct Voltammogram {
    /// Time stamps, s
    pub clock: DVector<f64>,
    /// Potential program
    pub applied: PotentialSequence,
    /// Potential after the RC lag
    pub filtered: PotentialSequence,
    /// Non-faradaic current, A
    pub capacitive: DVector<f64>,
    /// Total current (capacitive + faradaic), A
    pub total: CurrentTrace,
    /// Working potential after iR correction; `None` without a surface layer
    pub corrected: Option<PotentialSequence>,
    /// Integrator bookkeeping; `None` without a surface layer
    pub diagnostics: Option<IntegrationDiagnostics>,
}

impl Voltammogram {
    pub fn len(&self) -> usize {
        self.clock.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clock.is_empty()
    }

    /// Faradaic part of the total current.
    pub fn faradaic(&self) -> DVector<f64> {
        self.total.values() - &self.capacitive
    }
}

/// Simulate one waveform on one cell.
///
/// With `populations == None` the total current is the capacitive current.
pub fn assemble(
    waveform: &dyn Waveform,
    cell: &CellParameters,
    populations: Option<&PopulationSet>,
    integrator: &dyn Integrator,
) -> Result<Voltammogram> {
    cell.validate()?;
    waveform.validate()?;

    let dt = waveform.time_increment();
    let clock = waveform.clock()?;
    let applied = waveform.sequence()?;
    let filtered = apply_rc(cell.resistance, cell.capacitance, dt, &applied)?;
    let capacitive = ohmic_current(cell.resistance, &applied, &filtered)?;

    let (total, corrected, diagnostics) = match populations {
        Some(populations) => {
            let scenario = Scenario::new(populations, &applied, &filtered, cell.resistance)?;
            let result = integrator.integrate(&scenario)?;
            log::debug!(
                "{} with {}: {} populations, {} packet-steps",
                waveform.name(),
                integrator.name(),
                populations.len(),
                result.diagnostics.steps_integrated
            );
            (result.current, Some(result.corrected_potential), Some(result.diagnostics))
        }
        None => (CurrentTrace::new(capacitive.clone(), dt)?, None, None),
    };

    Ok(Voltammogram {
        clock,
        applied,
        filtered,
        capacitive,
        total,
        corrected,
        diagnostics,
    })
}
