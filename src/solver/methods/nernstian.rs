//! Reversible (Nernstian) reference response.
//!
//! When electron transfer is infinitely fast every population sits at its
//! Nernst equilibrium `θ = 1 / (1 + exp(z·f·(V − E0)))` at all times, and the
//! current is the rate of change of the reduced amount:
//!
//! ```text
//! I_j = Σ_i z_i·F·Γ_i · (θ_i(V_{j-1}) − θ_i(V_j)) / Δt,     I_0 = 0
//! ```
//!
//! The potential is the RC-filtered one; iR coupling of the faradaic current
//! is not modelled. When R > 0 the capacitive current `(V_applied − V_filtered)/R`
//! is added so that the result is comparable with [`PacketIntegrator`].
//!
//! [`PacketIntegrator`]: crate::solver::PacketIntegrator

use nalgebra::DVector;

use crate::error::Result;
use crate::physics::CurrentTrace;
use crate::solver::kinetics::ButlerVolmer;
use crate::solver::traits::{IntegrationDiagnostics, IntegrationResult, Integrator};
use crate::solver::{ohmic_current, validate_trace, KineticsConfiguration, Scenario};

/// Equilibrium integrator, the `k0 → ∞` limit of the packet scheme.
#[derive(Clone, Debug, Default)]
pub struct NernstianIntegrator {
    configuration: KineticsConfiguration,
}

impl NernstianIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration(configuration: KineticsConfiguration) -> Self {
        Self { configuration }
    }
}

impl Integrator for NernstianIntegrator {
    fn integrate(&self, scenario: &Scenario) -> Result<IntegrationResult> {
        self.configuration.validate()?;
        scenario.validate()?;

        let dt = scenario.time_increment();
        let potential = scenario.filtered().values();
        let law = ButlerVolmer::new(&self.configuration.constants, self.configuration.max_exponent);
        let faraday = self.configuration.constants.faraday;

        let mut current = ohmic_current(scenario.resistance(), scenario.applied(), scenario.filtered())?;
        for population in scenario.populations() {
            let charge = population.charge_number() as f64 * faraday * population.loading();
            let theta = DVector::from_fn(potential.len(), |j, _| law.reduced_fraction(population, potential[j]));
            for j in 1..potential.len() {
                current[j] += charge * (theta[j - 1] - theta[j]) / dt;
            }
        }
        validate_trace(&current, "current")?;

        let diagnostics = IntegrationDiagnostics {
            populations_processed: scenario.populations().len(),
            passes: scenario.populations().len(),
            steps_integrated: (scenario.populations().len() * scenario.len().saturating_sub(1)) as u64,
            ..IntegrationDiagnostics::default()
        };

        Ok(IntegrationResult {
            current: CurrentTrace::new(current, dt)?,
            corrected_potential: scenario.filtered().clone(),
            diagnostics,
        })
    }

    fn name(&self) -> &str {
        "Nernstian equilibrium"
    }
}
