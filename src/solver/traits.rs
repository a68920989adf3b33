//! Integrator trait and its configuration / result types
//!
//! # Design
//!
//! - [`Scenario`] says WHAT to integrate (populations, potentials, resistance)
//! - [`KineticsConfiguration`] says HOW (constants, windowing, packet density)
//! - [`Integrator`] is the method, independent of both
//!
//! An integrator is stateless between calls: every buffer it uses lives for
//! one `integrate` call only, so the same instance can be shared by several
//! threads running independent experiments.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_positive, RedoxError, Result};
use crate::physics::{CurrentTrace, PhysicalConstants, PotentialSequence};
use crate::solver::Scenario;

// =================================================================================================
// Integrator trait
// =================================================================================================

/// Faradaic current integrator.
///
/// # Example
///
/// ```rust,ignore
/// let integrator = PacketIntegrator::new();
/// let result = integrator.integrate(&scenario)?;
/// println!("{}: {} samples", integrator.name(), result.current.len());
/// ```
pub trait Integrator: Send + Sync {
    /// Compute the current trace for one scenario.
    ///
    /// The returned trace has exactly `scenario.len()` samples.
    fn integrate(&self, scenario: &Scenario) -> Result<IntegrationResult>;

    fn name(&self) -> &str;
}

// =================================================================================================
// Configuration
// =================================================================================================

/// How the current of one time step is evaluated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CurrentEvaluation {
    /// Instantaneous rate at the start of the step,
    /// `zF · (Red·k_f − (Γ − Red)·k_b)`.
    #[default]
    StepStart,
    /// Charge transferred during the step divided by its duration,
    /// `zF · (Red(t) − Red(t+Δt)) / Δt`. Accurate for coarse steps.
    StepAverage,
}

/// Active-window search parameters.
///
/// A sample is skipped when the reaction holding the population in its
/// current majority state relaxes faster than `benchmark_factor · Δt`
/// (scaled by α or 1−α) and the minority equilibrium fraction is below
/// `saturation_tolerance`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// `false` integrates every sample.
    pub enabled: bool,
    /// Benchmark half-life in units of the time increment.
    pub benchmark_factor: f64,
    /// Largest minority fraction considered negligible.
    pub saturation_tolerance: f64,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            benchmark_factor: 10.0,
            saturation_tolerance: 1e-6,
        }
    }
}

impl WindowSettings {
    pub fn disabled() -> Self {
        Self { enabled: false, ..Self::default() }
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("benchmark factor", self.benchmark_factor)?;
        if !(self.saturation_tolerance >= 0.0 && self.saturation_tolerance < 0.5) {
            return Err(RedoxError::InvalidParameter(format!(
                "saturation tolerance must lie in [0, 0.5) (got {})",
                self.saturation_tolerance
            )));
        }
        Ok(())
    }
}

/// Numerical settings shared by the integrators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticsConfiguration {
    pub constants: PhysicalConstants,
    pub window: WindowSettings,
    /// Packets per nanomole of loading (before rounding up to an even count).
    pub packets_per_nanomole: f64,
    /// Butler–Volmer exponents are clamped to `±max_exponent`.
    pub max_exponent: f64,
    pub current_evaluation: CurrentEvaluation,
    /// Packet-steps above which a run is reported as degraded.
    pub work_warning_threshold: u64,
}

impl Default for KineticsConfiguration {
    fn default() -> Self {
        Self {
            constants: PhysicalConstants::default(),
            window: WindowSettings::default(),
            packets_per_nanomole: 20.0,
            max_exponent: 300.0,
            current_evaluation: CurrentEvaluation::StepStart,
            work_warning_threshold: 500_000_000,
        }
    }
}

impl KineticsConfiguration {
    pub fn with_constants(mut self, constants: PhysicalConstants) -> Self {
        self.constants = constants;
        self
    }

    pub fn with_window(mut self, window: WindowSettings) -> Self {
        self.window = window;
        self
    }

    pub fn with_current_evaluation(mut self, evaluation: CurrentEvaluation) -> Self {
        self.current_evaluation = evaluation;
        self
    }

    pub fn with_packets_per_nanomole(mut self, packets_per_nanomole: f64) -> Self {
        self.packets_per_nanomole = packets_per_nanomole;
        self
    }

    pub fn validate(&self) -> Result<()> {
        self.constants.validate()?;
        self.window.validate()?;
        ensure_positive("packets per nanomole", self.packets_per_nanomole)?;
        ensure_positive("maximum exponent", self.max_exponent)?;
        if self.max_exponent > 700.0 {
            return Err(RedoxError::InvalidParameter(format!(
                "maximum exponent {} would overflow f64",
                self.max_exponent
            )));
        }
        if self.work_warning_threshold == 0 {
            return Err(RedoxError::InvalidParameter(
                "work warning threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Result
// =================================================================================================

/// Bookkeeping collected while integrating.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IntegrationDiagnostics {
    /// Populations that had an active window.
    pub populations_processed: usize,
    /// Populations skipped because they never leave saturation.
    pub populations_skipped: usize,
    /// Integration passes over all packets.
    pub passes: usize,
    /// Packet-steps performed (passes × window length).
    pub steps_integrated: u64,
    /// Rate evaluations whose exponent had to be clamped.
    pub saturated_rates: u64,
    /// Populations whose window covered the whole sequence.
    pub full_window_populations: usize,
    /// Work exceeded the configured threshold.
    pub degraded: bool,
}

/// Output of one integration.
#[derive(Clone, Debug)]
pub struct IntegrationResult {
    /// Faradaic current (plus capacitive current when R > 0), A·cm⁻²
    pub current: CurrentTrace,
    /// Working potential after iR correction, V
    pub corrected_potential: PotentialSequence,
    pub diagnostics: IntegrationDiagnostics,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_configuration_is_valid() {
        let config = KineticsConfiguration::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.window.benchmark_factor, 10.0);
        assert_eq!(config.packets_per_nanomole, 20.0);
        assert_eq!(config.current_evaluation, CurrentEvaluation::StepStart);
    }

    #[test]
    fn test_invalid_configuration() {
        let config = KineticsConfiguration::default().with_packets_per_nanomole(0.0);
        assert!(config.validate().is_err());

        let mut config = KineticsConfiguration::default();
        config.max_exponent = 1000.0;
        assert!(config.validate().is_err());

        let mut window = WindowSettings::default();
        window.saturation_tolerance = 0.5;
        assert!(window.validate().is_err());
        window.saturation_tolerance = 1e-6;
        window.benchmark_factor = -1.0;
        assert!(window.validate().is_err());
    }

    #[test]
    fn test_configuration_from_toml() {
        let config: KineticsConfiguration = toml::from_str(
            r#"
            packets_per_nanomole = 40.0
            current_evaluation = "step_average"

            [window]
            benchmark_factor = 5.0

            [constants]
            temperature = 310.0
            "#,
        )
        .unwrap();
        assert_eq!(config.packets_per_nanomole, 40.0);
        assert_eq!(config.current_evaluation, CurrentEvaluation::StepAverage);
        assert_eq!(config.window.benchmark_factor, 5.0);
        assert!(config.window.enabled);
        assert_eq!(config.constants.temperature, 310.0);
        assert_eq!(config.constants.faraday, 96485.0);
    }
}
