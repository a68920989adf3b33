//! Physical constants for interfacial electron transfer.
//!
//! The integrator never reads a global temperature: a [`PhysicalConstants`]
//! value travels with the kinetics configuration so that simulations at
//! different temperatures can coexist in one process.
//!
//! Default values reproduce the reference setup of the simulator
//! (R = 8.3145 J·mol⁻¹·K⁻¹, F = 96485 C·mol⁻¹, T = 295 K).

use serde::{Deserialize, Serialize};

use crate::error::{RedoxError, Result};

/// Natural logarithm of two, used for half-life estimates `ln 2 / k`.
pub const LN_2: f64 = std::f64::consts::LN_2;

/// Molar gas constant in J·mol⁻¹·K⁻¹.
pub const GAS_CONSTANT: f64 = 8.3145;

/// Faraday constant in C·mol⁻¹.
pub const FARADAY: f64 = 96485.0;

/// Default cell temperature in kelvin.
pub const DEFAULT_TEMPERATURE: f64 = 295.0;

/// Constants entering the Butler–Volmer and Nernst expressions.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicalConstants {
    /// Molar gas constant R (J·mol⁻¹·K⁻¹)
    pub gas_constant: f64,
    /// Faraday constant F (C·mol⁻¹)
    pub faraday: f64,
    /// Absolute temperature T (K)
    pub temperature: f64,
}

impl Default for PhysicalConstants {
    fn default() -> Self {
        Self {
            gas_constant: GAS_CONSTANT,
            faraday: FARADAY,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl PhysicalConstants {
    pub fn new(gas_constant: f64, faraday: f64, temperature: f64) -> Result<Self> {
        let constants = Self { gas_constant, faraday, temperature };
        constants.validate()?;
        Ok(constants)
    }

    /// Default R and F at another temperature.
    pub fn at_temperature(temperature: f64) -> Result<Self> {
        Self::new(GAS_CONSTANT, FARADAY, temperature)
    }

    /// F/(RT) in V⁻¹.
    #[inline]
    #[must_use]
    pub fn f_over_rt(&self) -> f64 {
        self.faraday / (self.gas_constant * self.temperature)
    }

    /// Thermal voltage RT/F in volts.
    #[inline]
    #[must_use]
    pub fn thermal_voltage(&self) -> f64 {
        1.0 / self.f_over_rt()
    }

    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("gas constant", self.gas_constant),
            ("Faraday constant", self.faraday),
            ("temperature", self.temperature),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value <= 0.0 {
                return Err(RedoxError::InvalidParameter(format!(
                    "{name} must be finite and strictly positive (got {value})"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_default_f_over_rt() {
        let constants = PhysicalConstants::default();
        assert_relative_eq!(constants.f_over_rt(), 96485.0 / (8.3145 * 295.0), max_relative = 1e-15);
        assert_relative_eq!(constants.f_over_rt(), 39.336, epsilon = 1e-3);
    }

    #[test]
    fn test_temperature_scaling() {
        let cold = PhysicalConstants::at_temperature(250.0).unwrap();
        let hot = PhysicalConstants::at_temperature(350.0).unwrap();
        assert!(cold.f_over_rt() > hot.f_over_rt());
        assert_relative_eq!(hot.thermal_voltage() * hot.f_over_rt(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_rejects_non_physical_values() {
        assert!(PhysicalConstants::at_temperature(0.0).is_err());
        assert!(PhysicalConstants::new(-1.0, FARADAY, 298.0).is_err());
        assert!(PhysicalConstants::new(GAS_CONSTANT, f64::NAN, 298.0).is_err());
    }
}
