//! Electroactive site populations.
//!
//! A [`SitePopulation`] is one sub-ensemble of identical redox sites. A
//! [`PopulationSet`] is the ordered, non-empty collection handed to an
//! integrator. The order matters: populations are integrated one after the
//! other against a shared working potential.

use crate::error::{ensure_finite, ensure_positive, RedoxError, Result};

/// One population of surface-confined redox sites.
///
/// | Field | Unit | Constraint |
/// |---|---|---|
/// | loading Γ | mol·cm⁻² | > 0 |
/// | formal potential E0 | V | finite |
/// | rate constant k0 | s⁻¹ | > 0 |
/// | transfer coefficient α | - | 0 < α < 1 |
/// | charge number z | - | ≠ 0 |
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SitePopulation {
    loading: f64,
    formal_potential: f64,
    rate_constant: f64,
    alpha: f64,
    charge_number: i32,
}

impl SitePopulation {
    pub fn new(
        loading: f64,
        formal_potential: f64,
        rate_constant: f64,
        alpha: f64,
        charge_number: i32,
    ) -> Result<Self> {
        let population = Self {
            loading,
            formal_potential,
            rate_constant,
            alpha,
            charge_number,
        };
        population.validate()?;
        Ok(population)
    }

    /// Build from log10 k0, the form distributions are sampled in.
    pub fn from_log_k0(
        loading: f64,
        formal_potential: f64,
        log_k0: f64,
        alpha: f64,
        charge_number: i32,
    ) -> Result<Self> {
        ensure_finite("log10 k0", log_k0)?;
        Self::new(loading, formal_potential, 10f64.powf(log_k0), alpha, charge_number)
    }

    pub fn validate(&self) -> Result<()> {
        ensure_positive("loading", self.loading)?;
        ensure_finite("formal potential", self.formal_potential)?;
        ensure_positive("rate constant", self.rate_constant)?;
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(RedoxError::InvalidParameter(format!(
                "transfer coefficient must lie in (0, 1) (got {})",
                self.alpha
            )));
        }
        if self.charge_number == 0 {
            return Err(RedoxError::InvalidParameter(
                "charge number must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn loading(&self) -> f64 {
        self.loading
    }

    pub fn formal_potential(&self) -> f64 {
        self.formal_potential
    }

    pub fn rate_constant(&self) -> f64 {
        self.rate_constant
    }

    pub fn log_rate_constant(&self) -> f64 {
        self.rate_constant.log10()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn charge_number(&self) -> i32 {
        self.charge_number
    }
}

// =================================================================================================
// Population set
// =================================================================================================

/// Non-empty ordered list of populations.
#[derive(Clone, Debug, PartialEq)]
pub struct PopulationSet {
    populations: Vec<SitePopulation>,
}

impl PopulationSet {
    pub fn new(populations: Vec<SitePopulation>) -> Result<Self> {
        if populations.is_empty() {
            return Err(RedoxError::InvalidParameter(
                "a population set needs at least one population".to_string(),
            ));
        }
        Ok(Self { populations })
    }

    /// Build from parallel arrays, the layout produced by the surface layer
    /// model. All slices must have the same length.
    pub fn from_arrays(
        loadings: &[f64],
        rate_constants: &[f64],
        formal_potentials: &[f64],
        alphas: &[f64],
        charge_numbers: &[i32],
    ) -> Result<Self> {
        let expected = loadings.len();
        let lengths = [
            ("rate constants", rate_constants.len()),
            ("formal potentials", formal_potentials.len()),
            ("transfer coefficients", alphas.len()),
            ("charge numbers", charge_numbers.len()),
        ];
        for (what, actual) in lengths {
            if actual != expected {
                return Err(RedoxError::LengthMismatch { what, expected, actual });
            }
        }

        let populations = (0..expected)
            .map(|i| {
                SitePopulation::new(
                    loadings[i],
                    formal_potentials[i],
                    rate_constants[i],
                    alphas[i],
                    charge_numbers[i],
                )
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(populations)
    }

    pub fn single(population: SitePopulation) -> Self {
        Self { populations: vec![population] }
    }

    pub fn len(&self) -> usize {
        self.populations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.populations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SitePopulation> {
        self.populations.iter()
    }

    pub fn as_slice(&self) -> &[SitePopulation] {
        &self.populations
    }

    /// Sum of all loadings (mol·cm⁻²).
    pub fn total_loading(&self) -> f64 {
        self.populations.iter().map(SitePopulation::loading).sum()
    }
}

impl<'a> IntoIterator for &'a PopulationSet {
    type Item = &'a SitePopulation;
    type IntoIter = std::slice::Iter<'a, SitePopulation>;

    fn into_iter(self) -> Self::IntoIter {
        self.populations.iter()
    }
}
