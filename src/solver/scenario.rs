//! Integration scenario
//!
//! A scenario bundles everything one integrator call reads: the site
//! populations, the applied potential, its RC-filtered version and the
//! uncompensated resistance. It only borrows them; the caller keeps
//! ownership for the duration of the call.

use crate::error::{RedoxError, Result};
use crate::physics::{PopulationSet, PotentialSequence};

/// Inputs of one integrator call (the "WHAT to integrate").
///
/// Construction validates the index alignment of the two sequences so that
/// integrators never see mismatched buffers.
///
/// # Example
///
/// ```rust
/// use redox_rs::physics::{PopulationSet, PotentialSequence, SitePopulation};
/// use redox_rs::solver::{apply_rc, Scenario};
///
/// let populations = PopulationSet::single(SitePopulation::new(1e-10, 0.0, 100.0, 0.5, 1).unwrap());
/// let applied = PotentialSequence::from_vec(vec![0.2, 0.1, 0.0, -0.1, -0.2], 1e-2).unwrap();
/// let filtered = apply_rc(50.0, 1e-5, 1e-2, &applied).unwrap();
///
/// let scenario = Scenario::new(&populations, &applied, &filtered, 50.0).unwrap();
/// assert_eq!(scenario.len(), 5);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Scenario<'a> {
    populations: &'a PopulationSet,
    applied: &'a PotentialSequence,
    filtered: &'a PotentialSequence,
    resistance: f64,
}

impl<'a> Scenario<'a> {
    pub fn new(
        populations: &'a PopulationSet,
        applied: &'a PotentialSequence,
        filtered: &'a PotentialSequence,
        resistance: f64,
    ) -> Result<Self> {
        let scenario = Self { populations, applied, filtered, resistance };
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check resistance and sequence alignment.
    pub fn validate(&self) -> Result<()> {
        if !self.resistance.is_finite() || self.resistance < 0.0 {
            return Err(RedoxError::InvalidParameter(format!(
                "resistance must be finite and non-negative (got {})",
                self.resistance
            )));
        }
        if self.filtered.len() != self.applied.len() {
            return Err(RedoxError::LengthMismatch {
                what: "filtered sequence",
                expected: self.applied.len(),
                actual: self.filtered.len(),
            });
        }
        let dt = self.applied.time_increment();
        if (self.filtered.time_increment() - dt).abs() > 1e-12 * dt {
            return Err(RedoxError::InvalidParameter(format!(
                "applied and filtered sequences are sampled differently ({dt} vs {})",
                self.filtered.time_increment()
            )));
        }
        Ok(())
    }

    pub fn populations(&self) -> &'a PopulationSet {
        self.populations
    }

    /// Unfiltered potential program.
    pub fn applied(&self) -> &'a PotentialSequence {
        self.applied
    }

    /// RC-filtered potential, the starting point of the working potential.
    pub fn filtered(&self) -> &'a PotentialSequence {
        self.filtered
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    pub fn time_increment(&self) -> f64 {
        self.applied.time_increment()
    }

    pub fn len(&self) -> usize {
        self.applied.len()
    }

    pub fn is_empty(&self) -> bool {
        self.applied.is_empty()
    }
}

// ================================================================================================
// Tests
// ================================================================================================
