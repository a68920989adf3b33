//! Butler–Volmer rate constants and per-step rate tables.
//!
//! For a population with formal potential E0, overpotential `η = V - E0`:
//!
//! ```text
//! k_f = k0 · exp( z·f·α·η)         (oxidation, Red → Ox)
//! k_b = k0 · exp(-z·f·(1-α)·η)     (reduction, Ox → Red)
//! ```
//!
//! with `f = F/RT`. Exponents are clamped to `±max_exponent` so that no
//! rate ever overflows; every clamp is counted. The equilibrium reduced
//! fraction `k_b / (k_f + k_b) = 1 / (1 + exp(z·f·η))` is evaluated in a
//! logistic form that is exact for any η, clamped or not.

use nalgebra::DVector;

use crate::physics::{PhysicalConstants, SitePopulation};

/// Rate law evaluated at a single potential.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButlerVolmer {
    f_over_rt: f64,
    max_exponent: f64,
}

/// Rates of one population at one potential.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StepRates {
    pub forward: f64,
    pub backward: f64,
    /// Equilibrium fraction of reduced sites.
    pub reduced_fraction: f64,
    /// At least one exponent hit the clamp.
    pub saturated: bool,
}

impl ButlerVolmer {
    pub fn new(constants: &PhysicalConstants, max_exponent: f64) -> Self {
        Self {
            f_over_rt: constants.f_over_rt(),
            max_exponent,
        }
    }

    pub fn f_over_rt(&self) -> f64 {
        self.f_over_rt
    }

    #[inline]
    fn clamp(&self, exponent: f64) -> (f64, bool) {
        if exponent > self.max_exponent {
            (self.max_exponent, true)
        } else if exponent < -self.max_exponent {
            (-self.max_exponent, true)
        } else {
            (exponent, false)
        }
    }

    /// Equilibrium reduced fraction `1 / (1 + exp(z·f·η))`.
    #[inline]
    pub fn reduced_fraction(&self, population: &SitePopulation, potential: f64) -> f64 {
        let x = population.charge_number() as f64
            * self.f_over_rt
            * (potential - population.formal_potential());
        logistic_complement(x)
    }

    #[inline]
    pub fn rates(&self, population: &SitePopulation, potential: f64) -> StepRates {
        let z_f_eta = population.charge_number() as f64
            * self.f_over_rt
            * (potential - population.formal_potential());
        let alpha = population.alpha();
        let k0 = population.rate_constant();

        let (forward_exp, forward_clamped) = self.clamp(z_f_eta * alpha);
        let (backward_exp, backward_clamped) = self.clamp(-z_f_eta * (1.0 - alpha));

        StepRates {
            forward: k0 * forward_exp.exp(),
            backward: k0 * backward_exp.exp(),
            reduced_fraction: logistic_complement(z_f_eta),
            saturated: forward_clamped || backward_clamped,
        }
    }
}

/// `1 / (1 + e^x)` without overflow for large |x|.
#[inline]
fn logistic_complement(x: f64) -> f64 {
    if x >= 0.0 {
        let e = (-x).exp();
        e / (1.0 + e)
    } else {
        1.0 / (1.0 + x.exp())
    }
}

// =================================================================================================
// Rate table
// =================================================================================================

/// Per-step kinetic state of one population along a potential sequence.
///
/// Lives for one population inside one integrator call and is refreshed
/// over the active window after every correction pass.
#[derive(Clone, Debug)]
pub struct RateTable {
    pub forward: DVector<f64>,
    pub backward: DVector<f64>,
    /// `k_f + k_b`
    pub sum: DVector<f64>,
    /// `k_b / (k_f + k_b)`, equilibrium reduced fraction
    pub reduced_fraction: DVector<f64>,
    /// Clamped evaluations since the table was created.
    pub saturated: u64,
}

impl RateTable {
    /// Evaluate rates at every sample of `potential`.
    pub fn evaluate(law: &ButlerVolmer, population: &SitePopulation, potential: &DVector<f64>) -> Self {
        let n = potential.len();
        let mut table = Self {
            forward: DVector::zeros(n),
            backward: DVector::zeros(n),
            sum: DVector::zeros(n),
            reduced_fraction: DVector::zeros(n),
            saturated: 0,
        };
        if n > 0 {
            table.refresh(law, population, potential, 0, n - 1);
        }
        table
    }

    /// Re-evaluate samples `first..=last` from an updated potential.
    pub fn refresh(
        &mut self,
        law: &ButlerVolmer,
        population: &SitePopulation,
        potential: &DVector<f64>,
        first: usize,
        last: usize,
    ) {
        for j in first..=last {
            let rates = law.rates(population, potential[j]);
            self.forward[j] = rates.forward;
            self.backward[j] = rates.backward;
            self.sum[j] = rates.forward + rates.backward;
            self.reduced_fraction[j] = rates.reduced_fraction;
            if rates.saturated {
                self.saturated += 1;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
