//! Common fixtures for integration tests

#![allow(dead_code)]

use nalgebra::DVector;
use redox_rs::physics::{PopulationSet, PotentialSequence, SitePopulation};
use redox_rs::solver::{Integrator, Scenario};
use redox_rs::waveform::{CyclicSweep, Waveform};

/// Reductive CV sweep, `e_start → e_end → e_start`.
pub fn cv_sequence(e_start: f64, e_end: f64, scan_rate: f64, points_per_volt: f64) -> PotentialSequence {
    CyclicSweep::new(e_start, e_end, scan_rate)
        .with_points_per_volt(points_per_volt)
        .sequence()
        .unwrap()
}

/// One population with α = 0.5, z = 1.
pub fn single_population(loading: f64, e0: f64, k0: f64) -> PopulationSet {
    PopulationSet::single(SitePopulation::new(loading, e0, k0, 0.5, 1).unwrap())
}

/// `n` populations spread evenly over ±0.2 V with rate constants 1..1000 s⁻¹.
pub fn spread_populations(n: usize) -> PopulationSet {
    let populations = (0..n)
        .map(|i| {
            let t = if n > 1 { i as f64 / (n - 1) as f64 } else { 0.5 };
            SitePopulation::from_log_k0(1e-11, -0.2 + 0.4 * t, 3.0 * t, 0.3 + 0.4 * t, 1 + (i % 2) as i32)
                .unwrap()
        })
        .collect();
    PopulationSet::new(populations).unwrap()
}

/// Integrate without RC filtering (`filtered == applied`).
pub fn run_unfiltered(
    integrator: &dyn Integrator,
    populations: &PopulationSet,
    applied: &PotentialSequence,
    resistance: f64,
) -> DVector<f64> {
    let scenario = Scenario::new(populations, applied, applied, resistance).unwrap();
    integrator.integrate(&scenario).unwrap().current.into_values()
}

/// `max |actual − expected| / max |expected|`
pub fn relative_max_error(actual: &DVector<f64>, expected: &DVector<f64>) -> f64 {
    assert_eq!(actual.len(), expected.len(), "trace lengths differ");
    (actual - expected).amax() / expected.amax()
}
