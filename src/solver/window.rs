//! Active-window search.
//!
//! Far from its formal potential a population sits in one redox state and
//! follows the potential instantly: it carries no current. Only the index
//! range between the first and the last *non-dormant* sample needs to be
//! integrated.
//!
//! A sample is dormant when both hold:
//!
//! - the reaction holding the majority state is fast. For an oxidised
//!   majority this is the oxidation rate (`ln 2 / k_f ≤ b · Δt · (1-α)`),
//!   for a reduced majority the reduction rate (`ln 2 / k_b ≤ b · Δt · α`),
//!   with `b` the benchmark factor;
//! - the minority equilibrium fraction is at most the saturation tolerance.
//!
//! On a reductive sweep the start of the sequence is oxidised and the end
//! (after the return sweep) is oxidised again, on an oxidative sweep both
//! ends are reduced. Testing the majority state therefore applies the α or
//! 1-α scaling that matches the scan direction at each end.
//!
//! After the last non-dormant sample the population may still be relaxing,
//! so the window is extended by the number of benchmark half-lives needed
//! to shrink a full deviation below the tolerance.

use crate::physics::LN_2;
use crate::solver::kinetics::RateTable;
use crate::solver::traits::WindowSettings;

/// Index range a population has to be integrated over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveWindow {
    /// Integrate samples `first..=last`.
    Active { first: usize, last: usize },
    /// Dormant everywhere: zero current.
    Inactive,
}

impl ActiveWindow {
    pub fn is_active(&self) -> bool {
        matches!(self, ActiveWindow::Active { .. })
    }

    /// Number of steps integrated (`last - first`), zero when inactive.
    pub fn steps(&self) -> usize {
        match *self {
            ActiveWindow::Active { first, last } => last - first,
            ActiveWindow::Inactive => 0,
        }
    }
}

fn is_dormant(rates: &RateTable, j: usize, alpha: f64, benchmark: f64, tolerance: f64) -> bool {
    let reduced = rates.reduced_fraction[j];
    if reduced < 0.5 {
        LN_2 / rates.forward[j] <= benchmark * (1.0 - alpha) && reduced <= tolerance
    } else {
        LN_2 / rates.backward[j] <= benchmark * alpha && 1.0 - reduced <= tolerance
    }
}

/// Samples needed for a half-life of `benchmark_factor` steps to reduce a
/// unit deviation below `tolerance`.
fn relaxation_tail(settings: &WindowSettings, len: usize) -> usize {
    if settings.saturation_tolerance <= 0.0 {
        return len;
    }
    let halvings = (1.0 / settings.saturation_tolerance).log2();
    let tail = (settings.benchmark_factor * halvings).ceil();
    if tail >= len as f64 { len } else { tail as usize }
}

/// Locate the active window of one population.
///
/// With windowing disabled the whole sequence is returned.
pub fn find_active_window(
    rates: &RateTable,
    alpha: f64,
    time_increment: f64,
    settings: &WindowSettings,
) -> ActiveWindow {
    let len = rates.len();
    if len == 0 {
        return ActiveWindow::Inactive;
    }
    if !settings.enabled {
        return ActiveWindow::Active { first: 0, last: len - 1 };
    }

    let benchmark = settings.benchmark_factor * time_increment;
    let tolerance = settings.saturation_tolerance;
    let dormant = |j: usize| is_dormant(rates, j, alpha, benchmark, tolerance);

    let Some(first) = (0..len).find(|&j| !dormant(j)) else {
        return ActiveWindow::Inactive;
    };
    let last = (first..len).rev().find(|&j| !dormant(j)).unwrap_or(first);
    let last = last.saturating_add(relaxation_tail(settings, len)).min(len - 1);

    ActiveWindow::Active { first, last }
}
