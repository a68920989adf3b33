//! Packet integrator with self-consistent iR correction
//!
//! # Kinetic model
//!
//! Each population of loading Γ is cut into an even number of equal packets.
//! Inside a packet of size Γ_p the reduced amount obeys
//!
//! ```text
//! dRed/dt = k_b · (Γ_p − Red) − k_f · Red
//! ```
//!
//! which over one step with constant rates has the closed form
//!
//! ```text
//! Red(t+Δt) = Γ_p·θ + (Red(t) − Γ_p·θ) · exp(−(k_f + k_b)·Δt),   θ = k_b / (k_f + k_b)
//! ```
//!
//! The packet starts in equilibrium with the first sample of the active
//! window, `Red = Γ_p · θ(first)`.
//!
//! # iR coupling
//!
//! Current through the uncompensated resistance lowers the potential seen by
//! the interface, which in turn changes the current. Packets are processed
//! in pairs against a working potential `V_avg` (initially the RC-filtered
//! potential):
//!
//! 1. **predictor**: integrate the packet on `V_avg`, write the strongly
//!    corrected potential `V_cor = V_avg − I·R`, refresh the rates on it;
//! 2. **corrector**: integrate again on `V_cor`, set
//!    `V_avg ← (V_avg + V_cor − I·R) / 2`, refresh the rates on it.
//!
//! A pair of packets of size `2Γ/packets` therefore removes the mean of both
//! pass currents times R from `V_avg`, and the pairs together account for
//! the full loading. Populations are processed sequentially: each sees the
//! potential already lowered by the previous ones.
//!
//! Once every population is done the total current is recovered from Ohm's
//! law, `I = (V_applied − V_avg) / R`, which includes the capacitive current
//! `(V_applied − V_filtered) / R`.
//!
//! With `R = 0` there is nothing to correct: each population is integrated
//! once with its whole loading and the currents are summed directly.
//!
//! # Saturation
//!
//! The start-of-step current of a packet never exceeds its full relaxation
//! within the step, `z·F·|Red − Γ_p·θ| / Δt`. A clamped rate while the iR
//! correction is active fails with [`RedoxError::NumericInstability`]; with
//! `R = 0` clamps are only counted.
//!
//! # Example
//!
//! ```rust
//! use redox_rs::physics::{PopulationSet, SitePopulation};
//! use redox_rs::solver::{apply_rc, Integrator, PacketIntegrator, Scenario};
//! use redox_rs::waveform::{CyclicSweep, Waveform};
//!
//! let sweep = CyclicSweep::new(0.3, -0.3, 1.0).with_points_per_volt(2000.0);
//! let applied = sweep.sequence().unwrap();
//! let filtered = apply_rc(10.0, 2e-5, sweep.time_increment(), &applied).unwrap();
//! let populations = PopulationSet::single(SitePopulation::new(1e-10, 0.0, 100.0, 0.5, 1).unwrap());
//!
//! let scenario = Scenario::new(&populations, &applied, &filtered, 10.0).unwrap();
//! let result = PacketIntegrator::new().integrate(&scenario).unwrap();
//! assert_eq!(result.current.len(), applied.len());
//! ```

use nalgebra::DVector;

use crate::error::{RedoxError, Result};
use crate::physics::{CurrentTrace, PotentialSequence, SitePopulation};
use crate::solver::kinetics::{ButlerVolmer, RateTable};
use crate::solver::traits::{
    CurrentEvaluation, IntegrationDiagnostics, IntegrationResult, Integrator, KineticsConfiguration,
};
use crate::solver::window::{find_active_window, ActiveWindow};
use crate::solver::{validate_trace, Scenario};

/// Loadings are counted in nanomoles when sizing packets.
const NANOMOLE: f64 = 1e9;

/// Even number of packets a loading is cut into, at least 2.
///
/// ```rust
/// use redox_rs::solver::packet_count;
///
/// assert_eq!(packet_count(1e-10, 20.0), 2);
/// assert_eq!(packet_count(1.6e-10, 20.0), 4);
/// assert_eq!(packet_count(1e-9, 20.0), 20);
/// ```
pub fn packet_count(loading: f64, packets_per_nanomole: f64) -> usize {
    let exact = packets_per_nanomole * loading * NANOMOLE;
    // 20 × 0.1 nmol must give 2 packets, not 3
    let nearest = exact.round();
    let raw = if (exact - nearest).abs() < 1e-9 { nearest } else { exact.ceil() };
    let count = if raw.is_finite() && raw >= 1.0 { raw as usize } else { 1 };
    if count % 2 == 1 { count + 1 } else { count }
}

/// Clamped rates under iR coupling leave the working potential unphysical.
fn ensure_unsaturated(index: usize, rates: &RateTable) -> Result<()> {
    if rates.saturated == 0 {
        return Ok(());
    }
    Err(RedoxError::NumericInstability(format!(
        "population {index}: {} rate evaluations hit the exponent clamp during iR correction",
        rates.saturated
    )))
}

// =================================================================================================
// Packet integrator
// =================================================================================================

/// Windowed packet integrator with iR correction.
#[derive(Clone, Debug, Default)]
pub struct PacketIntegrator {
    configuration: KineticsConfiguration,
}

impl PacketIntegrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_configuration(configuration: KineticsConfiguration) -> Self {
        Self { configuration }
    }

    pub fn configuration(&self) -> &KineticsConfiguration {
        &self.configuration
    }

    /// Integrate one packet of size `loading` over `first..=last` and write
    /// its current into `current`.
    #[allow(clippy::too_many_arguments)]
    fn packet_pass(
        &self,
        rates: &RateTable,
        first: usize,
        last: usize,
        loading: f64,
        charge: f64,
        time_increment: f64,
        current: &mut DVector<f64>,
    ) {
        let mut reduced = loading * rates.reduced_fraction[first];
        current[first] = 0.0;

        for n in (first + 1)..=last {
            let equilibrium = loading * rates.reduced_fraction[n];
            let next = equilibrium + (reduced - equilibrium) * (-rates.sum[n] * time_increment).exp();

            current[n] = match self.configuration.current_evaluation {
                CurrentEvaluation::StepStart => {
                    let rate = charge * (reduced * rates.forward[n] - (loading - reduced) * rates.backward[n]);
                    // no more than the full relaxation to equilibrium within one step
                    let bound = charge * (reduced - equilibrium).abs() / time_increment;
                    rate.max(-bound).min(bound)
                }
                CurrentEvaluation::StepAverage => charge * (reduced - next) / time_increment,
            };
            reduced = next;
        }
    }

    fn note_work(&self, diagnostics: &mut IntegrationDiagnostics, work: u64) {
        diagnostics.steps_integrated += work;
        if !diagnostics.degraded && diagnostics.steps_integrated > self.configuration.work_warning_threshold {
            diagnostics.degraded = true;
            log::warn!(
                "Packet integration exceeded {} packet-steps; the active windows cover most of the \
                 sequence. Consider a coarser time step or fewer populations.",
                self.configuration.work_warning_threshold
            );
        }
    }

    /// Locate the window of one population, with bookkeeping.
    fn window_for(
        &self,
        index: usize,
        population: &SitePopulation,
        rates: &RateTable,
        scenario: &Scenario,
        diagnostics: &mut IntegrationDiagnostics,
    ) -> Option<(usize, usize)> {
        let window = find_active_window(
            rates,
            population.alpha(),
            scenario.time_increment(),
            &self.configuration.window,
        );
        match window {
            ActiveWindow::Inactive => {
                diagnostics.populations_skipped += 1;
                log::debug!("population {index}: no active window, skipped");
                None
            }
            ActiveWindow::Active { first, last } => {
                diagnostics.populations_processed += 1;
                if first == 0 && last + 1 == scenario.len() {
                    diagnostics.full_window_populations += 1;
                    log::debug!("population {index}: active over the whole sequence");
                } else {
                    log::debug!("population {index}: active window {first}..={last}");
                }
                Some((first, last))
            }
        }
    }
}

impl Integrator for PacketIntegrator {
    fn integrate(&self, scenario: &Scenario) -> Result<IntegrationResult> {
        self.configuration.validate()?;
        scenario.validate()?;

        let n = scenario.len();
        let dt = scenario.time_increment();
        let resistance = scenario.resistance();
        let law = ButlerVolmer::new(&self.configuration.constants, self.configuration.max_exponent);
        let faraday = self.configuration.constants.faraday;

        let mut averaged = scenario.filtered().values().clone();
        let mut corrected = averaged.clone();
        let mut faradaic = DVector::zeros(n);
        let mut packet_current = DVector::zeros(n);
        let mut diagnostics = IntegrationDiagnostics::default();

        for (index, population) in scenario.populations().iter().enumerate() {
            let mut rates = RateTable::evaluate(&law, population, &averaged);
            let Some((first, last)) = self.window_for(index, population, &rates, scenario, &mut diagnostics)
            else {
                diagnostics.saturated_rates += rates.saturated;
                continue;
            };
            if last == first {
                diagnostics.saturated_rates += rates.saturated;
                continue;
            }

            let charge = population.charge_number() as f64 * faraday;
            let steps = (last - first) as u64;

            if resistance == 0.0 {
                self.note_work(&mut diagnostics, steps);
                self.packet_pass(&rates, first, last, population.loading(), charge, dt, &mut packet_current);
                for m in (first + 1)..=last {
                    faradaic[m] += packet_current[m];
                }
                diagnostics.passes += 1;
                diagnostics.saturated_rates += rates.saturated;
                continue;
            }

            let packets = packet_count(population.loading(), self.configuration.packets_per_nanomole);
            let packet_loading = 2.0 * population.loading() / packets as f64;
            log::debug!("population {index}: {packets} packets of {packet_loading:e} mol/cm2");
            self.note_work(&mut diagnostics, steps * packets as u64);
            ensure_unsaturated(index, &rates)?;

            for _ in 0..packets / 2 {
                // predictor
                self.packet_pass(&rates, first, last, packet_loading, charge, dt, &mut packet_current);
                for m in (first + 1)..=last {
                    corrected[m] = averaged[m] - packet_current[m] * resistance;
                }
                rates.refresh(&law, population, &corrected, first, last);

                // corrector
                self.packet_pass(&rates, first, last, packet_loading, charge, dt, &mut packet_current);
                for m in (first + 1)..=last {
                    let strongly_corrected = corrected[m] - packet_current[m] * resistance;
                    averaged[m] = 0.5 * (strongly_corrected + averaged[m]);
                    corrected[m] = averaged[m];
                }
                rates.refresh(&law, population, &averaged, first, last);

                diagnostics.passes += 2;
                ensure_unsaturated(index, &rates)?;
            }
        }

        if diagnostics.saturated_rates > 0 {
            log::warn!(
                "{} rate evaluations hit the exponent clamp (|exponent| > {})",
                diagnostics.saturated_rates,
                self.configuration.max_exponent
            );
        }

        let total = if resistance == 0.0 {
            faradaic
        } else {
            (scenario.applied().values() - &averaged) / resistance
        };
        validate_trace(&total, "current")?;
        validate_trace(&averaged, "corrected potential")?;

        let corrected_potential = PotentialSequence::new(averaged, dt).map_err(|err| {
            RedoxError::NumericInstability(format!("corrected potential is unusable: {err}"))
        })?;

        Ok(IntegrationResult {
            current: CurrentTrace::new(total, dt)?,
            corrected_potential,
            diagnostics,
        })
    }

    fn name(&self) -> &str {
        "Packet integrator"
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::physics::{PhysicalConstants, PopulationSet};
    use crate::solver::apply_rc;
    use crate::solver::traits::WindowSettings;
    use crate::waveform::{CyclicSweep, Waveform};

    fn sweep() -> (PotentialSequence, f64) {
        let sweep = CyclicSweep::new(0.4, -0.4, 0.1).with_points_per_volt(1000.0);
        (sweep.sequence().unwrap(), sweep.time_increment())
    }

    fn single(loading: f64, k0: f64) -> PopulationSet {
        PopulationSet::single(SitePopulation::new(loading, 0.0, k0, 0.5, 1).unwrap())
    }

    #[test]
    fn test_packet_count_is_even() {
        assert_eq!(packet_count(1e-12, 20.0), 2);
        assert_eq!(packet_count(5e-11, 20.0), 2);
        assert_eq!(packet_count(1.5e-10, 20.0), 4);
        assert_eq!(packet_count(2e-10, 20.0), 4);
        for loading in [1e-11, 3.3e-10, 7.7e-10, 2.05e-9] {
            assert_eq!(packet_count(loading, 20.0) % 2, 0);
        }
    }

    #[test]
    fn test_zero_resistance_charge_balance() {
        let (applied, dt) = sweep();
        let pops = single(1e-10, 1e3);
        let scenario = Scenario::new(&pops, &applied, &applied, 0.0).unwrap();
        let configuration =
            KineticsConfiguration::default().with_current_evaluation(CurrentEvaluation::StepAverage);
        let result = PacketIntegrator::with_configuration(configuration)
            .integrate(&scenario)
            .unwrap();

        // reductive half: Γ·F reduced; oxidative half: Γ·F re-oxidised
        let turning = 800;
        let current = result.current.as_slice();
        let cathodic: f64 = current[..=turning].iter().sum::<f64>() * dt;
        let anodic: f64 = current[turning + 1..].iter().sum::<f64>() * dt;
        let expected = 1e-10 * PhysicalConstants::default().faraday;
        assert_relative_eq!(-cathodic, expected, max_relative = 1e-3);
        assert_relative_eq!(anodic, expected, max_relative = 1e-3);
        assert_eq!(result.corrected_potential, applied);
    }

    #[test]
    fn test_resistance_shifts_working_potential() {
        let (applied, dt) = sweep();
        let filtered = apply_rc(500.0, 1e-6, dt, &applied).unwrap();
        let pops = single(1e-10, 1e3);
        let scenario = Scenario::new(&pops, &applied, &filtered, 500.0).unwrap();
        let result = PacketIntegrator::new().integrate(&scenario).unwrap();

        assert_eq!(result.current.len(), applied.len());
        assert_eq!(result.diagnostics.populations_processed, 1);
        assert_eq!(result.diagnostics.passes, packet_count(1e-10, 20.0));

        // the faradaic part of the current is exactly the iR shift of the working potential;
        // a cathodic current raises the interfacial potential
        let shift = result.corrected_potential.values() - filtered.values();
        let current = result.current.values() - (applied.values() - filtered.values()) / 500.0;
        for i in 0..applied.len() {
            assert_relative_eq!(shift[i], -current[i] * 500.0, epsilon = 1e-12);
        }
        assert!(shift.max() > 0.0);
    }

    #[test]
    fn test_inactive_population_gives_capacitive_current_only() {
        let (applied, dt) = sweep();
        let filtered = apply_rc(100.0, 1e-5, dt, &applied).unwrap();
        let pops = PopulationSet::single(SitePopulation::new(1e-10, 3.0, 1e3, 0.5, 1).unwrap());
        let scenario = Scenario::new(&pops, &applied, &filtered, 100.0).unwrap();
        let result = PacketIntegrator::new().integrate(&scenario).unwrap();

        assert_eq!(result.diagnostics.populations_skipped, 1);
        let capacitive = (applied.values() - filtered.values()) / 100.0;
        assert_eq!(result.current.values(), &capacitive);
    }

    #[test]
    fn test_window_does_not_change_result_materially() {
        let (applied, _) = sweep();
        let pops = single(1e-10, 10.0);
        let scenario = Scenario::new(&pops, &applied, &applied, 0.0).unwrap();

        let windowed = PacketIntegrator::new().integrate(&scenario).unwrap();
        let full = PacketIntegrator::with_configuration(
            KineticsConfiguration::default().with_window(WindowSettings::disabled()),
        )
        .integrate(&scenario)
        .unwrap();

        let peak = full.current.values().amax();
        let diff = (windowed.current.values() - full.current.values()).amax();
        assert!(diff / peak < 1e-4, "relative difference {}", diff / peak);
        assert!(windowed.diagnostics.steps_integrated < full.diagnostics.steps_integrated);
    }

    #[test]
    fn test_fast_kinetics_under_resistance_stay_bounded() {
        // k0·Δt ≈ 0.5 with a heavy film: the start-of-step rate would overshoot equilibrium
        let sweep = CyclicSweep::new(0.5, -0.5, 10.0).with_points_per_volt(2000.0);
        let applied = sweep.sequence().unwrap();
        let dt = sweep.time_increment();
        let pops = single(2e-9, 1e4);
        let scenario = Scenario::new(&pops, &applied, &applied, 20.0).unwrap();

        match PacketIntegrator::new().integrate(&scenario) {
            Ok(result) => {
                // every packet moves at most its own charge per step
                let ceiling = PhysicalConstants::default().faraday * 2e-9 / dt;
                let peak = result.current.values().amax();
                assert!(peak <= ceiling * (1.0 + 1e-9), "peak {peak:e} above {ceiling:e}");
                assert_eq!(result.diagnostics.saturated_rates, 0);
            }
            Err(err) => assert!(matches!(err, RedoxError::NumericInstability(_)), "{err}"),
        }
    }

    #[test]
    fn test_step_start_matches_step_average_when_relaxation_is_complete() {
        // (k_f + k_b)·Δt ≥ 1e4: every step relaxes fully, both rules transfer the same charge
        let sweep = CyclicSweep::new(0.4, -0.4, 0.1).with_points_per_volt(2000.0);
        let applied = sweep.sequence().unwrap();
        let pops = single(1e-10, 1e6);
        let scenario = Scenario::new(&pops, &applied, &applied, 10.0).unwrap();

        let start = PacketIntegrator::new().integrate(&scenario).unwrap();
        let average = PacketIntegrator::with_configuration(
            KineticsConfiguration::default().with_current_evaluation(CurrentEvaluation::StepAverage),
        )
        .integrate(&scenario)
        .unwrap();

        let peak = average.current.values().amax();
        let diff = (start.current.values() - average.current.values()).amax();
        assert!(peak < 1e-3, "peak {peak:e}");
        assert!(diff / peak < 1e-6, "relative difference {}", diff / peak);
    }

    #[test]
    fn test_saturation_under_resistance_is_an_error() {
        let (applied, _) = sweep();
        let pops = single(1e-10, 100.0);
        let configuration = KineticsConfiguration {
            max_exponent: 1.0,
            window: WindowSettings::disabled(),
            ..KineticsConfiguration::default()
        };
        let integrator = PacketIntegrator::with_configuration(configuration);

        let coupled = Scenario::new(&pops, &applied, &applied, 50.0).unwrap();
        let err = integrator.integrate(&coupled).unwrap_err();
        assert!(matches!(err, RedoxError::NumericInstability(_)), "{err}");

        // without iR coupling the clamp is only reported
        let uncoupled = Scenario::new(&pops, &applied, &applied, 0.0).unwrap();
        let result = integrator.integrate(&uncoupled).unwrap();
        assert!(result.diagnostics.saturated_rates > 0);
        assert!(result.current.as_slice().iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_excessive_work_is_reported_not_fatal() {
        let (applied, dt) = sweep();
        let filtered = apply_rc(50.0, 1e-6, dt, &applied).unwrap();
        let pops = single(1e-10, 100.0);
        let scenario = Scenario::new(&pops, &applied, &filtered, 50.0).unwrap();

        let normal = PacketIntegrator::new().integrate(&scenario).unwrap();
        assert!(!normal.diagnostics.degraded);

        let configuration = KineticsConfiguration {
            work_warning_threshold: 10,
            ..KineticsConfiguration::default()
        };
        let strained = PacketIntegrator::with_configuration(configuration)
            .integrate(&scenario)
            .unwrap();
        assert!(strained.diagnostics.degraded);
        assert!(strained.diagnostics.steps_integrated > 10);
        assert_eq!(strained.current, normal.current);
    }

    #[test]
    fn test_populations_are_processed_in_order() {
        let (applied, dt) = sweep();
        let filtered = apply_rc(200.0, 1e-6, dt, &applied).unwrap();
        let pops = PopulationSet::new(vec![
            SitePopulation::new(1e-10, -0.1, 100.0, 0.5, 1).unwrap(),
            SitePopulation::new(1e-10, 0.1, 100.0, 0.5, 1).unwrap(),
        ])
        .unwrap();
        let scenario = Scenario::new(&pops, &applied, &filtered, 200.0).unwrap();
        let result = PacketIntegrator::new().integrate(&scenario).unwrap();

        assert_eq!(result.diagnostics.populations_processed, 2);
        assert_eq!(result.current.len(), applied.len());
        assert!(result.current.as_slice().iter().all(|v| v.is_finite()));
    }
}
