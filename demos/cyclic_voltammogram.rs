//! Example: Ferrocene-Terminated Monolayer - Cyclic Voltammetry vs Scan Rate
//!
//! Simulates the CV of a ferrocene-terminated alkanethiol monolayer on gold
//! at increasing scan rates and compares the packet integrator with the
//! reversible reference.
//!
//! **Physical System**:
//! - Layer: single couple, E0 = 0.20 V, k0 = 50 s⁻¹, α = 0.5
//! - Loading: Γ = 4.5·10⁻¹⁰ mol/cm² (close to a full monolayer)
//! - Cell: Ru = 15 Ω, Cdl = 2 µF
//!
//! **What to look for**:
//! - the peak separation grows with the scan rate (finite kinetics)
//! - the Nernstian peaks stay at E0 whatever the scan rate
//! - the capacitive background scales with the scan rate

use redox_rs::{
    experiment::{CvParameters, CyclicVoltammetry, Voltammogram},
    output::export::{CsvConfig, CsvExporter, CsvMetadata, Exporter},
    physics::{PopulationSet, SitePopulation},
    solver::{Integrator, NernstianIntegrator, PacketIntegrator},
};

use std::time::Instant;

/// (potential at the cathodic peak, potential at the anodic peak)
fn peak_potentials(cv: &Voltammogram) -> (f64, f64) {
    let faradaic = cv.faradaic();
    let corrected = cv.corrected.as_ref().unwrap_or(&cv.applied);
    let cathodic = faradaic.imin();
    let anodic = faradaic.imax();
    (corrected.as_slice()[cathodic], corrected.as_slice()[anodic])
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("═══════════════════════════════════════════════════════");
    println!("  Ferrocene Monolayer - CV Scan Rate Study");
    println!("═══════════════════════════════════════════════════════\n");

    // ====== Layer ======

    let populations = PopulationSet::single(SitePopulation::new(4.5e-10, 0.20, 50.0, 0.5, 1)?);

    let integrators: Vec<(&str, Box<dyn Integrator>)> = vec![
        ("Packet", Box::new(PacketIntegrator::new())),
        ("Nernstian", Box::new(NernstianIntegrator::new())),
    ];

    let scan_rates = [0.1, 1.0, 10.0, 100.0];
    let tmp_dir = std::env::temp_dir();

    println!(
        "{:<10} {:>10} {:>12} {:>12} {:>10} {:>8}",
        "Method", "v (V/s)", "Epc (V)", "Epa (V)", "ΔEp (mV)", "t (s)"
    );
    println!("{:-<68}", "");

    for (name, integrator) in &integrators {
        for &scan_rate in &scan_rates {
            let parameters = CvParameters {
                e_start: 0.6,
                e_end: -0.2,
                scan_rate,
                resistance: 15.0,
                capacitance: 2e-6,
                points_per_volt: 20_000.0,
            };

            let start = Instant::now();
            let cv = CyclicVoltammetry::new(parameters).simulate(Some(&populations), integrator.as_ref())?;
            let elapsed = start.elapsed().as_secs_f64();

            let (cathodic, anodic) = peak_potentials(&cv);
            println!(
                "{:<10} {:>10} {:>12.4} {:>12.4} {:>10.1} {:>8.2}",
                name,
                scan_rate,
                cathodic,
                anodic,
                1e3 * (anodic - cathodic),
                elapsed
            );

            // ====== Export ======

            let metadata = CsvMetadata::for_technique("CV")
                .with_integrator(integrator.name())
                .with_cell(15.0, 2e-6);
            let exporter = CsvExporter::new(CsvConfig::default().with_metadata(metadata));
            let path = tmp_dir.join(format!("cv_{}_{}.csv", name.to_lowercase(), scan_rate));
            exporter.export_voltammogram(&cv, Some(2000), &path)?;
        }
    }

    println!("\nCSV files written to {}", tmp_dir.display());
    Ok(())
}
