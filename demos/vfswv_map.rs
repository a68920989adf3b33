//! Example: Protein Film - Variable-Frequency Square-Wave Voltammetry
//!
//! Builds a heterogeneous redox layer (two components with distributed
//! formal potentials and rate constants), records a VF-SWV map and reports
//! where the charge extremum sits in the (frequency, potential) plane.
//!
//! ## Structure
//!
//! **Phase 1 - Layer**
//! - heme-like component: Lorentzian E0 spread, fast kinetics
//! - minor component: normal E0 spread, slow kinetics
//!
//! **Phase 2 - Map** (frequencies from 10 kHz down to 1 Hz)
//!
//! **Phase 3 - Analysis**
//! - charge extremum and its frequency
//! - peak charge per frequency
//!
//! Build with `--features parallel` to spread the frequencies over threads.

use redox_rs::{
    experiment::{VariableFrequencySwv, VfSwvParameters},
    layer::{DistributionKind, LayerComponent, LayerGrid, SurfaceLayer},
    output::export::{CsvExporter, Exporter},
    solver::PacketIntegrator,
};

use std::time::Instant;

/// Prints a titled section banner to stdout.
fn print_section(title: &str) {
    println!("\n═══════════════════════════════════════════════════════");
    println!("  {title}");
    println!("═══════════════════════════════════════════════════════\n");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // =============================================================================================
    // Phase 1 - Layer
    // =============================================================================================

    print_section("Phase 1 - Surface Layer");

    let components = [
        LayerComponent {
            distribution: DistributionKind::Lorentzian,
            loading: 2e-11,
            e0: -0.15,
            sigma_e0: 0.03,
            log_k0: 2.5,
            sigma_log_k0: 0.2,
            alpha: 0.5,
            charge_number: 1,
        },
        LayerComponent {
            distribution: DistributionKind::Normal,
            loading: 5e-12,
            e0: 0.05,
            sigma_e0: 0.04,
            log_k0: 0.5,
            sigma_log_k0: 0.3,
            alpha: 0.4,
            charge_number: 1,
        },
    ];
    let grid = LayerGrid::new(25, (-0.35, 0.25), 7, (-0.5, 3.5)).with_loading_cutoff(1e-14);
    let layer = SurfaceLayer::build(grid, &components)?;
    let statistics = layer.statistics();
    let populations = layer.populations()?;

    println!("  Grid cells      : {}", statistics.grid_cells);
    println!("  Populations     : {}", populations.len());
    println!("  Size reduction  : {:.1} %", statistics.size_reduction_percent());
    println!("  Loading lost    : {:.3} %", statistics.loading_loss_percent());

    // =============================================================================================
    // Phase 2 - Map
    // =============================================================================================

    print_section("Phase 2 - VF-SWV Map");

    let parameters = VfSwvParameters {
        e_start: 0.3,
        e_end: -0.4,
        e_step: -0.005,
        amplitude: 0.025,
        log_frequency_min: 0.0,
        log_frequency_max: 4.0,
        resistance: 30.0,
        capacitance: 5e-7,
        points_per_pulse: 50,
        frequency_resolution: 21,
        sampling_fraction: 0.1,
    };

    let start = Instant::now();
    let map = VariableFrequencySwv::new(parameters).simulate(Some(&populations), &PacketIntegrator::new())?;
    println!(
        "  {} frequencies × {} potentials in {:.2} s",
        map.frequency_count(),
        map.potential_count(),
        start.elapsed().as_secs_f64()
    );

    // =============================================================================================
    // Phase 3 - Analysis
    // =============================================================================================

    print_section("Phase 3 - Analysis");

    let (log_f, potential, charge) = map.extremum();
    println!("  Extremum: {charge:.3e} C at E = {potential:.3} V, f = {:.1} Hz\n", 10f64.powf(log_f));

    println!("{:>12} {:>14} {:>10}", "f (Hz)", "|q|max (C)", "E (V)");
    println!("{:-<38}", "");
    for (row, log_f) in map.log_frequencies.iter().enumerate() {
        let charges = map.charge.row(row);
        let column = charges.iamax_full().1;
        println!(
            "{:>12.1} {:>14.3e} {:>10.3}",
            10f64.powf(*log_f),
            charges[column].abs(),
            map.potential_scale[column]
        );
    }

    let path = std::env::temp_dir().join("vfswv_map.csv");
    CsvExporter::default().export_vfswv(&map, &path)?;
    println!("\nMap written to {}", path.display());

    Ok(())
}
