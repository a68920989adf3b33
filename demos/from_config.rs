//! Example: Experiments From a TOML Description
//!
//! Runs every experiment declared in a description file and writes one CSV
//! per experiment next to the system temporary directory.
//!
//! ```bash
//! cargo run --example from_config -- demos/layer_experiment.toml
//! ```

use redox_rs::{
    config::ExperimentConfig,
    experiment::{CyclicVoltammetry, SquareWaveVoltammetry, VariableFrequencySwv},
    output::export::{CsvExporter, Exporter},
};

use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("demos/layer_experiment.toml"));

    let config = ExperimentConfig::from_file(&path)?;
    let integrator = config.integrator()?;
    let populations = config.populations()?;
    let exporter = CsvExporter::default();
    let out_dir = std::env::temp_dir();

    println!("Description : {}", path.display());
    println!("Integrator  : {}", integrator.name());
    match &populations {
        Some(populations) => println!(
            "Layer       : {} populations, Γ = {:.3e} mol/cm²",
            populations.len(),
            populations.total_loading()
        ),
        None => println!("Layer       : none (blank electrode)"),
    }
    println!();

    if let Some(parameters) = &config.cv {
        let cv = CyclicVoltammetry::new(parameters.clone()).simulate(populations.as_ref(), integrator.as_ref())?;
        let path = out_dir.join("cv.csv");
        exporter.export_voltammogram(&cv, Some(5000), &path)?;
        println!("CV     : {} samples → {}", cv.len(), path.display());
    }

    if let Some(parameters) = &config.swv {
        let swv = SquareWaveVoltammetry::new(parameters.clone())
            .simulate(populations.as_ref(), integrator.as_ref())?;
        let path = out_dir.join("swv.csv");
        exporter.export_swv(&swv, &path)?;
        println!("SWV    : {} periods → {}", swv.differential.len(), path.display());
    }

    if let Some(parameters) = &config.vfswv {
        let map = VariableFrequencySwv::new(parameters.clone())
            .simulate(populations.as_ref(), integrator.as_ref())?;
        let path = out_dir.join("vfswv.csv");
        exporter.export_vfswv(&map, &path)?;
        let (log_f, potential, charge) = map.extremum();
        println!(
            "VF-SWV : {}×{} map, extremum {charge:.3e} C at {potential:.3} V / 10^{log_f:.2} Hz → {}",
            map.frequency_count(),
            map.potential_count(),
            path.display()
        );
    }

    Ok(())
}
