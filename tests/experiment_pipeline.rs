//! End-to-end tests: experiment description → surface layer → assemblers → CSV.

use std::fs;

use redox_rs::config::ExperimentConfig;
use redox_rs::experiment::{CyclicVoltammetry, SquareWaveVoltammetry, VariableFrequencySwv};
use redox_rs::output::export::{CsvExporter, Exporter};

const DESCRIPTION: &str = r#"
[integrator]
method = "packet"

[layer.grid]
e_resolution = 9
e_bounds = [-0.2, 0.2]
log_k_resolution = 3
log_k_bounds = [1.0, 2.0]
loading_cutoff = 1e-13
integration_boost = 101

[[layer.components]]
distribution = "normal"
loading = 2e-10
e0 = 0.0
sigma_e0 = 0.03
log_k0 = 1.5
sigma_log_k0 = 0.2
alpha = 0.5
charge_number = 1

[cv]
e_start = 0.3
e_end = -0.3
scan_rate = 1.0
resistance = 20.0
capacitance = 1e-6
points_per_volt = 1000.0

[swv]
e_start = 0.3
e_end = -0.3
e_step = -0.01
amplitude = 0.025
log_frequency = 1.0
resistance = 20.0
capacitance = 1e-6
points_per_pulse = 20

[vfswv]
e_start = 0.2
e_end = -0.2
e_step = -0.02
amplitude = 0.025
log_frequency_min = 0.0
log_frequency_max = 2.0
resistance = 20.0
capacitance = 1e-6
points_per_pulse = 10
frequency_resolution = 3
"#;

#[test]
fn test_description_runs_every_experiment() {
    let config = ExperimentConfig::from_toml_str(DESCRIPTION).unwrap();
    let populations = config.populations().unwrap().expect("layer section present");
    let integrator = config.integrator().unwrap();
    assert!(populations.total_loading() > 1.9e-10 && populations.total_loading() <= 2e-10);

    let cv = CyclicVoltammetry::new(config.cv.clone().unwrap())
        .simulate(Some(&populations), integrator.as_ref())
        .unwrap();
    let diagnostics = cv.diagnostics.as_ref().unwrap();
    assert_eq!(diagnostics.populations_processed, populations.len());
    assert!(cv.faradaic().min() < 0.0);

    let swv = SquareWaveVoltammetry::new(config.swv.clone().unwrap())
        .simulate(Some(&populations), integrator.as_ref())
        .unwrap();
    assert_eq!(swv.differential.len(), 61);
    assert!(swv.differential.min() < 0.0);

    let map = VariableFrequencySwv::new(config.vfswv.clone().unwrap())
        .simulate(Some(&populations), integrator.as_ref())
        .unwrap();
    assert_eq!(map.charge.shape(), (3, 21));
}

#[test]
fn test_blank_electrode_versus_layer() {
    let config = ExperimentConfig::from_toml_str(DESCRIPTION).unwrap();
    let populations = config.populations().unwrap().unwrap();
    let integrator = config.integrator().unwrap();
    let cv = CyclicVoltammetry::new(config.cv.clone().unwrap());

    let blank = cv.simulate(None, integrator.as_ref()).unwrap();
    let loaded = cv.simulate(Some(&populations), integrator.as_ref()).unwrap();

    assert_eq!(blank.capacitive, loaded.capacitive);
    assert!(blank.faradaic().amax() == 0.0);
    assert!(loaded.faradaic().amax() > 0.0);
}

#[test]
fn test_results_export_to_csv() {
    let config = ExperimentConfig::from_toml_str(DESCRIPTION).unwrap();
    let populations = config.populations().unwrap().unwrap();
    let integrator = config.integrator().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let exporter = CsvExporter::default();

    let cv = CyclicVoltammetry::new(config.cv.clone().unwrap())
        .simulate(Some(&populations), integrator.as_ref())
        .unwrap();
    let cv_path = dir.path().join("cv.csv");
    exporter.export_voltammogram(&cv, Some(100), &cv_path).unwrap();
    let content = fs::read_to_string(&cv_path).unwrap();
    assert!(content.starts_with("time_s,applied_V,filtered_V,corrected_V,capacitive_A,total_A\n"));
    assert_eq!(content.lines().count(), 101);

    let swv = SquareWaveVoltammetry::new(config.swv.clone().unwrap())
        .simulate(Some(&populations), integrator.as_ref())
        .unwrap();
    let swv_path = dir.path().join("swv.csv");
    exporter.export_swv(&swv, &swv_path).unwrap();
    assert_eq!(fs::read_to_string(&swv_path).unwrap().lines().count(), 62);
}
