//! TOML experiment descriptions.
//!
//! One file describes the integrator settings, an optional surface layer and
//! any number of the three experiments:
//!
//! ```toml
//! [integrator]
//! method = "packet"
//! current_evaluation = "step_start"
//!
//! [integrator.constants]
//! temperature = 298.15
//!
//! [layer.grid]
//! e_resolution = 41
//! e_bounds = [-0.4, 0.4]
//! log_k_resolution = 11
//! log_k_bounds = [1.0, 3.0]
//!
//! [[layer.components]]
//! distribution = "normal"
//! loading = 1e-10
//! e0 = 0.0
//! sigma_e0 = 0.02
//! log_k0 = 2.0
//! sigma_log_k0 = 0.2
//! alpha = 0.5
//! charge_number = 1
//!
//! [cv]
//! e_start = 0.4
//! e_end = -0.4
//! scan_rate = 0.1
//! resistance = 10.0
//! capacitance = 1e-5
//! ```
//!
//! Every section is optional, but at least one experiment must be present.
//! Missing integrator keys take their defaults.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RedoxError, Result};
use crate::experiment::{CvParameters, SwvParameters, VfSwvParameters};
use crate::layer::{LayerComponent, LayerGrid, SurfaceLayer};
use crate::physics::PopulationSet;
use crate::solver::{Integrator, KineticsConfiguration, NernstianIntegrator, PacketIntegrator};

/// Which integrator an experiment file asks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegratorKind {
    /// Finite kinetics with iR correction
    #[default]
    Packet,
    /// Reversible (equilibrium) reference
    Nernstian,
}

/// `[integrator]` section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IntegratorSection {
    #[serde(default)]
    pub method: IntegratorKind,
    #[serde(flatten)]
    pub kinetics: KineticsConfiguration,
}

impl IntegratorSection {
    pub fn build(&self) -> Result<Box<dyn Integrator>> {
        self.kinetics.validate()?;
        let configuration = self.kinetics.clone();
        Ok(match self.method {
            IntegratorKind::Packet => Box::new(PacketIntegrator::with_configuration(configuration)),
            IntegratorKind::Nernstian => Box::new(NernstianIntegrator::with_configuration(configuration)),
        })
    }
}

/// `[layer]` section.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerSection {
    pub grid: LayerGrid,
    pub components: Vec<LayerComponent>,
}

impl LayerSection {
    pub fn build(&self) -> Result<SurfaceLayer> {
        SurfaceLayer::build(self.grid.clone(), &self.components)
    }
}

/// A complete experiment file.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentConfig {
    #[serde(default)]
    pub integrator: IntegratorSection,
    pub layer: Option<LayerSection>,
    pub cv: Option<CvParameters>,
    pub swv: Option<SwvParameters>,
    pub vfswv: Option<VfSwvParameters>,
}

impl ExperimentConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: ExperimentConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        log::debug!("loading experiment description from {}", path.display());
        Self::from_toml_str(&content)
    }

    /// Check every section that is present.
    pub fn validate(&self) -> Result<()> {
        self.integrator.kinetics.validate()?;
        if let Some(layer) = &self.layer {
            layer.grid.validate()?;
            for component in &layer.components {
                component.validate()?;
            }
        }
        if let Some(cv) = &self.cv {
            crate::waveform::Waveform::validate(&cv.sweep())?;
            cv.cell().validate()?;
        }
        if let Some(swv) = &self.swv {
            swv.validate()?;
        }
        if let Some(vfswv) = &self.vfswv {
            vfswv.validate()?;
        }
        if self.cv.is_none() && self.swv.is_none() && self.vfswv.is_none() {
            return Err(RedoxError::Config(
                "no experiment section ([cv], [swv] or [vfswv]) found".to_string(),
            ));
        }
        Ok(())
    }

    pub fn integrator(&self) -> Result<Box<dyn Integrator>> {
        self.integrator.build()
    }

    /// Populations of the configured layer, `None` for a blank electrode.
    pub fn populations(&self) -> Result<Option<PopulationSet>> {
        self.layer
            .as_ref()
            .map(|layer| layer.build()?.populations())
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::CurrentEvaluation;

    const FULL: &str = r#"
        [integrator]
        method = "nernstian"
        current_evaluation = "step_average"

        [integrator.constants]
        temperature = 298.15

        [layer.grid]
        e_resolution = 11
        e_bounds = [-0.2, 0.2]
        log_k_resolution = 3
        log_k_bounds = [1.0, 3.0]
        loading_cutoff = 1e-14

        [[layer.components]]
        distribution = "lorentzian"
        loading = 1e-10
        e0 = 0.0
        sigma_e0 = 0.03
        log_k0 = 2.0
        sigma_log_k0 = 0.5
        alpha = 0.5
        charge_number = 1

        [cv]
        e_start = 0.2
        e_end = -0.2
        scan_rate = 0.1
        resistance = 0.0
        capacitance = 0.0
        points_per_volt = 1000.0
    "#;

    #[test]
    fn test_full_description() {
        let config = ExperimentConfig::from_toml_str(FULL).unwrap();
        assert_eq!(config.integrator.method, IntegratorKind::Nernstian);
        assert_eq!(config.integrator.kinetics.current_evaluation, CurrentEvaluation::StepAverage);
        assert_eq!(config.integrator.kinetics.constants.temperature, 298.15);
        assert_eq!(config.integrator().unwrap().name(), NernstianIntegrator::new().name());

        let populations = config.populations().unwrap().unwrap();
        assert!(populations.len() <= 33);
        assert!(config.swv.is_none());
    }

    #[test]
    fn test_defaults_and_blank_electrode() {
        let config = ExperimentConfig::from_toml_str(
            "[swv]\ne_start = 0.2\ne_end = -0.2\ne_step = -0.01\namplitude = 0.02\n\
             log_frequency = 1.0\nresistance = 5.0\ncapacitance = 1e-5\n",
        )
        .unwrap();
        assert_eq!(config.integrator.method, IntegratorKind::Packet);
        assert_eq!(config.integrator.kinetics, KineticsConfiguration::default());
        assert!(config.populations().unwrap().is_none());
    }

    #[test]
    fn test_rejects_bad_descriptions() {
        // no experiment
        assert!(matches!(
            ExperimentConfig::from_toml_str("[integrator]\nmethod = \"packet\"\n"),
            Err(RedoxError::Config(_))
        ));
        // unknown distribution
        let bad = FULL.replace("\"lorentzian\"", "\"uniform\"");
        assert!(ExperimentConfig::from_toml_str(&bad).is_err());
        // negative scan rate
        let bad = FULL.replace("scan_rate = 0.1", "scan_rate = -0.1");
        assert!(matches!(
            ExperimentConfig::from_toml_str(&bad),
            Err(RedoxError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("experiment.toml");
        std::fs::write(&path, FULL).unwrap();
        let config = ExperimentConfig::from_file(&path).unwrap();
        assert!(config.cv.is_some());

        let missing = ExperimentConfig::from_file(dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(RedoxError::Io(_))));
    }
}
