//! Surface layer model
//!
//! A redox-active film rarely behaves like one ideal couple: formal
//! potentials and rate constants are spread by the local environment of
//! each site. The layer is therefore described as a sum of components,
//! each a bell-shaped distribution over E0 (Lorentzian or normal) times a
//! normal distribution over log10 k0, scaled by the component loading.
//!
//! The model discretises every component on a shared (E0 × log k0) grid,
//! adds components that share a transfer coefficient and a charge number
//! into one group, and finally flattens the groups into the
//! [`PopulationSet`] consumed by the integrators, dropping grid cells whose
//! loading is below a cutoff.
//!
//! # Example
//!
//! ```rust
//! use redox_rs::layer::{DistributionKind, LayerComponent, LayerGrid, SurfaceLayer};
//!
//! let grid = LayerGrid::new(15, (-0.4, 0.0), 5, (0.0, 2.0));
//! let component = LayerComponent {
//!     distribution: DistributionKind::Lorentzian,
//!     loading: 3.5e-11,
//!     e0: -0.2,
//!     sigma_e0: 0.04,
//!     log_k0: 1.2,
//!     sigma_log_k0: 0.1,
//!     alpha: 0.5,
//!     charge_number: 1,
//! };
//!
//! let layer = SurfaceLayer::build(grid, &[component]).unwrap();
//! let populations = layer.populations().unwrap();
//! assert!(populations.len() <= 15 * 5);
//! ```

pub mod distribution;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, RedoxError, Result};
use crate::physics::{PopulationSet, SitePopulation};

pub use distribution::{bin_probabilities, linspace, DistributionKind};

/// Default loading (mol·cm⁻²) below which a grid cell is dropped.
pub const DEFAULT_LOADING_CUTOFF: f64 = 1e-13;

/// Default number of integration sub-samples per grid bin.
pub const DEFAULT_INTEGRATION_BOOST: usize = 1001;

// =================================================================================================
// Inputs
// =================================================================================================

/// One statistically distributed redox couple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerComponent {
    /// Shape of the distribution along E0 (log k0 is always normal).
    pub distribution: DistributionKind,
    /// Total loading Γ of the component, mol·cm⁻²
    pub loading: f64,
    /// Most probable formal potential, V
    pub e0: f64,
    /// Width of the E0 distribution, V
    pub sigma_e0: f64,
    /// Most probable log10 k0
    pub log_k0: f64,
    /// Width of the log10 k0 distribution
    pub sigma_log_k0: f64,
    pub alpha: f64,
    pub charge_number: i32,
}

impl LayerComponent {
    pub fn validate(&self) -> Result<()> {
        ensure_positive("component loading", self.loading)?;
        ensure_finite("component E0", self.e0)?;
        ensure_positive("E0 distribution width", self.sigma_e0)?;
        ensure_finite("component log10 k0", self.log_k0)?;
        ensure_positive("log10 k0 distribution width", self.sigma_log_k0)?;
        if !(self.alpha > 0.0 && self.alpha < 1.0) {
            return Err(RedoxError::InvalidParameter(format!(
                "component transfer coefficient must lie in (0, 1) (got {})",
                self.alpha
            )));
        }
        if self.charge_number == 0 {
            return Err(RedoxError::InvalidParameter(
                "component charge number must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Discretisation grid shared by all components.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerGrid {
    /// Nodes along the E0 axis
    pub e_resolution: usize,
    /// (lower, upper) E0 bounds, V
    pub e_bounds: (f64, f64),
    /// Nodes along the log10 k0 axis
    pub log_k_resolution: usize,
    /// (lower, upper) log10 k0 bounds
    pub log_k_bounds: (f64, f64),
    #[serde(default = "default_loading_cutoff")]
    pub loading_cutoff: f64,
    #[serde(default = "default_integration_boost")]
    pub integration_boost: usize,
}

fn default_loading_cutoff() -> f64 {
    DEFAULT_LOADING_CUTOFF
}

fn default_integration_boost() -> usize {
    DEFAULT_INTEGRATION_BOOST
}

impl LayerGrid {
    pub fn new(
        e_resolution: usize,
        e_bounds: (f64, f64),
        log_k_resolution: usize,
        log_k_bounds: (f64, f64),
    ) -> Self {
        Self {
            e_resolution,
            e_bounds,
            log_k_resolution,
            log_k_bounds,
            loading_cutoff: DEFAULT_LOADING_CUTOFF,
            integration_boost: DEFAULT_INTEGRATION_BOOST,
        }
    }

    pub fn with_loading_cutoff(mut self, cutoff: f64) -> Self {
        self.loading_cutoff = cutoff;
        self
    }

    pub fn with_integration_boost(mut self, boost: usize) -> Self {
        self.integration_boost = boost;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.e_resolution < 2 || self.log_k_resolution < 2 {
            return Err(RedoxError::InvalidParameter(format!(
                "grid needs at least two nodes per axis (got {} x {})",
                self.e_resolution, self.log_k_resolution
            )));
        }
        for (name, (lower, upper)) in [("E0", self.e_bounds), ("log10 k0", self.log_k_bounds)] {
            if !lower.is_finite() || !upper.is_finite() || lower >= upper {
                return Err(RedoxError::InvalidParameter(format!(
                    "{name} bounds must be finite and increasing (got {lower}, {upper})"
                )));
            }
        }
        if !self.loading_cutoff.is_finite() || self.loading_cutoff < 0.0 {
            return Err(RedoxError::InvalidParameter(format!(
                "loading cutoff must be finite and non-negative (got {})",
                self.loading_cutoff
            )));
        }
        if self.integration_boost < 2 {
            return Err(RedoxError::InvalidParameter(
                "integration boost must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

// =================================================================================================
// Surface layer
// =================================================================================================

/// Components sharing α and z, summed on the grid.
#[derive(Clone, Debug, PartialEq)]
pub struct LayerGroup {
    pub alpha: f64,
    pub charge_number: i32,
    /// Loadings, rows along E0 and columns along log10 k0
    pub loadings: DMatrix<f64>,
}

/// Outcome of flattening the grid with the loading cutoff.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayerStatistics {
    /// Grid cells over all groups
    pub grid_cells: usize,
    /// Cells kept as populations
    pub retained_cells: usize,
    /// Loading on the grid, mol·cm⁻²
    pub grid_loading: f64,
    /// Loading kept, mol·cm⁻²
    pub retained_loading: f64,
}

impl LayerStatistics {
    pub fn size_reduction_percent(&self) -> f64 {
        if self.grid_cells == 0 {
            return 0.0;
        }
        100.0 * (1.0 - self.retained_cells as f64 / self.grid_cells as f64)
    }

    pub fn loading_loss_percent(&self) -> f64 {
        if self.grid_loading <= 0.0 {
            return 0.0;
        }
        100.0 * (1.0 - self.retained_loading / self.grid_loading)
    }
}

/// Discretised surface layer.
#[derive(Clone, Debug)]
pub struct SurfaceLayer {
    grid: LayerGrid,
    e_axis: DVector<f64>,
    log_k_axis: DVector<f64>,
    groups: Vec<LayerGroup>,
}

impl SurfaceLayer {
    /// Discretise `components` on `grid`.
    ///
    /// # Errors
    ///
    /// `InvalidParameter` for an invalid grid, an empty component list or an
    /// invalid component.
    pub fn build(grid: LayerGrid, components: &[LayerComponent]) -> Result<Self> {
        grid.validate()?;
        if components.is_empty() {
            return Err(RedoxError::InvalidParameter(
                "a surface layer needs at least one component".to_string(),
            ));
        }
        for component in components {
            component.validate()?;
        }

        let e_axis = linspace(grid.e_bounds.0, grid.e_bounds.1, grid.e_resolution);
        let log_k_axis = linspace(grid.log_k_bounds.0, grid.log_k_bounds.1, grid.log_k_resolution);
        let mut groups: Vec<LayerGroup> = Vec::new();

        for component in components {
            let p_e = bin_probabilities(
                component.distribution,
                &e_axis,
                component.e0,
                component.sigma_e0,
                grid.integration_boost,
            )?;
            let p_k = bin_probabilities(
                DistributionKind::Normal,
                &log_k_axis,
                component.log_k0,
                component.sigma_log_k0,
                grid.integration_boost,
            )?;
            let loadings = (p_e * p_k.transpose()) * component.loading;

            match groups
                .iter_mut()
                .find(|g| g.alpha == component.alpha && g.charge_number == component.charge_number)
            {
                Some(group) => group.loadings += loadings,
                None => groups.push(LayerGroup {
                    alpha: component.alpha,
                    charge_number: component.charge_number,
                    loadings,
                }),
            }
        }

        Ok(Self { grid, e_axis, log_k_axis, groups })
    }

    pub fn grid(&self) -> &LayerGrid {
        &self.grid
    }

    pub fn groups(&self) -> &[LayerGroup] {
        &self.groups
    }

    /// E0 node values, V.
    pub fn e_axis(&self) -> &DVector<f64> {
        &self.e_axis
    }

    /// log10 k0 node values.
    pub fn log_k_axis(&self) -> &DVector<f64> {
        &self.log_k_axis
    }

    /// Loading on the grid, before the cutoff.
    pub fn grid_loading(&self) -> f64 {
        self.groups.iter().map(|g| g.loadings.sum()).sum()
    }

    fn retained(&self) -> impl Iterator<Item = (&LayerGroup, usize, usize, f64)> + '_ {
        let cutoff = self.grid.loading_cutoff;
        self.groups.iter().flat_map(move |group| {
            let (rows, cols) = group.loadings.shape();
            (0..rows).flat_map(move |i| (0..cols).map(move |j| (group, i, j, group.loadings[(i, j)])))
        })
        .filter(move |&(_, _, _, loading)| loading >= cutoff && loading > 0.0)
    }

    pub fn statistics(&self) -> LayerStatistics {
        let (retained_cells, retained_loading) =
            self.retained().fold((0, 0.0), |(n, total), (_, _, _, g)| (n + 1, total + g));
        LayerStatistics {
            grid_cells: self.groups.iter().map(|g| g.loadings.len()).sum(),
            retained_cells,
            grid_loading: self.grid_loading(),
            retained_loading,
        }
    }

    /// Flatten the grid into populations, group by group, E0-major.
    ///
    /// Cells below the loading cutoff are dropped; the compression is logged
    /// at `info` level.
    pub fn populations(&self) -> Result<PopulationSet> {
        let populations = self
            .retained()
            .map(|(group, i, j, loading)| {
                SitePopulation::from_log_k0(
                    loading,
                    self.e_axis[i],
                    self.log_k_axis[j],
                    group.alpha,
                    group.charge_number,
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let stats = self.statistics();
        log::info!(
            "Surface layer: matrix size reduced by {:.0}%, loading lost to the cutoff {:.3}%, \
             loading passed to computation {:e} mol/cm2",
            stats.size_reduction_percent(),
            stats.loading_loss_percent(),
            stats.retained_loading
        );

        if populations.is_empty() {
            return Err(RedoxError::InvalidParameter(format!(
                "every grid cell is below the loading cutoff {:e}",
                self.grid.loading_cutoff
            )));
        }
        PopulationSet::new(populations)
    }
}
