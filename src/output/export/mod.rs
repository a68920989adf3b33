//! Export of simulation results.
//!
//! The [`Exporter`] trait abstracts the file format; each format lives in
//! its own sub-module. Only CSV exists today.
//!
//! ```rust,ignore
//! use redox_rs::output::export::{CsvExporter, Exporter};
//!
//! let exporter = CsvExporter::default();
//!
//! // every sample of a CV
//! exporter.export_voltammogram(&cv, None, Path::new("cv.csv"))?;
//! // 500 rows, first and last included
//! exporter.export_voltammogram(&cv, Some(500), Path::new("cv_light.csv"))?;
//! // VF-SWV map in long format
//! exporter.export_vfswv(&map, Path::new("vfswv.csv"))?;
//! ```

pub mod csv;

pub use csv::{downsample_indices, export_columns_csv, CsvConfig, CsvExporter, CsvMetadata};

use std::path::Path;

use crate::experiment::{SwvResponse, VfSwvMap, Voltammogram};

/// Abstraction over export formats.
///
/// # Parameter `n_points`
///
/// - `None`: every time step is written
/// - `Some(n)`: `n` evenly spaced rows, always including the first and the
///   last one
pub trait Exporter {
    /// Error type specific to this format.
    type Error: std::error::Error;

    /// Time-domain response: clock, potentials and currents.
    fn export_voltammogram(
        &self,
        voltammogram: &Voltammogram,
        n_points: Option<usize>,
        path: &Path,
    ) -> Result<(), Self::Error>;

    /// Sampled SWV curve: potential scale, forward, backward and differential current.
    fn export_swv(&self, response: &SwvResponse, path: &Path) -> Result<(), Self::Error>;

    /// VF-SWV charge map.
    fn export_vfswv(&self, map: &VfSwvMap, path: &Path) -> Result<(), Self::Error>;
}
