//! CSV export of simulated voltammograms
//!
//! Plain delimited text readable by spreadsheets, pandas or MATLAB.
//!
//! # Features
//!
//! - **Metadata header**: optional `#` comment lines with the technique,
//!   integrator and parameters, stamped with the generation time
//! - **Formatting**: delimiter, decimal separator and precision
//! - **Downsampling**: keep `n` evenly spaced rows, first and last included
//! - **Validation**: empty data, mismatched columns, NaN and Inf are rejected
//!   before the file is created
//!
//! # Quick Examples
//!
//! ```rust,ignore
//! use redox_rs::output::export::{CsvConfig, CsvExporter, CsvMetadata, Exporter};
//!
//! let exporter = CsvExporter::new(
//!     CsvConfig::default().with_metadata(CsvMetadata::for_technique("Cyclic voltammetry")),
//! );
//! exporter.export_voltammogram(&cv, None, Path::new("cv.csv"))?;
//! ```
//!
//! **Output** (`cv.csv`):
//! ```csv
//! # Redox Layer Simulation Data
//! # Generated: 2026-10-18T09:12:44+00:00
//! # Technique: Cyclic voltammetry
//! #
//! time_s,applied_V,filtered_V,capacitive_A,total_A
//! 0.000000e0,4.000000e-1,4.000000e-1,0.000000e0,0.000000e0
//! ...
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use nalgebra::DVector;

use crate::error::{RedoxError, Result};
use crate::experiment::{SwvResponse, VfSwvMap, Voltammogram};
use crate::output::export::Exporter;

// =============================================================================
// Configuration Structures
// =============================================================================

/// Formatting of the exported file.
///
/// ```rust,ignore
/// let config = CsvConfig {
///     delimiter: ';',
///     precision: 10,
///     ..Default::default()
/// };
/// ```
#[derive(Clone, Debug)]
pub struct CsvConfig {
    /// Column delimiter (default: ',')
    pub delimiter: char,

    /// Decimal separator (default: '.')
    pub decimal_separator: char,

    /// Significant digits after the point, scientific notation (default: 6)
    pub precision: usize,

    /// Write the `#` header block (default: false)
    pub include_metadata: bool,

    pub metadata: Option<CsvMetadata>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            decimal_separator: '.',
            precision: 6,
            include_metadata: false,
            metadata: None,
        }
    }
}

impl CsvConfig {
    /// Semicolon-delimited with a decimal comma.
    pub fn european() -> Self {
        Self {
            delimiter: ';',
            decimal_separator: ',',
            ..Default::default()
        }
    }

    pub fn high_precision() -> Self {
        Self {
            precision: 12,
            ..Default::default()
        }
    }

    pub fn delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    pub fn precision(mut self, precision: usize) -> Self {
        self.precision = precision;
        self
    }

    pub fn with_metadata(mut self, metadata: CsvMetadata) -> Self {
        self.include_metadata = true;
        self.metadata = Some(metadata);
        self
    }

    fn validate(&self) -> Result<()> {
        if self.delimiter == self.decimal_separator {
            return Err(RedoxError::InvalidParameter(format!(
                "CSV delimiter and decimal separator are both '{}'",
                self.delimiter
            )));
        }
        Ok(())
    }
}

/// Header comments. Only fields that are set are written.
#[derive(Clone, Debug, Default)]
pub struct CsvMetadata {
    /// e.g. "Cyclic voltammetry"
    pub technique: Option<String>,

    /// e.g. "Packet integrator"
    pub integrator: Option<String>,

    pub resistance: Option<f64>,

    pub capacitance: Option<f64>,

    /// Additional `key: value` lines
    pub custom: Vec<(String, String)>,
}

impl CsvMetadata {
    pub fn for_technique(technique: &str) -> Self {
        Self {
            technique: Some(technique.to_string()),
            ..Default::default()
        }
    }

    pub fn with_integrator(mut self, integrator: &str) -> Self {
        self.integrator = Some(integrator.to_string());
        self
    }

    pub fn with_cell(mut self, resistance: f64, capacitance: f64) -> Self {
        self.resistance = Some(resistance);
        self.capacitance = Some(capacitance);
        self
    }

    pub fn add_custom(&mut self, key: &str, value: impl ToString) {
        self.custom.push((key.to_string(), value.to_string()));
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn write_metadata_header<W: Write>(out: &mut W, metadata: &CsvMetadata) -> Result<()> {
    writeln!(out, "# Redox Layer Simulation Data")?;
    writeln!(out, "# Generated: {}", chrono::Utc::now().to_rfc3339())?;

    if let Some(technique) = &metadata.technique {
        writeln!(out, "# Technique: {technique}")?;
    }
    if let Some(integrator) = &metadata.integrator {
        writeln!(out, "# Integrator: {integrator}")?;
    }
    if let Some(resistance) = metadata.resistance {
        writeln!(out, "# Resistance: {resistance} Ohm")?;
    }
    if let Some(capacitance) = metadata.capacitance {
        writeln!(out, "# Capacitance: {capacitance} F")?;
    }
    for (key, value) in &metadata.custom {
        writeln!(out, "# {key}: {value}")?;
    }
    writeln!(out, "#")?;
    Ok(())
}

fn format_number(value: f64, config: &CsvConfig) -> String {
    let formatted = format!("{:.prec$e}", value, prec = config.precision);
    if config.decimal_separator != '.' {
        formatted.replace('.', &config.decimal_separator.to_string())
    } else {
        formatted
    }
}

/// Row indices kept when downsampling `len` rows to `n_points`.
///
/// `None`, or `n_points >= len`, keeps everything. Otherwise the indices are
/// evenly spaced and always include the first and the last row.
pub fn downsample_indices(len: usize, n_points: Option<usize>) -> Vec<usize> {
    match n_points {
        Some(n) if n < len && n >= 2 => {
            let last = (len - 1) as f64;
            let mut indices: Vec<usize> = (0..n)
                .map(|k| (k as f64 * last / (n - 1) as f64).round() as usize)
                .collect();
            indices.dedup();
            indices
        }
        Some(1) if len > 0 => vec![0],
        _ => (0..len).collect(),
    }
}

/// Write named columns as a CSV file.
///
/// All columns must be non-empty, of equal length and finite.
///
/// ```rust,ignore
/// export_columns_csv(&[("E_V", &scale), ("dI_A", &diff)], None, "swv.csv", &CsvConfig::default())?;
/// ```
pub fn export_columns_csv(
    columns: &[(&str, &DVector<f64>)],
    n_points: Option<usize>,
    path: impl AsRef<Path>,
    config: &CsvConfig,
) -> Result<()> {
    // ============================= Validation =============================

    config.validate()?;
    let Some((_, first)) = columns.first() else {
        return Err(RedoxError::InvalidParameter("no columns to export".to_string()));
    };
    let rows = first.len();
    if rows == 0 {
        return Err(RedoxError::InvalidParameter(
            "empty data: columns must not be empty".to_string(),
        ));
    }
    for (name, column) in columns {
        if column.len() != rows {
            return Err(RedoxError::LengthMismatch {
                what: "CSV column",
                expected: rows,
                actual: column.len(),
            });
        }
        if let Some(index) = column.iter().position(|v| !v.is_finite()) {
            return Err(RedoxError::NumericInstability(format!(
                "column '{name}' holds a non-finite value at row {index}"
            )));
        }
    }

    // ============================= Write =================================

    let mut out = BufWriter::new(File::create(path.as_ref())?);

    if config.include_metadata {
        if let Some(metadata) = &config.metadata {
            write_metadata_header(&mut out, metadata)?;
        }
    }

    let delimiter = config.delimiter.to_string();
    let header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
    writeln!(out, "{}", header.join(&delimiter))?;

    for i in downsample_indices(rows, n_points) {
        let row: Vec<String> = columns.iter().map(|(_, c)| format_number(c[i], config)).collect();
        writeln!(out, "{}", row.join(&delimiter))?;
    }
    out.flush()?;

    log::debug!("wrote {} columns x {} rows to {}", columns.len(), rows, path.as_ref().display());
    Ok(())
}

// =============================================================================
// Exporter
// =============================================================================

/// CSV implementation of [`Exporter`].
#[derive(Clone, Debug, Default)]
pub struct CsvExporter {
    pub config: CsvConfig,
}

impl CsvExporter {
    pub fn new(config: CsvConfig) -> Self {
        Self { config }
    }
}

impl Exporter for CsvExporter {
    type Error = RedoxError;

    fn export_voltammogram(
        &self,
        voltammogram: &Voltammogram,
        n_points: Option<usize>,
        path: &Path,
    ) -> Result<()> {
        let mut columns = vec![
            ("time_s", &voltammogram.clock),
            ("applied_V", voltammogram.applied.values()),
            ("filtered_V", voltammogram.filtered.values()),
        ];
        if let Some(corrected) = &voltammogram.corrected {
            columns.push(("corrected_V", corrected.values()));
        }
        columns.push(("capacitive_A", &voltammogram.capacitive));
        columns.push(("total_A", voltammogram.total.values()));
        export_columns_csv(&columns, n_points, path, &self.config)
    }

    fn export_swv(&self, response: &SwvResponse, path: &Path) -> Result<()> {
        export_columns_csv(
            &[
                ("potential_V", &response.potential_scale),
                ("forward_A", &response.forward),
                ("backward_A", &response.backward),
                ("differential_A", &response.differential),
            ],
            None,
            path,
            &self.config,
        )
    }

    fn export_vfswv(&self, map: &VfSwvMap, path: &Path) -> Result<()> {
        // long format: one row per (frequency, potential) cell
        let cells = map.frequency_count() * map.potential_count();
        let mut log_f = DVector::zeros(cells);
        let mut potential = DVector::zeros(cells);
        let mut charge = DVector::zeros(cells);
        for i in 0..map.frequency_count() {
            for j in 0..map.potential_count() {
                let k = i * map.potential_count() + j;
                log_f[k] = map.log_frequencies[i];
                potential[k] = map.potential_scale[j];
                charge[k] = map.charge[(i, j)];
            }
        }
        export_columns_csv(
            &[("log10_frequency_Hz", &log_f), ("potential_V", &potential), ("charge_C", &charge)],
            None,
            path,
            &self.config,
        )
    }
}

// =================================================================================================
// Tests
// =================================================================================================

#[cfg(test)]
mod tests {
    use std::fs;

    use nalgebra::DMatrix;
    use tempfile::NamedTempFile;

    use super::*;
    use crate::experiment::{assemble, CellParameters};
    use crate::solver::PacketIntegrator;
    use crate::waveform::CyclicSweep;

    fn column(values: &[f64]) -> DVector<f64> {
        DVector::from_row_slice(values)
    }

    fn data_lines(content: &str) -> Vec<&str> {
        content.lines().filter(|l| !l.starts_with('#')).collect()
    }

    #[test]
    fn test_minimal_export() {
        let file = NamedTempFile::new().unwrap();
        let e = column(&[0.1, 0.0]);
        let i = column(&[1e-6, -2.5e-6]);
        export_columns_csv(&[("E_V", &e), ("I_A", &i)], None, file.path(), &CsvConfig::default().precision(2))
            .unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(content, "E_V,I_A\n1.00e-1,1.00e-6\n0.00e0,-2.50e-6\n");
    }

    #[test]
    fn test_european_format() {
        let file = NamedTempFile::new().unwrap();
        let e = column(&[0.5]);
        export_columns_csv(&[("E", &e), ("E2", &e)], None, file.path(), &CsvConfig::european().precision(1))
            .unwrap();
        let content = fs::read_to_string(file.path()).unwrap();
        assert_eq!(data_lines(&content), vec!["E;E2", "5,0e-1;5,0e-1"]);
    }

    #[test]
    fn test_metadata_header() {
        let file = NamedTempFile::new().unwrap();
        let mut metadata = CsvMetadata::for_technique("Square-wave voltammetry")
            .with_integrator("Packet integrator")
            .with_cell(10.0, 1e-5);
        metadata.add_custom("log10 frequency", 2.0);
        let config = CsvConfig::default().with_metadata(metadata);
        export_columns_csv(&[("x", &column(&[1.0]))], None, file.path(), &config).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        assert!(content.starts_with("# Redox Layer Simulation Data\n# Generated: "));
        assert!(content.contains("# Technique: Square-wave voltammetry\n"));
        assert!(content.contains("# Integrator: Packet integrator\n"));
        assert!(content.contains("# Resistance: 10 Ohm\n"));
        assert!(content.contains("# log10 frequency: 2\n"));
        assert_eq!(data_lines(&content), vec!["x", "1.000000e0"]);
    }

    #[test]
    fn test_validation_errors() {
        let file = NamedTempFile::new().unwrap();
        let config = CsvConfig::default();
        let short = column(&[1.0]);
        let long = column(&[1.0, 2.0]);
        let nan = column(&[1.0, f64::NAN]);
        let empty = DVector::<f64>::zeros(0);

        assert!(export_columns_csv(&[], None, file.path(), &config).is_err());
        assert!(export_columns_csv(&[("a", &empty)], None, file.path(), &config).is_err());
        assert!(matches!(
            export_columns_csv(&[("a", &long), ("b", &short)], None, file.path(), &config),
            Err(RedoxError::LengthMismatch { expected: 2, actual: 1, .. })
        ));
        let err = export_columns_csv(&[("a", &long), ("b", &nan)], None, file.path(), &config).unwrap_err();
        assert!(err.to_string().contains("column 'b'"));
        let clash = CsvConfig::default().delimiter('.');
        assert!(export_columns_csv(&[("a", &long)], None, file.path(), &clash).is_err());
    }

    #[test]
    fn test_downsample_keeps_first_and_last() {
        assert_eq!(downsample_indices(5, None), vec![0, 1, 2, 3, 4]);
        assert_eq!(downsample_indices(5, Some(10)), vec![0, 1, 2, 3, 4]);
        assert_eq!(downsample_indices(11, Some(3)), vec![0, 5, 10]);
        assert_eq!(downsample_indices(4, Some(1)), vec![0]);
        let picked = downsample_indices(1001, Some(7));
        assert_eq!(picked.len(), 7);
        assert_eq!(picked.first(), Some(&0));
        assert_eq!(picked.last(), Some(&1000));
    }

    #[test]
    fn test_export_voltammogram() {
        let sweep = CyclicSweep::new(0.1, -0.1, 1.0).with_points_per_volt(100.0);
        let cv = assemble(&sweep, &CellParameters::new(10.0, 1e-5), None, &PacketIntegrator::new()).unwrap();
        let file = NamedTempFile::new().unwrap();

        CsvExporter::default().export_voltammogram(&cv, Some(5), file.path()).unwrap();
        let content = fs::read_to_string(file.path()).unwrap();
        let lines = data_lines(&content);
        assert_eq!(lines[0], "time_s,applied_V,filtered_V,capacitive_A,total_A");
        assert_eq!(lines.len(), 6);
    }

    #[test]
    fn test_export_vfswv_long_format() {
        let map = VfSwvMap {
            log_frequencies: column(&[1.0, 0.0]),
            potential_scale: column(&[0.1, 0.0, -0.1]),
            charge: DMatrix::from_row_slice(2, 3, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        };
        let file = NamedTempFile::new().unwrap();
        CsvExporter::new(CsvConfig::default().precision(1)).export_vfswv(&map, file.path()).unwrap();

        let content = fs::read_to_string(file.path()).unwrap();
        let lines = data_lines(&content);
        assert_eq!(lines.len(), 7);
        assert_eq!(lines[1], "1.0e0,1.0e-1,1.0e0");
        assert_eq!(lines[6], "0.0e0,-1.0e-1,6.0e0");
    }
}
