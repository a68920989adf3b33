//! Output of simulation results
//!
//! ```text
//! output/
//! ├── mod.rs
//! └── export/         ← data export
//!     ├── mod.rs      ← Exporter trait
//!     └── csv.rs
//! ```
//!
//! Plotting is left to external tools: the exported files carry the
//! potentials, currents and charge maps in plain columns.

pub mod export;
