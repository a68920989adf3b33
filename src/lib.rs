//! redox-rs: voltammetry of surface-confined redox layers
//!
//! Simulates cyclic voltammetry, square-wave voltammetry and
//! variable-frequency square-wave voltammetry (VF-SWV) of an electrode
//! carrying a heterogeneous film of immobilised redox sites, including the
//! potential lost across the uncompensated resistance (iR drop) and the
//! charging of the double layer.
//!
//! # Architecture
//!
//! 1. **Separation of description and method**
//!    - waveforms, populations and cells describe the experiment
//!    - integrators compute the faradaic response
//!
//! 2. **Typed, length-checked data**
//!    - potential and current sequences carry their time increment
//!    - every length contract is checked before any work begins
//!
//! # Quick Start
//!
//! ```rust
//! use redox_rs::prelude::*;
//!
//! # fn main() -> redox_rs::Result<()> {
//! // 1. Describe the layer
//! let populations = PopulationSet::single(SitePopulation::new(1e-10, 0.0, 100.0, 0.5, 1)?);
//!
//! // 2. Describe the experiment
//! let cv = CyclicVoltammetry::new(CvParameters {
//!     e_start: 0.3,
//!     e_end: -0.3,
//!     scan_rate: 1.0,
//!     resistance: 10.0,
//!     capacitance: 1e-5,
//!     points_per_volt: 2000.0,
//! });
//!
//! // 3. Run it
//! let result = cv.simulate(Some(&populations), &PacketIntegrator::new())?;
//! assert_eq!(result.total.len(), result.applied.len());
//! # Ok(())
//! # }
//! ```
//!
//! # Modules
//!
//! - [`physics`]: constants, site populations, sequences
//! - [`waveform`]: CV and SWV potential programs
//! - [`solver`]: RC filter, kinetics and integrators
//! - [`layer`]: distributed surface layer model
//! - [`experiment`]: CV / SWV / VF-SWV assemblers
//! - [`config`]: TOML experiment descriptions
//! - [`output`]: CSV export
//!
//! # Features
//!
//! - `parallel`: VF-SWV frequency sweeps on the Rayon thread pool

pub mod error;

// Core modules
pub mod physics;
pub mod solver;
pub mod waveform;

pub mod config;
pub mod experiment;
pub mod layer;
pub mod output;

pub use error::{RedoxError, Result};

pub mod prelude {
    //! Convenient imports for common usage
    //!
    //! ```rust
    //! use redox_rs::prelude::*;
    //! ```
    pub use crate::error::{RedoxError, Result};
    pub use crate::experiment::{
        CellParameters, CvParameters, CyclicVoltammetry, SquareWaveVoltammetry, SwvParameters,
        VariableFrequencySwv, VfSwvParameters, Voltammogram,
    };
    pub use crate::layer::{DistributionKind, LayerComponent, LayerGrid, SurfaceLayer};
    pub use crate::physics::{
        CurrentTrace, PhysicalConstants, PopulationSet, PotentialSequence, SitePopulation,
    };
    pub use crate::solver::{
        apply_rc, CurrentEvaluation, Integrator, KineticsConfiguration, NernstianIntegrator,
        PacketIntegrator, Scenario,
    };
    pub use crate::waveform::{CyclicSweep, SquareWave, Waveform};
}
