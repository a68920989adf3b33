//! Physical description of a voltammetry experiment
//!
//! This module holds the data the simulation works on, independent of any
//! numerical method:
//!
//! - **`constants`**: R, F, T bundled in [`PhysicalConstants`]
//! - **`population`**: surface site populations ([`SitePopulation`], [`PopulationSet`])
//! - **`sequence`**: sampled potentials and currents ([`PotentialSequence`], [`CurrentTrace`])
//!
//! # Units
//!
//! Potentials are in volts, times in seconds, loadings in mol·cm⁻²,
//! which makes currents come out in A·cm⁻².

pub mod constants;
pub mod population;
pub mod sequence;

pub use constants::{PhysicalConstants, LN_2};
pub use population::{PopulationSet, SitePopulation};
pub use sequence::{CurrentTrace, PotentialSequence};
