//! Applied potential waveforms
//!
//! A waveform knows three things: how many samples it has, how far apart
//! they are in time, and what potential to apply at each of them.
//!
//! - [`CyclicSweep`]: triangular ramp (cyclic voltammetry)
//! - [`SquareWave`]: staircase with superimposed square pulses (SWV)
//!
//! The free functions ([`build_clock`], [`build_cv_sequence`],
//! [`build_swv_sequence`]) are the raw generators, usable without building
//! a waveform value.

pub mod clock;
pub mod cyclic;
pub mod square_wave;

use nalgebra::DVector;

use crate::error::Result;
use crate::physics::PotentialSequence;

pub use clock::build_clock;
pub use cyclic::{build_cv_sequence, cv_sequence_length, CyclicSweep};
pub use square_wave::{build_swv_sequence, swv_period_count, SquareWave};

/// Potential program applied to the cell.
pub trait Waveform {
    /// Human-readable technique name (for logs and CSV metadata).
    fn name(&self) -> &str;

    /// Check parameters without generating anything.
    fn validate(&self) -> Result<()>;

    /// Sampling interval, s.
    fn time_increment(&self) -> f64;

    /// Number of samples.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Generate the applied potential sequence.
    fn sequence(&self) -> Result<PotentialSequence>;

    /// Timestamps matching [`Waveform::sequence`].
    fn clock(&self) -> Result<DVector<f64>> {
        self.validate()?;
        build_clock(self.time_increment(), self.len())
    }
}
