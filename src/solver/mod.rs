//! Faradaic current integration
//!
//! # The Architecture (WHAT vs HOW)
//!
//! 1. **Scenario** ([`Scenario`]) - WHAT to integrate
//!    - site populations
//!    - applied and RC-filtered potential sequences
//!    - uncompensated resistance
//!
//! 2. **Configuration** ([`KineticsConfiguration`]) - HOW to integrate
//!    - physical constants (temperature)
//!    - active-window thresholds
//!    - packet density, exponent clamp, current evaluation rule
//!
//! 3. **Integrator** ([`Integrator`] trait) - the method
//!    - [`PacketIntegrator`]: finite kinetics with iR correction
//!    - [`NernstianIntegrator`]: reversible reference
//!
//! # Module Organization
//!
//! - **`rc`**: double-layer RC filter and ohmic current
//! - **`kinetics`**: Butler–Volmer rates and per-step rate tables
//! - **`window`**: active-window search
//! - **`scenario`**, **`traits`**: inputs, configuration and results
//! - **`methods`**: integrator implementations
//!
//! # Workflow Diagram
//!
//! ```text
//! ┌──────────┐   apply_rc   ┌──────────┐
//! │ Waveform ├─────────────►│ filtered │
//! └────┬─────┘              └────┬─────┘
//!      │ applied                 │
//!      ▼                         ▼
//! ┌─────────────────────────────────────┐
//! │ Scenario (populations, R)           │ ← WHAT
//! └─────────────────┬───────────────────┘
//!                   │
//!          ┌────────▼──────────┐
//!          │ Integrator        │ ← HOW (KineticsConfiguration)
//!          └────────┬──────────┘
//!                   │
//!          ┌────────▼──────────────────────┐
//!          │ IntegrationResult             │
//!          │ (current, corrected potential)│
//!          └───────────────────────────────┘
//! ```
//!
//! # Error Handling
//!
//! Integrators return [`RedoxError`](crate::RedoxError):
//! - `InvalidParameter` / `LengthMismatch` before any work is done
//! - `NumericInstability` if a NaN or Inf reaches an output sequence
//!
//! Excessive work (windows degrading to full scans) is only logged.

// =================================================================================================
// Module Declarations
// =================================================================================================
mod kinetics;
mod methods;
mod rc;
mod scenario;
mod traits;
mod window;

// =================================================================================================
// Parallel Execution Threshold
// =================================================================================================
//
// Independent simulation runs (the frequencies of a VF-SWV sweep) can be
// dispatched to Rayon. Whether that pays off depends on how many runs there
// are, so the decision lives next to the integrators. The value is a
// performance hint, relaxed ordering is enough.
// =================================================================================================

use std::sync::atomic::{AtomicUsize, Ordering};

use nalgebra::DVector;

use crate::error::{RedoxError, Result};

/// Default number of independent runs above which sweeps go parallel.
const DEFAULT_PARALLEL_THRESHOLD: usize = 4;

static PARALLEL_THRESHOLD: AtomicUsize = AtomicUsize::new(DEFAULT_PARALLEL_THRESHOLD);

/// Current parallel-execution threshold.
///
/// Sweeps run sequentially when they contain at most this many independent
/// simulations, and on the Rayon pool otherwise. Only effective with the
/// `parallel` feature.
///
/// ```rust
/// use redox_rs::solver::parallel_threshold;
///
/// assert!(parallel_threshold() > 0);
/// ```
pub fn parallel_threshold() -> usize {
    PARALLEL_THRESHOLD.load(Ordering::Relaxed)
}

/// Set the parallel-execution threshold.
///
/// # Panics
///
/// Panics when `threshold == 0`.
pub fn set_parallel_threshold(threshold: usize) {
    assert!(threshold > 0, "parallel threshold must be at least 1");
    PARALLEL_THRESHOLD.store(threshold, Ordering::Relaxed);
}

/// Restores the previous threshold on drop. Test builds only.
#[cfg(test)]
pub(crate) struct ThresholdGuard {
    previous: usize,
}

#[cfg(test)]
impl ThresholdGuard {
    pub(crate) fn save(new_value: usize) -> Self {
        let previous = parallel_threshold();
        set_parallel_threshold(new_value);
        Self { previous }
    }
}

#[cfg(test)]
impl Drop for ThresholdGuard {
    fn drop(&mut self) {
        PARALLEL_THRESHOLD.store(self.previous, Ordering::Relaxed);
    }
}

// =================================================================================================
// Public Re-exports
// =================================================================================================

pub use kinetics::{ButlerVolmer, RateTable, StepRates};
pub use methods::{packet_count, NernstianIntegrator, PacketIntegrator};
pub use rc::{apply_rc, decay_factor, ohmic_current};
pub use scenario::Scenario;
pub use traits::{
    CurrentEvaluation, IntegrationDiagnostics, IntegrationResult, Integrator, KineticsConfiguration,
    WindowSettings,
};
pub use window::{find_active_window, ActiveWindow};

// =================================================================================================
// Helper Functions
// =================================================================================================

/// Check a computed sequence for NaN or Inf.
///
/// The error names the quantity and the first offending index.
///
/// ```rust,ignore
/// validate_trace(&current, "current")?;
/// ```
pub(crate) fn validate_trace(values: &DVector<f64>, quantity: &str) -> Result<()> {
    if let Some(index) = values.iter().position(|v| v.is_nan()) {
        return Err(RedoxError::NumericInstability(format!(
            "NaN detected in {quantity} at step {index}"
        )));
    }
    if let Some(index) = values.iter().position(|v| v.is_infinite()) {
        return Err(RedoxError::NumericInstability(format!(
            "infinity detected in {quantity} at step {index}"
        )));
    }
    Ok(())
}

// =================================================================================================
// Tests
// =================================================================================================
