//! Single-pole RC relaxation of the cell potential.
//!
//! The double-layer capacitance charges through the solution resistance, so
//! the potential actually seen by the interface lags the applied one:
//!
//! ```text
//! out[0] = in[0]
//! out[i] = out[i-1] + (in[i] - out[i-1]) · (1 - exp(-Δt / RC))
//! ```
//!
//! The difference between applied and filtered potential, divided by R, is
//! the capacitive (non-faradaic) current.

use nalgebra::DVector;

use crate::error::{RedoxError, Result};
use crate::physics::PotentialSequence;

fn ensure_non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_nan() || value < 0.0 {
        return Err(RedoxError::InvalidParameter(format!(
            "{name} must be non-negative (got {value})"
        )));
    }
    Ok(())
}

/// Relaxation factor `1 - exp(-Δt/τ)` for one step.
///
/// `τ ≤ 0` gives 1 (identity filter), `τ = ∞` gives 0 (frozen output).
pub fn decay_factor(resistance: f64, capacitance: f64, time_increment: f64) -> f64 {
    let tau = resistance * capacitance;
    if tau.is_nan() || tau <= 0.0 {
        // 0 · ∞ lands here too: a zero factor on either side means no lag.
        return 1.0;
    }
    -(-time_increment / tau).exp_m1()
}

/// Apply the RC filter to a potential sequence.
///
/// Resistance and capacitance may be zero (no lag) or `+∞` (no response);
/// negative or NaN values are rejected. The time increment of `sequence`
/// must match `time_increment`.
///
/// # Example
///
/// ```rust
/// use redox_rs::physics::PotentialSequence;
/// use redox_rs::solver::apply_rc;
///
/// let step = PotentialSequence::from_vec(vec![0.0, 1.0, 1.0, 1.0], 1e-3).unwrap();
/// let filtered = apply_rc(100.0, 1e-5, 1e-3, &step).unwrap();
/// assert!(filtered.as_slice()[1] < 1.0);
/// assert!(filtered.as_slice()[3] > filtered.as_slice()[1]);
/// ```
pub fn apply_rc(
    resistance: f64,
    capacitance: f64,
    time_increment: f64,
    sequence: &PotentialSequence,
) -> Result<PotentialSequence> {
    ensure_non_negative("resistance", resistance)?;
    ensure_non_negative("capacitance", capacitance)?;
    crate::error::ensure_positive("time increment", time_increment)?;
    let mismatch = (sequence.time_increment() - time_increment).abs();
    if mismatch > 1e-12 * time_increment.abs() {
        return Err(RedoxError::InvalidParameter(format!(
            "time increment {time_increment} does not match the sequence sampling {}",
            sequence.time_increment()
        )));
    }

    let decay = decay_factor(resistance, capacitance, time_increment);
    let input = sequence.values();
    let mut output = DVector::zeros(input.len());
    output[0] = input[0];
    for i in 1..input.len() {
        output[i] = output[i - 1] + (input[i] - output[i - 1]) * decay;
    }

    PotentialSequence::new(output, time_increment)
}

/// Current flowing through the resistance, `(raw - filtered) / R`.
///
/// With `R = 0` nothing is dropped across the resistance and the result is
/// all zeros. `R = ∞` also yields zeros.
pub fn ohmic_current(
    resistance: f64,
    raw: &PotentialSequence,
    filtered: &PotentialSequence,
) -> Result<DVector<f64>> {
    ensure_non_negative("resistance", resistance)?;
    if raw.len() != filtered.len() {
        return Err(RedoxError::LengthMismatch {
            what: "filtered sequence",
            expected: raw.len(),
            actual: filtered.len(),
        });
    }
    if resistance == 0.0 || resistance.is_infinite() {
        return Ok(DVector::zeros(raw.len()));
    }
    Ok((raw.values() - filtered.values()) / resistance)
}
