//! Experiment time base.

use nalgebra::DVector;

use crate::error::{ensure_positive, RedoxError, Result};

/// Timestamps `t_i = i · time_increment` for `i` in `0..length`.
///
/// # Errors
///
/// `InvalidParameter` when the increment is not finite and positive or when
/// `length` is zero.
///
/// # Example
///
/// ```rust
/// use redox_rs::waveform::build_clock;
///
/// let clock = build_clock(0.5, 4).unwrap();
/// assert_eq!(clock.as_slice(), &[0.0, 0.5, 1.0, 1.5]);
/// ```
pub fn build_clock(time_increment: f64, length: usize) -> Result<DVector<f64>> {
    ensure_positive("time increment", time_increment)?;
    if length == 0 {
        return Err(RedoxError::InvalidParameter(
            "clock length must be at least 1".to_string(),
        ));
    }
    Ok(DVector::from_fn(length, |i, _| i as f64 * time_increment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_starts_at_zero() {
        let clock = build_clock(1e-3, 5).unwrap();
        assert_eq!(clock.len(), 5);
        assert_eq!(clock[0], 0.0);
        assert!((clock[4] - 4e-3).abs() < 1e-18);
    }

    #[test]
    fn test_clock_rejects_degenerate_input() {
        assert!(build_clock(0.0, 10).is_err());
        assert!(build_clock(-1.0, 10).is_err());
        assert!(build_clock(f64::INFINITY, 10).is_err());
        assert!(build_clock(1.0, 0).is_err());
    }
}
