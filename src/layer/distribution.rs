//! Site-parameter distributions and their discretisation onto an axis.
//!
//! Each axis node `x_i` owns the bin `[x_i − h/2, x_i + h/2]` (h the node
//! spacing). The probability of a bin is the trapezoid integral of the pdf
//! over `boost` sub-samples spanning it, so narrow distributions are
//! integrated correctly even when their width is close to h.

use std::f64::consts::PI;
use std::fmt;
use std::str::FromStr;

use nalgebra::DVector;
use serde::{Deserialize, Serialize};

use crate::error::{RedoxError, Result};

/// Shape of a site distribution along one axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DistributionKind {
    /// Cauchy / Lorentzian bell, `width` is the half width at half maximum.
    Lorentzian,
    /// Gaussian bell, `width` is the standard deviation.
    Normal,
}

impl DistributionKind {
    pub fn name(&self) -> &'static str {
        match self {
            DistributionKind::Lorentzian => "lorentzian",
            DistributionKind::Normal => "normal",
        }
    }

    /// Probability density at `x`.
    #[inline]
    pub fn pdf(&self, x: f64, center: f64, width: f64) -> f64 {
        let u = (x - center) / width;
        match self {
            DistributionKind::Lorentzian => 1.0 / (PI * width * (1.0 + u * u)),
            DistributionKind::Normal => (-0.5 * u * u).exp() / (width * (2.0 * PI).sqrt()),
        }
    }
}

impl FromStr for DistributionKind {
    type Err = RedoxError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lorentz" | "lorentzian" | "cauchy" => Ok(DistributionKind::Lorentzian),
            "normal" | "gaussian" | "gauss" => Ok(DistributionKind::Normal),
            _ => Err(RedoxError::UnsupportedDistribution(s.to_string())),
        }
    }
}

impl TryFrom<String> for DistributionKind {
    type Error = RedoxError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<DistributionKind> for String {
    fn from(kind: DistributionKind) -> Self {
        kind.name().to_string()
    }
}

impl fmt::Display for DistributionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Evenly spaced axis of `resolution` nodes from `lower` to `upper`.
pub fn linspace(lower: f64, upper: f64, resolution: usize) -> DVector<f64> {
    if resolution == 1 {
        return DVector::from_element(1, lower);
    }
    let last = (resolution - 1) as f64;
    DVector::from_fn(resolution, |i, _| {
        let t = i as f64 / last;
        (1.0 - t) * lower + t * upper
    })
}

/// Probability mass of each axis bin.
///
/// `axis` must be evenly spaced with at least two nodes, `boost ≥ 2`.
pub fn bin_probabilities(
    kind: DistributionKind,
    axis: &DVector<f64>,
    center: f64,
    width: f64,
    boost: usize,
) -> Result<DVector<f64>> {
    if axis.len() < 2 {
        return Err(RedoxError::InvalidParameter(
            "a distribution axis needs at least two nodes".to_string(),
        ));
    }
    if boost < 2 {
        return Err(RedoxError::InvalidParameter(format!(
            "integration boost must be at least 2 (got {boost})"
        )));
    }
    if !width.is_finite() || width <= 0.0 {
        return Err(RedoxError::InvalidParameter(format!(
            "distribution width must be finite and positive (got {width})"
        )));
    }

    let spacing = axis[1] - axis[0];
    let sub_step = spacing / (boost - 1) as f64;

    Ok(axis.map(|node| {
        let lower = node - 0.5 * spacing;
        let mut area = 0.0;
        let mut previous = kind.pdf(lower, center, width);
        for k in 1..boost {
            let current = kind.pdf(lower + k as f64 * sub_step, center, width);
            area += 0.5 * (previous + current) * sub_step;
            previous = current;
        }
        area
    }))
}
