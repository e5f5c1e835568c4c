// Fit domain models - polynomial coefficients, fitted curves and their samples
use super::errors::AnalysisError;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum FitOrder {
    Quadratic,
    Cubic,
}

impl FitOrder {
    pub fn degree(&self) -> usize {
        match self {
            FitOrder::Quadratic => 2,
            FitOrder::Cubic => 3,
        }
    }

    /// Fewest points that still give a determined system for this order.
    pub fn min_points(&self) -> usize {
        self.degree() + 1
    }
}

impl From<FitOrder> for u8 {
    fn from(order: FitOrder) -> Self {
        order.degree() as u8
    }
}

impl TryFrom<u8> for FitOrder {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(FitOrder::Quadratic),
            3 => Ok(FitOrder::Cubic),
            other => Err(format!("unsupported fit order {other}, expected 2 or 3")),
        }
    }
}

impl fmt::Display for FitOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.degree())
    }
}

/// Polynomial coefficients in ascending order, constant term first.
/// Missing or `null` terms deserialize as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    #[serde(default, deserialize_with = "null_as_zero")]
    pub a0: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub a1: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub a2: f64,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub a3: f64,
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(0.0))
}

impl Coefficients {
    pub fn new(a0: f64, a1: f64, a2: f64, a3: f64) -> Self {
        Self { a0, a1, a2, a3 }
    }

    pub fn from_options(terms: [Option<f64>; 4]) -> Self {
        let [a0, a1, a2, a3] = terms.map(|t| t.unwrap_or(0.0));
        Self::new(a0, a1, a2, a3)
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.a0, self.a1, self.a2, self.a3]
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        self.a0 + self.a1 * x + self.a2 * x * x + self.a3 * x * x * x
    }

    /// Number of samples needed to draw the curve smoothly.
    pub fn sample_count(&self) -> usize {
        if self.a3 != 0.0 {
            50
        } else if self.a2 != 0.0 {
            30
        } else {
            2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub min: f64,
    pub max: f64,
}

impl Domain {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fit {
    pub order: FitOrder,
    pub coefficients: Coefficients,
    pub domain: Domain,
    pub r_squared: f64,
}

impl Fit {
    pub fn sample_curve(&self) -> SampleCurve {
        SampleCurve::new(self.coefficients, self.domain)
    }
}

/// Evenly spaced evaluation of a polynomial across a domain.
///
/// The iterator is lazy and finite; `rewind` (or cloning before iterating)
/// restarts it from the first sample.
#[derive(Debug, Clone)]
pub struct SampleCurve {
    coefficients: Coefficients,
    start: f64,
    step: f64,
    count: usize,
    next: usize,
}

impl SampleCurve {
    pub fn new(coefficients: Coefficients, domain: Domain) -> Self {
        let count = coefficients.sample_count();
        let width = domain.width();
        let step = if width == 0.0 {
            0.0
        } else {
            width / (count - 1) as f64
        };

        Self {
            coefficients,
            start: domain.min,
            step,
            count,
            next: 0,
        }
    }

    pub fn rewind(&mut self) {
        self.next = 0;
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Split the remaining samples into separate x and y vectors.
    pub fn into_xy(self) -> (Vec<f64>, Vec<f64>) {
        self.unzip()
    }
}

impl Iterator for SampleCurve {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.count {
            return None;
        }
        let x = self.start + self.next as f64 * self.step;
        self.next += 1;
        Some((x, self.coefficients.evaluate(x)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.next;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for SampleCurve {}

/// Outcome of fitting both orders to the same selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    pub quadratic: Result<Fit, AnalysisError>,
    pub cubic: Result<Fit, AnalysisError>,
}

impl FitReport {
    pub fn get(&self, order: FitOrder) -> &Result<Fit, AnalysisError> {
        match order {
            FitOrder::Quadratic => &self.quadratic,
            FitOrder::Cubic => &self.cubic,
        }
    }
}
