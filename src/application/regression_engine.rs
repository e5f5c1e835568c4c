// Regression engine - least-squares polynomial fits of order 2 and 3
use crate::domain::errors::AnalysisError;
use crate::domain::fit::{Coefficients, Domain, Fit, FitOrder, FitReport, SampleCurve};
use nalgebra::{DMatrix, DVector};

/// Coefficients are reported to this many decimal places.
const COEFFICIENT_PRECISION: i32 = 6;

pub struct RegressionEngine;

impl RegressionEngine {
    pub fn fit(points: &[(f64, f64)], order: FitOrder) -> Result<Fit, AnalysisError> {
        let min = order.min_points();
        if points.len() < min {
            return Err(AnalysisError::InsufficientPoints {
                order,
                got: points.len(),
                min,
            });
        }
        Self::validate_finite(points)?;

        let terms = order.degree() + 1;
        let distinct = distinct_x_count(points);
        if distinct < terms {
            return Err(AnalysisError::FitFailure(format!(
                "order {order} fit needs {terms} distinct x values, got {distinct}"
            )));
        }
        let solution = solve_normal_equations(points, terms)?;

        let mut ascending = [0.0; 4];
        for (slot, value) in ascending.iter_mut().zip(solution.iter()) {
            *slot = round_to(*value, COEFFICIENT_PRECISION);
        }
        let [a0, a1, a2, a3] = ascending;
        let coefficients = Coefficients::new(a0, a1, a2, a3);

        let (min_x, max_x) = points
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &(x, _)| {
                (lo.min(x), hi.max(x))
            });

        let r_squared = reported_r_squared(r_squared(points, &coefficients));

        tracing::debug!(
            "order {} fit over {} points: {:?}, r2={}",
            order,
            points.len(),
            coefficients.as_array(),
            r_squared
        );

        Ok(Fit {
            order,
            coefficients,
            domain: Domain::new(min_x, max_x),
            r_squared,
        })
    }

    /// Fit both orders independently; one failing never hides the other.
    pub fn fit_both(points: &[(f64, f64)]) -> FitReport {
        FitReport {
            quadratic: Self::fit(points, FitOrder::Quadratic),
            cubic: Self::fit(points, FitOrder::Cubic),
        }
    }

    pub fn sample_curve(fit: &Fit) -> SampleCurve {
        fit.sample_curve()
    }

    fn validate_finite(points: &[(f64, f64)]) -> Result<(), AnalysisError> {
        for (i, &(x, y)) in points.iter().enumerate() {
            if !x.is_finite() || !y.is_finite() {
                return Err(AnalysisError::FitFailure(format!(
                    "non-finite point at index {i}: ({x}, {y})"
                )));
            }
        }
        Ok(())
    }
}

/// The Vandermonde basis has rank `min(terms, distinct x)`, so fewer distinct
/// abscissae than terms leaves the system underdetermined.
fn distinct_x_count(points: &[(f64, f64)]) -> usize {
    let mut xs: Vec<f64> = points.iter().map(|&(x, _)| x).collect();
    xs.sort_by(|a, b| a.total_cmp(b));
    xs.dedup();
    xs.len()
}

/// Solve X'X * beta = X'y for a polynomial basis with `terms` columns.
fn solve_normal_equations(points: &[(f64, f64)], terms: usize) -> Result<Vec<f64>, AnalysisError> {
    // power sums of x up to 2 * degree, and moments of y
    let mut x_powers = vec![0.0; 2 * terms - 1];
    let mut xy_moments = vec![0.0; terms];
    for &(x, y) in points {
        let mut p = 1.0;
        for (k, sum) in x_powers.iter_mut().enumerate() {
            *sum += p;
            if k < terms {
                xy_moments[k] += p * y;
            }
            p *= x;
        }
    }

    let matrix = DMatrix::from_fn(terms, terms, |i, j| x_powers[i + j]);
    let rhs = DVector::from_vec(xy_moments);

    let solution = match matrix.clone().qr().solve(&rhs) {
        Some(solution) => solution,
        None => matrix
            .svd(true, true)
            .solve(&rhs, f64::EPSILON * 100.0)
            .map_err(|e| AnalysisError::FitFailure(e.to_string()))?,
    };

    if solution.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::FitFailure(format!(
            "normal equations for {} terms are singular",
            terms
        )));
    }

    Ok(solution.as_slice().to_vec())
}

fn r_squared(points: &[(f64, f64)], coefficients: &Coefficients) -> f64 {
    let n = points.len() as f64;
    let mean = points.iter().map(|&(_, y)| y).sum::<f64>() / n;
    let (ss_res, ss_tot) = points.iter().fold((0.0, 0.0), |(res, tot), &(x, y)| {
        let residual = y - coefficients.evaluate(x);
        (res + residual * residual, tot + (y - mean) * (y - mean))
    });

    if ss_tot == 0.0 {
        return if ss_res <= f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// Least squares with an intercept never scores below zero; clamp rounding
/// noise and drop the sign of a negative zero.
fn reported_r_squared(value: f64) -> f64 {
    round_to(value.max(0.0), COEFFICIENT_PRECISION) + 0.0
}

pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
