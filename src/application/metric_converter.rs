// Metric converter - evaluates a fit at the per-category reference coordinate
use crate::application::regression_engine::round_to;
use crate::domain::category::Category;
use crate::domain::errors::AnalysisError;
use crate::domain::fit::Coefficients;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Converted metrics are stored to this many decimal places.
const METRIC_PRECISION: i32 = 4;

/// Reference coordinate per category, supplied fresh for every conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BaseConstants(HashMap<Category, f64>);

impl BaseConstants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, category: Category, base: f64) -> Self {
        self.0.insert(category, base);
        self
    }

    pub fn get(&self, category: Category) -> Option<f64> {
        self.0.get(&category).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(Category, f64)> for BaseConstants {
    fn from_iter<I: IntoIterator<Item = (Category, f64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

pub struct MetricConverter;

impl MetricConverter {
    pub fn convert(
        category: Category,
        coefficients: &Coefficients,
        constants: &BaseConstants,
    ) -> Result<f64, AnalysisError> {
        let base = constants
            .get(category)
            .ok_or(AnalysisError::UnknownCategory(category))?;

        Ok(coefficients.a3 * base.powi(3)
            + coefficients.a2 * base.powi(2)
            + coefficients.a1 * base
            + coefficients.a0)
    }

    pub fn round_metric(value: f64) -> f64 {
        round_to(value, METRIC_PRECISION)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn constants() -> BaseConstants {
        BaseConstants::new()
            .with(Category::R, 0.682)
            .with(Category::G, 0.24)
            .with(Category::B, 0.045)
    }

    #[test]
    fn test_convert_matches_direct_evaluation() {
        let coefficients = Coefficients::new(12.5, -3.0, 40.0, 7.5);
        for category in [Category::R, Category::G, Category::B] {
            let base = constants().get(category).unwrap();
            let metric = MetricConverter::convert(category, &coefficients, &constants()).unwrap();
            assert!((metric - coefficients.evaluate(base)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_convert_quadratic_ignores_zero_cubic_term() {
        let coefficients = Coefficients::from_options([Some(1.0), Some(2.0), Some(3.0), None]);
        let metric = MetricConverter::convert(Category::G, &coefficients, &constants()).unwrap();
        assert!((metric - (1.0 + 2.0 * 0.24 + 3.0 * 0.24 * 0.24)).abs() < 1e-12);
    }

    #[test]
    fn test_unknown_category() {
        let coefficients = Coefficients::new(1.0, 0.0, 0.0, 0.0);
        assert_eq!(
            MetricConverter::convert(Category::Unknown, &coefficients, &constants()),
            Err(AnalysisError::UnknownCategory(Category::Unknown))
        );
        assert_eq!(
            MetricConverter::convert(Category::R, &coefficients, &BaseConstants::new()),
            Err(AnalysisError::UnknownCategory(Category::R))
        );
    }

    #[test]
    fn test_round_metric() {
        assert_eq!(MetricConverter::round_metric(41.234_567), 41.2346);
    }
}
