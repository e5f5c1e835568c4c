// Measurement domain models - raw table rows and the chart-plane points derived from them
use super::category::{classify, Category, ClassifierThresholds, HasCategory};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A point in the chart plane. The category is fixed at ingestion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawPoint {
    pub x: f64,
    pub y: f64,
    pub category: Category,
}

impl RawPoint {
    pub fn new(x: f64, y: f64, category: Category) -> Self {
        Self { x, y, category }
    }

    pub fn ingest(x: f64, y: f64, thresholds: &ClassifierThresholds) -> Self {
        Self::new(x, y, classify(x, y, thresholds))
    }

    pub fn xy(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl HasCategory for RawPoint {
    fn category(&self) -> Category {
        self.category
    }
}

/// One row of the raw data table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub source_id: String,
    pub cie_x: f64,
    pub cie_y: f64,
    /// Current efficiency in cd/A.
    pub efficiency: f64,
    #[serde(default)]
    pub exp_date: Option<NaiveDate>,
}

impl Measurement {
    pub fn category(&self, thresholds: &ClassifierThresholds) -> Category {
        classify(self.cie_x, self.cie_y, thresholds)
    }

    /// Project into the chart plane. Blue rows plot the blue index
    /// (efficiency / CIE y) against CIE y, every other row plots efficiency
    /// against CIE x. A zero CIE y never classifies as blue, so the division
    /// is always defined.
    pub fn to_raw_point(&self, thresholds: &ClassifierThresholds) -> RawPoint {
        let category = self.category(thresholds);
        match category {
            Category::B => RawPoint::new(self.cie_y, self.efficiency / self.cie_y, category),
            _ => RawPoint::new(self.cie_x, self.efficiency, category),
        }
    }
}

/// Experiment date shared by every row, or `None` when rows disagree or none is set.
pub fn common_exp_date<'a>(rows: impl IntoIterator<Item = &'a Measurement>) -> Option<NaiveDate> {
    let mut iter = rows.into_iter();
    let first = iter.next()?.exp_date?;
    iter.all(|m| m.exp_date == Some(first)).then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: &str, x: f64, y: f64, ce: f64) -> Measurement {
        Measurement {
            source_id: id.to_string(),
            cie_x: x,
            cie_y: y,
            efficiency: ce,
            exp_date: None,
        }
    }

    #[test]
    fn test_ingest_classifies() {
        let p = RawPoint::ingest(0.65, 0.33, &ClassifierThresholds::default());
        assert_eq!(p.category, Category::R);
        assert_eq!(p.xy(), (0.65, 0.33));
    }

    #[test]
    fn test_projection_red_and_green() {
        let t = ClassifierThresholds::default();
        let p = row("a", 0.68, 0.31, 42.0).to_raw_point(&t);
        assert_eq!(p, RawPoint::new(0.68, 42.0, Category::R));

        let p = row("b", 0.25, 0.7, 90.0).to_raw_point(&t);
        assert_eq!(p, RawPoint::new(0.25, 90.0, Category::G));
    }

    #[test]
    fn test_projection_blue_index() {
        let t = ClassifierThresholds::default();
        let p = row("c", 0.14, 0.05, 8.0).to_raw_point(&t);
        assert_eq!(p.category, Category::B);
        assert_eq!(p.x, 0.05);
        assert!((p.y - 160.0).abs() < 1e-9);
    }

    #[test]
    fn test_projection_unknown_keeps_cie_x() {
        let t = ClassifierThresholds::default();
        let p = row("d", 0.3, 0.0, 1.0).to_raw_point(&t);
        assert_eq!(p.category, Category::Unknown);
        assert_eq!(p.x, 0.3);
    }

    #[test]
    fn test_common_exp_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let mut a = row("a", 0.7, 0.3, 1.0);
        let mut b = row("b", 0.7, 0.3, 1.0);
        a.exp_date = Some(date);
        b.exp_date = Some(date);
        assert_eq!(common_exp_date([&a, &b]), Some(date));

        b.exp_date = None;
        assert_eq!(common_exp_date([&a, &b]), None);
        assert_eq!(common_exp_date(std::iter::empty()), None);
    }
}
