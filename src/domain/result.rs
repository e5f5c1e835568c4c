// Result domain models - accepted fits kept in the registry
use super::category::{Category, HasCategory};
use super::errors::AnalysisError;
use super::fit::{Coefficients, Domain, FitOrder, SampleCurve};
use super::measurement::RawPoint;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultId(u64);

impl ResultId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResultId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "result_{}", self.0)
    }
}

/// Fields the analyst may change after a result has been accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditableMeta {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub product_label: Option<String>,
    #[serde(default)]
    pub exp_date: Option<NaiveDate>,
    #[serde(default)]
    pub min_range: f64,
    #[serde(default = "default_max_range")]
    pub max_range: f64,
    #[serde(default = "default_max_coordinate")]
    pub max_coordinate: f64,
    #[serde(default)]
    pub author: Option<String>,
}

fn default_max_range() -> f64 {
    1.0
}

fn default_max_coordinate() -> f64 {
    -1.0
}

impl Default for EditableMeta {
    fn default() -> Self {
        Self {
            condition: None,
            product_label: None,
            exp_date: None,
            min_range: 0.0,
            max_range: default_max_range(),
            max_coordinate: default_max_coordinate(),
            author: None,
        }
    }
}

impl EditableMeta {
    pub fn validate(&self) -> Result<(), AnalysisError> {
        for (name, value) in [("min_range", self.min_range), ("max_range", self.max_range)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(AnalysisError::InvalidMeta(format!(
                    "{name} must be within [0, 1], got {value}"
                )));
            }
        }
        if self.min_range > self.max_range {
            return Err(AnalysisError::InvalidMeta(format!(
                "min_range {} exceeds max_range {}",
                self.min_range, self.max_range
            )));
        }
        // -1 means unset
        if self.max_coordinate.is_nan() || self.max_coordinate > 1.0 {
            return Err(AnalysisError::InvalidMeta(format!(
                "max_coordinate must be at most 1, got {}",
                self.max_coordinate
            )));
        }
        Ok(())
    }

    /// Text shown in trace names; changes here must be re-rendered.
    pub fn label(&self) -> Option<String> {
        match (&self.product_label, &self.condition) {
            (Some(p), Some(c)) => Some(format!("{p} {c}")),
            (Some(p), None) => Some(p.clone()),
            (None, Some(c)) => Some(c.clone()),
            (None, None) => None,
        }
    }
}

/// Partial update of `EditableMeta`. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetaPatch {
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub product_label: Option<String>,
    #[serde(default)]
    pub exp_date: Option<NaiveDate>,
    #[serde(default)]
    pub min_range: Option<f64>,
    #[serde(default)]
    pub max_range: Option<f64>,
    #[serde(default)]
    pub max_coordinate: Option<f64>,
    #[serde(default)]
    pub author: Option<String>,
}

impl MetaPatch {
    pub fn apply_to(&self, meta: &EditableMeta) -> EditableMeta {
        let mut merged = meta.clone();
        if let Some(condition) = &self.condition {
            merged.condition = Some(condition.clone());
        }
        if let Some(label) = &self.product_label {
            merged.product_label = Some(label.clone());
        }
        if let Some(date) = self.exp_date {
            merged.exp_date = Some(date);
        }
        if let Some(min) = self.min_range {
            merged.min_range = min;
        }
        if let Some(max) = self.max_range {
            merged.max_range = max;
        }
        if let Some(coord) = self.max_coordinate {
            merged.max_coordinate = coord;
        }
        if let Some(author) = &self.author {
            merged.author = Some(author.clone());
        }
        merged
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub id: ResultId,
    pub category: Category,
    pub order: FitOrder,
    pub coefficients: Coefficients,
    pub domain: Domain,
    pub r_squared: f64,
    pub converted_metric: Option<f64>,
    pub raw_points: Vec<RawPoint>,
    pub source_ids: Vec<String>,
    pub meta: EditableMeta,
    /// Bumped whenever something drawn on the chart changes.
    pub revision: u64,
    pub created_at: DateTime<Utc>,
}

impl ResultRecord {
    pub fn sample_curve(&self) -> SampleCurve {
        SampleCurve::new(self.coefficients, self.domain)
    }

    pub fn display_name(&self) -> String {
        match self.meta.label() {
            Some(label) => format!("{} {}", self.category, label),
            None => format!("{} {}", self.category, self.id),
        }
    }
}

impl HasCategory for ResultRecord {
    fn category(&self) -> Category {
        self.category
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_id_display() {
        assert_eq!(ResultId::new(3).to_string(), "result_3");
        assert_eq!(serde_json::to_string(&ResultId::new(3)).unwrap(), "3");
    }

    #[test]
    fn test_meta_defaults() {
        let meta: EditableMeta = serde_json::from_str("{}").unwrap();
        assert_eq!(meta, EditableMeta::default());
        assert_eq!(meta.max_range, 1.0);
        assert_eq!(meta.max_coordinate, -1.0);
        assert!(meta.validate().is_ok());
    }

    #[test]
    fn test_meta_validation() {
        let meta = EditableMeta {
            min_range: 1.2,
            ..EditableMeta::default()
        };
        assert!(matches!(meta.validate(), Err(AnalysisError::InvalidMeta(_))));

        let meta = EditableMeta {
            min_range: 0.8,
            max_range: 0.3,
            ..EditableMeta::default()
        };
        assert!(matches!(meta.validate(), Err(AnalysisError::InvalidMeta(_))));
    }

    #[test]
    fn test_max_coordinate_capped_at_one() {
        let meta = EditableMeta {
            max_coordinate: 1.5,
            ..EditableMeta::default()
        };
        assert!(matches!(meta.validate(), Err(AnalysisError::InvalidMeta(_))));

        for coord in [-1.0, 0.0, 0.71, 1.0] {
            let meta = EditableMeta {
                max_coordinate: coord,
                ..EditableMeta::default()
            };
            assert!(meta.validate().is_ok(), "{coord} should be accepted");
        }

        let nan = EditableMeta {
            max_coordinate: f64::NAN,
            ..EditableMeta::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let meta = EditableMeta {
            condition: Some("old".into()),
            author: Some("kim".into()),
            ..EditableMeta::default()
        };
        let patch = MetaPatch {
            condition: Some("new".into()),
            max_range: Some(0.5),
            ..MetaPatch::default()
        };
        let merged = patch.apply_to(&meta);
        assert_eq!(merged.condition.as_deref(), Some("new"));
        assert_eq!(merged.author.as_deref(), Some("kim"));
        assert_eq!(merged.max_range, 0.5);
    }

    #[test]
    fn test_label() {
        let mut meta = EditableMeta::default();
        assert_eq!(meta.label(), None);
        meta.condition = Some("ETL 30nm".into());
        assert_eq!(meta.label().as_deref(), Some("ETL 30nm"));
        meta.product_label = Some("P1".into());
        assert_eq!(meta.label().as_deref(), Some("P1 ETL 30nm"));
    }
}
