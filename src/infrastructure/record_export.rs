// Record export - persistence snapshots of accepted results
use crate::domain::category::Category;
use crate::domain::errors::AnalysisError;
use crate::domain::fit::{Coefficients, FitOrder};
use crate::domain::measurement::RawPoint;
use crate::domain::result::{EditableMeta, ResultId, ResultRecord};
use serde::{Deserialize, Serialize};

/// What a persistence collaborator receives for one result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSnapshot {
    pub id: ResultId,
    pub category: Category,
    pub order: FitOrder,
    pub coefficients: Coefficients,
    pub converted_metric: Option<f64>,
    pub raw_points: Vec<RawPoint>,
    pub source_ids: Vec<String>,
    pub meta: EditableMeta,
}

impl From<&ResultRecord> for ResultSnapshot {
    fn from(record: &ResultRecord) -> Self {
        Self {
            id: record.id,
            category: record.category,
            order: record.order,
            coefficients: record.coefficients,
            converted_metric: record.converted_metric,
            raw_points: record.raw_points.clone(),
            source_ids: record.source_ids.clone(),
            meta: record.meta.clone(),
        }
    }
}

/// Snapshot `records` for saving. Every row needs a condition and an
/// experiment date; the first row missing one fails the whole export.
pub fn export_snapshots<'a>(
    records: impl IntoIterator<Item = &'a ResultRecord>,
) -> Result<Vec<ResultSnapshot>, AnalysisError> {
    let mut snapshots = Vec::new();
    for (i, record) in records.into_iter().enumerate() {
        let position = i + 1;
        let has_condition = record
            .meta
            .condition
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty());
        if !has_condition {
            return Err(AnalysisError::IncompleteMetadata {
                position,
                field: "condition",
            });
        }
        if record.meta.exp_date.is_none() {
            return Err(AnalysisError::IncompleteMetadata {
                position,
                field: "exp_date",
            });
        }
        snapshots.push(ResultSnapshot::from(record));
    }
    Ok(snapshots)
}
