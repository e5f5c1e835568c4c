// Result registry - the editable collection of accepted fits
use crate::application::selection_validator::SelectionValidator;
use crate::domain::category::Category;
use crate::domain::errors::AnalysisError;
use crate::domain::fit::Fit;
use crate::domain::measurement::RawPoint;
use crate::domain::result::{EditableMeta, MetaPatch, ResultId, ResultRecord};
use chrono::Utc;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditOutcome {
    /// Whether the edit touched something drawn on the chart.
    pub plotted_changed: bool,
    pub revision: u64,
}

/// Ids are handed out in increasing order and never reused, so iterating the
/// map by key is iterating in insertion order.
#[derive(Debug, Default)]
pub struct ResultRegistry {
    records: BTreeMap<ResultId, ResultRecord>,
    next_id: u64,
}

impl ResultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        fit: &Fit,
        category: Category,
        converted_metric: Option<f64>,
        raw_points: Vec<RawPoint>,
        source_ids: Vec<String>,
        meta: EditableMeta,
    ) -> Result<ResultId, AnalysisError> {
        SelectionValidator::validate(std::iter::once(category).chain(raw_points.iter().map(|p| p.category)))?;
        meta.validate()?;

        self.next_id += 1;
        let id = ResultId::new(self.next_id);
        let record = ResultRecord {
            id,
            category,
            order: fit.order,
            coefficients: fit.coefficients,
            domain: fit.domain,
            r_squared: fit.r_squared,
            converted_metric,
            raw_points,
            source_ids,
            meta,
            revision: 0,
            created_at: Utc::now(),
        };
        self.records.insert(id, record);

        tracing::info!("registered {} ({} order {})", id, category, fit.order);
        Ok(id)
    }

    /// Merge `patch` into the record's metadata. Nothing is written unless the
    /// merged metadata is valid.
    pub fn edit(&mut self, id: ResultId, patch: &MetaPatch) -> Result<EditOutcome, AnalysisError> {
        let record = self.records.get_mut(&id).ok_or(AnalysisError::NotFound(id))?;

        let merged = patch.apply_to(&record.meta);
        merged.validate()?;

        let plotted_changed = merged.label() != record.meta.label();
        record.meta = merged;
        if plotted_changed {
            record.revision += 1;
        }

        tracing::debug!("edited {} (plotted change: {})", id, plotted_changed);
        Ok(EditOutcome {
            plotted_changed,
            revision: record.revision,
        })
    }

    /// Remove a record. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: ResultId) -> Option<ResultRecord> {
        let removed = self.records.remove(&id);
        if removed.is_none() {
            tracing::debug!("remove of {} ignored, not registered", id);
        }
        removed
    }

    pub fn get(&self, id: ResultId) -> Option<&ResultRecord> {
        self.records.get(&id)
    }

    pub fn contains(&self, id: ResultId) -> bool {
        self.records.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResultRecord> {
        self.records.values()
    }

    /// Records for `ids` in the given order, skipping ids that are not registered.
    pub fn records<'a>(&'a self, ids: &'a [ResultId]) -> impl Iterator<Item = &'a ResultRecord> + 'a {
        ids.iter().filter_map(move |id| self.records.get(id))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
