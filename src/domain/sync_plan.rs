// Chart synchronisation models - rendered trace bookkeeping and the plans that change it
use super::errors::AnalysisError;
use super::result::ResultId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceRole {
    DataPoints,
    FitLine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    Markers,
    Lines,
}

impl TraceRole {
    pub fn mode(&self) -> TraceMode {
        match self {
            TraceRole::DataPoints => TraceMode::Markers,
            TraceRole::FitLine => TraceMode::Lines,
        }
    }

    pub fn suffix(&self) -> &'static str {
        match self {
            TraceRole::DataPoints => "(Data)",
            TraceRole::FitLine => "(Fit)",
        }
    }
}

/// Where the two traces of one result currently sit on the chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceIndices {
    pub data_points: usize,
    pub fit_line: usize,
    /// Record revision the traces were drawn from.
    #[serde(default)]
    pub revision: u64,
}

impl TraceIndices {
    pub fn new(data_points: usize, fit_line: usize, revision: u64) -> Self {
        Self {
            data_points,
            fit_line,
            revision,
        }
    }

    pub fn index_of(&self, role: TraceRole) -> usize {
        match role {
            TraceRole::DataPoints => self.data_points,
            TraceRole::FitLine => self.fit_line,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartTraceState(BTreeMap<ResultId, TraceIndices>);

impl ChartTraceState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: ResultId, indices: TraceIndices) {
        self.0.insert(id, indices);
    }

    pub fn get(&self, id: &ResultId) -> Option<&TraceIndices> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &ResultId) -> bool {
        self.0.contains_key(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &ResultId> {
        self.0.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ResultId, &TraceIndices)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(ResultId, TraceIndices)> for ChartTraceState {
    fn from_iter<I: IntoIterator<Item = (ResultId, TraceIndices)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TracePayload {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// A trace to append, tagged with the result it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceSpec {
    pub result_id: ResultId,
    pub role: TraceRole,
    pub mode: TraceMode,
    pub revision: u64,
    #[serde(flatten)]
    pub payload: TracePayload,
}

/// In-place rewrite of a trace, addressed by its index after removals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceUpdate {
    pub index: usize,
    pub result_id: ResultId,
    pub role: TraceRole,
    pub revision: u64,
    pub payload: TracePayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisTitles {
    pub x: String,
    pub y: String,
}

impl AxisTitles {
    pub fn new(x: impl Into<String>, y: impl Into<String>) -> Self {
        Self {
            x: x.into(),
            y: y.into(),
        }
    }
}

/// Operations that bring the chart in line with the selection.
/// Apply in field order: removals, updates, additions, then axis titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncOps {
    /// Strictly descending.
    pub remove_indices: Vec<usize>,
    pub updates: Vec<TraceUpdate>,
    pub additions: Vec<TraceSpec>,
    pub axis_titles: AxisTitles,
}

impl SyncOps {
    /// True when applying the plan would leave every trace untouched.
    pub fn is_noop(&self) -> bool {
        self.remove_indices.is_empty() && self.updates.is_empty() && self.additions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SyncPlan {
    Apply(SyncOps),
    Rejected { reason: String, warning: String },
}

impl SyncPlan {
    pub fn rejected(error: &AnalysisError) -> Self {
        SyncPlan::Rejected {
            reason: error.to_string(),
            warning: "selected results have different colours".to_string(),
        }
    }

    pub fn ops(&self) -> Option<&SyncOps> {
        match self {
            SyncPlan::Apply(ops) => Some(ops),
            SyncPlan::Rejected { .. } => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, SyncPlan::Rejected { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::category::Category;

    #[test]
    fn test_plan_serializes_with_kind_tag() {
        let plan = SyncPlan::Apply(SyncOps {
            remove_indices: vec![1, 0],
            updates: vec![],
            additions: vec![],
            axis_titles: AxisTitles::new("CIE x", "CIE y"),
        });
        let json = serde_json::to_value(&plan).unwrap();
        assert_eq!(json["kind"], "apply");
        assert_eq!(json["remove_indices"], serde_json::json!([1, 0]));

        let err = AnalysisError::CategoryMismatch {
            expected: Category::R,
            found: Category::G,
        };
        let json = serde_json::to_value(SyncPlan::rejected(&err)).unwrap();
        assert_eq!(json["kind"], "rejected");
        assert_eq!(json["reason"], "selection mixes categories R and G");
    }

    #[test]
    fn test_trace_state_round_trips_through_json() {
        let state: ChartTraceState = [(ResultId::new(4), TraceIndices::new(0, 1, 2))]
            .into_iter()
            .collect();
        let json = serde_json::to_string(&state).unwrap();
        let back: ChartTraceState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_role_mode() {
        assert_eq!(TraceRole::DataPoints.mode(), TraceMode::Markers);
        assert_eq!(TraceRole::FitLine.mode(), TraceMode::Lines);
        assert_eq!(TraceIndices::new(3, 4, 0).index_of(TraceRole::FitLine), 4);
    }
}
