// Chart synchronizer - reconciles the selected results against the traces already drawn
//
// The chart keeps its zoom, pan and styling only if traces are edited in place,
// so every reconciliation produces the smallest add / update / remove plan that
// turns the rendered state into the selected one. Trace indices are positional:
// removals are listed in descending order and every update index is expressed
// relative to the trace list *after* those removals.
use crate::application::result_registry::ResultRegistry;
use crate::application::selection_validator::SelectionValidator;
use crate::domain::category::Category;
use crate::domain::result::{ResultId, ResultRecord};
use crate::domain::sync_plan::{
    AxisTitles, ChartTraceState, SyncOps, SyncPlan, TracePayload, TraceRole, TraceSpec, TraceUpdate,
};
use std::collections::{HashMap, HashSet};

const ROLES: [TraceRole; 2] = [TraceRole::DataPoints, TraceRole::FitLine];

/// Axis titles per category, with a placeholder for an empty chart.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTitleTable {
    by_category: HashMap<Category, AxisTitles>,
    placeholder: AxisTitles,
}

impl AxisTitleTable {
    pub fn new(placeholder: AxisTitles) -> Self {
        Self {
            by_category: HashMap::new(),
            placeholder,
        }
    }

    pub fn with(mut self, category: Category, titles: AxisTitles) -> Self {
        self.by_category.insert(category, titles);
        self
    }

    pub fn placeholder(&self) -> &AxisTitles {
        &self.placeholder
    }

    pub fn for_category(&self, category: Option<Category>) -> AxisTitles {
        category
            .and_then(|c| self.by_category.get(&c))
            .unwrap_or(&self.placeholder)
            .clone()
    }
}

impl Default for AxisTitleTable {
    fn default() -> Self {
        let cie = AxisTitles::new("CIE x", "CIE y");
        Self::new(AxisTitles::new("x axis", "y axis"))
            .with(Category::R, cie.clone())
            .with(Category::G, cie.clone())
            .with(Category::Unknown, cie)
            .with(Category::B, AxisTitles::new("CIE y", "BI"))
    }
}

/// Maps an index from before a batch of removals to the index after it.
struct IndexShift {
    removed_ascending: Vec<usize>,
}

impl IndexShift {
    fn new(removed: &[usize]) -> Self {
        let mut removed_ascending = removed.to_vec();
        removed_ascending.sort_unstable();
        Self { removed_ascending }
    }

    fn apply(&self, index: usize) -> usize {
        index - self.removed_ascending.partition_point(|&r| r < index)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChartSynchronizer {
    axis_titles: AxisTitleTable,
}

impl ChartSynchronizer {
    pub fn new(axis_titles: AxisTitleTable) -> Self {
        Self { axis_titles }
    }

    pub fn axis_titles(&self) -> &AxisTitleTable {
        &self.axis_titles
    }

    pub fn reconcile(
        &self,
        target: &[ResultId],
        registry: &ResultRegistry,
        current: &ChartTraceState,
    ) -> SyncPlan {
        let records = resolve_target(target, registry);

        let category = match SelectionValidator::validate(records.iter().copied()) {
            Ok(category) => category,
            Err(e) => {
                tracing::warn!("chart selection rejected: {}", e);
                return SyncPlan::rejected(&e);
            }
        };

        let target_ids: HashSet<ResultId> = records.iter().map(|r| r.id).collect();

        let mut remove_indices: Vec<usize> = current
            .iter()
            .filter(|(id, _)| !target_ids.contains(*id))
            .flat_map(|(_, indices)| ROLES.map(|role| indices.index_of(role)))
            .collect();
        remove_indices.sort_unstable_by(|a, b| b.cmp(a));
        remove_indices.dedup();

        let shift = IndexShift::new(&remove_indices);
        let mut updates = Vec::new();
        let mut additions = Vec::new();

        for record in &records {
            match current.get(&record.id) {
                Some(indices) if indices.revision != record.revision => {
                    for role in ROLES {
                        updates.push(TraceUpdate {
                            index: shift.apply(indices.index_of(role)),
                            result_id: record.id,
                            role,
                            revision: record.revision,
                            payload: trace_payload(record, role),
                        });
                    }
                }
                Some(_) => {}
                None => {
                    for role in ROLES {
                        additions.push(TraceSpec {
                            result_id: record.id,
                            role,
                            mode: role.mode(),
                            revision: record.revision,
                            payload: trace_payload(record, role),
                        });
                    }
                }
            }
        }

        tracing::debug!(
            "chart reconcile: {} removed, {} updated, {} added",
            remove_indices.len(),
            updates.len(),
            additions.len()
        );

        SyncPlan::Apply(SyncOps {
            remove_indices,
            updates,
            additions,
            axis_titles: self.axis_titles.for_category(category),
        })
    }
}

/// Registered records for `target`, first occurrence of each id, in target order.
fn resolve_target<'a>(target: &[ResultId], registry: &'a ResultRegistry) -> Vec<&'a ResultRecord> {
    let mut seen = HashSet::new();
    target
        .iter()
        .filter(|id| seen.insert(**id))
        .filter_map(|id| {
            let record = registry.get(*id);
            if record.is_none() {
                tracing::warn!("{} is selected but not registered, skipping", id);
            }
            record
        })
        .collect()
}

fn trace_payload(record: &ResultRecord, role: TraceRole) -> TracePayload {
    let (x, y): (Vec<f64>, Vec<f64>) = match role {
        TraceRole::DataPoints => record.raw_points.iter().map(|p| p.xy()).unzip(),
        TraceRole::FitLine => record.sample_curve().into_xy(),
    };
    TracePayload {
        name: format!("{} {}", record.display_name(), role.suffix()),
        x,
        y,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fit::{Coefficients, Domain, Fit, FitOrder};
    use crate::domain::measurement::RawPoint;
    use crate::domain::result::{EditableMeta, MetaPatch};
    use crate::domain::sync_plan::TraceIndices;

    fn add(registry: &mut ResultRegistry, category: Category, a2: f64) -> ResultId {
        let fit = Fit {
            order: FitOrder::Quadratic,
            coefficients: Coefficients::new(1.0, 1.0, a2, 0.0),
            domain: Domain::new(0.0, 2.0),
            r_squared: 1.0,
        };
        let points = vec![
            RawPoint::new(0.0, 1.0, category),
            RawPoint::new(1.0, 2.0 + a2, category),
            RawPoint::new(2.0, 3.0 + 4.0 * a2, category),
        ];
        registry
            .add(&fit, category, None, points, vec![], EditableMeta::default())
            .unwrap()
    }

    fn ops(plan: SyncPlan) -> SyncOps {
        match plan {
            SyncPlan::Apply(ops) => ops,
            SyncPlan::Rejected { reason, .. } => panic!("unexpected rejection: {reason}"),
        }
    }

    #[test]
    fn test_adds_two_traces_per_new_result() {
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::R, 1.0);
        let b = add(&mut registry, Category::R, 2.0);

        let ops = ops(ChartSynchronizer::default().reconcile(&[a, b], &registry, &ChartTraceState::new()));
        assert!(ops.remove_indices.is_empty());
        assert!(ops.updates.is_empty());
        assert_eq!(ops.additions.len(), 4);

        let tags: Vec<(ResultId, TraceRole)> = ops.additions.iter().map(|t| (t.result_id, t.role)).collect();
        assert_eq!(
            tags,
            vec![
                (a, TraceRole::DataPoints),
                (a, TraceRole::FitLine),
                (b, TraceRole::DataPoints),
                (b, TraceRole::FitLine)
            ]
        );
        assert_eq!(ops.additions[0].payload.x, vec![0.0, 1.0, 2.0]);
        assert_eq!(ops.additions[1].payload.x.len(), 30);
        assert_eq!(ops.axis_titles, AxisTitles::new("CIE x", "CIE y"));
    }

    #[test]
    fn test_deselect_removes_in_descending_order_and_shifts_updates() {
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::R, 1.0);
        let b = add(&mut registry, Category::R, 2.0);

        // b was drawn before its label changed
        registry
            .edit(b, &MetaPatch { condition: Some("x".into()), ..MetaPatch::default() })
            .unwrap();
        let current: ChartTraceState = [(a, TraceIndices::new(0, 1, 0)), (b, TraceIndices::new(2, 3, 0))]
            .into_iter()
            .collect();

        let ops = ops(ChartSynchronizer::default().reconcile(&[b], &registry, &current));
        assert_eq!(ops.remove_indices, vec![1, 0]);
        assert!(ops.additions.is_empty());
        let indices: Vec<(usize, TraceRole)> = ops.updates.iter().map(|u| (u.index, u.role)).collect();
        assert_eq!(indices, vec![(0, TraceRole::DataPoints), (1, TraceRole::FitLine)]);
        assert_eq!(ops.updates[0].revision, 1);
        assert!(ops.updates[0].payload.name.contains('x'));
    }

    #[test]
    fn test_unchanged_selection_is_noop() {
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::G, 1.0);
        let current: ChartTraceState = [(a, TraceIndices::new(0, 1, 0))].into_iter().collect();

        let ops = ops(ChartSynchronizer::default().reconcile(&[a], &registry, &current));
        assert!(ops.is_noop());
    }

    #[test]
    fn test_mixed_categories_rejected_without_operations() {
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::R, 1.0);
        let b = add(&mut registry, Category::B, 1.0);
        let current: ChartTraceState = [(a, TraceIndices::new(0, 1, 0))].into_iter().collect();

        let plan = ChartSynchronizer::default().reconcile(&[a, b], &registry, &current);
        assert!(plan.is_rejected());
        assert!(plan.ops().is_none());
    }

    #[test]
    fn test_empty_target_clears_chart_with_placeholder_titles() {
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::B, 1.0);
        let current: ChartTraceState = [(a, TraceIndices::new(2, 5, 0))].into_iter().collect();

        let ops = ops(ChartSynchronizer::default().reconcile(&[], &registry, &current));
        assert_eq!(ops.remove_indices, vec![5, 2]);
        assert_eq!(ops.axis_titles, AxisTitles::new("x axis", "y axis"));
    }

    #[test]
    fn test_blue_axis_titles() {
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::B, 1.0);
        let ops = ops(ChartSynchronizer::default().reconcile(&[a], &registry, &ChartTraceState::new()));
        assert_eq!(ops.axis_titles, AxisTitles::new("CIE y", "BI"));
    }

    #[test]
    fn test_unregistered_and_duplicate_ids_are_dropped() {
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::R, 1.0);
        let ghost = ResultId::new(404);

        let ops = ops(ChartSynchronizer::default().reconcile(&[a, ghost, a], &registry, &ChartTraceState::new()));
        assert_eq!(ops.additions.len(), 2);
    }

    #[test]
    fn test_rendered_but_deleted_result_is_removed() {
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::R, 1.0);
        let b = add(&mut registry, Category::R, 1.0);
        registry.remove(a);
        let current: ChartTraceState = [(a, TraceIndices::new(0, 1, 0)), (b, TraceIndices::new(2, 3, 0))]
            .into_iter()
            .collect();

        let ops = ops(ChartSynchronizer::default().reconcile(&[a, b], &registry, &current));
        assert_eq!(ops.remove_indices, vec![1, 0]);
        assert!(ops.updates.is_empty());
    }

    #[test]
    fn test_index_shift_with_interleaved_untagged_traces() {
        // traces: 0 baseline, 1-2 a, 3 baseline, 4-5 b, 6-7 c
        let mut registry = ResultRegistry::new();
        let a = add(&mut registry, Category::R, 1.0);
        let b = add(&mut registry, Category::R, 2.0);
        let c = add(&mut registry, Category::R, 3.0);
        for id in [b, c] {
            registry
                .edit(id, &MetaPatch { product_label: Some("P".into()), ..MetaPatch::default() })
                .unwrap();
        }
        let current: ChartTraceState = [
            (a, TraceIndices::new(1, 2, 0)),
            (b, TraceIndices::new(4, 5, 0)),
            (c, TraceIndices::new(6, 7, 0)),
        ]
        .into_iter()
        .collect();

        let ops = ops(ChartSynchronizer::default().reconcile(&[c, b], &registry, &current));
        assert_eq!(ops.remove_indices, vec![2, 1]);
        let indices: Vec<(ResultId, usize)> = ops.updates.iter().map(|u| (u.result_id, u.index)).collect();
        assert_eq!(indices, vec![(c, 4), (c, 5), (b, 2), (b, 3)]);
    }

    #[test]
    fn test_index_shift() {
        let shift = IndexShift::new(&[5, 1]);
        assert_eq!(shift.apply(0), 0);
        assert_eq!(shift.apply(2), 1);
        assert_eq!(shift.apply(6), 4);
    }
}
