// Comparison service - Use cases for one analyst workspace
use crate::application::chart_synchronizer::ChartSynchronizer;
use crate::application::constants_source::BaseConstantSource;
use crate::application::metric_converter::MetricConverter;
use crate::application::regression_engine::RegressionEngine;
use crate::application::result_registry::ResultRegistry;
use crate::application::selection_validator::SelectionSet;
use crate::domain::category::{Category, ClassifierThresholds};
use crate::domain::errors::AnalysisError;
use crate::domain::fit::{FitOrder, FitReport};
use crate::domain::measurement::{common_exp_date, Measurement, RawPoint};
use crate::domain::result::{EditableMeta, MetaPatch, ResultId, ResultRecord};
use crate::domain::sync_plan::{AxisTitles, ChartTraceState, SyncPlan};
use crate::infrastructure::record_export::{export_snapshots, ResultSnapshot};
use crate::infrastructure::trace_surface::{SurfaceError, TraceSurface};
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("no regression has been run on the current selection")]
    NoFit,

    #[error("base constants unavailable: {0:#}")]
    Constants(anyhow::Error),

    #[error("chart out of sync: {0}")]
    Surface(#[from] SurfaceError),
}

/// The points a regression was run on, kept so extraction uses exactly what was fitted.
#[derive(Debug, Clone)]
struct FittedSelection {
    report: FitReport,
    category: Option<Category>,
    points: Vec<RawPoint>,
    source_ids: Vec<String>,
    exp_date: Option<NaiveDate>,
}

#[derive(Debug, Default)]
struct Workspace {
    selection: SelectionSet<RawPoint>,
    rows: Vec<Measurement>,
    fitted: Option<FittedSelection>,
    registry: ResultRegistry,
    selected_results: Vec<ResultId>,
    surface: TraceSurface,
}

impl Workspace {
    fn resync(&mut self, synchronizer: &ChartSynchronizer) -> Result<SyncPlan, ServiceError> {
        let state = self.surface.trace_state();
        let plan = synchronizer.reconcile(&self.selected_results, &self.registry, &state);
        if let Some(ops) = plan.ops() {
            self.surface.apply(ops)?;
        }
        Ok(plan)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionSnapshot {
    pub category: Option<Category>,
    pub points: Vec<RawPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extraction {
    pub id: ResultId,
    pub converted_metric: Option<f64>,
    pub warning: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSnapshot {
    pub selected: Vec<ResultId>,
    pub traces: ChartTraceState,
    pub trace_count: usize,
    pub axis_titles: Option<AxisTitles>,
}

#[derive(Clone)]
pub struct ComparisonService {
    workspace: Arc<Mutex<Workspace>>,
    constants: Arc<dyn BaseConstantSource>,
    thresholds: ClassifierThresholds,
    synchronizer: Arc<ChartSynchronizer>,
}

impl ComparisonService {
    pub fn new(
        constants: Arc<dyn BaseConstantSource>,
        thresholds: ClassifierThresholds,
        synchronizer: ChartSynchronizer,
    ) -> Self {
        Self {
            workspace: Arc::new(Mutex::new(Workspace::default())),
            constants,
            thresholds,
            synchronizer: Arc::new(synchronizer),
        }
    }

    /// Add table rows to the raw selection as one addition.
    pub async fn select_measurements(
        &self,
        rows: Vec<Measurement>,
    ) -> Result<SelectionSnapshot, ServiceError> {
        let points: Vec<RawPoint> = rows
            .iter()
            .map(|row| row.to_raw_point(&self.thresholds))
            .collect();

        let mut ws = self.workspace.lock().await;
        if let Err(e) = ws.selection.try_extend(points) {
            tracing::warn!("measurement selection rejected: {}", e);
            return Err(e.into());
        }
        ws.rows.extend(rows);

        tracing::debug!("raw selection now holds {} points", ws.selection.len());
        Ok(SelectionSnapshot {
            category: ws.selection.category(),
            points: ws.selection.items().to_vec(),
        })
    }

    pub async fn clear_selection(&self) {
        let mut ws = self.workspace.lock().await;
        ws.selection.clear();
        ws.rows.clear();
        ws.fitted = None;
    }

    /// Fit both orders to the raw selection, ordered by x.
    pub async fn run_regression(&self) -> FitReport {
        let mut ws = self.workspace.lock().await;

        let mut points: Vec<(f64, f64)> = ws.selection.items().iter().map(|p| p.xy()).collect();
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        let report = RegressionEngine::fit_both(&points);

        let fitted = FittedSelection {
            report: report.clone(),
            category: ws.selection.category(),
            points: ws.selection.items().to_vec(),
            source_ids: ws.rows.iter().map(|r| r.source_id.clone()).collect(),
            exp_date: common_exp_date(&ws.rows),
        };
        ws.fitted = Some(fitted);
        report
    }

    /// Accept the latest fit of `order` as a result.
    pub async fn extract(
        &self,
        order: FitOrder,
        mut meta: EditableMeta,
    ) -> Result<Extraction, ServiceError> {
        let constants = self
            .constants
            .base_constants()
            .await
            .map_err(ServiceError::Constants)?;

        let mut ws = self.workspace.lock().await;
        let fitted = ws.fitted.clone().ok_or(ServiceError::NoFit)?;
        let fit = fitted.report.get(order).clone()?;
        let category = fitted.category.ok_or(ServiceError::NoFit)?;

        let mut warning = None;
        let converted_metric = match MetricConverter::convert(category, &fit.coefficients, &constants) {
            Ok(value) => Some(MetricConverter::round_metric(value)),
            Err(e) => {
                tracing::warn!("extracting without a converted metric: {}", e);
                warning = Some(e.to_string());
                None
            }
        };

        if meta.exp_date.is_none() {
            meta.exp_date = fitted.exp_date;
        }

        let id = ws.registry.add(
            &fit,
            category,
            converted_metric,
            fitted.points,
            fitted.source_ids,
            meta,
        )?;

        Ok(Extraction {
            id,
            converted_metric,
            warning,
        })
    }

    /// Show exactly `ids` on the chart. A rejected selection keeps the previous one.
    pub async fn select_results(&self, ids: Vec<ResultId>) -> Result<SyncPlan, ServiceError> {
        let mut guard = self.workspace.lock().await;
        let ws = &mut *guard;

        let state = ws.surface.trace_state();
        let plan = self.synchronizer.reconcile(&ids, &ws.registry, &state);
        if let Some(ops) = plan.ops() {
            ws.surface.apply(ops)?;
            let mut selected: Vec<ResultId> = Vec::with_capacity(ids.len());
            for id in ids {
                if ws.registry.contains(id) && !selected.contains(&id) {
                    selected.push(id);
                }
            }
            ws.selected_results = selected;
        }
        Ok(plan)
    }

    pub async fn edit_result(
        &self,
        id: ResultId,
        patch: MetaPatch,
    ) -> Result<SyncPlan, ServiceError> {
        let mut ws = self.workspace.lock().await;
        ws.registry.edit(id, &patch)?;
        ws.resync(&self.synchronizer)
    }

    /// Delete a result and take its traces off the chart. Deleting twice is harmless.
    pub async fn remove_result(&self, id: ResultId) -> Result<SyncPlan, ServiceError> {
        let mut ws = self.workspace.lock().await;
        if ws.registry.remove(id).is_some() {
            tracing::info!("removed {}", id);
        }
        ws.selected_results.retain(|selected| *selected != id);
        ws.resync(&self.synchronizer)
    }

    pub async fn results(&self) -> Vec<ResultRecord> {
        let ws = self.workspace.lock().await;
        ws.registry.iter().cloned().collect()
    }

    pub async fn result(&self, id: ResultId) -> Result<ResultRecord, ServiceError> {
        let ws = self.workspace.lock().await;
        ws.registry
            .get(id)
            .cloned()
            .ok_or(AnalysisError::NotFound(id).into())
    }

    /// Snapshot `ids` for saving; an empty list exports every result.
    pub async fn export(&self, ids: &[ResultId]) -> Result<Vec<ResultSnapshot>, ServiceError> {
        let ws = self.workspace.lock().await;
        if ids.is_empty() {
            return Ok(export_snapshots(ws.registry.iter())?);
        }

        let records = ids
            .iter()
            .map(|id| ws.registry.get(*id).ok_or(AnalysisError::NotFound(*id)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(export_snapshots(records)?)
    }

    pub async fn chart(&self) -> ChartSnapshot {
        let ws = self.workspace.lock().await;
        ChartSnapshot {
            selected: ws.selected_results.clone(),
            traces: ws.surface.trace_state(),
            trace_count: ws.surface.len(),
            axis_titles: ws.surface.axis_titles().cloned(),
        }
    }
}
