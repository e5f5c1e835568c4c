// Trace surface - in-memory mirror of the comparison chart's trace list
use crate::domain::result::ResultId;
use crate::domain::sync_plan::{
    AxisTitles, ChartTraceState, SyncOps, TraceIndices, TraceMode, TracePayload, TraceRole,
};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("{operation} references trace {index}, but only {len} traces exist")]
    IndexOutOfRange {
        operation: &'static str,
        index: usize,
        len: usize,
    },

    #[error("removal indices are not strictly descending at position {position}")]
    UnorderedRemovals { position: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TraceTag {
    pub result_id: ResultId,
    pub role: TraceRole,
    pub revision: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedTrace {
    /// `None` for traces the synchronizer does not own, such as a baseline.
    pub tag: Option<TraceTag>,
    pub mode: TraceMode,
    pub payload: TracePayload,
}

#[derive(Debug, Clone, Default)]
pub struct TraceSurface {
    traces: Vec<RenderedTrace>,
    axis_titles: Option<AxisTitles>,
}

impl TraceSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a trace the synchronizer knows nothing about.
    pub fn push_untagged(&mut self, mode: TraceMode, payload: TracePayload) {
        self.traces.push(RenderedTrace {
            tag: None,
            mode,
            payload,
        });
    }

    /// Apply a plan: removals, then updates, then additions, then titles.
    /// The whole plan is checked before anything is touched.
    pub fn apply(&mut self, ops: &SyncOps) -> Result<(), SurfaceError> {
        self.check(ops)?;

        for &index in &ops.remove_indices {
            self.traces.remove(index);
        }

        for update in &ops.updates {
            let trace = &mut self.traces[update.index];
            trace.payload = update.payload.clone();
            trace.tag = Some(TraceTag {
                result_id: update.result_id,
                role: update.role,
                revision: update.revision,
            });
        }

        self.traces.extend(ops.additions.iter().map(|spec| RenderedTrace {
            tag: Some(TraceTag {
                result_id: spec.result_id,
                role: spec.role,
                revision: spec.revision,
            }),
            mode: spec.mode,
            payload: spec.payload.clone(),
        }));

        self.axis_titles = Some(ops.axis_titles.clone());
        Ok(())
    }

    fn check(&self, ops: &SyncOps) -> Result<(), SurfaceError> {
        for (position, pair) in ops.remove_indices.windows(2).enumerate() {
            if pair[0] <= pair[1] {
                return Err(SurfaceError::UnorderedRemovals { position: position + 1 });
            }
        }
        if let Some(&highest) = ops.remove_indices.first() {
            if highest >= self.traces.len() {
                return Err(SurfaceError::IndexOutOfRange {
                    operation: "removal",
                    index: highest,
                    len: self.traces.len(),
                });
            }
        }

        let remaining = self.traces.len() - ops.remove_indices.len();
        if let Some(update) = ops.updates.iter().find(|u| u.index >= remaining) {
            return Err(SurfaceError::IndexOutOfRange {
                operation: "update",
                index: update.index,
                len: remaining,
            });
        }
        Ok(())
    }

    /// Rebuild the id -> indices map by scanning tagged traces. A result is only
    /// reported once both of its traces are present.
    pub fn trace_state(&self) -> ChartTraceState {
        let mut partial: BTreeMap<ResultId, (Option<usize>, Option<usize>, u64)> = BTreeMap::new();
        for (index, trace) in self.traces.iter().enumerate() {
            if let Some(tag) = trace.tag {
                let entry = partial.entry(tag.result_id).or_insert((None, None, tag.revision));
                match tag.role {
                    TraceRole::DataPoints => entry.0 = Some(index),
                    TraceRole::FitLine => entry.1 = Some(index),
                }
                entry.2 = entry.2.min(tag.revision);
            }
        }

        partial
            .into_iter()
            .filter_map(|(id, entry)| match entry {
                (Some(data), Some(fit), revision) => Some((id, TraceIndices::new(data, fit, revision))),
                _ => {
                    tracing::warn!("{} has only one trace on the chart", id);
                    None
                }
            })
            .collect()
    }

    pub fn traces(&self) -> &[RenderedTrace] {
        &self.traces
    }

    pub fn axis_titles(&self) -> Option<&AxisTitles> {
        self.axis_titles.as_ref()
    }

    pub fn len(&self) -> usize {
        self.traces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}
