use flowcanvas_core::{ConnectorIndex, PathStatus, ScenarioId, ScenarioStatus};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

use crate::GRAPH_TARGET;
use crate::scope::ScopeWindow;

/// One scenario's reported walk through the flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioHighlight {
    pub scenario_id: ScenarioId,
    pub status: ScenarioStatus,
    pub connectors: BTreeSet<ConnectorIndex>,
}

impl ScenarioHighlight {
    pub fn new(
        scenario_id: impl Into<String>,
        status: ScenarioStatus,
        connectors: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            scenario_id: ScenarioId(scenario_id.into()),
            status,
            connectors: connectors.into_iter().map(ConnectorIndex).collect(),
        }
    }
}

/// Render state of a single connector line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectorHighlight {
    None,
    /// The connector right after the end bound: drawn as a scope edge, never
    /// marked.
    Boundary,
    Single {
        status: PathStatus,
    },
    Multi {
        statuses: Vec<PathStatus>,
        style_key: String,
    },
}

impl ConnectorHighlight {
    fn from_statuses(statuses: BTreeSet<PathStatus>) -> Self {
        let mut iter = statuses.iter();
        match (iter.next(), iter.next()) {
            (None, _) => ConnectorHighlight::None,
            (Some(status), None) => ConnectorHighlight::Single { status: *status },
            _ => {
                let statuses: Vec<PathStatus> = statuses.into_iter().collect();
                let style_key = statuses
                    .iter()
                    .map(PathStatus::as_str)
                    .collect::<Vec<_>>()
                    .join("-");
                ConnectorHighlight::Multi {
                    statuses,
                    style_key,
                }
            }
        }
    }
}

/// Per-scenario highlights plus the legacy flat execution path.
#[derive(Debug, Clone, Default)]
pub struct PathHighlightCompositor {
    scenarios: HashMap<ScenarioId, ScenarioHighlight>,
    executed: BTreeSet<ConnectorIndex>,
}

impl PathHighlightCompositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty() && self.executed.is_empty()
    }

    pub fn scenario(&self, id: &ScenarioId) -> Option<&ScenarioHighlight> {
        self.scenarios.get(id)
    }

    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Replace every scenario highlight. A later entry with the same id wins.
    pub fn set_highlights(&mut self, highlights: Vec<ScenarioHighlight>) {
        self.scenarios = highlights
            .into_iter()
            .map(|h| (h.scenario_id.clone(), h))
            .collect();
        tracing::debug!(
            target: GRAPH_TARGET,
            scenarios = self.scenarios.len(),
            "scenario highlights replaced"
        );
    }

    /// Remove the given scenarios, or everything (legacy path included) when
    /// `ids` is `None`.
    pub fn clear_highlights(&mut self, ids: Option<&HashSet<ScenarioId>>) -> bool {
        match ids {
            Some(ids) => {
                let before = self.scenarios.len();
                self.scenarios.retain(|id, _| !ids.contains(id));
                before != self.scenarios.len()
            }
            None => {
                let had_any = !self.is_empty();
                self.scenarios.clear();
                self.executed.clear();
                had_any
            }
        }
    }

    pub fn set_execution_path(&mut self, connectors: impl IntoIterator<Item = ConnectorIndex>) {
        self.executed = connectors.into_iter().collect();
    }

    pub fn clear_execution_path(&mut self) -> bool {
        let had_any = !self.executed.is_empty();
        self.executed.clear();
        had_any
    }

    /// Distinct statuses contributed to `index` after scope trimming.
    pub fn connector_status(
        &self,
        index: ConnectorIndex,
        window: Option<ScopeWindow>,
    ) -> BTreeSet<PathStatus> {
        let mut statuses = BTreeSet::new();
        let Some(window) = window else {
            return statuses;
        };
        if !window.can_mark(index) {
            return statuses;
        }
        if self.executed.contains(&index) {
            statuses.insert(PathStatus::Executed);
        }
        statuses.extend(
            self.scenarios
                .values()
                .filter(|h| h.connectors.contains(&index))
                .map(|h| PathStatus::from(h.status)),
        );
        statuses
    }

    /// Render state for every connector of a flow with `connector_count`
    /// connectors.
    pub fn composite(
        &self,
        connector_count: usize,
        window: Option<ScopeWindow>,
    ) -> Vec<ConnectorHighlight> {
        (0..connector_count)
            .map(ConnectorIndex)
            .map(|index| match window {
                Some(w) if w.is_boundary(index) => ConnectorHighlight::Boundary,
                _ => ConnectorHighlight::from_statuses(self.connector_status(index, window)),
            })
            .collect()
    }
}
