use flowcanvas_core::{ConnectorIndex, NodeId, NodeKind, ScopeError};
use serde::{Deserialize, Serialize};

use crate::GRAPH_TARGET;
use crate::node_graph::NodeGraph;

/// Test scope translated into connector-index space.
///
/// Connectors before `start` and after `end` are outside the scope. The
/// connector at `end` is kept as a visual boundary but never receives a
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeWindow {
    pub start: ConnectorIndex,
    pub end: Option<ConnectorIndex>,
}

impl ScopeWindow {
    /// Every connector in scope, nothing bounded.
    pub const FULL: ScopeWindow = ScopeWindow {
        start: ConnectorIndex(0),
        end: None,
    };

    pub fn retains(&self, index: ConnectorIndex) -> bool {
        index >= self.start && self.end.is_none_or(|end| index <= end)
    }

    pub fn is_boundary(&self, index: ConnectorIndex) -> bool {
        self.end == Some(index)
    }

    /// Whether a connector may carry a status.
    pub fn can_mark(&self, index: ConnectorIndex) -> bool {
        self.retains(index) && !self.is_boundary(index)
    }
}

/// Single-slot start and end bounds for selective testing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestScopeTracker {
    start: Option<NodeId>,
    end: Option<NodeId>,
}

impl TestScopeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<&NodeId> {
        self.start.as_ref()
    }

    pub fn end(&self) -> Option<&NodeId> {
        self.end.as_ref()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Replace the start bound. Returns whether anything changed.
    pub fn set_start(&mut self, graph: &NodeGraph, id: &NodeId) -> Result<bool, ScopeError> {
        let index = graph
            .index_of(id)
            .ok_or_else(|| ScopeError::UnknownNode(id.clone()))?;
        if let Some(end_index) = self.end.as_ref().and_then(|end| graph.index_of(end))
            && index > end_index
        {
            return Err(ScopeError::Inverted(id.clone()));
        }
        if self.start.as_ref() == Some(id) {
            return Ok(false);
        }
        tracing::debug!(target: GRAPH_TARGET, %id, index, "set test start point");
        self.start = Some(id.clone());
        Ok(true)
    }

    /// Whether `id` is an acceptable end bound.
    ///
    /// The end bound must leave at least one connector between itself and
    /// the flow's terminal node, and may not sit right in front of the
    /// current end bound.
    pub fn can_set_end(&self, graph: &NodeGraph, id: &NodeId) -> bool {
        let Some(node) = graph.get(id) else {
            return false;
        };
        if node.kind == NodeKind::End {
            return false;
        }
        match graph.successor(id) {
            None => false,
            Some(next) if next.kind == NodeKind::End => false,
            Some(next) => self.end.as_ref() != Some(&next.id),
        }
    }

    /// Replace the end bound. Returns whether anything changed.
    pub fn set_end(&mut self, graph: &NodeGraph, id: &NodeId) -> Result<bool, ScopeError> {
        let index = graph
            .index_of(id)
            .ok_or_else(|| ScopeError::UnknownNode(id.clone()))?;
        if self.end.as_ref() == Some(id) {
            return Ok(false);
        }
        if !self.can_set_end(graph, id) {
            return Err(ScopeError::EndPointNotAllowed(id.clone()));
        }
        if let Some(start_index) = self.start.as_ref().and_then(|start| graph.index_of(start))
            && index < start_index
        {
            return Err(ScopeError::Inverted(id.clone()));
        }
        tracing::debug!(target: GRAPH_TARGET, %id, index, "set test end point");
        self.end = Some(id.clone());
        Ok(true)
    }

    pub fn clear_start(&mut self) -> bool {
        self.start.take().is_some()
    }

    pub fn clear_end(&mut self) -> bool {
        self.end.take().is_some()
    }

    pub fn clear(&mut self) -> bool {
        let had_start = self.clear_start();
        let had_end = self.clear_end();
        had_start || had_end
    }

    /// Drop bounds whose node is gone. Returns whether anything was dropped.
    pub fn prune(&mut self, graph: &NodeGraph) -> bool {
        let mut changed = false;
        if self.start.as_ref().is_some_and(|id| !graph.contains(id)) {
            self.start = None;
            changed = true;
        }
        if self.end.as_ref().is_some_and(|id| !graph.contains(id)) {
            self.end = None;
            changed = true;
        }
        changed
    }

    /// Inclusive node-index range covered by the scope. `None` for an empty
    /// graph or an inverted configuration.
    pub fn index_range(&self, graph: &NodeGraph) -> Option<(usize, usize)> {
        if graph.is_empty() {
            return None;
        }
        let start = match &self.start {
            Some(id) => graph.index_of(id)?,
            None => 0,
        };
        let end = match &self.end {
            Some(id) => graph.index_of(id)?,
            None => graph.len() - 1,
        };
        (start <= end).then_some((start, end))
    }

    pub fn scope_node_ids(&self, graph: &NodeGraph) -> Vec<NodeId> {
        match self.index_range(graph) {
            Some((start, end)) => graph.nodes()[start..=end]
                .iter()
                .map(|n| n.id.clone())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn contains(&self, graph: &NodeGraph, id: &NodeId) -> bool {
        match (self.index_range(graph), graph.index_of(id)) {
            (Some((start, end)), Some(index)) => (start..=end).contains(&index),
            _ => false,
        }
    }

    /// The scope expressed over connectors. `None` when nothing can be in
    /// scope.
    pub fn connector_window(&self, graph: &NodeGraph) -> Option<ScopeWindow> {
        let (start, end) = self.index_range(graph)?;
        Some(ScopeWindow {
            start: ConnectorIndex(start),
            end: self.end.as_ref().map(|_| ConnectorIndex(end)),
        })
    }
}
