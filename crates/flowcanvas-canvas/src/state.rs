use flowcanvas_core::{CanvasMode, FlowNode, NodeId, Size};
use flowcanvas_graph::{
    NodeGraph, PanelLayoutNegotiator, PathHighlightCompositor, ScopeWindow, TestScopeTracker,
    ZoomController,
};
use std::collections::HashMap;

use crate::CANVAS_TARGET;
use crate::config::{Capabilities, CanvasConfig};
use crate::menu::NodeMenu;
use crate::view::OverlayPlacement;

/// Everything the canvas knows. Owned by one controller; the renderer only
/// reads it.
#[derive(Debug, Clone)]
pub struct CanvasState {
    pub mode: CanvasMode,
    pub capabilities: Capabilities,
    pub graph: NodeGraph,
    pub scope: TestScopeTracker,
    pub highlights: PathHighlightCompositor,
    pub zoom: ZoomController,
    pub panels: PanelLayoutNegotiator,
    pub viewport: Size,
    pub selection: Option<NodeId>,
    pub menu: Option<NodeMenu>,
    /// Mock outputs per node, edited in the detail test view.
    pub outputs: HashMap<NodeId, serde_json::Value>,
    /// Last placement computed while re-sync was enabled.
    pub overlay: OverlayPlacement,
    pub dirty: bool,
}

impl CanvasState {
    /// Build the initial state. An invalid node list starts the canvas empty.
    pub fn from_config(config: &CanvasConfig) -> Self {
        let graph = NodeGraph::new(config.nodes.clone()).unwrap_or_else(|e| {
            tracing::warn!(target: CANVAS_TARGET, "Rejected initial node list: {}", e);
            NodeGraph::default()
        });
        let settings = &config.settings;
        let mut panels = PanelLayoutNegotiator::new(settings.panels, config.viewport.width);
        if let Some(widths) = settings.panel_widths {
            panels.restore_widths(widths);
        }
        let overlay = OverlayPlacement::from_panels(&panels);
        Self {
            mode: config.mode,
            capabilities: config.capabilities,
            graph,
            scope: TestScopeTracker::new(),
            highlights: PathHighlightCompositor::new(),
            zoom: ZoomController::new(settings.zoom),
            panels,
            viewport: config.viewport,
            selection: None,
            menu: None,
            outputs: HashMap::new(),
            overlay,
            dirty: true,
        }
    }

    pub fn is_test_mode(&self) -> bool {
        self.mode == CanvasMode::Test
    }

    pub fn selective_testing_active(&self) -> bool {
        self.is_test_mode() && self.capabilities.selective_testing
    }

    pub fn selected_node(&self) -> Option<&FlowNode> {
        self.selection.as_ref().and_then(|id| self.graph.get(id))
    }

    pub fn connector_window(&self) -> Option<ScopeWindow> {
        self.scope.connector_window(&self.graph)
    }

    /// Drop selection, menu, scope bounds and outputs that point at nodes
    /// no longer in the graph. Returns whether the selection was dropped.
    pub fn prune_dangling(&mut self) -> bool {
        self.scope.prune(&self.graph);
        if self
            .menu
            .as_ref()
            .is_some_and(|menu| !self.graph.contains(&menu.node_id))
        {
            self.menu = None;
        }
        let graph = &self.graph;
        self.outputs.retain(|id, _| graph.contains(id));
        if self
            .selection
            .as_ref()
            .is_some_and(|id| !self.graph.contains(id))
        {
            self.selection = None;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcanvas_core::NodeKind;
    use flowcanvas_graph::PanelWidths;

    #[test]
    fn test_duplicate_initial_nodes_start_empty() {
        let config = CanvasConfig::new(
            "#canvas",
            vec![
                FlowNode::new("a", NodeKind::Start, "A"),
                FlowNode::new("a", NodeKind::End, "A again"),
            ],
        );
        let state = CanvasState::from_config(&config);
        assert!(state.graph.is_empty());
        assert!(state.dirty);
    }

    #[test]
    fn test_remembered_widths_are_restored() {
        let mut config = CanvasConfig::new("#canvas", Vec::new());
        config.settings.panel_widths = Some(PanelWidths {
            left: 450.0,
            right: 300.0,
        });
        let state = CanvasState::from_config(&config);
        assert_eq!(state.panels.widths().left, 450.0);
        // raised to the minimum width
        assert_eq!(state.panels.widths().right, 400.0);
    }

    #[test]
    fn test_prune_dangling_after_removal() {
        let config = CanvasConfig::new(
            "#canvas",
            vec![
                FlowNode::new("start", NodeKind::Start, "Start"),
                FlowNode::new("task", NodeKind::Create, "Task"),
                FlowNode::new("end", NodeKind::End, "End"),
            ],
        );
        let mut state = CanvasState::from_config(&config);
        let task = NodeId::from("task");
        state.selection = Some(task.clone());
        state.outputs.insert(task.clone(), serde_json::json!({"id": 1}));
        let graph = state.graph.clone();
        state.scope.set_start(&graph, &task).unwrap();

        state.graph.remove(&task).unwrap();
        assert!(state.prune_dangling());
        assert_eq!(state.selection, None);
        assert!(state.outputs.is_empty());
        assert!(state.scope.is_unbounded());
        assert!(!state.prune_dangling());
    }
}
