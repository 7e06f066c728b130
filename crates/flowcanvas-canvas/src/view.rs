//! Pure rendering of [`CanvasState`] into a serializable frame description.

use flowcanvas_core::{CanvasMode, ConnectorIndex, NodeId, NodeKind, PanelSide, Size};
use flowcanvas_graph::{ConnectorHighlight, PanelLayoutNegotiator, PanelWidths};
use serde::Serialize;
use std::collections::HashSet;

use crate::menu::NodeMenu;
use crate::state::CanvasState;

// Layout units, before zoom.
pub const NODE_WIDTH: f32 = 320.0;
pub const NODE_HEIGHT: f32 = 72.0;
pub const CONNECTOR_LENGTH: f32 = 56.0;

/// Unscaled size of a vertical flow of `node_count` nodes.
pub fn content_size(node_count: usize) -> Size {
    if node_count == 0 {
        return Size::default();
    }
    let n = node_count as f32;
    Size::new(NODE_WIDTH, n * NODE_HEIGHT + (n - 1.0) * CONNECTOR_LENGTH)
}

/// Where the legend and zoom controls sit, as insets from the viewport edges.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OverlayPlacement {
    pub left_inset: f32,
    pub right_inset: f32,
}

impl OverlayPlacement {
    pub fn from_panels(panels: &PanelLayoutNegotiator) -> Self {
        let inset = |side| {
            if panels.is_open(side) {
                panels.width(side)
            } else {
                0.0
            }
        };
        Self {
            left_inset: inset(PanelSide::Left),
            right_inset: inset(PanelSide::Right),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    pub id: NodeId,
    pub kind: NodeKind,
    pub title: String,
    pub subtitle: String,
    pub icon: String,
    pub icon_color: String,
    pub badge: Option<String>,
    /// Top edge in layout units.
    pub y: f32,
    pub selected: bool,
    pub in_scope: bool,
    pub is_start_point: bool,
    pub is_end_point: bool,
    /// Outside the test scope while one is bounded.
    pub dimmed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConnectorView {
    pub index: ConnectorIndex,
    pub from: NodeId,
    pub to: NodeId,
    pub highlight: ConnectorHighlight,
    /// Shows the "+" affordance.
    pub can_add: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ZoomView {
    pub level: f32,
    pub percent: u32,
    pub can_zoom_in: bool,
    pub can_zoom_out: bool,
    /// "Reset" after a manual zoom, "Fit" otherwise.
    pub fit_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanelView {
    pub left_open: bool,
    pub right_open: bool,
    pub widths: PanelWidths,
    pub dragging: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanvasView {
    pub mode: CanvasMode,
    pub nodes: Vec<NodeView>,
    pub connectors: Vec<ConnectorView>,
    pub zoom: ZoomView,
    pub panels: PanelView,
    pub menu: Option<NodeMenu>,
    pub overlay: OverlayPlacement,
    pub scope_start: Option<NodeId>,
    pub scope_end: Option<NodeId>,
}

impl CanvasView {
    pub fn node(&self, id: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id.as_str() == id)
    }
}

pub fn render(state: &CanvasState) -> CanvasView {
    let graph = &state.graph;
    let scoped: HashSet<NodeId> = state.scope.scope_node_ids(graph).into_iter().collect();
    let bounded = !state.scope.is_unbounded();

    let nodes = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(index, node)| {
            let in_scope = scoped.contains(&node.id);
            NodeView {
                id: node.id.clone(),
                kind: node.kind,
                title: node.title.clone(),
                subtitle: node.subtitle.clone(),
                icon: node.icon.clone(),
                icon_color: node.icon_color.clone(),
                badge: node.badge.clone(),
                y: index as f32 * (NODE_HEIGHT + CONNECTOR_LENGTH),
                selected: state.selection.as_ref() == Some(&node.id),
                in_scope,
                is_start_point: state.scope.start() == Some(&node.id),
                is_end_point: state.scope.end() == Some(&node.id),
                dimmed: state.is_test_mode() && bounded && !in_scope,
            }
        })
        .collect();

    let highlights = state
        .highlights
        .composite(graph.connector_count(), state.connector_window());
    let connectors = graph
        .connectors()
        .zip(highlights)
        .map(|(connector, highlight)| ConnectorView {
            index: connector.index,
            from: connector.from.clone(),
            to: connector.to.clone(),
            highlight,
            can_add: state.mode == CanvasMode::Build,
        })
        .collect();

    let zoom = &state.zoom;
    CanvasView {
        mode: state.mode,
        nodes,
        connectors,
        zoom: ZoomView {
            level: zoom.level(),
            percent: zoom.percent(),
            can_zoom_in: zoom.can_zoom_in(),
            can_zoom_out: zoom.can_zoom_out(),
            fit_label: if zoom.manually_changed() { "Reset" } else { "Fit" },
        },
        panels: PanelView {
            left_open: state.panels.is_open(PanelSide::Left),
            right_open: state.panels.is_open(PanelSide::Right),
            widths: state.panels.widths(),
            dragging: state.panels.is_dragging(),
        },
        menu: state.menu.clone(),
        overlay: state.overlay,
        scope_start: state.scope.start().cloned(),
        scope_end: state.scope.end().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CanvasConfig;
    use flowcanvas_core::{FlowNode, PathStatus, ScenarioStatus};
    use flowcanvas_graph::ScenarioHighlight;

    fn state() -> CanvasState {
        let config = CanvasConfig::new(
            "#canvas",
            vec![
                FlowNode::new("start", NodeKind::Start, "Start"),
                FlowNode::new("create-task", NodeKind::Create, "Create task"),
                FlowNode::new("update-case", NodeKind::Update, "Update case"),
                FlowNode::new("send-email", NodeKind::Action, "Send email"),
                FlowNode::new("end", NodeKind::End, "End"),
            ],
        )
        .with_mode(CanvasMode::Test);
        CanvasState::from_config(&config)
    }

    #[test]
    fn test_content_size() {
        assert_eq!(content_size(0), Size::default());
        assert_eq!(content_size(1), Size::new(320.0, 72.0));
        assert_eq!(content_size(3), Size::new(320.0, 3.0 * 72.0 + 2.0 * 56.0));
    }

    #[test]
    fn test_render_marks_scope_and_highlights() {
        let mut state = state();
        let graph = state.graph.clone();
        state.scope.set_start(&graph, &NodeId::from("create-task")).unwrap();
        state.scope.set_end(&graph, &NodeId::from("update-case")).unwrap();
        state.highlights.set_highlights(vec![ScenarioHighlight::new(
            "happy",
            ScenarioStatus::Passed,
            [0, 1, 2, 3],
        )]);

        let view = render(&state);
        assert_eq!(view.nodes.len(), 5);
        assert_eq!(view.connectors.len(), 4);
        assert!(view.node("start").unwrap().dimmed);
        assert!(view.node("create-task").unwrap().is_start_point);
        assert!(view.node("update-case").unwrap().is_end_point);
        assert!(!view.node("update-case").unwrap().dimmed);

        assert_eq!(view.connectors[0].highlight, ConnectorHighlight::None);
        assert_eq!(
            view.connectors[1].highlight,
            ConnectorHighlight::Single {
                status: PathStatus::Passed
            }
        );
        assert_eq!(view.connectors[2].highlight, ConnectorHighlight::Boundary);
        assert_eq!(view.connectors[3].highlight, ConnectorHighlight::None);
        assert!(!view.connectors[0].can_add);
    }

    #[test]
    fn test_overlay_insets_follow_open_panels() {
        let mut state = state();
        state.panels.open(PanelSide::Right);
        let overlay = OverlayPlacement::from_panels(&state.panels);
        assert_eq!(overlay.left_inset, 0.0);
        assert_eq!(overlay.right_inset, 400.0);

        let view = render(&state);
        assert!(view.panels.right_open);
        assert_eq!(view.zoom.fit_label, "Fit");
        assert_eq!(view.zoom.percent, 100);
    }
}
