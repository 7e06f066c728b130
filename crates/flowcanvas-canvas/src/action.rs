use flowcanvas_core::{CanvasMode, ConnectorIndex, FlowNode, NodeId, PanelSide, ScenarioId, Size};
use flowcanvas_graph::ScenarioHighlight;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::menu::MenuItemKind;

/// Editor widget a mock-output field is typed into. Decides the debounce
/// delay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    #[default]
    Short,
    MultiLine,
}

/// Every input the canvas reacts to, from the user or from the host.
///
/// Applied by [`crate::CanvasController::dispatch`]. Serializable so that
/// sessions can be scripted and replayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CanvasAction {
    // Structure (host)
    SetNodes {
        nodes: Vec<FlowNode>,
    },
    InsertNode {
        anchor_index: usize,
        node: FlowNode,
    },

    // Selection and menus (user)
    SelectNode {
        id: NodeId,
    },
    Deselect,
    ToggleMenu {
        id: NodeId,
    },
    /// Click anywhere outside an open menu.
    DismissMenus,
    ChooseMenuItem {
        id: NodeId,
        item: MenuItemKind,
    },

    // Build mode requests
    RequestConnectorAdd {
        index: ConnectorIndex,
    },
    RequestNodeAdd {
        anchor: NodeId,
    },
    DeleteNode {
        id: NodeId,
    },
    CopyNode {
        id: NodeId,
    },
    CutNode {
        id: NodeId,
    },
    EditTitle {
        id: NodeId,
        title: String,
    },

    SetMode {
        mode: CanvasMode,
    },

    // Test scope
    SetTestStart {
        id: NodeId,
    },
    SetTestEnd {
        id: NodeId,
    },
    ClearTestStart,
    ClearTestEnd,

    // Highlights (host)
    SetHighlights {
        highlights: Vec<ScenarioHighlight>,
    },
    ClearHighlights {
        #[serde(default)]
        ids: Option<HashSet<ScenarioId>>,
    },
    SetExecutionPath {
        connectors: Vec<ConnectorIndex>,
    },

    // Viewport
    ZoomIn,
    ZoomOut,
    ZoomToFit,
    SetZoom {
        level: f32,
    },
    SetViewport {
        size: Size,
    },

    // Side panels
    OpenPanel {
        side: PanelSide,
    },
    ClosePanel {
        side: PanelSide,
    },
    /// The host's open/close animation ended.
    PanelTransitionFinished,
    BeginPanelDrag {
        side: PanelSide,
        pointer_x: f32,
    },
    UpdatePanelDrag {
        pointer_x: f32,
    },
    EndPanelDrag,

    // Mock outputs
    SetNodeOutputs {
        id: NodeId,
        payload: serde_json::Value,
    },
    EditOutputField {
        id: NodeId,
        field: String,
        value: String,
        #[serde(default)]
        kind: FieldKind,
    },
}

impl CanvasAction {
    pub fn name(&self) -> &'static str {
        match self {
            CanvasAction::SetNodes { .. } => "set_nodes",
            CanvasAction::InsertNode { .. } => "insert_node",
            CanvasAction::SelectNode { .. } => "select_node",
            CanvasAction::Deselect => "deselect",
            CanvasAction::ToggleMenu { .. } => "toggle_menu",
            CanvasAction::DismissMenus => "dismiss_menus",
            CanvasAction::ChooseMenuItem { .. } => "choose_menu_item",
            CanvasAction::RequestConnectorAdd { .. } => "request_connector_add",
            CanvasAction::RequestNodeAdd { .. } => "request_node_add",
            CanvasAction::DeleteNode { .. } => "delete_node",
            CanvasAction::CopyNode { .. } => "copy_node",
            CanvasAction::CutNode { .. } => "cut_node",
            CanvasAction::EditTitle { .. } => "edit_title",
            CanvasAction::SetMode { .. } => "set_mode",
            CanvasAction::SetTestStart { .. } => "set_test_start",
            CanvasAction::SetTestEnd { .. } => "set_test_end",
            CanvasAction::ClearTestStart => "clear_test_start",
            CanvasAction::ClearTestEnd => "clear_test_end",
            CanvasAction::SetHighlights { .. } => "set_highlights",
            CanvasAction::ClearHighlights { .. } => "clear_highlights",
            CanvasAction::SetExecutionPath { .. } => "set_execution_path",
            CanvasAction::ZoomIn => "zoom_in",
            CanvasAction::ZoomOut => "zoom_out",
            CanvasAction::ZoomToFit => "zoom_to_fit",
            CanvasAction::SetZoom { .. } => "set_zoom",
            CanvasAction::SetViewport { .. } => "set_viewport",
            CanvasAction::OpenPanel { .. } => "open_panel",
            CanvasAction::ClosePanel { .. } => "close_panel",
            CanvasAction::PanelTransitionFinished => "panel_transition_finished",
            CanvasAction::BeginPanelDrag { .. } => "begin_panel_drag",
            CanvasAction::UpdatePanelDrag { .. } => "update_panel_drag",
            CanvasAction::EndPanelDrag => "end_panel_drag",
            CanvasAction::SetNodeOutputs { .. } => "set_node_outputs",
            CanvasAction::EditOutputField { .. } => "edit_output_field",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_format() {
        let script = r#"[
            {"action": "select_node", "id": "create-task"},
            {"action": "zoom_in"},
            {"action": "open_panel", "side": "left"},
            {"action": "clear_highlights"},
            {"action": "edit_output_field", "id": "create-task", "field": "body", "value": "x", "kind": "multi_line"}
        ]"#;
        let actions: Vec<CanvasAction> = serde_json::from_str(script).unwrap();
        assert_eq!(
            actions[0],
            CanvasAction::SelectNode {
                id: NodeId::from("create-task")
            }
        );
        assert_eq!(actions[1], CanvasAction::ZoomIn);
        assert_eq!(actions[3], CanvasAction::ClearHighlights { ids: None });
        assert!(matches!(
            &actions[4],
            CanvasAction::EditOutputField {
                kind: FieldKind::MultiLine,
                ..
            }
        ));
        assert_eq!(actions[2].name(), "open_panel");
    }
}
