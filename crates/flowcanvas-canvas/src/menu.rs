//! Per-node contextual menus. At most one is open at a time; the controller
//! holds it in [`CanvasState::menu`].

use flowcanvas_core::{CanvasMode, NodeId, NodeKind};
use serde::{Deserialize, Serialize};

use crate::state::CanvasState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuItemKind {
    // Build mode
    Copy,
    Cut,
    Delete,

    // Test mode, selective testing only
    SetStartPoint,
    RemoveStartPoint,
    SetEndPoint,
    RemoveEndPoint,
}

impl MenuItemKind {
    pub fn label(&self) -> &'static str {
        match self {
            MenuItemKind::Copy => "Copy",
            MenuItemKind::Cut => "Cut",
            MenuItemKind::Delete => "Delete",
            MenuItemKind::SetStartPoint => "Set start point",
            MenuItemKind::RemoveStartPoint => "Remove start point",
            MenuItemKind::SetEndPoint => "Set end point",
            MenuItemKind::RemoveEndPoint => "Remove end point",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub kind: MenuItemKind,
    pub enabled: bool,
}

impl MenuItem {
    fn enabled(kind: MenuItemKind) -> Self {
        Self {
            kind,
            enabled: true,
        }
    }
}

/// An open menu and the items it was opened with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMenu {
    pub node_id: NodeId,
    pub items: Vec<MenuItem>,
}

impl NodeMenu {
    pub fn item(&self, kind: MenuItemKind) -> Option<&MenuItem> {
        self.items.iter().find(|item| item.kind == kind)
    }

    pub fn is_enabled(&self, kind: MenuItemKind) -> bool {
        self.item(kind).is_some_and(|item| item.enabled)
    }
}

/// Items offered for `node_id` in the current state. Empty means the menu
/// must not open.
pub fn menu_items(state: &CanvasState, node_id: &NodeId, detail_view_active: bool) -> Vec<MenuItem> {
    let Some(node) = state.graph.get(node_id) else {
        return Vec::new();
    };
    match state.mode {
        CanvasMode::Build => {
            if node.kind.is_terminal() {
                return Vec::new();
            }
            vec![
                MenuItem::enabled(MenuItemKind::Copy),
                MenuItem::enabled(MenuItemKind::Cut),
                MenuItem::enabled(MenuItemKind::Delete),
            ]
        }
        CanvasMode::Test => {
            if !state.capabilities.selective_testing || detail_view_active {
                return Vec::new();
            }
            if node.kind == NodeKind::End {
                return Vec::new();
            }
            vec![start_item(state, node_id), end_item(state, node_id)]
        }
    }
}

fn start_item(state: &CanvasState, node_id: &NodeId) -> MenuItem {
    if state.scope.start() == Some(node_id) {
        return MenuItem::enabled(MenuItemKind::RemoveStartPoint);
    }
    let index = state.graph.index_of(node_id);
    let end_index = state.scope.end().and_then(|end| state.graph.index_of(end));
    let enabled = match (index, end_index) {
        (Some(index), Some(end_index)) => index <= end_index,
        (Some(_), None) => true,
        (None, _) => false,
    };
    MenuItem {
        kind: MenuItemKind::SetStartPoint,
        enabled,
    }
}

fn end_item(state: &CanvasState, node_id: &NodeId) -> MenuItem {
    if state.scope.end() == Some(node_id) {
        return MenuItem::enabled(MenuItemKind::RemoveEndPoint);
    }
    let index = state.graph.index_of(node_id);
    let start_index = state
        .scope
        .start()
        .and_then(|start| state.graph.index_of(start));
    let ordered = match (index, start_index) {
        (Some(index), Some(start_index)) => index >= start_index,
        (Some(_), None) => true,
        (None, _) => false,
    };
    MenuItem {
        kind: MenuItemKind::SetEndPoint,
        enabled: ordered && state.scope.can_set_end(&state.graph, node_id),
    }
}
