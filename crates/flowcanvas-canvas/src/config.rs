use flowcanvas_core::{CanvasMode, ConnectorIndex, FlowNode, NodeId, Size};
use serde::{Deserialize, Serialize};

use crate::settings::CanvasSettings;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    /// Start/end point menus in test mode.
    pub selective_testing: bool,
}

/// Construction parameters for a [`crate::CanvasController`].
#[derive(Debug, Clone)]
pub struct CanvasConfig {
    /// Host element the canvas renders into. `None` or empty leaves the
    /// controller inert.
    pub mount_point: Option<String>,
    pub nodes: Vec<FlowNode>,
    pub mode: CanvasMode,
    pub capabilities: Capabilities,
    pub settings: CanvasSettings,
    pub viewport: Size,
}

impl CanvasConfig {
    pub fn new(mount_point: impl Into<String>, nodes: Vec<FlowNode>) -> Self {
        Self {
            mount_point: Some(mount_point.into()),
            nodes,
            mode: CanvasMode::Build,
            capabilities: Capabilities::default(),
            settings: CanvasSettings::default(),
            viewport: Size::new(1440.0, 900.0),
        }
    }

    pub fn with_mode(mut self, mode: CanvasMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_selective_testing(mut self, enabled: bool) -> Self {
        self.capabilities.selective_testing = enabled;
        self
    }

    pub fn with_settings(mut self, settings: CanvasSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_viewport(mut self, viewport: Size) -> Self {
        self.viewport = viewport;
        self
    }

    pub fn has_mount_point(&self) -> bool {
        self.mount_point
            .as_deref()
            .is_some_and(|mount| !mount.trim().is_empty())
    }
}

/// What the confirmation prompt is asked about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteRequest {
    pub node_id: NodeId,
    pub title: String,
}

/// Host-provided yes/no prompt for destructive actions.
pub trait ConfirmPrompt {
    fn confirm(&mut self, request: &DeleteRequest) -> bool;
}

impl<F> ConfirmPrompt for F
where
    F: FnMut(&DeleteRequest) -> bool,
{
    fn confirm(&mut self, request: &DeleteRequest) -> bool {
        self(request)
    }
}

/// Optional host hooks. A notification with no hook installed goes to the
/// controller's event bus instead, which the host must drain.
#[derive(Default)]
pub struct CanvasCallbacks {
    pub on_node_selected: Option<Box<dyn FnMut(Option<&NodeId>)>>,
    pub on_content_changed: Option<Box<dyn FnMut()>>,
    pub on_outputs_changed: Option<Box<dyn FnMut(&NodeId, &serde_json::Value)>>,
    pub on_connector_add: Option<Box<dyn FnMut(ConnectorIndex)>>,
    pub on_node_add: Option<Box<dyn FnMut(&NodeId)>>,
    pub on_node_copy: Option<Box<dyn FnMut(&NodeId)>>,
    pub on_node_cut: Option<Box<dyn FnMut(&NodeId)>>,
    /// Whether the host currently shows the detail test view, where mock
    /// outputs are editable and scope menus are hidden.
    pub is_detail_test_view_active: Option<Box<dyn Fn() -> bool>>,
    pub confirm_delete: Option<Box<dyn ConfirmPrompt>>,
}

impl std::fmt::Debug for CanvasCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CanvasCallbacks")
            .field("on_node_selected", &self.on_node_selected.is_some())
            .field("on_content_changed", &self.on_content_changed.is_some())
            .field("on_outputs_changed", &self.on_outputs_changed.is_some())
            .field("on_connector_add", &self.on_connector_add.is_some())
            .field("on_node_add", &self.on_node_add.is_some())
            .field("on_node_copy", &self.on_node_copy.is_some())
            .field("on_node_cut", &self.on_node_cut.is_some())
            .field(
                "is_detail_test_view_active",
                &self.is_detail_test_view_active.is_some(),
            )
            .field("confirm_delete", &self.confirm_delete.is_some())
            .finish()
    }
}

impl CanvasCallbacks {
    pub fn with_confirm(mut self, prompt: impl ConfirmPrompt + 'static) -> Self {
        self.confirm_delete = Some(Box::new(prompt));
        self
    }

    pub fn with_detail_view(mut self, active: impl Fn() -> bool + 'static) -> Self {
        self.is_detail_test_view_active = Some(Box::new(active));
        self
    }

    pub(crate) fn detail_view_active(&self) -> bool {
        self.is_detail_test_view_active
            .as_ref()
            .is_some_and(|active| active())
    }
}
