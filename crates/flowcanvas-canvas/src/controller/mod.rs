//! The canvas controller: owns the state, applies [`CanvasAction`]s and
//! forwards the resulting notifications to the host.

use flowcanvas_core::{
    CanvasMode, ConnectorIndex, FlowNode, NodeId, PanelSide, PathStatus, ScenarioId, Size,
};
use flowcanvas_events::{CanvasEvent, EventBus};
use flowcanvas_graph::{FitOutcome, PanelWidths, ScenarioHighlight};
use std::collections::{BTreeSet, HashSet};
use std::time::Duration;

use crate::CANVAS_TARGET;
use crate::action::{CanvasAction, FieldKind};
use crate::config::{CanvasCallbacks, CanvasConfig, ConfirmPrompt, DeleteRequest};
use crate::menu::{MenuItemKind, NodeMenu, menu_items};
use crate::scheduler::{Clock, DebounceKey, Debouncer, ResyncGate, SystemClock};
use crate::settings::DebounceSettings;
use crate::state::CanvasState;
use crate::view::{self, CanvasView, OverlayPlacement};


/// Live canvas. Absent when the controller was created without a mount
/// point.
struct Session {
    state: CanvasState,
    edits: Debouncer<String>,
    debounce: DebounceSettings,
    gate: ResyncGate,
    drag_start: Option<PanelWidths>,
    outbox: Vec<CanvasEvent>,
}

pub struct CanvasController {
    session: Option<Session>,
    callbacks: CanvasCallbacks,
    bus: EventBus,
    clock: Box<dyn Clock>,
}

impl CanvasController {
    pub fn new(config: CanvasConfig, callbacks: CanvasCallbacks, bus: EventBus) -> Self {
        Self::with_clock(config, callbacks, bus, SystemClock::default())
    }

    pub fn with_clock(
        config: CanvasConfig,
        callbacks: CanvasCallbacks,
        bus: EventBus,
        clock: impl Clock + 'static,
    ) -> Self {
        let session = if config.has_mount_point() {
            tracing::info!(
                target: CANVAS_TARGET,
                nodes = config.nodes.len(),
                mode = ?config.mode,
                "canvas mounted"
            );
            Some(Session {
                state: CanvasState::from_config(&config),
                edits: Debouncer::new(),
                debounce: config.settings.debounce,
                gate: ResyncGate::new(config.settings.resync_max_suspend()),
                drag_start: None,
                outbox: Vec::new(),
            })
        } else {
            tracing::warn!(target: CANVAS_TARGET, "No mount point given, canvas stays inert");
            None
        };
        Self {
            session,
            callbacks,
            bus,
            clock: Box::new(clock),
        }
    }

    pub fn is_inert(&self) -> bool {
        self.session.is_none()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn state(&self) -> Option<&CanvasState> {
        self.session.as_ref().map(|s| &s.state)
    }

    /// Render the current state without consuming the dirty flag.
    pub fn view(&self) -> Option<CanvasView> {
        self.state().map(view::render)
    }

    pub fn selected(&self) -> Option<&NodeId> {
        self.state().and_then(|s| s.selection.as_ref())
    }

    pub fn scope_node_ids(&self) -> Vec<NodeId> {
        self.state()
            .map(|s| s.scope.scope_node_ids(&s.graph))
            .unwrap_or_default()
    }

    pub fn connector_status(&self, index: ConnectorIndex) -> BTreeSet<PathStatus> {
        self.state()
            .map(|s| s.highlights.connector_status(index, s.connector_window()))
            .unwrap_or_default()
    }

    pub fn node_outputs(&self, id: &NodeId) -> Option<&serde_json::Value> {
        self.state().and_then(|s| s.outputs.get(id))
    }

    /// Panel widths for the host to persist.
    pub fn remembered_panel_widths(&self) -> Option<PanelWidths> {
        self.state().map(|s| s.panels.widths())
    }

    pub fn pending_edits(&self) -> usize {
        self.session.as_ref().map_or(0, |s| s.edits.len())
    }

    /// Apply one action and deliver the notifications it raised.
    pub fn dispatch(&mut self, action: CanvasAction) {
        let now = self.clock.now();
        let detail_view_active = self.callbacks.detail_view_active();
        let Some(session) = self.session.as_mut() else {
            tracing::debug!(target: CANVAS_TARGET, action = action.name(), "inert canvas ignored action");
            return;
        };
        tracing::trace!(target: CANVAS_TARGET, action = action.name(), "dispatch");

        match action {
            CanvasAction::SetNodes { nodes } => session.set_nodes(nodes),
            CanvasAction::InsertNode { anchor_index, node } => {
                session.insert_node(anchor_index, node)
            }
            CanvasAction::SelectNode { id } => session.select_node(id),
            CanvasAction::Deselect => session.deselect(),
            CanvasAction::ToggleMenu { id } => session.toggle_menu(id, detail_view_active),
            CanvasAction::DismissMenus => session.dismiss_menus(),
            CanvasAction::ChooseMenuItem { id, item } => {
                let confirm = self.callbacks.confirm_delete.as_mut();
                session.choose_menu_item(&id, item, confirm);
            }
            CanvasAction::RequestConnectorAdd { index } => session.request_connector_add(index),
            CanvasAction::RequestNodeAdd { anchor } => session.request_node_add(anchor),
            CanvasAction::DeleteNode { id } => {
                let confirm = self.callbacks.confirm_delete.as_mut();
                session.delete_node(&id, confirm);
            }
            CanvasAction::CopyNode { id } => session.copy_node(&id),
            CanvasAction::CutNode { id } => session.cut_node(&id),
            CanvasAction::EditTitle { id, title } => session.edit_title(&id, title),
            CanvasAction::SetMode { mode } => session.set_mode(mode),
            CanvasAction::SetTestStart { id } => session.set_test_start(&id),
            CanvasAction::SetTestEnd { id } => session.set_test_end(&id),
            CanvasAction::ClearTestStart => session.clear_test_start(),
            CanvasAction::ClearTestEnd => session.clear_test_end(),
            CanvasAction::SetHighlights { highlights } => session.set_highlights(highlights),
            CanvasAction::ClearHighlights { ids } => session.clear_highlights(ids.as_ref()),
            CanvasAction::SetExecutionPath { connectors } => {
                session.set_execution_path(connectors)
            }
            CanvasAction::ZoomIn => session.zoom(|zoom| zoom.zoom_in()),
            CanvasAction::ZoomOut => session.zoom(|zoom| zoom.zoom_out()),
            CanvasAction::SetZoom { level } => session.zoom(|zoom| zoom.set_level(level)),
            CanvasAction::ZoomToFit => session.zoom_to_fit(),
            CanvasAction::SetViewport { size } => session.set_viewport(size),
            CanvasAction::OpenPanel { side } => session.open_panel(side, now),
            CanvasAction::ClosePanel { side } => session.close_panel(side),
            CanvasAction::PanelTransitionFinished => session.panel_transition_finished(),
            CanvasAction::BeginPanelDrag { side, pointer_x } => {
                session.begin_panel_drag(side, pointer_x)
            }
            CanvasAction::UpdatePanelDrag { pointer_x } => session.update_panel_drag(pointer_x),
            CanvasAction::EndPanelDrag => session.end_panel_drag(),
            CanvasAction::SetNodeOutputs { id, payload } => session.set_node_outputs(id, payload),
            CanvasAction::EditOutputField {
                id,
                field,
                value,
                kind,
            } => session.edit_output_field(id, field, value, kind, now, detail_view_active),
        }
        self.flush_outbox();
    }

    /// Frame tick: commit due edits, lift an expired re-sync suspension and
    /// return a fresh view when anything changed since the last frame.
    pub fn tick(&mut self) -> Option<CanvasView> {
        let now = self.clock.now();
        let session = self.session.as_mut()?;
        for (key, value) in session.edits.take_due(now) {
            session.commit_edit(key, value);
        }
        if session.gate.poll(now) {
            tracing::debug!(target: CANVAS_TARGET, "overlay re-sync resumed after timeout");
        }
        if session.gate.is_enabled(now) {
            session.resync_overlay();
        }
        self.flush_outbox();

        let state = &mut self.session.as_mut()?.state;
        if !state.dirty {
            return None;
        }
        state.dirty = false;
        Some(view::render(state))
    }

    fn flush_outbox(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let events = std::mem::take(&mut session.outbox);
        for event in events {
            self.notify(event);
        }
    }

    /// Hand the event to its callback; the bus only carries what no
    /// installed callback consumed, so callback-only hosts never need to
    /// drain it.
    fn notify(&mut self, event: CanvasEvent) {
        let callbacks = &mut self.callbacks;
        let consumed = match &event {
            CanvasEvent::NodeSelected(id) => callbacks
                .on_node_selected
                .as_mut()
                .map(|cb| cb(id.as_ref()))
                .is_some(),
            CanvasEvent::ContentChanged => {
                callbacks.on_content_changed.as_mut().map(|cb| cb()).is_some()
            }
            CanvasEvent::NodeAddRequested { anchor } => {
                callbacks.on_node_add.as_mut().map(|cb| cb(anchor)).is_some()
            }
            CanvasEvent::ConnectorAddRequested(index) => callbacks
                .on_connector_add
                .as_mut()
                .map(|cb| cb(*index))
                .is_some(),
            CanvasEvent::NodeCopyRequested(id) => {
                callbacks.on_node_copy.as_mut().map(|cb| cb(id)).is_some()
            }
            CanvasEvent::NodeCutRequested(id) => {
                callbacks.on_node_cut.as_mut().map(|cb| cb(id)).is_some()
            }
            CanvasEvent::OutputsChanged { node_id, payload } => callbacks
                .on_outputs_changed
                .as_mut()
                .map(|cb| cb(node_id, payload))
                .is_some(),
            CanvasEvent::PanelChanged { .. } => false,
        };
        if consumed {
            tracing::trace!(target: CANVAS_TARGET, event = event.name(), "delivered to callback");
        } else {
            self.bus.publish(event);
        }
    }
}

impl Session {
    fn emit(&mut self, event: CanvasEvent) {
        self.outbox.push(event);
    }

    fn mark_dirty(&mut self) {
        self.state.dirty = true;
    }

    fn require_build_mode(&self, what: &str) -> bool {
        if self.state.mode != CanvasMode::Build {
            tracing::debug!(target: CANVAS_TARGET, what, "refused outside build mode");
            return false;
        }
        true
    }

    fn require_node(&self, id: &NodeId) -> Option<&FlowNode> {
        let node = self.state.graph.get(id);
        if node.is_none() {
            tracing::debug!(target: CANVAS_TARGET, %id, "unknown node");
        }
        node
    }

    /// Connector indices shift with every structural change, so any
    /// reported path is void afterwards.
    fn void_highlights(&mut self) {
        if self.state.highlights.clear_highlights(None) {
            tracing::debug!(target: CANVAS_TARGET, "highlights cleared");
        }
    }

    // Structure

    fn set_nodes(&mut self, nodes: Vec<FlowNode>) {
        if let Err(e) = self.state.graph.replace_all(nodes) {
            tracing::warn!(target: CANVAS_TARGET, "Rejected node list: {}", e);
            return;
        }
        self.state.menu = None;
        if self.state.prune_dangling() {
            self.emit(CanvasEvent::NodeSelected(None));
        }
        self.void_highlights();
        self.mark_dirty();
    }

    fn insert_node(&mut self, anchor_index: usize, node: FlowNode) {
        if let Err(e) = self.state.graph.insert_after(anchor_index, node) {
            tracing::debug!(target: CANVAS_TARGET, "Insert refused: {}", e);
            return;
        }
        self.void_highlights();
        self.mark_dirty();
        if self.state.mode == CanvasMode::Build {
            self.emit(CanvasEvent::ContentChanged);
        }
    }

    // Selection and menus

    fn select_node(&mut self, id: NodeId) {
        if self.require_node(&id).is_none() {
            return;
        }
        if self.state.menu.take().is_some() {
            self.mark_dirty();
        }
        if self.state.selection.as_ref() == Some(&id) {
            return;
        }
        self.state.selection = Some(id.clone());
        self.mark_dirty();
        self.emit(CanvasEvent::NodeSelected(Some(id)));
    }

    fn deselect(&mut self) {
        if self.state.menu.take().is_some() {
            self.mark_dirty();
        }
        if self.state.selection.take().is_some() {
            self.mark_dirty();
            self.emit(CanvasEvent::NodeSelected(None));
        }
    }

    fn toggle_menu(&mut self, id: NodeId, detail_view_active: bool) {
        if self
            .state
            .menu
            .as_ref()
            .is_some_and(|menu| menu.node_id == id)
        {
            self.state.menu = None;
            self.mark_dirty();
            return;
        }
        let items = menu_items(&self.state, &id, detail_view_active);
        if items.is_empty() {
            tracing::debug!(target: CANVAS_TARGET, %id, "menu has no items, not opening");
            return;
        }
        self.state.menu = Some(NodeMenu { node_id: id, items });
        self.mark_dirty();
    }

    fn dismiss_menus(&mut self) {
        if self.state.menu.take().is_some() {
            self.mark_dirty();
        }
    }

    fn choose_menu_item(
        &mut self,
        id: &NodeId,
        item: MenuItemKind,
        confirm: Option<&mut Box<dyn ConfirmPrompt>>,
    ) {
        let enabled = self
            .state
            .menu
            .as_ref()
            .is_some_and(|menu| &menu.node_id == id && menu.is_enabled(item));
        if !enabled {
            tracing::debug!(target: CANVAS_TARGET, %id, ?item, "menu item not available");
            return;
        }
        self.state.menu = None;
        self.mark_dirty();
        match item {
            MenuItemKind::Copy => self.copy_node(id),
            MenuItemKind::Cut => self.cut_node(id),
            MenuItemKind::Delete => self.delete_node(id, confirm),
            MenuItemKind::SetStartPoint => self.set_test_start(id),
            MenuItemKind::RemoveStartPoint => self.clear_test_start(),
            MenuItemKind::SetEndPoint => self.set_test_end(id),
            MenuItemKind::RemoveEndPoint => self.clear_test_end(),
        }
    }

    // Build mode requests

    fn request_connector_add(&mut self, index: ConnectorIndex) {
        if !self.require_build_mode("connector add") {
            return;
        }
        if index.0 >= self.state.graph.connector_count() {
            tracing::debug!(target: CANVAS_TARGET, %index, "unknown connector");
            return;
        }
        self.emit(CanvasEvent::ConnectorAddRequested(index));
    }

    fn request_node_add(&mut self, anchor: NodeId) {
        if !self.require_build_mode("node add") || self.require_node(&anchor).is_none() {
            return;
        }
        self.emit(CanvasEvent::NodeAddRequested { anchor });
    }

    /// Copy, cut and delete apply to non-terminal nodes in build mode.
    fn editable_node(&self, id: &NodeId, what: &str) -> Option<&FlowNode> {
        if !self.require_build_mode(what) {
            return None;
        }
        let node = self.require_node(id)?;
        if node.kind.is_terminal() {
            tracing::debug!(target: CANVAS_TARGET, %id, what, "terminal node");
            return None;
        }
        Some(node)
    }

    fn copy_node(&mut self, id: &NodeId) {
        if self.editable_node(id, "copy").is_some() {
            self.emit(CanvasEvent::NodeCopyRequested(id.clone()));
        }
    }

    fn cut_node(&mut self, id: &NodeId) {
        if self.editable_node(id, "cut").is_some() {
            self.emit(CanvasEvent::NodeCutRequested(id.clone()));
        }
    }

    fn delete_node(&mut self, id: &NodeId, confirm: Option<&mut Box<dyn ConfirmPrompt>>) {
        let Some(node) = self.editable_node(id, "delete") else {
            return;
        };
        let request = DeleteRequest {
            node_id: node.id.clone(),
            title: node.title.clone(),
        };
        let confirmed = match confirm {
            Some(prompt) => prompt.confirm(&request),
            None => {
                tracing::debug!(target: CANVAS_TARGET, %id, "no confirmation prompt, delete refused");
                false
            }
        };
        if !confirmed {
            tracing::debug!(target: CANVAS_TARGET, %id, "delete declined");
            return;
        }
        if let Err(e) = self.state.graph.remove(id) {
            tracing::debug!(target: CANVAS_TARGET, "Delete failed: {}", e);
            return;
        }
        tracing::info!(target: CANVAS_TARGET, %id, "node deleted");
        self.edits.cancel_node(id);
        if self.state.prune_dangling() {
            self.emit(CanvasEvent::NodeSelected(None));
        }
        self.void_highlights();
        self.mark_dirty();
        self.emit(CanvasEvent::ContentChanged);
    }

    fn edit_title(&mut self, id: &NodeId, title: String) {
        if self.state.mode == CanvasMode::Test {
            tracing::debug!(target: CANVAS_TARGET, %id, "fields are read-only in test mode");
            return;
        }
        if self.state.selection.as_ref() != Some(id) {
            tracing::debug!(target: CANVAS_TARGET, %id, "title edit on unselected node");
            return;
        }
        match self.state.graph.get(id) {
            Some(node) if node.title == title => return,
            Some(_) => {}
            None => return,
        }
        if self.state.graph.set_title(id, title).is_ok() {
            self.mark_dirty();
            self.emit(CanvasEvent::ContentChanged);
        }
    }

    fn set_mode(&mut self, mode: CanvasMode) {
        if self.state.mode == mode {
            return;
        }
        for (key, value) in self.edits.flush() {
            self.commit_edit(key, value);
        }
        tracing::info!(target: CANVAS_TARGET, ?mode, "mode switched");
        self.state.mode = mode;
        self.state.menu = None;
        self.state.zoom.reset();
        if mode == CanvasMode::Build {
            self.void_highlights();
        }
        self.mark_dirty();
    }

    // Test scope

    fn require_selective_testing(&self) -> bool {
        if !self.state.selective_testing_active() {
            tracing::debug!(target: CANVAS_TARGET, "selective testing unavailable");
            return false;
        }
        true
    }

    fn scope_changed(&mut self) {
        self.void_highlights();
        self.mark_dirty();
    }

    fn set_test_start(&mut self, id: &NodeId) {
        if !self.require_selective_testing() {
            return;
        }
        match self.state.scope.set_start(&self.state.graph, id) {
            Ok(true) => self.scope_changed(),
            Ok(false) => {}
            Err(e) => tracing::debug!(target: CANVAS_TARGET, "Start point refused: {}", e),
        }
    }

    fn set_test_end(&mut self, id: &NodeId) {
        if !self.require_selective_testing() {
            return;
        }
        match self.state.scope.set_end(&self.state.graph, id) {
            Ok(true) => self.scope_changed(),
            Ok(false) => {}
            Err(e) => tracing::debug!(target: CANVAS_TARGET, "End point refused: {}", e),
        }
    }

    fn clear_test_start(&mut self) {
        if self.require_selective_testing() && self.state.scope.clear_start() {
            self.scope_changed();
        }
    }

    fn clear_test_end(&mut self) {
        if self.require_selective_testing() && self.state.scope.clear_end() {
            self.scope_changed();
        }
    }

    // Highlights

    fn set_highlights(&mut self, highlights: Vec<ScenarioHighlight>) {
        if !self.state.is_test_mode() {
            tracing::debug!(target: CANVAS_TARGET, "highlights ignored outside test mode");
            return;
        }
        self.state.highlights.set_highlights(highlights);
        self.mark_dirty();
    }

    fn clear_highlights(&mut self, ids: Option<&HashSet<ScenarioId>>) {
        if self.state.highlights.clear_highlights(ids) {
            self.mark_dirty();
        }
    }

    fn set_execution_path(&mut self, connectors: Vec<ConnectorIndex>) {
        if !self.state.is_test_mode() {
            tracing::debug!(target: CANVAS_TARGET, "execution path ignored outside test mode");
            return;
        }
        self.state.highlights.set_execution_path(connectors);
        self.mark_dirty();
    }

    // Viewport

    fn zoom(&mut self, apply: impl FnOnce(&mut flowcanvas_graph::ZoomController)) {
        apply(&mut self.state.zoom);
        self.mark_dirty();
    }

    /// Fit into the part of the viewport the open panels leave visible.
    fn zoom_to_fit(&mut self) {
        let state = &mut self.state;
        let covered = OverlayPlacement::from_panels(&state.panels);
        let visible = Size::new(
            (state.viewport.width - covered.left_inset - covered.right_inset).max(0.0),
            state.viewport.height,
        );
        let content = view::content_size(state.graph.len());
        match state.zoom.zoom_to_fit(visible, content) {
            FitOutcome::Unchanged => {}
            FitOutcome::Reset | FitOutcome::Fitted(_) => self.mark_dirty(),
        }
    }

    fn set_viewport(&mut self, size: Size) {
        if !(size.width.is_finite() && size.height.is_finite())
            || size.width <= 0.0
            || size.height <= 0.0
        {
            tracing::debug!(target: CANVAS_TARGET, ?size, "ignoring degenerate viewport");
            return;
        }
        self.state.viewport = size;
        self.state.panels.set_viewport_width(size.width);
        self.mark_dirty();
    }

    fn resync_overlay(&mut self) {
        let placement = OverlayPlacement::from_panels(&self.state.panels);
        if placement != self.state.overlay {
            self.state.overlay = placement;
            self.mark_dirty();
        }
    }

    // Side panels

    fn panel_changed(&mut self, side: PanelSide) {
        let open = self.state.panels.is_open(side);
        let width = self.state.panels.width(side);
        self.emit(CanvasEvent::PanelChanged { side, open, width });
    }

    fn open_panel(&mut self, side: PanelSide, now: Duration) {
        if !self.state.panels.open(side) {
            return;
        }
        self.gate.suspend(now);
        self.mark_dirty();
        self.panel_changed(side);
    }

    fn close_panel(&mut self, side: PanelSide) {
        if !self.state.panels.close(side) {
            return;
        }
        if self.state.panels.dragging_side().is_none() {
            self.drag_start = None;
        }
        self.gate.resume();
        self.mark_dirty();
        self.panel_changed(side);
    }

    fn panel_transition_finished(&mut self) {
        if self.gate.resume() {
            self.resync_overlay();
        }
    }

    fn begin_panel_drag(&mut self, side: PanelSide, pointer_x: f32) {
        if self.state.panels.begin_drag(side, pointer_x) {
            self.drag_start = Some(self.state.panels.widths());
            self.mark_dirty();
        }
    }

    fn update_panel_drag(&mut self, pointer_x: f32) {
        if self.state.panels.update_drag(pointer_x).is_some() {
            self.mark_dirty();
        }
    }

    fn end_panel_drag(&mut self) {
        let Some(widths) = self.state.panels.end_drag() else {
            return;
        };
        let before = self.drag_start.take().unwrap_or(widths);
        self.mark_dirty();
        if widths.left != before.left {
            self.panel_changed(PanelSide::Left);
        }
        if widths.right != before.right {
            self.panel_changed(PanelSide::Right);
        }
    }

    // Mock outputs

    fn set_node_outputs(&mut self, id: NodeId, payload: serde_json::Value) {
        if self.require_node(&id).is_none() {
            return;
        }
        self.edits.cancel_node(&id);
        self.state.outputs.insert(id, payload);
    }

    fn edit_output_field(
        &mut self,
        id: NodeId,
        field: String,
        value: String,
        kind: FieldKind,
        now: Duration,
        detail_view_active: bool,
    ) {
        if !self.state.is_test_mode() || !detail_view_active {
            tracing::debug!(target: CANVAS_TARGET, %id, "outputs are editable only in the detail test view");
            return;
        }
        if self.require_node(&id).is_none() {
            return;
        }
        let delay = Duration::from_millis(match kind {
            FieldKind::Short => self.debounce.short_field_ms,
            FieldKind::MultiLine => self.debounce.multi_line_field_ms,
        });
        self.edits
            .schedule(DebounceKey::new(id, field), value, now, delay);
    }

    fn commit_edit(&mut self, key: DebounceKey, value: String) {
        if !self.state.graph.contains(&key.node_id) {
            tracing::debug!(target: CANVAS_TARGET, id = %key.node_id, "dropping edit for removed node");
            return;
        }
        let payload = self
            .state
            .outputs
            .entry(key.node_id.clone())
            .or_insert_with(|| serde_json::Value::Object(serde_json::Map::new()));
        if !payload.is_object() {
            *payload = serde_json::Value::Object(serde_json::Map::new());
        }
        if let Some(map) = payload.as_object_mut() {
            map.insert(key.field, serde_json::Value::String(value));
        }
        let payload = payload.clone();
        self.emit(CanvasEvent::OutputsChanged {
            node_id: key.node_id,
            payload,
        });
    }
}
