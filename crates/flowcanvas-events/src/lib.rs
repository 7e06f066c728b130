use crossbeam_channel::{Receiver, Sender, unbounded};
use flowcanvas_core::{ConnectorIndex, NodeId, PanelSide};
use serde::{Deserialize, Serialize};

const EVENTS_TARGET: &str = "flowcanvas::events";

/// Outbound notifications raised by the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CanvasEvent {
    // Selection
    NodeSelected(Option<NodeId>),

    // Build mode editing
    /// Something the host would save changed (title edit, node removal, insertion).
    ContentChanged,
    NodeAddRequested {
        anchor: NodeId,
    },
    ConnectorAddRequested(ConnectorIndex),
    NodeCopyRequested(NodeId),
    NodeCutRequested(NodeId),

    // Test mode
    OutputsChanged {
        node_id: NodeId,
        payload: serde_json::Value,
    },

    // Layout
    PanelChanged {
        side: PanelSide,
        open: bool,
        width: f32,
    },
}

impl CanvasEvent {
    pub fn name(&self) -> &'static str {
        match self {
            CanvasEvent::NodeSelected(_) => "node_selected",
            CanvasEvent::ContentChanged => "content_changed",
            CanvasEvent::NodeAddRequested { .. } => "node_add_requested",
            CanvasEvent::ConnectorAddRequested(_) => "connector_add_requested",
            CanvasEvent::NodeCopyRequested(_) => "node_copy_requested",
            CanvasEvent::NodeCutRequested(_) => "node_cut_requested",
            CanvasEvent::OutputsChanged { .. } => "outputs_changed",
            CanvasEvent::PanelChanged { .. } => "panel_changed",
        }
    }
}

#[derive(Clone)]
pub struct EventBus {
    tx: Sender<CanvasEvent>,
    rx: Receiver<CanvasEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<CanvasEvent> {
        self.tx.clone()
    }

    pub fn receiver(&self) -> Receiver<CanvasEvent> {
        self.rx.clone()
    }

    pub fn publish(&self, event: CanvasEvent) {
        tracing::trace!(target: EVENTS_TARGET, event = event.name(), "publish");
        let _ = self.tx.send(event);
    }

    /// Dispatch all pending events to a listener.
    /// Hosts call this from their own loop after driving the canvas.
    pub fn dispatch_to<L: EventListener>(&self, listener: &mut L) {
        while let Ok(event) = self.rx.try_recv() {
            listener.handle_event(&event);
        }
    }

    /// Take every pending event without a listener.
    pub fn drain(&self) -> Vec<CanvasEvent> {
        self.rx.try_iter().collect()
    }
}

/// Trait for components that respond to canvas events.
pub trait EventListener {
    fn handle_event(&mut self, event: &CanvasEvent);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Recorder(Vec<&'static str>);

    impl EventListener for Recorder {
        fn handle_event(&mut self, event: &CanvasEvent) {
            self.0.push(event.name());
        }
    }

    #[test]
    fn test_event_bus_publish_receive() {
        let bus = EventBus::new();
        let sender = bus.sender();
        let receiver = bus.receiver();

        sender
            .send(CanvasEvent::NodeSelected(Some(NodeId::from("create-task"))))
            .unwrap();

        match receiver.recv().unwrap() {
            CanvasEvent::NodeSelected(Some(id)) => assert_eq!(id.as_str(), "create-task"),
            other => panic!("Expected NodeSelected, got {:?}", other),
        }
    }

    #[test]
    fn test_dispatch_preserves_order() {
        let bus = EventBus::new();
        bus.publish(CanvasEvent::ContentChanged);
        bus.publish(CanvasEvent::ConnectorAddRequested(ConnectorIndex(2)));
        bus.publish(CanvasEvent::NodeSelected(None));

        let mut recorder = Recorder(Vec::new());
        bus.dispatch_to(&mut recorder);
        assert_eq!(
            recorder.0,
            vec!["content_changed", "connector_add_requested", "node_selected"]
        );
        assert!(bus.drain().is_empty());
    }
}
