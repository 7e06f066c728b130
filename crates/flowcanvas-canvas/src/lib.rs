pub mod action;
pub mod config;
pub mod controller;
pub mod menu;
pub mod scheduler;
pub mod settings;
pub mod state;
pub mod view;

pub use action::{CanvasAction, FieldKind};
pub use config::{Capabilities, CanvasCallbacks, CanvasConfig, ConfirmPrompt, DeleteRequest};
pub use controller::CanvasController;
pub use menu::{MenuItem, MenuItemKind, NodeMenu};
pub use scheduler::{Clock, DebounceKey, Debouncer, ResyncGate, SystemClock, VirtualClock};
pub use settings::{CanvasSettings, DebounceSettings, SettingsError};
pub use state::CanvasState;
pub use view::{
    CanvasView, ConnectorView, NodeView, OverlayPlacement, PanelView, ZoomView, content_size, render,
};

pub(crate) const CANVAS_TARGET: &str = "flowcanvas::canvas";
