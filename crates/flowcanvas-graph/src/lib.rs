pub mod highlight;
pub mod node_graph;
pub mod panel_layout;
pub mod scope;
pub mod zoom;

pub use highlight::{ConnectorHighlight, PathHighlightCompositor, ScenarioHighlight};
pub use node_graph::{Connector, NodeGraph};
pub use panel_layout::{PanelLayoutConfig, PanelLayoutNegotiator, PanelState, PanelWidths};
pub use scope::{ScopeWindow, TestScopeTracker};
pub use zoom::{FitOutcome, ZoomConfig, ZoomController};

pub(crate) const GRAPH_TARGET: &str = "flowcanvas::graph";
