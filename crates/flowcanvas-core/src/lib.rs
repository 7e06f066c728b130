use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod error;
pub mod status;

pub use error::{EnumConversionError, GraphError, ScopeError};
pub use status::{PathStatus, ScenarioStatus};

/// Caller-supplied, stable node identifier. Unique within one graph.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Position of a connector: connector `i` joins node `i` and node `i + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectorIndex(pub usize);

impl fmt::Display for ConnectorIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(pub String);

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ScenarioId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    // Terminals
    Start,
    End,

    // Record operations
    Create,
    Update,
    Delete,

    // Logic
    Action,
    Decision,

    Other,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Start => "start",
            NodeKind::End => "end",
            NodeKind::Create => "create",
            NodeKind::Update => "update",
            NodeKind::Delete => "delete",
            NodeKind::Action => "action",
            NodeKind::Decision => "decision",
            NodeKind::Other => "other",
        }
    }

    /// Start and end nodes frame the flow and cannot be edited structurally.
    pub fn is_terminal(&self) -> bool {
        matches!(self, NodeKind::Start | NodeKind::End)
    }
}

impl FromStr for NodeKind {
    type Err = EnumConversionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "start" => Ok(NodeKind::Start),
            "end" => Ok(NodeKind::End),
            "create" => Ok(NodeKind::Create),
            "update" => Ok(NodeKind::Update),
            "delete" => Ok(NodeKind::Delete),
            "action" => Ok(NodeKind::Action),
            "decision" => Ok(NodeKind::Decision),
            "other" => Ok(NodeKind::Other),
            _ => Err(EnumConversionError::InvalidNodeKind(value.to_string())),
        }
    }
}

/// A single flow element displayed on the canvas.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FlowNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    /// Icon token resolved by the host's asset layer.
    #[serde(default)]
    pub icon: String,
    #[serde(default = "default_icon_color")]
    pub icon_color: String,
    #[serde(default)]
    pub badge: Option<String>,
}

fn default_icon_color() -> String {
    "#6b7280".to_string()
}

impl FlowNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, title: impl Into<String>) -> Self {
        Self {
            id: NodeId::new(id),
            kind,
            title: title.into(),
            subtitle: String::new(),
            icon: kind.as_str().to_string(),
            icon_color: default_icon_color(),
            badge: None,
        }
    }

    pub fn with_subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn with_badge(mut self, badge: impl Into<String>) -> Self {
        self.badge = Some(badge.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CanvasMode {
    #[default]
    Build,
    Test,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelSide {
    Left,
    Right,
}

impl PanelSide {
    pub fn other(&self) -> Self {
        match self {
            PanelSide::Left => PanelSide::Right,
            PanelSide::Right => PanelSide::Left,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_kind_parses_every_label() {
        for kind in [
            NodeKind::Start,
            NodeKind::End,
            NodeKind::Create,
            NodeKind::Update,
            NodeKind::Delete,
            NodeKind::Action,
            NodeKind::Decision,
            NodeKind::Other,
        ] {
            assert_eq!(kind.as_str().parse::<NodeKind>().unwrap(), kind);
        }
        assert!("loop".parse::<NodeKind>().is_err());
    }

    #[test]
    fn flow_node_deserializes_with_defaults() {
        let node: FlowNode =
            serde_json::from_str(r#"{"id":"send-email","kind":"action","title":"Send email"}"#)
                .unwrap();
        assert_eq!(node.id, NodeId::from("send-email"));
        assert_eq!(node.kind, NodeKind::Action);
        assert!(node.subtitle.is_empty());
        assert_eq!(node.badge, None);
        assert_eq!(node.icon_color, "#6b7280");
    }

    #[test]
    fn terminal_kinds() {
        assert!(NodeKind::Start.is_terminal());
        assert!(NodeKind::End.is_terminal());
        assert!(!NodeKind::Update.is_terminal());
        assert_eq!(PanelSide::Left.other(), PanelSide::Right);
    }
}
