use crate::NodeId;
use thiserror::Error;

/// Error type for enum conversion failures
#[derive(Error, Debug, Clone)]
pub enum EnumConversionError {
    #[error("Invalid NodeKind value: {0}")]
    InvalidNodeKind(String),
    #[error("Invalid ScenarioStatus value: {0}")]
    InvalidScenarioStatus(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("Duplicate node id: {0}")]
    DuplicateNode(NodeId),
    #[error("Anchor index {index} out of range for {len} nodes")]
    AnchorOutOfRange { index: usize, len: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScopeError {
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("End point not allowed on {0}: no connector would remain after it")]
    EndPointNotAllowed(NodeId),
    #[error("Scope bound on {0} would place the start after the end")]
    Inverted(NodeId),
}
