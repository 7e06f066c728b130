use flowcanvas_core::{ConnectorIndex, FlowNode, GraphError, NodeId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::GRAPH_TARGET;

/// The link between node `index` and node `index + 1`. Derived on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connector<'a> {
    pub index: ConnectorIndex,
    pub from: &'a NodeId,
    pub to: &'a NodeId,
}

/// Ordered, linear flow. Order is execution order.
///
/// Ids are unique: construction, replacement and insertion reject duplicates
/// instead of overwriting.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FlowNode>", into = "Vec<FlowNode>")]
pub struct NodeGraph {
    nodes: Vec<FlowNode>,
}

impl TryFrom<Vec<FlowNode>> for NodeGraph {
    type Error = GraphError;

    fn try_from(nodes: Vec<FlowNode>) -> Result<Self, Self::Error> {
        Self::new(nodes)
    }
}

impl From<NodeGraph> for Vec<FlowNode> {
    fn from(graph: NodeGraph) -> Self {
        graph.nodes
    }
}

impl NodeGraph {
    pub fn new(nodes: Vec<FlowNode>) -> Result<Self, GraphError> {
        let mut seen = HashSet::with_capacity(nodes.len());
        for node in &nodes {
            if !seen.insert(&node.id) {
                return Err(GraphError::DuplicateNode(node.id.clone()));
            }
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[FlowNode] {
        &self.nodes
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.nodes.iter().map(|n| &n.id)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.nodes.iter().position(|n| &n.id == id)
    }

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn get(&self, id: &NodeId) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn node_at(&self, index: usize) -> Option<&FlowNode> {
        self.nodes.get(index)
    }

    /// The node executed right after `id`, if any.
    pub fn successor(&self, id: &NodeId) -> Option<&FlowNode> {
        self.index_of(id).and_then(|i| self.nodes.get(i + 1))
    }

    pub fn connector_count(&self) -> usize {
        self.nodes.len().saturating_sub(1)
    }

    pub fn connectors(&self) -> impl Iterator<Item = Connector<'_>> {
        self.nodes.windows(2).enumerate().map(|(i, pair)| Connector {
            index: ConnectorIndex(i),
            from: &pair[0].id,
            to: &pair[1].id,
        })
    }

    pub fn connector(&self, index: ConnectorIndex) -> Option<Connector<'_>> {
        let from = self.nodes.get(index.0)?;
        let to = self.nodes.get(index.0 + 1)?;
        Some(Connector {
            index,
            from: &from.id,
            to: &to.id,
        })
    }

    /// Insert `node` directly after the node at `anchor_index`.
    pub fn insert_after(&mut self, anchor_index: usize, node: FlowNode) -> Result<(), GraphError> {
        if anchor_index >= self.nodes.len() {
            return Err(GraphError::AnchorOutOfRange {
                index: anchor_index,
                len: self.nodes.len(),
            });
        }
        if self.contains(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        tracing::debug!(target: GRAPH_TARGET, id = %node.id, anchor_index, "insert node");
        self.nodes.insert(anchor_index + 1, node);
        Ok(())
    }

    pub fn push(&mut self, node: FlowNode) -> Result<(), GraphError> {
        if self.contains(&node.id) {
            return Err(GraphError::DuplicateNode(node.id));
        }
        self.nodes.push(node);
        Ok(())
    }

    /// Remove a node. Scope bounds and selection pointing at it are the
    /// caller's to clear.
    pub fn remove(&mut self, id: &NodeId) -> Result<FlowNode, GraphError> {
        let index = self
            .index_of(id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
        tracing::debug!(target: GRAPH_TARGET, %id, index, "remove node");
        Ok(self.nodes.remove(index))
    }

    pub fn set_title(&mut self, id: &NodeId, title: impl Into<String>) -> Result<(), GraphError> {
        let node = self
            .nodes
            .iter_mut()
            .find(|n| &n.id == id)
            .ok_or_else(|| GraphError::UnknownNode(id.clone()))?;
        node.title = title.into();
        Ok(())
    }

    pub fn replace_all(&mut self, nodes: Vec<FlowNode>) -> Result<(), GraphError> {
        *self = Self::new(nodes)?;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use flowcanvas_core::NodeKind;
    use proptest::prelude::*;

    pub(crate) fn sample_flow() -> NodeGraph {
        NodeGraph::new(vec![
            FlowNode::new("start", NodeKind::Start, "Start"),
            FlowNode::new("create-task", NodeKind::Create, "Create task"),
            FlowNode::new("update-case", NodeKind::Update, "Update case"),
            FlowNode::new("send-email", NodeKind::Action, "Send email"),
            FlowNode::new("end", NodeKind::End, "End"),
        ])
        .unwrap()
    }

    #[test]
    fn test_connectors_join_consecutive_nodes() {
        let graph = sample_flow();
        let connectors: Vec<_> = graph.connectors().collect();
        assert_eq!(connectors.len(), 4);
        assert_eq!(connectors[1].from.as_str(), "create-task");
        assert_eq!(connectors[1].to.as_str(), "update-case");
        assert_eq!(graph.connector(ConnectorIndex(3)).unwrap().to.as_str(), "end");
        assert!(graph.connector(ConnectorIndex(4)).is_none());
    }

    #[test]
    fn test_single_node_has_no_connectors() {
        let graph = NodeGraph::new(vec![FlowNode::new("only", NodeKind::Start, "Only")]).unwrap();
        assert_eq!(graph.connector_count(), 0);
        assert_eq!(graph.connectors().count(), 0);
        assert_eq!(NodeGraph::default().connector_count(), 0);
    }

    #[test]
    fn test_duplicate_ids_are_rejected() {
        let err = NodeGraph::new(vec![
            FlowNode::new("a", NodeKind::Start, "A"),
            FlowNode::new("a", NodeKind::End, "A again"),
        ])
        .unwrap_err();
        assert_eq!(err, GraphError::DuplicateNode(NodeId::from("a")));

        let mut graph = sample_flow();
        let err = graph
            .insert_after(0, FlowNode::new("end", NodeKind::Action, "Dup"))
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateNode(_)));
        assert_eq!(graph.len(), 5);
    }

    #[test]
    fn test_insert_after_and_remove() {
        let mut graph = sample_flow();
        graph
            .insert_after(1, FlowNode::new("notify", NodeKind::Action, "Notify"))
            .unwrap();
        assert_eq!(graph.index_of(&NodeId::from("notify")), Some(2));
        assert_eq!(graph.index_of(&NodeId::from("update-case")), Some(3));

        let removed = graph.remove(&NodeId::from("notify")).unwrap();
        assert_eq!(removed.title, "Notify");
        assert_eq!(graph.index_of(&NodeId::from("notify")), None);
        assert!(matches!(
            graph.remove(&NodeId::from("notify")),
            Err(GraphError::UnknownNode(_))
        ));
        assert!(matches!(
            graph.insert_after(9, FlowNode::new("x", NodeKind::Action, "X")),
            Err(GraphError::AnchorOutOfRange { index: 9, len: 5 })
        ));
    }

    #[test]
    fn test_serde_rejects_duplicates() {
        let json = r#"[{"id":"a","kind":"start","title":"A"},{"id":"a","kind":"end","title":"B"}]"#;
        assert!(serde_json::from_str::<NodeGraph>(json).is_err());
        let json = r#"[{"id":"a","kind":"start","title":"A"},{"id":"b","kind":"end","title":"B"}]"#;
        let graph: NodeGraph = serde_json::from_str(json).unwrap();
        assert_eq!(graph.connector_count(), 1);
    }

    proptest! {
        #[test]
        fn prop_connector_count_is_len_minus_one(count in 0usize..40) {
            let nodes = (0..count)
                .map(|i| FlowNode::new(format!("n{i}"), NodeKind::Action, format!("Step {i}")))
                .collect();
            let graph = NodeGraph::new(nodes).unwrap();
            prop_assert_eq!(graph.connector_count(), count.saturating_sub(1));
            for connector in graph.connectors() {
                let i = connector.index.0;
                prop_assert_eq!(connector.from, &graph.nodes()[i].id);
                prop_assert_eq!(connector.to, &graph.nodes()[i + 1].id);
            }
        }
    }
}
