//! Turns a retargeted fragment into the caller-visible node sequence.

use crate::node::{Node, to_markup};
use crate::retarget::RetargetedTree;

/// Highlighted nodes in document order, without the synthetic root.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultSequence {
    nodes: Vec<Node>,
    namespace: Option<String>,
}

impl ResultSequence {
    /// The nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Number of top-level nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True when the source produced no nodes at all.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Namespace the elements were bound to.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Hand the nodes over to the caller.
    pub fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }

    /// Serialize with a namespace declaration on each top-level element.
    pub fn to_xml(&self) -> String {
        to_markup(&self.nodes, None)
    }

    /// Serialize as if embedded where the target namespace is already the default.
    pub fn to_embedded_xml(&self) -> String {
        to_markup(&self.nodes, self.namespace())
    }
}

impl IntoIterator for ResultSequence {
    type Item = Node;
    type IntoIter = std::vec::IntoIter<Node>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

/// Drop the synthetic root and keep its direct children in order.
pub fn extract_sequence(tree: RetargetedTree) -> ResultSequence {
    let namespace = Some(tree.namespace().as_str().to_string());
    ResultSequence {
        nodes: tree.into_root().children,
        namespace,
    }
}
