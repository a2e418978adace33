use super::edge::{Edge, EdgeLength};
use super::taxon::TaxonId;
use slotmap::new_key_type;
use std::{fmt::Display, sync::Arc};

new_key_type! { pub struct NodeId; }

/// What a node stands for: a leaf identity or an internal annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Leaf { taxon: Option<TaxonId> },
    Internal { label: Option<Arc<str>> },
}

impl Default for NodeKind {
    fn default() -> Self {
        NodeKind::Leaf { taxon: None }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Node {
    node_id: Option<NodeId>,
    parent_id: Option<NodeId>,
    child_ids: Vec<NodeId>,
    kind: NodeKind,
    edge: Edge,
}

impl Node {
    pub fn new_leaf(taxon: Option<TaxonId>) -> Self {
        Self { kind: NodeKind::Leaf { taxon }, ..Self::default() }
    }

    pub fn new_internal(label: Option<&str>) -> Self {
        let label = label.map(Into::into);
        Self { kind: NodeKind::Internal { label }, ..Self::default() }
    }

    pub fn is_tip(&self) -> bool {
        self.child_ids.is_empty()
    }

    pub fn child_ids(&self) -> &[NodeId] {
        &self.child_ids
    }

    pub(crate) fn add_child_id(&mut self, node_id: NodeId) {
        self.child_ids.push(node_id)
    }

    pub fn node_id(&self) -> Option<&NodeId> {
        self.node_id.as_ref()
    }

    pub(crate) fn set_node_id(&mut self, node_id: NodeId) {
        self.node_id = Some(node_id);
    }

    pub fn parent_id(&self) -> Option<&NodeId> {
        self.parent_id.as_ref()
    }

    pub(crate) fn set_parent_id(&mut self, node_id: Option<NodeId>) {
        self.parent_id = node_id;
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn taxon(&self) -> Option<TaxonId> {
        match self.kind {
            NodeKind::Leaf { taxon } => taxon,
            NodeKind::Internal { .. } => None,
        }
    }

    pub fn node_label(&self) -> Option<Arc<str>> {
        match &self.kind {
            NodeKind::Internal { label } => label.clone(),
            NodeKind::Leaf { .. } => None,
        }
    }

    /// Sets the label of an internal node. Returns `false` for leaves, whose
    /// only name is their taxon.
    pub fn set_node_label(&mut self, label: Option<&str>) -> bool {
        match &mut self.kind {
            NodeKind::Internal { label: current } => {
                *current = label.map(Into::into);
                true
            }
            NodeKind::Leaf { .. } => false,
        }
    }

    pub fn edge(&self) -> &Edge {
        &self.edge
    }

    pub fn edge_mut(&mut self) -> &mut Edge {
        &mut self.edge
    }

    pub fn branch_length(&self) -> Option<&EdgeLength> {
        self.edge.length()
    }

    pub fn set_branch_length(&mut self, branch_length: Option<EdgeLength>) {
        self.edge.set_length(branch_length);
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let disp = format!("{self:?}");
        write!(f, "{}", &disp[7..disp.len() - 1])
    }
}

impl From<NodeId> for String {
    fn from(node_id: NodeId) -> Self {
        format!("{node_id}")
    }
}
