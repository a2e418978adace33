use super::edge::EdgeLength;
use super::node::{Node, NodeId};
use super::taxon::{RegistryId, TaxonError, TaxonId, TaxonRegistry};
use crate::SplitBitmask;
use slotmap::SlotMap;
use thiserror::Error;

/// A rooted, ordered multiway tree whose leaves refer to taxa of one
/// [TaxonRegistry].
///
/// The tree does not own the registry; it only records its [RegistryId].
/// Cloning a tree shares taxon identities with the original.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: SlotMap<NodeId, Node>,
    seed_node_id: Option<NodeId>,
    registry_id: RegistryId,
    is_rooted: bool,
}

#[derive(Debug, Error)]
pub enum TreeError {
    #[error("Parent node with NodeId: {0} does not exist.")]
    ParentNodeDoesNotExist(NodeId),
    #[error("Tree validation failed: {0}.")]
    InvalidTree(String),
}

impl Tree {
    // =========================================================================
    // Construction
    // =========================================================================

    pub fn new(registry_id: RegistryId) -> Self {
        Self {
            nodes: SlotMap::with_key(),
            seed_node_id: None,
            registry_id,
            is_rooted: false,
        }
    }

    /// Adds a node below `parent_node_id`, or as the seed node when no parent
    /// is given. A tree has exactly one seed node.
    pub fn add_node(
        &mut self,
        node: Node,
        parent_node_id: Option<NodeId>,
    ) -> Result<NodeId, TreeError> {
        let node_ids = self.add_nodes(vec![node], parent_node_id)?;
        node_ids.first().copied().ok_or_else(|| {
            TreeError::InvalidTree("no node was added".to_string())
        })
    }

    pub fn add_nodes(
        &mut self,
        nodes: impl Into<Vec<Node>>,
        parent_node_id: Option<NodeId>,
    ) -> Result<Vec<NodeId>, TreeError> {
        let mut nodes: Vec<Node> = nodes.into();

        match parent_node_id {
            Some(parent_node_id) if !self.nodes.contains_key(parent_node_id) => {
                return Err(TreeError::ParentNodeDoesNotExist(parent_node_id));
            }
            Some(_) => {
                for node in &mut nodes {
                    node.set_parent_id(parent_node_id);
                }
            }
            None if self.seed_node_id.is_some() || nodes.len() != 1 => {
                return Err(TreeError::InvalidTree(
                    "a tree has exactly one seed node".to_string(),
                ));
            }
            None => {}
        }

        let mut node_ids: Vec<NodeId> = Vec::with_capacity(nodes.len());

        for mut node in nodes {
            let node_id = self.nodes.insert_with_key(|node_id| {
                node.set_node_id(node_id);
                node
            });

            node_ids.push(node_id);

            match self.node_mut(parent_node_id) {
                Some(parent_node) => parent_node.add_child_id(node_id),
                None => self.seed_node_id = Some(node_id),
            }
        }

        Ok(node_ids)
    }

    // =========================================================================
    // Tree Properties
    // =========================================================================

    pub fn registry_id(&self) -> RegistryId {
        self.registry_id
    }

    pub fn is_rooted(&self) -> bool {
        self.is_rooted
    }

    pub fn set_rooted(&mut self, is_rooted: bool) {
        self.is_rooted = is_rooted;
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn tip_count(&self) -> usize {
        self.nodes.values().filter(|node| node.is_tip()).count()
    }

    pub fn has_branch_lengths(&self) -> bool {
        self.nodes.iter().any(|(node_id, node)| {
            Some(node_id) != self.seed_node_id && node.branch_length().is_some()
        })
    }

    // =========================================================================
    // Node Access
    // =========================================================================

    pub fn node(&self, node_id: Option<NodeId>) -> Option<&Node> {
        node_id.and_then(|node_id| self.nodes.get(node_id))
    }

    pub fn node_mut(&mut self, node_id: Option<NodeId>) -> Option<&mut Node> {
        node_id.and_then(|node_id| self.nodes.get_mut(node_id))
    }

    pub fn seed_node_id(&self) -> Option<NodeId> {
        self.seed_node_id
    }

    pub fn seed_node(&self) -> Option<&Node> {
        self.node(self.seed_node_id)
    }

    pub fn parent_id(&self, node_id: &NodeId) -> Option<&NodeId> {
        self.nodes.get(*node_id).and_then(Node::parent_id)
    }

    pub fn child_ids(&self, node_id: &NodeId) -> &[NodeId] {
        self.nodes.get(*node_id).map(Node::child_ids).unwrap_or_default()
    }

    pub fn children(&self, node_id: &NodeId) -> Vec<&Node> {
        self.child_ids(node_id)
            .iter()
            .filter_map(|child_id| self.nodes.get(*child_id))
            .collect()
    }

    pub fn child_count(&self, node_id: &NodeId) -> usize {
        self.child_ids(node_id).len()
    }

    pub fn is_tip(&self, node_id: &NodeId) -> bool {
        self.child_ids(node_id).is_empty()
    }

    pub fn branch_length(&self, node_id: NodeId) -> Option<&EdgeLength> {
        self.nodes.get(node_id).and_then(Node::branch_length)
    }

    pub fn split_bitmask(&self, node_id: NodeId) -> Option<SplitBitmask> {
        self.nodes.get(node_id).and_then(|node| node.edge().split_bitmask())
    }

    // =========================================================================
    // Tree Traversal
    // =========================================================================

    /// Leaf node ids below `node_id`, left to right.
    pub fn tip_node_ids(&self, node_id: &NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        self.collect_tip_ids_recursive(*node_id, &mut result);
        result
    }

    fn collect_tip_ids_recursive(
        &self,
        node_id: NodeId,
        result: &mut Vec<NodeId>,
    ) {
        if self.is_tip(&node_id) {
            result.push(node_id);
        } else {
            for child_id in self.child_ids(&node_id) {
                self.collect_tip_ids_recursive(*child_id, result);
            }
        }
    }

    pub fn tip_node_ids_all(&self) -> Vec<NodeId> {
        if let Some(id) = self.seed_node_id {
            self.tip_node_ids(&id)
        } else {
            Vec::new()
        }
    }

    /// Taxa of the leaves, left to right. Unlabelled leaves are skipped.
    pub fn leaf_taxa(&self) -> Vec<TaxonId> {
        self.tip_node_ids_all()
            .iter()
            .filter_map(|node_id| self.nodes.get(*node_id).and_then(Node::taxon))
            .collect()
    }

    /// Node ids in post-order: every child before its parent.
    pub fn postorder_node_ids(&self) -> Vec<NodeId> {
        let mut result = Vec::with_capacity(self.nodes.len());
        let Some(seed_node_id) = self.seed_node_id else {
            return result;
        };

        let mut stack: Vec<(NodeId, bool)> = vec![(seed_node_id, false)];
        while let Some((node_id, expanded)) = stack.pop() {
            if expanded {
                result.push(node_id);
            } else {
                stack.push((node_id, true));
                for child_id in self.child_ids(&node_id).iter().rev() {
                    stack.push((*child_id, false));
                }
            }
        }
        result
    }

    // =========================================================================
    // Splits
    // =========================================================================

    /// Computes and stores the split bitmask of every edge: a leaf's mask is
    /// its taxon's bitmask, an internal node's mask is the union of its
    /// children's. Returns the mask of the seed node.
    pub fn encode_splits(
        &mut self,
        registry: &mut TaxonRegistry,
    ) -> Result<SplitBitmask, TaxonError> {
        if registry.id() != self.registry_id {
            return Err(TaxonError::RegistryMismatch {
                expected: registry.id(),
                found: self.registry_id,
            });
        }

        for node_id in self.postorder_node_ids() {
            let mask = self.node_split_bitmask(node_id, registry)?;
            if let Some(node) = self.nodes.get_mut(node_id) {
                node.edge_mut().set_split_bitmask(Some(mask));
            }
        }

        Ok(self
            .seed_node_id
            .and_then(|node_id| self.split_bitmask(node_id))
            .unwrap_or_default())
    }

    /// Split bitmask of one node, assuming its children are already encoded.
    pub(crate) fn node_split_bitmask(
        &self,
        node_id: NodeId,
        registry: &mut TaxonRegistry,
    ) -> Result<SplitBitmask, TaxonError> {
        let Some(node) = self.nodes.get(node_id) else {
            return Ok(0);
        };

        if node.is_tip() {
            return match node.taxon() {
                Some(taxon_id) => registry.taxon_bitmask(taxon_id),
                None => Ok(0),
            };
        }

        Ok(node
            .child_ids()
            .iter()
            .filter_map(|child_id| self.split_bitmask(*child_id))
            .fold(0, |mask, child_mask| mask | child_mask))
    }
}
