use super::config::NewickWriterConfig;
use super::labels::escape_newick_label;
use crate::parsers::{NewickError, NewickResult};
use crate::{
    DataSet, NodeId, NodeKind, RegistryId, TaxonError, TaxonRegistry, Tree,
    TreeCollection,
};
use log::{debug, warn};
use rayon::prelude::*;
use std::io::Write;

/// Converts trees to NEWICK statements.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeComposer {
    config: NewickWriterConfig,
}

impl TreeComposer {
    pub fn new(config: NewickWriterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &NewickWriterConfig {
        &self.config
    }

    /// Composes one `;`-terminated statement, checking first that `tree`
    /// resolves its taxa against `registry`.
    pub fn compose_tree(
        &self,
        tree: &Tree,
        registry: &TaxonRegistry,
    ) -> NewickResult<String> {
        if tree.registry_id() != registry.id() {
            return Err(TaxonError::RegistryMismatch {
                expected: registry.id(),
                found: tree.registry_id(),
            }
            .into());
        }
        Ok(self.statement(tree, registry))
    }

    /// Composes one statement followed by a newline. Taxa that are not
    /// members of `registry` are written by their node id.
    pub fn statement(&self, tree: &Tree, registry: &TaxonRegistry) -> String {
        let mut newick = String::new();
        if let Some(seed_node_id) = tree.seed_node_id() {
            self.compose_node(tree, seed_node_id, registry, &mut newick);
        }
        newick.push_str(";\n");
        newick
    }

    fn compose_node(
        &self,
        tree: &Tree,
        node_id: NodeId,
        registry: &TaxonRegistry,
        newick: &mut String,
    ) {
        let child_ids = tree.child_ids(&node_id);
        if !child_ids.is_empty() {
            newick.push('(');
            for (i, child_id) in child_ids.iter().enumerate() {
                if i > 0 {
                    newick.push(',');
                }
                self.compose_node(tree, *child_id, registry, newick);
            }
            newick.push(')');
        }

        if let Some(tag) = self.display_tag(tree, node_id, registry) {
            newick.push_str(&escape_newick_label(&tag, self.config.escaping()));
        }

        if self.config.edge_lengths()
            && let Some(length) = tree.branch_length(node_id)
        {
            let precision = if child_ids.is_empty() {
                self.config.leaf_precision()
            } else {
                self.config.internal_precision()
            };
            match length.as_float() {
                Some(value) => newick.push_str(&format!(":{value:.precision$}")),
                None => {
                    warn!("edge length \"{length}\" is not a number; written as is");
                    newick.push_str(&format!(":{length}"));
                }
            }
        }
    }

    /// Label written for a node: the taxon label of a leaf, the label of an
    /// internal node. A leaf without either is written by its node id.
    fn display_tag(
        &self,
        tree: &Tree,
        node_id: NodeId,
        registry: &TaxonRegistry,
    ) -> Option<String> {
        let node = tree.node(Some(node_id))?;
        let tag = match node.kind() {
            NodeKind::Leaf { taxon } => taxon
                .and_then(|taxon_id| registry.taxon(taxon_id))
                .map(|taxon| taxon.display_label().to_string()),
            NodeKind::Internal { label } => {
                if self.config.internal_labels() {
                    label.as_ref().map(|label| label.to_string())
                } else {
                    None
                }
            }
        };

        match tag {
            Some(tag) => Some(tag),
            None if node.is_tip() => Some(node_id.to_string()),
            None => None,
        }
    }
}

/// Writes the tree collections of a [DataSet] as NEWICK text.
///
/// # Example
/// ```
/// use newick_splits::{DataSet, NewickWriter, NewickWriterConfig, parse_newick};
///
/// let mut dataset = DataSet::new();
/// dataset.add_tree_collection(parse_newick("(A:1,B:2);").unwrap());
///
/// let mut out = Vec::new();
/// NewickWriter::new(NewickWriterConfig::new().without_edge_lengths())
///     .with_dataset(&dataset)
///     .write(&mut out)
///     .unwrap();
/// assert_eq!(String::from_utf8(out).unwrap(), "(A,B);\n");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct NewickWriter<'d> {
    composer: TreeComposer,
    dataset: Option<&'d DataSet>,
    registry_id: Option<RegistryId>,
}

impl<'d> NewickWriter<'d> {
    pub fn new(config: NewickWriterConfig) -> Self {
        Self { composer: TreeComposer::new(config), dataset: None, registry_id: None }
    }

    pub fn with_dataset(mut self, dataset: &'d DataSet) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Restricts output to the collection bound to one registry.
    pub fn with_registry(mut self, registry_id: RegistryId) -> Self {
        self.registry_id = Some(registry_id);
        self
    }

    pub fn composer(&self) -> &TreeComposer {
        &self.composer
    }

    pub fn write<W: Write>(&self, sink: &mut W) -> NewickResult<()> {
        let Some(dataset) = self.dataset else {
            return Err(NewickError::Configuration(
                "no data set bound to the writer".to_string(),
            ));
        };

        for collection in dataset.collections() {
            if self
                .registry_id
                .is_some_and(|registry_id| registry_id != collection.registry().id())
            {
                continue;
            }
            self.write_tree_collection(collection, sink)?;
        }
        Ok(())
    }

    /// Composes the statements of a collection in parallel and writes them
    /// in collection order.
    pub fn write_tree_collection<W: Write>(
        &self,
        collection: &TreeCollection,
        sink: &mut W,
    ) -> NewickResult<()> {
        let registry = collection.registry();
        let statements = collection
            .trees()
            .par_iter()
            .map(|tree| self.composer.compose_tree(tree, registry))
            .collect::<NewickResult<Vec<String>>>()?;

        for statement in &statements {
            sink.write_all(statement.as_bytes())?;
        }
        debug!("{}: wrote {} trees", registry.id(), statements.len());
        Ok(())
    }
}
