use super::taxon::{RegistryId, TaxonError, TaxonRegistry};
use super::tree::Tree;

/// Trees that all resolve their taxa against one owned [TaxonRegistry].
#[derive(Debug, Default)]
pub struct TreeCollection {
    registry: TaxonRegistry,
    trees: Vec<Tree>,
}

impl TreeCollection {
    pub fn new(registry: TaxonRegistry) -> Self {
        Self { registry, trees: Vec::new() }
    }

    pub fn registry(&self) -> &TaxonRegistry {
        &self.registry
    }

    pub fn trees(&self) -> &[Tree] {
        &self.trees
    }

    pub fn trees_mut(&mut self) -> &mut [Tree] {
        &mut self.trees
    }

    pub fn len(&self) -> usize {
        self.trees.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trees.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Tree> {
        self.trees.iter()
    }

    /// Appends a tree built against this collection's registry.
    pub fn append(&mut self, tree: Tree) -> Result<(), TaxonError> {
        if tree.registry_id() != self.registry.id() {
            return Err(TaxonError::RegistryMismatch {
                expected: self.registry.id(),
                found: tree.registry_id(),
            });
        }
        self.trees.push(tree);
        Ok(())
    }

    /// Split bitmasks for every edge of every tree, in tree order.
    pub fn encode_splits(&mut self) -> Result<(), TaxonError> {
        for tree in &mut self.trees {
            _ = tree.encode_splits(&mut self.registry)?;
        }
        Ok(())
    }

    pub fn into_parts(self) -> (TaxonRegistry, Vec<Tree>) {
        (self.registry, self.trees)
    }
}

/// Container of tree collections, one per registry.
#[derive(Debug, Default)]
pub struct DataSet {
    collections: Vec<TreeCollection>,
}

impl DataSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_tree_collection(
        &mut self,
        registry: TaxonRegistry,
    ) -> &mut TreeCollection {
        self.add_tree_collection(TreeCollection::new(registry))
    }

    pub fn add_tree_collection(
        &mut self,
        collection: TreeCollection,
    ) -> &mut TreeCollection {
        self.collections.push(collection);
        let index = self.collections.len() - 1;
        &mut self.collections[index]
    }

    pub fn collections(&self) -> &[TreeCollection] {
        &self.collections
    }

    pub fn tree_collection(&self, registry_id: RegistryId) -> Option<&TreeCollection> {
        self.collections
            .iter()
            .find(|collection| collection.registry().id() == registry_id)
    }

    pub fn into_collections(self) -> Vec<TreeCollection> {
        self.collections
    }

    pub fn tree_count(&self) -> usize {
        self.collections.iter().map(TreeCollection::len).sum()
    }
}
