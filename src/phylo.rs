pub(crate) mod dataset;
pub(crate) mod edge;
pub(crate) mod node;
pub(crate) mod split;
pub(crate) mod taxon;
pub(crate) mod tree;
