// -------------------------------------
// #![allow(dead_code)]
// #![allow(unused_mut)]
// #![allow(unused_imports)]
// #![allow(unused_variables)]
// #![allow(clippy::single_match)]
// #![allow(clippy::collapsible_if)]
// #![allow(clippy::type_complexity)]
// #![allow(clippy::too_many_arguments)]
// -------------------------------------

mod parsers;
mod phylo;

pub type TreeFloat = f64;
pub type TreeInt = i64;
pub type SplitBitmask = u128;

pub use parsers::NewickError;
pub use parsers::NewickResult;
pub use parsers::newick::EdgeLengthType;
pub use parsers::newick::LabelEscaping;
pub use parsers::newick::NewickReader;
pub use parsers::newick::NewickReaderConfig;
pub use parsers::newick::NewickTokenizer;
pub use parsers::newick::NewickWriter;
pub use parsers::newick::NewickWriterConfig;
pub use parsers::newick::NodeHook;
pub use parsers::newick::Rooting;
pub use parsers::newick::RootingInterpreter;
pub use parsers::newick::Token;
pub use parsers::newick::TreeBuilder;
pub use parsers::newick::TreeComposer;
pub use parsers::newick::escape_newick_label;
pub use parsers::newick::parse_newick;
pub use parsers::newick::write_newick;
pub use phylo::dataset::DataSet;
pub use phylo::dataset::TreeCollection;
pub use phylo::edge::Edge;
pub use phylo::edge::EdgeLength;
pub use phylo::node::Node;
pub use phylo::node::NodeId;
pub use phylo::node::NodeKind;
pub use phylo::split::is_trivial_split;
pub use phylo::split::split_as_newick_string;
pub use phylo::split::split_leaf_labels;
pub use phylo::taxon::RegistryId;
pub use phylo::taxon::Taxon;
pub use phylo::taxon::TaxonError;
pub use phylo::taxon::TaxonId;
pub use phylo::taxon::TaxonRef;
pub use phylo::taxon::TaxonRegistry;
pub use phylo::taxon::resolve_or_create_taxon;
pub use phylo::tree::Tree;
pub use phylo::tree::TreeError;
