pub(crate) mod builder;
pub(crate) mod config;
pub(crate) mod labels;
pub(crate) mod rooting;
pub(crate) mod tokenizer;
pub(crate) mod writer;

pub use builder::{NewickReader, NodeHook, TreeBuilder};
pub use config::{EdgeLengthType, NewickReaderConfig, NewickWriterConfig};
pub use labels::{LabelEscaping, escape_newick_label};
pub use rooting::{Rooting, RootingInterpreter};
pub use tokenizer::{NewickTokenizer, Token};
pub use writer::{NewickWriter, TreeComposer};

use super::NewickResult;
use crate::{DataSet, TreeCollection};

/// Parses every NEWICK statement in `s` against a fresh taxon registry.
pub fn parse_newick(s: &str) -> NewickResult<TreeCollection> {
    let mut dataset = DataSet::new();
    let mut reader = NewickReader::new(NewickReaderConfig::default());
    _ = reader.read(s.as_bytes(), &mut dataset, None)?;
    let mut collections = dataset.into_collections();
    Ok(collections.pop().unwrap_or_default())
}

/// Converts every tree of a collection to NEWICK statements with the default
/// writer settings, one `;`-terminated statement per line.
pub fn write_newick(collection: &TreeCollection) -> String {
    let composer = TreeComposer::new(NewickWriterConfig::default());
    collection
        .trees()
        .iter()
        .map(|tree| composer.statement(tree, collection.registry()))
        .collect()
}
