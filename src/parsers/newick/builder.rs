use super::config::{EdgeLengthType, NewickReaderConfig};
use super::rooting::Rooting;
use super::tokenizer::{NewickTokenizer, Token};
use crate::parsers::{NewickError, NewickResult};
use crate::{
    DataSet, EdgeLength, Node, NodeId, TaxonRegistry, Tree, TreeCollection,
    TreeFloat, TreeInt,
};
use log::debug;
use std::fmt::Display;
use std::io::BufRead;
use std::iter::FusedIterator;
use std::ops::{Deref, DerefMut};

/// Callback run once for every completed node, children before parents.
///
/// The registry is only lent out shared: a hook cannot add or reorder taxa
/// while a statement is being built.
pub type NodeHook<'r> = Box<dyn FnMut(&mut Tree, NodeId, &TaxonRegistry) + 'r>;

enum RegistryHandle<'r> {
    Borrowed(&'r mut TaxonRegistry),
    Owned(TaxonRegistry),
}

impl Deref for RegistryHandle<'_> {
    type Target = TaxonRegistry;

    fn deref(&self) -> &TaxonRegistry {
        match self {
            RegistryHandle::Borrowed(registry) => registry,
            RegistryHandle::Owned(registry) => registry,
        }
    }
}

impl DerefMut for RegistryHandle<'_> {
    fn deref_mut(&mut self) -> &mut TaxonRegistry {
        match self {
            RegistryHandle::Borrowed(registry) => registry,
            RegistryHandle::Owned(registry) => registry,
        }
    }
}

/// Position inside one tree statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatementState {
    /// Nothing read yet: expecting `(` or a single leaf.
    AwaitOpenParen,
    /// After `(` or `,`: expecting the next subtree of the innermost open node.
    ReadingSubtreeList,
    /// A subtree was just read; its label and `:` may follow.
    ReadingLabel { node_id: NodeId, label_seen: bool, length_seen: bool },
    /// After `:`.
    ReadingEdgeLength { node_id: NodeId },
    StatementComplete,
}

impl Display for StatementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let description = match self {
            StatementState::AwaitOpenParen => "waiting for a tree",
            StatementState::ReadingSubtreeList => "reading a subtree list",
            StatementState::ReadingLabel { .. } => "reading a node label",
            StatementState::ReadingEdgeLength { .. } => "reading an edge length",
            StatementState::StatementComplete => "after the end of the statement",
        };
        write!(f, "{description}")
    }
}

/// Builds one [Tree] per `;`-terminated NEWICK statement.
///
/// Iterating yields trees lazily in statement order. The iterator is
/// finite and cannot be restarted: after the end of the stream, or after the
/// first error, it yields nothing more.
///
/// Leaf labels are resolved against the registry with
/// [TaxonRegistry::find_or_create]. The registry is borrowed exclusively for
/// the whole session; when none is supplied the builder creates its own.
pub struct TreeBuilder<'r, R: BufRead> {
    tokenizer: NewickTokenizer<R>,
    registry: RegistryHandle<'r>,
    config: NewickReaderConfig,
    node_hook: Option<NodeHook<'r>>,
    tree_count: usize,
    finished: bool,
}

impl<'r, R: BufRead> TreeBuilder<'r, R> {
    /// Fails with a configuration error when split bitmasks are requested
    /// without a registry: masks are only stable for a registry whose order
    /// was fixed before parsing began.
    pub fn new(
        tokenizer: NewickTokenizer<R>,
        registry: Option<&'r mut TaxonRegistry>,
        config: NewickReaderConfig,
    ) -> NewickResult<Self> {
        let registry = match registry {
            Some(registry) => RegistryHandle::Borrowed(registry),
            None if config.compute_split_bitmasks() => {
                return Err(NewickError::Configuration(
                    "split bitmasks require a taxon registry supplied before \
                     parsing"
                        .to_string(),
                ));
            }
            None => RegistryHandle::Owned(TaxonRegistry::new()),
        };

        Ok(Self {
            tokenizer,
            registry,
            config,
            node_hook: None,
            tree_count: 0,
            finished: false,
        })
    }

    pub fn with_node_hook(
        mut self,
        hook: impl FnMut(&mut Tree, NodeId, &TaxonRegistry) + 'r,
    ) -> Self {
        self.node_hook = Some(Box::new(hook));
        self
    }

    pub fn registry(&self) -> &TaxonRegistry {
        &self.registry
    }

    /// The registry the builder created for itself, if it was not given one.
    pub fn into_registry(self) -> Option<TaxonRegistry> {
        match self.registry {
            RegistryHandle::Owned(registry) => Some(registry),
            RegistryHandle::Borrowed(_) => None,
        }
    }

    pub fn tree_count(&self) -> usize {
        self.tree_count
    }

    /// Parses the next statement; `Ok(None)` once the stream is exhausted or
    /// after the first error.
    pub fn parse_next(&mut self) -> NewickResult<Option<Tree>> {
        if self.finished {
            return Ok(None);
        }
        let result = match self.tokenizer.at_end() {
            Ok(true) => Ok(None),
            Ok(false) => self.parse_statement().map(Some),
            Err(err) => Err(err),
        };
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    fn parse_statement(&mut self) -> NewickResult<Tree> {
        let mut tree = Tree::new(self.registry.id());
        let mut open_node_ids: Vec<NodeId> = Vec::new();
        let mut state = StatementState::AwaitOpenParen;

        while state != StatementState::StatementComplete {
            let token = self.tokenizer.advance()?;
            let line = self.tokenizer.line();
            let Some(token) = token else {
                return Err(NewickError::parse(
                    line,
                    format!("unexpected end of stream while {state}"),
                ));
            };

            state = match (state, token) {
                (StatementState::AwaitOpenParen, Token::OpenParen) => {
                    let node_id = tree.add_node(Node::new_internal(None), None)?;
                    open_node_ids.push(node_id);
                    StatementState::ReadingSubtreeList
                }
                (StatementState::AwaitOpenParen, Token::Label { text, quoted }) => {
                    let node_id = self.add_leaf(&mut tree, None, Some((text.as_str(), quoted)))?;
                    StatementState::ReadingLabel {
                        node_id,
                        label_seen: true,
                        length_seen: false,
                    }
                }
                (StatementState::AwaitOpenParen, Token::Semicolon) => {
                    return Err(NewickError::parse(line, "empty tree statement"));
                }

                (StatementState::ReadingSubtreeList, Token::OpenParen) => {
                    let parent_id = open_node_ids.last().copied();
                    let node_id =
                        tree.add_node(Node::new_internal(None), parent_id)?;
                    open_node_ids.push(node_id);
                    StatementState::ReadingSubtreeList
                }
                (StatementState::ReadingSubtreeList, Token::Label { text, quoted }) => {
                    let parent_id = open_node_ids.last().copied();
                    let node_id =
                        self.add_leaf(&mut tree, parent_id, Some((text.as_str(), quoted)))?;
                    StatementState::ReadingLabel {
                        node_id,
                        label_seen: true,
                        length_seen: false,
                    }
                }
                (StatementState::ReadingSubtreeList, Token::Colon) => {
                    let parent_id = open_node_ids.last().copied();
                    let node_id = self.add_leaf(&mut tree, parent_id, None)?;
                    StatementState::ReadingEdgeLength { node_id }
                }
                (StatementState::ReadingSubtreeList, Token::Comma) => {
                    let parent_id = open_node_ids.last().copied();
                    let node_id = self.add_leaf(&mut tree, parent_id, None)?;
                    self.finish_node(&mut tree, node_id)?;
                    StatementState::ReadingSubtreeList
                }
                (StatementState::ReadingSubtreeList, Token::CloseParen) => {
                    let Some(parent_id) = open_node_ids.pop() else {
                        return Err(NewickError::parse(line, "unmatched ')'"));
                    };
                    if tree.child_count(&parent_id) == 0 {
                        return Err(NewickError::parse(line, "empty subtree '()'"));
                    }
                    let node_id = self.add_leaf(&mut tree, Some(parent_id), None)?;
                    self.finish_node(&mut tree, node_id)?;
                    StatementState::ReadingLabel {
                        node_id: parent_id,
                        label_seen: false,
                        length_seen: false,
                    }
                }
                (StatementState::ReadingSubtreeList, Token::Semicolon) => {
                    return Err(NewickError::parse(line, "unmatched '('"));
                }

                (
                    StatementState::ReadingLabel {
                        node_id,
                        label_seen: false,
                        length_seen: false,
                    },
                    Token::Label { text, quoted },
                ) => {
                    let label = self.label_text(&text, quoted);
                    if let Some(node) = tree.node_mut(Some(node_id)) {
                        _ = node.set_node_label(Some(label.as_str()));
                    }
                    StatementState::ReadingLabel {
                        node_id,
                        label_seen: true,
                        length_seen: false,
                    }
                }
                (
                    StatementState::ReadingLabel { node_id, length_seen: false, .. },
                    Token::Colon,
                ) => StatementState::ReadingEdgeLength { node_id },
                (StatementState::ReadingLabel { node_id, .. }, Token::Comma) => {
                    self.finish_node(&mut tree, node_id)?;
                    if open_node_ids.is_empty() {
                        return Err(NewickError::parse(
                            line,
                            "',' outside of parentheses",
                        ));
                    }
                    StatementState::ReadingSubtreeList
                }
                (StatementState::ReadingLabel { node_id, .. }, Token::CloseParen) => {
                    self.finish_node(&mut tree, node_id)?;
                    let Some(parent_id) = open_node_ids.pop() else {
                        return Err(NewickError::parse(line, "unmatched ')'"));
                    };
                    StatementState::ReadingLabel {
                        node_id: parent_id,
                        label_seen: false,
                        length_seen: false,
                    }
                }
                (StatementState::ReadingLabel { node_id, .. }, Token::Semicolon) => {
                    if !open_node_ids.is_empty() {
                        return Err(NewickError::parse(line, "unmatched '('"));
                    }
                    self.finish_node(&mut tree, node_id)?;
                    StatementState::StatementComplete
                }

                (StatementState::ReadingEdgeLength { node_id }, Token::Label { text, .. }) => {
                    let length = self.parse_edge_length(&text, line)?;
                    if let Some(node) = tree.node_mut(Some(node_id)) {
                        node.set_branch_length(Some(length));
                    }
                    StatementState::ReadingLabel {
                        node_id,
                        label_seen: true,
                        length_seen: true,
                    }
                }
                (StatementState::ReadingEdgeLength { .. }, token) => {
                    return Err(NewickError::parse(
                        line,
                        format!("expected an edge length, found {token}"),
                    ));
                }

                (state, token) => {
                    return Err(NewickError::parse(
                        line,
                        format!("unexpected {token} while {state}"),
                    ));
                }
            };
        }

        let marker = self
            .tokenizer
            .take_comments()
            .iter()
            .find_map(|comment| Rooting::from_comment(comment));
        let rooting = self.config.rooting().interpret(marker);
        tree.set_rooted(rooting.is_rooted());

        self.tree_count += 1;
        debug!(
            "tree {}: {} nodes, {} leaves, {:?}",
            self.tree_count,
            tree.node_count(),
            tree.tip_count(),
            rooting
        );
        Ok(tree)
    }

    /// Maps a raw label token to label text: unquoted `_` reads as a blank
    /// unless underscores are preserved.
    fn label_text(&self, text: &str, quoted: bool) -> String {
        if quoted || self.config.preserve_underscores() {
            text.to_string()
        } else {
            text.replace('_', " ")
        }
    }

    fn add_leaf(
        &mut self,
        tree: &mut Tree,
        parent_id: Option<NodeId>,
        label: Option<(&str, bool)>,
    ) -> NewickResult<NodeId> {
        let taxon = match label {
            Some((text, quoted)) => {
                let label = self.label_text(text, quoted);
                if label.is_empty() {
                    None
                } else {
                    Some(self.registry.find_or_create(Some(label.as_str()), None)?)
                }
            }
            None => None,
        };
        Ok(tree.add_node(Node::new_leaf(taxon), parent_id)?)
    }

    fn parse_edge_length(&self, text: &str, line: usize) -> NewickResult<EdgeLength> {
        let invalid = |err: &dyn Display| {
            NewickError::parse(line, format!("invalid edge length \"{text}\": {err}"))
        };
        match self.config.edge_length_type() {
            EdgeLengthType::Float => text
                .parse::<TreeFloat>()
                .map(EdgeLength::Float)
                .map_err(|err| invalid(&err)),
            EdgeLengthType::Integer => text
                .parse::<TreeInt>()
                .map(EdgeLength::Int)
                .map_err(|err| invalid(&err)),
        }
    }

    /// Runs once per node after its subtree, label and length are complete.
    fn finish_node(&mut self, tree: &mut Tree, node_id: NodeId) -> NewickResult<()> {
        if self.config.compute_split_bitmasks() {
            let mask = tree.node_split_bitmask(node_id, &mut self.registry)?;
            if let Some(node) = tree.node_mut(Some(node_id)) {
                node.edge_mut().set_split_bitmask(Some(mask));
            }
        }

        if let Some(hook) = self.node_hook.as_mut() {
            hook(tree, node_id, &*self.registry);
        }
        Ok(())
    }
}

impl<R: BufRead> Iterator for TreeBuilder<'_, R> {
    type Item = NewickResult<Tree>;

    fn next(&mut self) -> Option<Self::Item> {
        self.parse_next().transpose()
    }
}

impl<R: BufRead> FusedIterator for TreeBuilder<'_, R> {}

/// Reads NEWICK sources into a [DataSet].
///
/// The same configuration and node hook apply to every source read.
pub struct NewickReader<'h> {
    config: NewickReaderConfig,
    node_hook: Option<NodeHook<'h>>,
}

impl<'h> NewickReader<'h> {
    pub fn new(config: NewickReaderConfig) -> Self {
        Self { config, node_hook: None }
    }

    pub fn with_node_hook(
        mut self,
        hook: impl FnMut(&mut Tree, NodeId, &TaxonRegistry) + 'h,
    ) -> Self {
        self.node_hook = Some(Box::new(hook));
        self
    }

    pub fn config(&self) -> &NewickReaderConfig {
        &self.config
    }

    /// Reads every statement of `source` into a new collection of `dataset`.
    ///
    /// Trees resolve their taxa against `registry`, or against a fresh
    /// registry when none is given. Nothing is added to `dataset` if any
    /// statement fails.
    pub fn read<'d, R: BufRead>(
        &mut self,
        source: R,
        dataset: &'d mut DataSet,
        registry: Option<TaxonRegistry>,
    ) -> NewickResult<&'d mut TreeCollection> {
        if registry.is_none() && self.config.compute_split_bitmasks() {
            return Err(NewickError::Configuration(
                "split bitmasks require a taxon registry supplied before parsing"
                    .to_string(),
            ));
        }

        let mut registry = registry.unwrap_or_default();
        let mut trees = Vec::new();
        {
            let mut builder = TreeBuilder::new(
                NewickTokenizer::new(source),
                Some(&mut registry),
                self.config,
            )?;
            if let Some(hook) = self.node_hook.as_mut() {
                builder = builder.with_node_hook(
                    |tree: &mut Tree, node_id: NodeId, registry: &TaxonRegistry| {
                        hook(tree, node_id, registry)
                    },
                );
            }
            for tree in builder {
                trees.push(tree?);
            }
        }

        let collection = dataset.new_tree_collection(registry);
        for tree in trees {
            collection.append(tree)?;
        }
        Ok(collection)
    }
}
