use super::labels::LabelEscaping;
use super::rooting::{Rooting, RootingInterpreter};

/// Numeric type edge lengths are read as.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EdgeLengthType {
    Integer,
    #[default]
    Float,
}

/// Reader settings, fixed for the lifetime of a reader.
///
/// # Configuration
/// * `with_preserve_underscores()` - unquoted `_` stays `_` instead of
///   becoming a blank.
/// * `with_default_rooting(rooting)` - rooting of trees without a
///   `[&R]`/`[&U]` marker.
/// * `with_forced_rooting(rooting)` - rooting of every tree, markers ignored.
/// * `with_edge_length_type(type)` - integer or floating-point lengths.
/// * `with_split_bitmasks()` - annotate every edge with its split bitmask;
///   needs a registry supplied before parsing.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NewickReaderConfig {
    preserve_underscores: bool,
    rooting: RootingInterpreter,
    edge_length_type: EdgeLengthType,
    compute_split_bitmasks: bool,
}

impl NewickReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preserve_underscores(mut self) -> Self {
        self.preserve_underscores = true;
        self
    }

    pub fn with_default_rooting(mut self, rooting: Rooting) -> Self {
        self.rooting = RootingInterpreter::new(rooting);
        self
    }

    pub fn with_forced_rooting(mut self, rooting: Rooting) -> Self {
        self.rooting = RootingInterpreter::forced(rooting);
        self
    }

    pub fn with_edge_length_type(mut self, edge_length_type: EdgeLengthType) -> Self {
        self.edge_length_type = edge_length_type;
        self
    }

    pub fn with_split_bitmasks(mut self) -> Self {
        self.compute_split_bitmasks = true;
        self
    }

    pub fn preserve_underscores(&self) -> bool {
        self.preserve_underscores
    }

    pub fn rooting(&self) -> &RootingInterpreter {
        &self.rooting
    }

    pub fn edge_length_type(&self) -> EdgeLengthType {
        self.edge_length_type
    }

    pub fn compute_split_bitmasks(&self) -> bool {
        self.compute_split_bitmasks
    }
}

/// Writer settings.
///
/// Edge lengths are written in fixed-point notation with `leaf_precision`
/// fractional digits on leaf edges and `internal_precision` on the rest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewickWriterConfig {
    edge_lengths: bool,
    internal_labels: bool,
    escaping: LabelEscaping,
    leaf_precision: usize,
    internal_precision: usize,
}

impl Default for NewickWriterConfig {
    fn default() -> Self {
        Self {
            edge_lengths: true,
            internal_labels: true,
            escaping: LabelEscaping::default(),
            leaf_precision: 10,
            internal_precision: 6,
        }
    }
}

impl NewickWriterConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn without_edge_lengths(mut self) -> Self {
        self.edge_lengths = false;
        self
    }

    pub fn without_internal_labels(mut self) -> Self {
        self.internal_labels = false;
        self
    }

    pub fn with_preserve_spaces(mut self, preserve_spaces: bool) -> Self {
        self.escaping.preserve_spaces = preserve_spaces;
        self
    }

    pub fn with_quote_underscores(mut self, quote_underscores: bool) -> Self {
        self.escaping.quote_underscores = quote_underscores;
        self
    }

    pub fn with_leaf_precision(mut self, precision: usize) -> Self {
        self.leaf_precision = precision;
        self
    }

    pub fn with_internal_precision(mut self, precision: usize) -> Self {
        self.internal_precision = precision;
        self
    }

    pub fn edge_lengths(&self) -> bool {
        self.edge_lengths
    }

    pub fn internal_labels(&self) -> bool {
        self.internal_labels
    }

    pub fn escaping(&self) -> LabelEscaping {
        self.escaping
    }

    pub fn leaf_precision(&self) -> usize {
        self.leaf_precision
    }

    pub fn internal_precision(&self) -> usize {
        self.internal_precision
    }
}
