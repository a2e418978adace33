use crate::{SplitBitmask, TreeFloat, TreeInt};
use std::fmt::Display;
use std::sync::Arc;

/// Length of an edge as it was read, or as it was set by the caller.
///
/// `Text` holds a length that was never interpreted as a number; writers try
/// to read it as one and fall back to the literal text.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeLength {
    Int(TreeInt),
    Float(TreeFloat),
    Text(Arc<str>),
}

impl EdgeLength {
    pub fn as_float(&self) -> Option<TreeFloat> {
        match self {
            EdgeLength::Int(value) => Some(*value as TreeFloat),
            EdgeLength::Float(value) => Some(*value),
            EdgeLength::Text(text) => text.trim().parse::<TreeFloat>().ok(),
        }
    }
}

impl Display for EdgeLength {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeLength::Int(value) => write!(f, "{value}"),
            EdgeLength::Float(value) => write!(f, "{value}"),
            EdgeLength::Text(text) => write!(f, "{text}"),
        }
    }
}

impl From<TreeFloat> for EdgeLength {
    fn from(value: TreeFloat) -> Self {
        EdgeLength::Float(value)
    }
}

impl From<TreeInt> for EdgeLength {
    fn from(value: TreeInt) -> Self {
        EdgeLength::Int(value)
    }
}

impl From<&str> for EdgeLength {
    fn from(value: &str) -> Self {
        EdgeLength::Text(value.into())
    }
}

/// The edge subtending a node: every node owns exactly one.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Edge {
    length: Option<EdgeLength>,
    split_bitmask: Option<SplitBitmask>,
}

impl Edge {
    pub fn length(&self) -> Option<&EdgeLength> {
        self.length.as_ref()
    }

    pub fn set_length(&mut self, length: Option<EdgeLength>) {
        self.length = length;
    }

    pub fn split_bitmask(&self) -> Option<SplitBitmask> {
        self.split_bitmask
    }

    pub fn set_split_bitmask(&mut self, split_bitmask: Option<SplitBitmask>) {
        self.split_bitmask = split_bitmask;
    }
}
