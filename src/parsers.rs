pub(crate) mod newick;

use crate::{TaxonError, TreeError};

#[derive(Debug, thiserror::Error)]
pub enum NewickError {
    #[error("Parse error at line {line}: {message}.")]
    Parse { line: usize, message: String },
    #[error(transparent)]
    Lookup(#[from] TaxonError),
    #[error("Configuration error: {0}.")]
    Configuration(String),
    #[error(transparent)]
    Tree(#[from] TreeError),
    #[error("I/O error: {0}.")]
    Io(#[from] std::io::Error),
}

impl NewickError {
    pub(crate) fn parse(line: usize, message: impl Into<String>) -> Self {
        NewickError::Parse { line, message: message.into() }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, NewickError::Parse { .. })
    }

    pub fn is_lookup_error(&self) -> bool {
        matches!(self, NewickError::Lookup(_))
    }

    pub fn is_configuration_error(&self) -> bool {
        matches!(self, NewickError::Configuration(_))
    }
}

pub type NewickResult<T> = Result<T, NewickError>;
