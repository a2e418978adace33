#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Rooting {
    Rooted,
    #[default]
    Unrooted,
}

impl Rooting {
    pub fn is_rooted(self) -> bool {
        self == Rooting::Rooted
    }

    /// Reads a rooting marker from the body of a `[...]` comment:
    /// `&R` is rooted, `&U` is unrooted (case-insensitive).
    pub fn from_comment(comment: &str) -> Option<Rooting> {
        match comment.trim() {
            "&R" | "&r" => Some(Rooting::Rooted),
            "&U" | "&u" => Some(Rooting::Unrooted),
            _ => None,
        }
    }
}

/// Decides whether a parsed tree is rooted.
///
/// A forced rooting overrides everything; otherwise a `[&R]`/`[&U]` marker
/// in the statement wins over the default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RootingInterpreter {
    forced: Option<Rooting>,
    default: Rooting,
}

impl RootingInterpreter {
    pub fn new(default: Rooting) -> Self {
        Self { forced: None, default }
    }

    pub fn forced(rooting: Rooting) -> Self {
        Self { forced: Some(rooting), default: rooting }
    }

    pub fn default_rooting(&self) -> Rooting {
        self.default
    }

    pub fn interpret(&self, marker: Option<Rooting>) -> Rooting {
        self.forced.or(marker).unwrap_or(self.default)
    }
}
