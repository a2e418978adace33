use std::borrow::Cow;

/// Checks if a character has meaning in NEWICK (or NEXUS) punctuation.
fn is_punctuation(character: char) -> bool {
    matches!(
        character,
        '(' | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '\\'
            | '/'
            | ','
            | ';'
            | ':'
            | '='
            | '*'
            | '\''
            | '"'
            | '`'
            | '+'
            | '-'
            | '<'
            | '>'
    )
}

/// How labels are protected when written out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelEscaping {
    /// Keep blanks as blanks (quoting the label) instead of writing `_`.
    pub preserve_spaces: bool,
    /// Quote labels containing `_`, so it does not read back as a blank.
    pub quote_underscores: bool,
}

impl Default for LabelEscaping {
    fn default() -> Self {
        Self { preserve_spaces: false, quote_underscores: true }
    }
}

/// Escapes a label for use as a NEWICK token.
///
/// - A label with neither punctuation nor `_`, whose only whitespace is blanks
///   or tabs, has them written as `_` unless spaces are preserved.
/// - A label with punctuation or whitespace, or with `_` when underscores are
///   quoted, is wrapped in single quotes with embedded quotes doubled.
/// - Anything else is written verbatim.
pub fn escape_newick_label(label: &str, escaping: LabelEscaping) -> Cow<'_, str> {
    let has_underscore = label.contains('_');
    let has_punctuation = label.chars().any(is_punctuation);
    let mut whitespace = label.chars().filter(|character| character.is_whitespace());
    let has_whitespace = whitespace.clone().next().is_some();
    let only_blanks = whitespace.all(|character| matches!(character, ' ' | '\t'));

    if !escaping.preserve_spaces && !has_underscore && !has_punctuation && only_blanks {
        if has_whitespace {
            return Cow::Owned(label.replace([' ', '\t'], "_"));
        }
        return Cow::Borrowed(label);
    }

    if has_punctuation
        || has_whitespace
        || (escaping.quote_underscores && has_underscore)
    {
        return Cow::Owned(format!("'{}'", label.replace('\'', "''")));
    }

    Cow::Borrowed(label)
}
