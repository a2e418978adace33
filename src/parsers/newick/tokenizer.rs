//! Lexical scanner for NEWICK text.
//!
//! Splits a buffered character source into punctuation and label tokens.
//! Whitespace is dropped. Bracketed comments are skipped, but their bodies
//! are kept until the caller collects them with
//! [NewickTokenizer::take_comments]; this is how rooting markers such as
//! `[&R]` reach the tree builder.

use crate::parsers::{NewickError, NewickResult};
use log::trace;
use std::fmt::Display;
use std::io::BufRead;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    OpenParen,
    CloseParen,
    Comma,
    Colon,
    Semicolon,
    /// A label or number. `quoted` labels were enclosed in `'...'` or `"..."`
    /// and have had their doubled quotes collapsed.
    Label { text: String, quoted: bool },
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::OpenParen => write!(f, "'('"),
            Token::CloseParen => write!(f, "')'"),
            Token::Comma => write!(f, "','"),
            Token::Colon => write!(f, "':'"),
            Token::Semicolon => write!(f, "';'"),
            Token::Label { text, .. } => write!(f, "label \"{text}\""),
        }
    }
}

/// Checks if a character ends an unquoted label.
fn is_label_delimiter(character: char) -> bool {
    character.is_whitespace()
        || matches!(character, '(' | ')' | ',' | ':' | ';' | '[')
}

pub struct NewickTokenizer<R: BufRead> {
    reader: R,
    line_buffer: Vec<char>,
    position: usize,
    line: usize,
    source_exhausted: bool,
    peeked: Option<Token>,
    comments: Vec<String>,
}

impl<'a> NewickTokenizer<&'a [u8]> {
    pub fn from_text(text: &'a str) -> Self {
        Self::new(text.as_bytes())
    }
}

impl<R: BufRead> NewickTokenizer<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_buffer: Vec::new(),
            position: 0,
            line: 0,
            source_exhausted: false,
            peeked: None,
            comments: Vec::new(),
        }
    }

    /// Line (1-based) the scanner is currently on.
    pub fn line(&self) -> usize {
        self.line.max(1)
    }

    /// Returns the next token without consuming it.
    pub fn peek_token(&mut self) -> NewickResult<Option<&Token>> {
        if self.peeked.is_none() {
            self.peeked = self.scan()?;
        }
        Ok(self.peeked.as_ref())
    }

    /// Consumes and returns the next token; `None` at end of stream.
    pub fn advance(&mut self) -> NewickResult<Option<Token>> {
        match self.peeked.take() {
            Some(token) => Ok(Some(token)),
            None => self.scan(),
        }
    }

    /// `true` when only whitespace and comments remain.
    pub fn at_end(&mut self) -> NewickResult<bool> {
        Ok(self.peek_token()?.is_none())
    }

    /// Bodies of the comments skipped since the last call, in source order.
    pub fn take_comments(&mut self) -> Vec<String> {
        std::mem::take(&mut self.comments)
    }

    fn fill_buffer(&mut self) -> NewickResult<bool> {
        while self.position >= self.line_buffer.len() {
            if self.source_exhausted {
                return Ok(false);
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                self.source_exhausted = true;
                return Ok(false);
            }
            self.line += 1;
            self.line_buffer = line.chars().collect();
            self.position = 0;
        }
        Ok(true)
    }

    fn peek_char(&mut self) -> NewickResult<Option<char>> {
        if self.fill_buffer()? {
            Ok(Some(self.line_buffer[self.position]))
        } else {
            Ok(None)
        }
    }

    fn next_char(&mut self) -> NewickResult<Option<char>> {
        let character = self.peek_char()?;
        if character.is_some() {
            self.position += 1;
        }
        Ok(character)
    }

    fn scan(&mut self) -> NewickResult<Option<Token>> {
        self.skip_whitespace_and_comments()?;

        let Some(character) = self.peek_char()? else {
            return Ok(None);
        };

        let token = match character {
            '(' | ')' | ',' | ':' | ';' => {
                self.position += 1;
                match character {
                    '(' => Token::OpenParen,
                    ')' => Token::CloseParen,
                    ',' => Token::Comma,
                    ':' => Token::Colon,
                    _ => Token::Semicolon,
                }
            }
            '\'' | '"' => {
                Token::Label { text: self.read_quoted(character)?, quoted: true }
            }
            _ => Token::Label { text: self.read_unquoted()?, quoted: false },
        };

        trace!("line {}: {token}", self.line());
        Ok(Some(token))
    }

    fn skip_whitespace_and_comments(&mut self) -> NewickResult<()> {
        while let Some(character) = self.peek_char()? {
            if character.is_whitespace() {
                self.position += 1;
            } else if character == '[' {
                let comment = self.read_comment()?;
                self.comments.push(comment);
            } else {
                break;
            }
        }
        Ok(())
    }

    /// Reads a `[...]` comment, nested brackets included, and returns its body.
    fn read_comment(&mut self) -> NewickResult<String> {
        let start_line = self.line();
        _ = self.next_char()?;

        let mut depth = 1;
        let mut body = String::new();
        loop {
            match self.next_char()? {
                None => {
                    return Err(NewickError::parse(
                        start_line,
                        "unterminated comment",
                    ));
                }
                Some('[') => {
                    depth += 1;
                    body.push('[');
                }
                Some(']') => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(body);
                    }
                    body.push(']');
                }
                Some(character) => body.push(character),
            }
        }
    }

    /// Reads a quoted label; a doubled quote stands for one literal quote.
    fn read_quoted(&mut self, quote: char) -> NewickResult<String> {
        let start_line = self.line();
        _ = self.next_char()?;

        let mut text = String::new();
        loop {
            match self.next_char()? {
                None => {
                    return Err(NewickError::parse(
                        start_line,
                        "unterminated quoted label",
                    ));
                }
                Some(character) if character == quote => {
                    if self.peek_char()? == Some(quote) {
                        self.position += 1;
                        text.push(quote);
                    } else {
                        return Ok(text);
                    }
                }
                Some(character) => text.push(character),
            }
        }
    }

    fn read_unquoted(&mut self) -> NewickResult<String> {
        let mut text = String::new();
        while let Some(character) = self.peek_char()? {
            if is_label_delimiter(character) {
                break;
            }
            text.push(character);
            self.position += 1;
        }
        Ok(text)
    }
}
