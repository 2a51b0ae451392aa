use std::fmt;

pub mod temporal;

pub use temporal::parse_formula;

use crate::logic::Formula;

pub type ParseResult<T> = Result<T, ParseErr>;

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ParseErr {
    Expected(String, String),
    EmptyFormula,
    UnknownChar(char, usize),
    Line(usize, Box<ParseErr>),
}

impl fmt::Display for ParseErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseErr::Expected(expected, got) => write!(f, "Expected {expected} but got {got}"),
            ParseErr::EmptyFormula => write!(f, "Expected a formula but got an empty input"),
            ParseErr::UnknownChar(c, pos) => {
                write!(f, "Unknown character '{c}' at position {pos}")
            }
            ParseErr::Line(line, e) => write!(f, "Line {line}: {e}"),
        }
    }
}

impl ParseErr {
    /// Attributes the error to the 1-based `line`, replacing an earlier line.
    pub fn at_line(self, line: usize) -> ParseErr {
        match self {
            ParseErr::Line(_, e) => ParseErr::Line(line, e),
            e => ParseErr::Line(line, Box::new(e)),
        }
    }
}

/// Yields the formula lines of `text` with their 1-based line numbers.
/// Blank lines and lines starting with `#` are skipped.
pub fn formula_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty() && !line.starts_with('#'))
        .map(|(i, line)| (i + 1, line))
}

/// Parses one formula per line of `text`, see [`formula_lines`].
pub fn parse_formula_list(text: &str) -> ParseResult<Vec<Formula>> {
    formula_lines(text)
        .map(|(n, line)| parse_formula(line).map_err(|e| e.at_line(n)))
        .collect()
}

#[derive(Debug, PartialEq, Eq)]
pub struct Token<'t> {
    pub kind: TokenKind,
    pub spelling: &'t str,
    pub src_pos: usize,
}

impl<'t> fmt::Display for Token<'t> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.spelling)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum TokenKind {
    Not,
    And,
    Or,
    Impl,
    Until,
    Unless,
    Always,
    Eventually,
    Next,
    Knowledge,
    LParen,
    RParen,
    True,
    False,
    Prop,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TokenKind::Not => "~",
            TokenKind::And => "^",
            TokenKind::Or => "v",
            TokenKind::Impl => "->",
            TokenKind::Until => "U",
            TokenKind::Unless => "W",
            TokenKind::Always => "G",
            TokenKind::Eventually => "F",
            TokenKind::Next => "N",
            TokenKind::Knowledge => "knowledge operator",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::True => "true",
            TokenKind::False => "false",
            TokenKind::Prop => "proposition",
        };

        write!(f, "{}", s)
    }
}

pub struct Tokenizer<'t> {
    src: &'t str,
    pos: usize,
}

impl<'t> Tokenizer<'t> {
    pub fn new(src: &'t str) -> Self {
        Self { src, pos: 0 }
    }

    fn token(&mut self, kind: TokenKind, len: usize) -> Token<'t> {
        let t = Token {
            kind,
            spelling: &self.src[self.pos..self.pos + len],
            src_pos: self.pos,
        };
        self.pos += len;
        t
    }

    /// Length of a leading letter followed by any number of digits.
    fn indexed_len(rest: &str) -> usize {
        1 + rest[1..].chars().take_while(char::is_ascii_digit).count()
    }
}

impl<'t> Iterator for Tokenizer<'t> {
    type Item = ParseResult<Token<'t>>;

    fn next(&mut self) -> Option<Self::Item> {
        let src = self.src;
        let rest = &src[self.pos..];
        let trimmed = rest.trim_start();
        self.pos += rest.len() - trimmed.len();
        let rest = trimmed;

        let c = rest.chars().next()?;

        let token = if rest.starts_with("->") {
            self.token(TokenKind::Impl, 2)
        } else if rest.starts_with("true") {
            self.token(TokenKind::True, 4)
        } else if rest.starts_with("false") {
            self.token(TokenKind::False, 5)
        } else {
            let kind = match c {
                '~' | '!' => TokenKind::Not,
                '^' | '&' => TokenKind::And,
                'v' | '|' => TokenKind::Or,
                'U' => TokenKind::Until,
                'W' => TokenKind::Unless,
                'G' => TokenKind::Always,
                'F' => TokenKind::Eventually,
                'N' => TokenKind::Next,
                '(' => TokenKind::LParen,
                ')' => TokenKind::RParen,
                'k' => {
                    let len = Self::indexed_len(rest);
                    return Some(Ok(self.token(TokenKind::Knowledge, len)));
                }
                'p'..='t' => {
                    let len = Self::indexed_len(rest);
                    return Some(Ok(self.token(TokenKind::Prop, len)));
                }
                _ => {
                    let pos = self.pos;
                    self.pos = self.src.len();
                    return Some(Err(ParseErr::UnknownChar(c, pos)));
                }
            };
            self.token(kind, 1)
        };

        Some(Ok(token))
    }
}
