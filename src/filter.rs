// ISOPLOT: Confidence-Interval Charts of Scalar Results Pivoted over Iteration Variables
// Copyright (C) 2024-2025 Roland Schmid <roschmi@ethz.ch> and Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.
//! Boolean filter expressions selecting scalar rows by glob patterns.
//!
//! The grammar, from lowest to highest precedence:
//!
//! ```text
//! expr    := or
//! or      := and ("or" and)*
//! and     := unary ("and" unary)*
//! unary   := "not" unary | primary
//! primary := "(" expr ")" | term
//! term    := WORD ("=~" WORD)?
//! ```
//!
//! A term with `=~` matches the named field against a glob pattern; the
//! fields are `name`, `module`, `run`, `itervar:<key>`, `runattr:<key>` and
//! `attr:<key>`. A bare word is shorthand for a pattern on the scalar name.
//! Keywords and field names are matched case-insensitively. Words containing
//! whitespace, parentheses, quotes or `=` must be double-quoted; inside
//! quotes, a backslash escapes the next character. The empty expression
//! matches every row.

use glob::Pattern;
use thiserror::Error;

use crate::results::ScalarRow;

/// Errors raised while parsing a filter expression.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("unexpected character {1:?} in filter expression at offset {0}")]
    UnexpectedChar(usize, char),
    #[error("unterminated quoted string starting at offset {0}")]
    UnterminatedString(usize),
    #[error("unknown field {field:?} at offset {offset}; expected name, module, run, itervar:<key>, runattr:<key> or attr:<key>")]
    UnknownField { offset: usize, field: String },
    #[error("invalid match pattern {pattern:?} at offset {offset}: {source}")]
    BadPattern {
        offset: usize,
        pattern: String,
        source: glob::PatternError,
    },
    #[error("expected {1} at offset {0}")]
    Expected(usize, &'static str),
    #[error("trailing input after filter expression at offset {0}")]
    TrailingInput(usize),
}

/// A matchable field of a [`ScalarRow`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field {
    Name,
    Module,
    Run,
    Itervar(String),
    Runattr(String),
    Attr(String),
}

impl Field {
    fn resolve<'a>(&self, row: &'a ScalarRow) -> Option<&'a str> {
        match self {
            Self::Name => Some(&row.name),
            Self::Module => Some(&row.module),
            Self::Run => Some(&row.run),
            Self::Itervar(key) => row.itervars.get(key).map(String::as_str),
            Self::Runattr(key) => row.runattrs.get(key).map(String::as_str),
            Self::Attr(key) => row.attrs.get(key).map(String::as_str),
        }
    }
}

/// A parsed filter expression.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterExpr {
    /// The empty expression, matching every row.
    All,
    /// A glob pattern match on a single field. A row whose field is absent
    /// never matches.
    Match { field: Field, pattern: Pattern },
    Not(Box<FilterExpr>),
    And(Box<FilterExpr>, Box<FilterExpr>),
    Or(Box<FilterExpr>, Box<FilterExpr>),
}

impl FilterExpr {
    /// Parse a filter expression. A blank input yields [`FilterExpr::All`].
    pub fn parse(input: &str) -> Result<Self, FilterError> {
        let tokens = lex(input)?;
        if tokens.is_empty() {
            return Ok(Self::All);
        }
        let mut parser = Parser {
            tokens: &tokens,
            pos: 0,
            end: input.len(),
        };
        let expr = parser.or_expr()?;
        match parser.tokens.get(parser.pos) {
            Some((offset, _)) => Err(FilterError::TrailingInput(*offset)),
            None => Ok(expr),
        }
    }

    /// Evaluate the expression against a single row.
    pub fn matches(&self, row: &ScalarRow) -> bool {
        match self {
            Self::All => true,
            Self::Match { field, pattern } => field
                .resolve(row)
                .map(|value| pattern.matches(value))
                .unwrap_or(false),
            Self::Not(inner) => !inner.matches(row),
            Self::And(lhs, rhs) => lhs.matches(row) && rhs.matches(row),
            Self::Or(lhs, rhs) => lhs.matches(row) || rhs.matches(row),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    LParen,
    RParen,
    And,
    Or,
    Not,
    Matches,
    Word(String),
}

/// Tokenize the input, keeping the byte offset of every token.
fn lex(input: &str) -> Result<Vec<(usize, Token)>, FilterError> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();
    while let Some((offset, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '(' => tokens.push((offset, Token::LParen)),
            ')' => tokens.push((offset, Token::RParen)),
            '=' => match chars.next() {
                Some((_, '~')) => tokens.push((offset, Token::Matches)),
                _ => return Err(FilterError::UnexpectedChar(offset, '=')),
            },
            '"' => {
                let mut word = String::new();
                let mut closed = false;
                while let Some((_, c)) = chars.next() {
                    match c {
                        '"' => {
                            closed = true;
                            break;
                        }
                        '\\' => match chars.next() {
                            Some((_, escaped)) => word.push(escaped),
                            None => break,
                        },
                        c => word.push(c),
                    }
                }
                if !closed {
                    return Err(FilterError::UnterminatedString(offset));
                }
                tokens.push((offset, Token::Word(word)));
            }
            c => {
                let mut word = String::from(c);
                while let Some(&(_, c)) = chars.peek() {
                    if c.is_whitespace() || matches!(c, '(' | ')' | '"' | '=') {
                        break;
                    }
                    word.push(c);
                    chars.next();
                }
                let token = match word.to_ascii_lowercase().as_str() {
                    "and" => Token::And,
                    "or" => Token::Or,
                    "not" => Token::Not,
                    _ => Token::Word(word),
                };
                tokens.push((offset, token));
            }
        }
    }
    Ok(tokens)
}

/// Recursive-descent parser over the token stream.
struct Parser<'a> {
    tokens: &'a [(usize, Token)],
    pos: usize,
    end: usize,
}

impl Parser<'_> {
    fn offset(&self) -> usize {
        self.tokens.get(self.pos).map(|(o, _)| *o).unwrap_or(self.end)
    }

    fn bump(&mut self) -> Option<(usize, Token)> {
        let entry = self.tokens.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.tokens.get(self.pos).map(|(_, t)| t) == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn or_expr(&mut self) -> Result<FilterExpr, FilterError> {
        let mut lhs = self.and_expr()?;
        while self.eat(&Token::Or) {
            let rhs = self.and_expr()?;
            lhs = FilterExpr::Or(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn and_expr(&mut self) -> Result<FilterExpr, FilterError> {
        let mut lhs = self.unary()?;
        while self.eat(&Token::And) {
            let rhs = self.unary()?;
            lhs = FilterExpr::And(Box::new(lhs), Box::new(rhs));
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<FilterExpr, FilterError> {
        if self.eat(&Token::Not) {
            Ok(FilterExpr::Not(Box::new(self.unary()?)))
        } else {
            self.primary()
        }
    }

    fn primary(&mut self) -> Result<FilterExpr, FilterError> {
        let offset = self.offset();
        match self.bump() {
            Some((_, Token::LParen)) => {
                let inner = self.or_expr()?;
                if !self.eat(&Token::RParen) {
                    return Err(FilterError::Expected(self.offset(), "a closing parenthesis"));
                }
                Ok(inner)
            }
            Some((word_at, Token::Word(word))) => {
                if self.eat(&Token::Matches) {
                    let field = parse_field(word_at, &word)?;
                    let pattern_at = self.offset();
                    match self.bump() {
                        Some((at, Token::Word(pattern))) => Ok(FilterExpr::Match {
                            field,
                            pattern: compile_pattern(at, &pattern)?,
                        }),
                        _ => Err(FilterError::Expected(pattern_at, "a match pattern")),
                    }
                } else {
                    // a bare word is a pattern on the scalar name
                    Ok(FilterExpr::Match {
                        field: Field::Name,
                        pattern: compile_pattern(word_at, &word)?,
                    })
                }
            }
            _ => Err(FilterError::Expected(offset, "a filter term")),
        }
    }
}

fn parse_field(offset: usize, word: &str) -> Result<Field, FilterError> {
    if let Some((prefix, key)) = word.split_once(':') {
        match prefix.to_ascii_lowercase().as_str() {
            "itervar" => Ok(Field::Itervar(key.to_string())),
            "runattr" => Ok(Field::Runattr(key.to_string())),
            "attr" => Ok(Field::Attr(key.to_string())),
            _ => Err(FilterError::UnknownField {
                offset,
                field: word.to_string(),
            }),
        }
    } else {
        match word.to_ascii_lowercase().as_str() {
            "name" => Ok(Field::Name),
            "module" => Ok(Field::Module),
            "run" => Ok(Field::Run),
            _ => Err(FilterError::UnknownField {
                offset,
                field: word.to_string(),
            }),
        }
    }
}

fn compile_pattern(offset: usize, raw: &str) -> Result<Pattern, FilterError> {
    Pattern::new(raw).map_err(|source| FilterError::BadPattern {
        offset,
        pattern: raw.to_string(),
        source,
    })
}
