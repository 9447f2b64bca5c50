use std::{fmt, iter::Peekable, str::CharIndices};

use crate::planner::error::PlannerError;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Ident(String),
    Int(i32),
    Float(f32),
    Text(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(name) => write!(f, "identifier '{}'", name),
            Token::Int(i) => write!(f, "number {}", i),
            Token::Float(x) => write!(f, "number {}", x),
            Token::Text(s) => write!(f, "text '{}'", s),
        }
    }
}

/// A token and the byte position it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub position: usize,
    pub token: Token,
}

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | ',')
}

/// Splits a predicate into tokens.
///
/// Whitespace, parentheses and commas only separate tokens, so
/// `less(age, 30)` and `less age 30` tokenize the same.
pub struct Tokenizer<'a> {
    input: &'a str,
    chars: Peekable<CharIndices<'a>>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            chars: input.char_indices().peekable(),
        }
    }

    fn skip_separators(&mut self) {
        while self.chars.next_if(|(_, c)| is_separator(*c)).is_some() {}
    }

    /// Byte position where the current word ends.
    fn word_end(&mut self) -> usize {
        while self.chars.next_if(|(_, c)| !is_separator(*c)).is_some() {}
        self.chars.peek().map(|(i, _)| *i).unwrap_or(self.input.len())
    }

    fn text(&mut self, start: usize) -> Result<Token, PlannerError> {
        for (i, c) in self.chars.by_ref() {
            if c == '\'' {
                return Ok(Token::Text(self.input[start + 1..i].to_string()));
            }
        }
        Err(PlannerError::UnterminatedText { position: start })
    }

    fn number(&mut self, start: usize) -> Result<Token, PlannerError> {
        let literal = &self.input[start..self.word_end()];
        if literal.contains('.') {
            let valid = literal
                .trim_start_matches('-')
                .split('.')
                .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit()));
            if valid {
                if let Ok(value) = literal.parse::<f32>() {
                    return Ok(Token::Float(value));
                }
            }
        } else if let Ok(value) = literal.parse::<i32>() {
            return Ok(Token::Int(value));
        }
        Err(PlannerError::InvalidNumber {
            literal: literal.to_string(),
        })
    }

    fn ident(&mut self, start: usize) -> Result<Token, PlannerError> {
        let end = self.word_end();
        let word = &self.input[start..end];
        match word.char_indices().find(|(_, c)| !(c.is_alphanumeric() || *c == '_')) {
            Some((offset, found)) => Err(PlannerError::UnexpectedCharacter {
                position: start + offset,
                found,
            }),
            None => Ok(Token::Ident(word.to_string())),
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Result<Spanned, PlannerError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.skip_separators();
        let (position, c) = *self.chars.peek()?;

        let token = match c {
            '\'' => {
                self.chars.next();
                self.text(position)
            }
            '-' | '0'..='9' => self.number(position),
            c if c.is_alphabetic() || c == '_' => self.ident(position),
            found => {
                self.chars.next();
                Err(PlannerError::UnexpectedCharacter { position, found })
            }
        };
        Some(token.map(|token| Spanned { position, token }))
    }
}

pub fn tokenize(input: &str) -> Result<Vec<Spanned>, PlannerError> {
    Tokenizer::new(input).collect()
}
