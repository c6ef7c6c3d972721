//! Recursive-descent reader driving [`TextMessage::merge_field`].

use super::tokenizer::{Delim, Token, TokenKind, Tokenizer};
use super::{ParseError, TextEnum, TextMessage};

/// Field-level reader handed to [`TextMessage::merge_field`].
pub struct Parser<'a> {
    tokens: Tokenizer<'a>,
    /// Name and position of the field currently being merged.
    field: (String, usize, usize),
}

impl<'a> Parser<'a> {
    pub(crate) fn new(text: &'a str) -> Self {
        Self {
            tokens: Tokenizer::new(text),
            field: (String::new(), 1, 1),
        }
    }

    /// Read fields into `msg` until end of input (`close == None`) or the
    /// matching closing delimiter.
    pub(crate) fn parse_fields<M: TextMessage>(
        &mut self,
        msg: &mut M,
        close: Option<Delim>,
    ) -> Result<(), ParseError> {
        loop {
            let tok = self.tokens.next_token()?;
            match tok.kind {
                TokenKind::Eof if close.is_none() => return Ok(()),
                TokenKind::Eof => {
                    return Err(ParseError::new(
                        tok.line,
                        tok.column,
                        format!("unexpected end of input inside {}", M::FULL_NAME),
                    ))
                }
                TokenKind::Close(d) if Some(d) == close => return Ok(()),
                TokenKind::Word(ref name) if is_field_name(name) => {
                    self.field = (name.clone(), tok.line, tok.column);
                    msg.merge_field(name, self)?;
                    if self.tokens.peek()?.kind == TokenKind::Separator {
                        self.tokens.next_token()?;
                    }
                }
                _ => return Err(unexpected(&tok, "a field name")),
            }
        }
    }

    /// Read `: "literal"`, concatenating adjacent literals.
    pub fn string(&mut self) -> Result<String, ParseError> {
        self.expect_colon()?;
        let tok = self.tokens.next_token()?;
        let (line, column) = (tok.line, tok.column);
        let mut bytes = match tok.kind {
            TokenKind::Str(bytes) => bytes,
            _ => return Err(unexpected(&tok, "a string literal")),
        };
        while let TokenKind::Str(more) = &self.tokens.peek()?.kind {
            bytes.extend_from_slice(more);
            self.tokens.next_token()?;
        }
        String::from_utf8(bytes)
            .map_err(|_| ParseError::new(line, column, "string literal is not valid UTF-8"))
    }

    /// Read `: true` / `: false` (also `t`, `f`, `1`, `0`, `True`, `False`).
    pub fn boolean(&mut self) -> Result<bool, ParseError> {
        self.expect_colon()?;
        let tok = self.tokens.next_token()?;
        match &tok.kind {
            TokenKind::Word(w) => match w.as_str() {
                "true" | "True" | "t" | "1" => Ok(true),
                "false" | "False" | "f" | "0" => Ok(false),
                _ => Err(ParseError::new(
                    tok.line,
                    tok.column,
                    format!("invalid bool value '{w}'"),
                )),
            },
            _ => Err(unexpected(&tok, "a bool value")),
        }
    }

    /// Read `: NAME` for enum `E`.
    pub fn enumeration<E: TextEnum>(&mut self) -> Result<E, ParseError> {
        self.expect_colon()?;
        let tok = self.tokens.next_token()?;
        match &tok.kind {
            TokenKind::Word(w) => E::from_name(w).ok_or_else(|| {
                ParseError::new(
                    tok.line,
                    tok.column,
                    format!("unknown {} value '{w}'", E::TYPE_NAME),
                )
            }),
            _ => Err(unexpected(&tok, "an enum value")),
        }
    }

    /// Read a nested message block, with or without a leading colon.
    pub fn message<M: TextMessage>(&mut self) -> Result<M, ParseError> {
        if self.tokens.peek()?.kind == TokenKind::Colon {
            self.tokens.next_token()?;
        }
        let tok = self.tokens.next_token()?;
        let TokenKind::Open(delim) = tok.kind else {
            return Err(unexpected(&tok, "'{' or '<'"));
        };
        let mut msg = M::default();
        self.parse_fields(&mut msg, Some(delim))?;
        Ok(msg)
    }

    pub fn repeated_string(&mut self, list: &mut Vec<String>) -> Result<(), ParseError> {
        list.push(self.string()?);
        Ok(())
    }

    pub fn repeated_message<M: TextMessage>(&mut self, list: &mut Vec<M>) -> Result<(), ParseError> {
        list.push(self.message()?);
        Ok(())
    }

    pub fn optional_string(&mut self, slot: &mut Option<String>) -> Result<(), ParseError> {
        let value = self.string()?;
        self.set_once(slot, value)
    }

    pub fn optional_bool(&mut self, slot: &mut Option<bool>) -> Result<(), ParseError> {
        let value = self.boolean()?;
        self.set_once(slot, value)
    }

    pub fn optional_enum<E: TextEnum>(&mut self, slot: &mut Option<E>) -> Result<(), ParseError> {
        let value = self.enumeration()?;
        self.set_once(slot, value)
    }

    /// Error for a field name that is not part of message `M`.
    pub fn unknown_field<M: TextMessage>(&self) -> ParseError {
        let (name, line, column) = &self.field;
        ParseError::new(
            *line,
            *column,
            format!("unknown field '{name}' in {}", M::FULL_NAME),
        )
    }

    fn set_once<T>(&self, slot: &mut Option<T>, value: T) -> Result<(), ParseError> {
        if slot.is_some() {
            let (name, line, column) = &self.field;
            return Err(ParseError::new(
                *line,
                *column,
                format!("non-repeated field '{name}' specified multiple times"),
            ));
        }
        *slot = Some(value);
        Ok(())
    }

    fn expect_colon(&mut self) -> Result<(), ParseError> {
        let tok = self.tokens.next_token()?;
        match tok.kind {
            TokenKind::Colon => Ok(()),
            _ => Err(unexpected(&tok, "':'")),
        }
    }
}

fn is_field_name(word: &str) -> bool {
    word.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && word.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn unexpected(tok: &Token, expected: &str) -> ParseError {
    let found = match &tok.kind {
        TokenKind::Word(w) => format!("'{w}'"),
        TokenKind::Str(_) => "string literal".to_string(),
        TokenKind::Colon => "':'".to_string(),
        TokenKind::Separator => "separator".to_string(),
        TokenKind::Open(Delim::Brace) => "'{'".to_string(),
        TokenKind::Open(Delim::Angle) => "'<'".to_string(),
        TokenKind::Close(Delim::Brace) => "'}'".to_string(),
        TokenKind::Close(Delim::Angle) => "'>'".to_string(),
        TokenKind::Eof => "end of input".to_string(),
    };
    ParseError::new(
        tok.line,
        tok.column,
        format!("expected {expected}, found {found}"),
    )
}
