//! Tokenizer for the protocol buffer text format.

use super::ParseError;

/// Delimiter pair used for a nested message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delim {
    /// `{` ... `}`
    Brace,
    /// `<` ... `>`
    Angle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier, keyword or bare number.
    Word(String),
    /// A single quoted literal with escapes already decoded.
    Str(Vec<u8>),
    Colon,
    /// `,` or `;` between fields.
    Separator,
    Open(Delim),
    Close(Delim),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

pub struct Tokenizer<'a> {
    src: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
    peeked: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            src: text.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            peeked: None,
        }
    }

    pub fn peek(&mut self) -> Result<&Token, ParseError> {
        let tok = match self.peeked.take() {
            Some(tok) => tok,
            None => self.scan()?,
        };
        Ok(self.peeked.insert(tok))
    }

    pub fn next_token(&mut self) -> Result<Token, ParseError> {
        match self.peeked.take() {
            Some(tok) => Ok(tok),
            None => self.scan(),
        }
    }

    fn bump(&mut self) -> Option<u8> {
        let b = *self.src.get(self.pos)?;
        self.pos += 1;
        if b == b'\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(b)
    }

    fn current(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(b) = self.current() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.bump();
                }
                b'#' => {
                    while let Some(c) = self.bump() {
                        if c == b'\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn scan(&mut self) -> Result<Token, ParseError> {
        self.skip_trivia();
        let (line, column) = (self.line, self.column);
        let token = |kind| Token { kind, line, column };

        let Some(b) = self.current() else {
            return Ok(token(TokenKind::Eof));
        };

        let kind = match b {
            b':' => {
                self.bump();
                TokenKind::Colon
            }
            b',' | b';' => {
                self.bump();
                TokenKind::Separator
            }
            b'{' => {
                self.bump();
                TokenKind::Open(Delim::Brace)
            }
            b'}' => {
                self.bump();
                TokenKind::Close(Delim::Brace)
            }
            b'<' => {
                self.bump();
                TokenKind::Open(Delim::Angle)
            }
            b'>' => {
                self.bump();
                TokenKind::Close(Delim::Angle)
            }
            b'"' | b'\'' => TokenKind::Str(self.scan_string(line, column)?),
            b if is_word_byte(b) => {
                let start = self.pos;
                while self.current().is_some_and(is_word_byte) {
                    self.bump();
                }
                let word = String::from_utf8_lossy(&self.src[start..self.pos]).into_owned();
                TokenKind::Word(word)
            }
            other => {
                return Err(ParseError::new(
                    line,
                    column,
                    format!("unexpected character '{}'", other.escape_ascii()),
                ))
            }
        };
        Ok(token(kind))
    }

    fn scan_string(&mut self, line: usize, column: usize) -> Result<Vec<u8>, ParseError> {
        let unterminated = || ParseError::new(line, column, "unterminated string literal");
        let quote = self.bump().ok_or_else(unterminated)?;
        let mut out = Vec::new();
        loop {
            let b = self.bump().ok_or_else(unterminated)?;
            match b {
                b'\n' => return Err(unterminated()),
                b'\\' => {
                    let (esc_line, esc_column) = (self.line, self.column - 1);
                    let e = self.bump().ok_or_else(unterminated)?;
                    match e {
                        b'n' => out.push(b'\n'),
                        b'r' => out.push(b'\r'),
                        b't' => out.push(b'\t'),
                        b'a' => out.push(0x07),
                        b'b' => out.push(0x08),
                        b'f' => out.push(0x0c),
                        b'v' => out.push(0x0b),
                        b'\\' | b'\'' | b'"' | b'?' => out.push(e),
                        b'0'..=b'7' => {
                            let mut value = u32::from(e - b'0');
                            for _ in 0..2 {
                                match self.current() {
                                    Some(d @ b'0'..=b'7') => {
                                        self.bump();
                                        value = value * 8 + u32::from(d - b'0');
                                    }
                                    _ => break,
                                }
                            }
                            let byte = u8::try_from(value).map_err(|_| {
                                ParseError::new(esc_line, esc_column, "octal escape out of range")
                            })?;
                            out.push(byte);
                        }
                        b'x' | b'X' => {
                            let mut value = 0u8;
                            let mut digits = 0;
                            while digits < 2 {
                                let Some(d) = self.current().and_then(hex_value) else {
                                    break;
                                };
                                self.bump();
                                value = value * 16 + d;
                                digits += 1;
                            }
                            if digits == 0 {
                                return Err(ParseError::new(
                                    esc_line,
                                    esc_column,
                                    "\\x escape without hex digits",
                                ));
                            }
                            out.push(value);
                        }
                        other => {
                            return Err(ParseError::new(
                                esc_line,
                                esc_column,
                                format!("invalid escape '\\{}'", other.escape_ascii()),
                            ))
                        }
                    }
                }
                b if b == quote => return Ok(out),
                b => out.push(b),
            }
        }
    }
}

fn is_word_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'.' | b'-' | b'+')
}

fn hex_value(b: u8) -> Option<u8> {
    (b as char).to_digit(16).map(|d| d as u8)
}
