//! Protocol buffer text format for the CROSSTOOL records.
//!
//! Covers the subset of the format the CROSSTOOL schema needs: string,
//! bool and enum scalars, repeated fields written as repeated lines, and
//! nested messages in `{ }` or `< >` blocks. `#` starts a comment that runs
//! to the end of the line.
//!
//! Records plug in by implementing [`TextMessage`]; the parser hands each
//! field name to [`TextMessage::merge_field`] and the writer asks the record
//! to emit its present fields through [`TextWriter`].

mod parser;
mod tokenizer;
mod writer;

use std::io::{self, Write};

pub use parser::Parser;
pub use writer::TextWriter;

/// A syntax or schema error in text-format input, with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("line {line}, column {column}: {message}")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl ParseError {
    pub fn new(line: usize, column: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            column,
            message: message.into(),
        }
    }
}

/// A record that can be read from and written to the text format.
pub trait TextMessage: Default {
    /// Fully qualified schema name of the record type.
    const FULL_NAME: &'static str;

    /// Consume the value of field `name` from `parser` into `self`.
    ///
    /// Implementations return [`Parser::unknown_field`] for names outside
    /// their schema.
    fn merge_field(&mut self, name: &str, parser: &mut Parser<'_>) -> Result<(), ParseError>;

    /// Emit every present field in schema order.
    fn write_fields(&self, writer: &mut TextWriter<'_>) -> io::Result<()>;
}

/// An enum whose values are written by symbolic name.
pub trait TextEnum: Sized + Copy {
    const TYPE_NAME: &'static str;

    fn from_name(name: &str) -> Option<Self>;

    fn name(self) -> &'static str;
}

/// Parse a complete record from text.
pub fn parse<M: TextMessage>(text: &str) -> Result<M, ParseError> {
    let mut msg = M::default();
    merge(text, &mut msg)?;
    Ok(msg)
}

/// Merge text into an existing record. Repeated fields are appended.
pub fn merge<M: TextMessage>(text: &str, msg: &mut M) -> Result<(), ParseError> {
    Parser::new(text).parse_fields(msg, None)
}

/// Write `msg` in text format.
pub fn print<M: TextMessage>(msg: &M, out: &mut dyn Write) -> io::Result<()> {
    msg.write_fields(&mut TextWriter::new(out))
}

/// Render `msg` in text format.
pub fn to_string<M: TextMessage>(msg: &M) -> String {
    let mut buf = Vec::new();
    // Writes into a Vec cannot fail.
    let _ = print(msg, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
